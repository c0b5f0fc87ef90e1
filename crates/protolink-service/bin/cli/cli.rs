use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DATA_DIR_ENV: &str = "PROTOLINK_DATA_DIR";
pub const UPLOAD_DIR_ENV: &str = "PROTOLINK_UPLOAD_DIR";
pub const INDEX_BACKEND_ENV: &str = "PROTOLINK_INDEX_BACKEND";
pub const BASE_URL_ENV: &str = "PROTOLINK_BASE_URL";
pub const LOG_FORMAT_ENV: &str = "PROTOLINK_LOG_FORMAT";

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IndexBackendArg {
    #[value(name = "json")]
    Json,
    #[value(name = "in-memory")]
    InMemory,
}

impl Display for IndexBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexBackendArg::Json => write!(f, "json"),
            IndexBackendArg::InMemory => write!(f, "in-memory"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "protolink", about = "Store HTML prototypes and share them by short code")]
pub struct CLI {
    /// Directory holding the metadata index.
    #[arg(long, env = DATA_DIR_ENV, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Base directory for prototype files.
    #[arg(long, env = UPLOAD_DIR_ENV, default_value = DEFAULT_UPLOAD_DIR)]
    pub upload_dir: PathBuf,

    #[arg(
        long,
        env = INDEX_BACKEND_ENV,
        value_enum,
        default_value_t = IndexBackendArg::Json
    )]
    pub index: IndexBackendArg,

    /// Public address the preview links are built on.
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload every file below DIR as one prototype.
    Upload {
        dir: PathBuf,
        /// Logical name; uploading under an existing name overwrites it.
        #[arg(long)]
        name: Option<String>,
    },
    /// Look up the prototype behind a short code.
    Resolve { code: String },
    /// List prototypes, newest first.
    List {
        #[arg(long, allow_hyphen_values = true)]
        page: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        page_size: Option<String>,
    },
    /// Show one prototype by id.
    Show { id: String },
    /// Delete a prototype and its files.
    Delete { id: String },
    /// Report disagreements between the index and the stored files.
    Check,
}
