mod cli;
mod upload;

use crate::cli::{Command, IndexBackendArg, LogFormatArg, CLI};
use anyhow::Context;
use clap::Parser;
use protolink_core::{MetadataIndex, PageRequest, PrototypeId, PrototypeRecord};
use protolink_generator::HashGenerator;
use protolink_service::PrototypeService;
use protolink_storage::{FsBlobStore, InMemoryIndex, JsonFileIndex};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

type Service<I> = PrototypeService<I, FsBlobStore, HashGenerator>;

/// A record as shown to users: with its preview link and file location.
#[derive(Debug, Serialize)]
struct PrototypeView {
    #[serde(flatten)]
    record: PrototypeRecord,
    preview_url: String,
    storage_path: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    init_tracing(config.log_format);

    info!(
        data_dir = %config.data_dir.display(),
        upload_dir = %config.upload_dir.display(),
        index_backend = %config.index,
        "starting protolink"
    );

    let blobs = FsBlobStore::open(&config.upload_dir)
        .await
        .with_context(|| format!("opening blob store at {}", config.upload_dir.display()))?;
    let generator = HashGenerator::default();

    match config.index {
        IndexBackendArg::Json => {
            let index = JsonFileIndex::open_in(&config.data_dir)
                .await
                .with_context(|| format!("opening index in {}", config.data_dir.display()))?;
            run(PrototypeService::new(index, blobs, generator), &config).await
        }
        IndexBackendArg::InMemory => {
            run(
                PrototypeService::new(InMemoryIndex::new(), blobs, generator),
                &config,
            )
            .await
        }
    }
}

fn init_tracing(format: LogFormatArg) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormatArg::Text => builder.init(),
        LogFormatArg::Json => builder.json().init(),
    }
}

async fn run<I: MetadataIndex>(service: Service<I>, config: &CLI) -> anyhow::Result<()> {
    let view = |record: PrototypeRecord| PrototypeView {
        preview_url: record.preview_url(&config.base_url),
        storage_path: service.storage_path(&record.id),
        record,
    };

    match &config.command {
        Command::Upload { dir, name } => {
            let files = upload::read_dir_as_file_set(dir)
                .await
                .with_context(|| format!("reading {}", dir.display()))?;
            let outcome = service.save(name.as_deref(), &files).await?;

            #[derive(Serialize)]
            struct Uploaded {
                overwritten: bool,
                #[serde(flatten)]
                prototype: PrototypeView,
            }

            print_json(&Uploaded {
                overwritten: outcome.overwritten,
                prototype: view(outcome.record),
            })
        }
        Command::Resolve { code } => print_json(&view(service.resolve(code).await?)),
        Command::List { page, page_size } => {
            let request = PageRequest::parse(page.as_deref(), page_size.as_deref());
            let page = service.list(request).await?;
            print_json(&page.map(view))
        }
        Command::Show { id } => {
            let id: PrototypeId = id.parse()?;
            print_json(&view(service.get(&id).await?))
        }
        Command::Delete { id } => {
            let id: PrototypeId = id.parse()?;
            let deleted = service.delete(&id).await?;
            print_json(&serde_json::json!({ "id": id, "deleted": deleted }))
        }
        Command::Check => print_json(&service.check_consistency().await?),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
