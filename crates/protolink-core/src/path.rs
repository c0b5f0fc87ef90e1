use crate::error::CoreError;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::Display;
use std::path::PathBuf;
use tracing::debug;

/// Best-effort percent decoding of a client supplied path.
///
/// Browsers may submit relative paths percent-encoded. When the decoded
/// bytes are not valid UTF-8 the raw string is returned unchanged; this
/// function never fails.
pub fn decode_lossy(raw: &str) -> Cow<'_, str> {
    match percent_decode_str(raw).decode_utf8() {
        Ok(decoded) => decoded,
        Err(e) => {
            debug!(path = %raw, error = %e, "path is not decodable, using raw value");
            Cow::Borrowed(raw)
        }
    }
}

/// A normalized path of a file inside a prototype directory.
///
/// Segments are joined with `/`. A `RelativePath` never contains empty,
/// `.` or `..` segments, so joining it onto a directory cannot leave that
/// directory.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelativePath(String);

impl RelativePath {
    /// Decodes and normalizes a client supplied relative path.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let decoded = decode_lossy(raw);
        let unified = decoded.replace('\\', "/");

        let mut segments = Vec::new();
        for segment in unified.split('/') {
            match segment {
                "" | "." => continue,
                ".." => {
                    return Err(CoreError::InvalidPath(format!(
                        "parent directory segments are not allowed: '{raw}'"
                    )))
                }
                s if s.contains('\0') => {
                    return Err(CoreError::InvalidPath(format!(
                        "path contains a NUL byte: '{}'",
                        raw.escape_default()
                    )))
                }
                s => segments.push(s),
            }
        }

        if segments.is_empty() {
            return Err(CoreError::InvalidPath(format!(
                "path has no file name: '{raw}'"
            )));
        }

        Ok(Self(segments.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Converts into a platform path relative to a prototype directory.
    pub fn to_path_buf(&self) -> PathBuf {
        self.0.split('/').collect()
    }
}

impl TryFrom<String> for RelativePath {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RelativePath> for String {
    fn from(value: RelativePath) -> Self {
        value.0
    }
}

impl Display for RelativePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
