use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque identity of a stored prototype.
///
/// The id doubles as the name of the prototype's directory in the blob
/// store, so its textual form is always a lowercase hyphenated UUID and
/// can never escape the base directory.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrototypeId(Uuid);

impl PrototypeId {
    /// Creates a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PrototypeId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for PrototypeId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| CoreError::InvalidId(format!("'{s}': {e}")))
    }
}

impl std::fmt::Debug for PrototypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PrototypeId")
            .field(&self.0.hyphenated().to_string())
            .finish()
    }
}

impl Display for PrototypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0.hyphenated(), f)
    }
}
