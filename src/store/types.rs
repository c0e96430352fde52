//! Input types for word-list ingestion.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One entry of a word list: the word itself plus optional extra metadata
/// statements (property identifier → value, no assumed schema).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    /// The word to record.
    pub text: String,
    /// Extra metadata statements merged into the finalize payload.
    #[serde(default)]
    pub extra: HashMap<String, String>,
}

impl WordEntry {
    /// Create an entry with no extra metadata.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            extra: HashMap::new(),
        }
    }

    /// Create an entry carrying extra metadata statements.
    pub fn with_extra(text: impl Into<String>, extra: HashMap<String, String>) -> Self {
        Self {
            text: text.into(),
            extra,
        }
    }
}

impl From<&str> for WordEntry {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for WordEntry {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}
