//! Session context persistence as a small JSON document.

use std::path::Path;

use anyhow::{Context, Result};

use super::SessionMetadata;

/// Save the session context to `path` as pretty-printed JSON.
pub fn save_session(path: &Path, metadata: &SessionMetadata) -> Result<()> {
    let json =
        serde_json::to_string_pretty(metadata).with_context(|| "Failed to serialize session")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write session file: {:?}", path))?;
    Ok(())
}

/// Load a previously saved session context from `path`.
pub fn load_session(path: &Path) -> Result<SessionMetadata> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read session file: {:?}", path))?;
    let metadata = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse session file: {:?}", path))?;
    Ok(metadata)
}
