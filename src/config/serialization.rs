use crate::config::Configuration;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SerializationError>;

/// Explicit export; configurations are never written implicitly.
pub fn export_configuration(config: &Configuration, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn import_configuration(path: &Path) -> Result<Configuration> {
    let json = std::fs::read_to_string(path)?;
    let config: Configuration = serde_json::from_str(&json)?;
    Ok(config)
}
