use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LightavgError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Lighthouse failed for {url}: {message}")]
    Lighthouse { url: String, message: String },

    #[error("Failed to launch Chrome: {0}")]
    BrowserLaunch(String),

    #[error("Failed to kill Chrome: {0}")]
    BrowserClose(String),

    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid job id: {0:?}")]
    InvalidJobId(String),

    #[error("Page name {0:?} is reserved for the stats file")]
    InvalidPageName(String),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T, E = LightavgError> = std::result::Result<T, E>;
