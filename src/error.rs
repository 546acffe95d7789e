use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AutomattikError>;

#[derive(Error, Debug)]
pub enum AutomattikError {
    #[error("Unknown database type: '{0}'")]
    InvalidDatabaseType(String),

    #[error("Malformed configuration: {0}")]
    MalformedConfig(#[source] serde_json::Error),

    #[error("Can't read file: {}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse file: '{}' ({source})", path.display())]
    ConfigFileParse {
        path: PathBuf,
        #[source]
        source: Box<AutomattikError>,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
