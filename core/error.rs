use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("TOML Parsing Error: {0}")]
    TomlParse(String),

    #[error("JSON Serialization Error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scan root does not exist: '{path}'")]
    RootNotFound { path: PathBuf },

    #[error("Scan root is not a directory: '{path}'")]
    NotADirectory { path: PathBuf },

    #[error("File Read Error: Path '{path}', Error: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No such node in the scanned tree: '{path}'")]
    NodeNotFound { path: PathBuf },

    #[error("Invalid Argument: {0}")]
    InvalidArgument(String),
}
