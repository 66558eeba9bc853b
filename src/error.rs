use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("The file already exists: {}. Delete it or set `overwrite`.", .0.display())]
    FileExists(PathBuf),

    #[error("The data was not yet downloaded. Run fetch() first.")]
    NotDownloaded,

    #[error("The data was already transformed into a table.")]
    AlreadyTransformed,

    #[error("Unexpected response payload: {0}")]
    Payload(String),

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),
}
