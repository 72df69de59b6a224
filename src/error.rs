use thiserror::Error;

pub type Result<T> = std::result::Result<T, LibraryError>;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store error: {0}")]
    Store(String),
    #[cfg(feature = "storage-rocksdb")]
    #[error("storage error: {0}")]
    Storage(#[from] rocksdb::Error),
    #[error("notification dispatch failed: {0}")]
    Notify(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("invalid event: {0}")]
    InvalidEvent(String),
    #[error("consistency violation: {0}")]
    Consistency(String),
}
