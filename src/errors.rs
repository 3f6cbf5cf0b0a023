//! Error types shared by the catalog and its storage backends.

use thiserror::Error;

/// Failures raised by a key-value backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    /// Update or removal referenced an id that is not in the catalog.
    #[error("Track {0} not found.")]
    NotFound(String),
    /// The persisted slot could not be read as a list of tracks.
    #[error("malformed catalog data: {0}")]
    Malformed(String),
    /// A required field was blank.
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("failed to encode catalog: {0}")]
    Encode(#[from] serde_json::Error),
}
