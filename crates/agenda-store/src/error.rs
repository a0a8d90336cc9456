use thiserror::Error;

use agenda_shared::RecordId;

/// Errors produced by the store layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No record with this id is cached.
    #[error("Record {0} not found")]
    NotFound(RecordId),

    /// Only persisted records (with a server id) may enter the store.
    #[error("Record has no server-assigned id")]
    MissingId,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
