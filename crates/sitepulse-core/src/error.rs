use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The embedded engine could not be opened or has been torn down.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// A write was rejected by the store (malformed parameter, constraint).
    #[error("write rejected: {0}")]
    Rejected(String),
}
