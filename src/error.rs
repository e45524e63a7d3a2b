//! Error types shared by the network, its snapshots, and the training config.
use thiserror::Error;

/// Errors reported by this crate.
///
/// Numeric degeneracies (NaN/Inf) are not errors: they flow through the
/// cost and gradient computations unchanged.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// A constructor, training, or shape argument was rejected before any
    /// computation started.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A snapshot or config could not be read back.
    #[error("not found: {0}")]
    NotFound(String),
    /// Writing a snapshot file failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl NetworkError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

pub type Result<T, E = NetworkError> = std::result::Result<T, E>;
