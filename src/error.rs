//! Error types for scull
//!
//! Provides a unified error type for all device operations.

use std::io;

use thiserror::Error;

/// Result type alias using ScullError
pub type Result<T> = std::result::Result<T, ScullError>;

/// Unified error type for scull operations
#[derive(Debug, Error)]
pub enum ScullError {
    // -------------------------------------------------------------------------
    // Allocation Errors
    // -------------------------------------------------------------------------
    /// A quantum set node, slot array or quantum could not be allocated.
    /// Scaffolding allocated before the failure stays in place.
    #[error("Out of memory: could not allocate {requested} bytes ({in_use} bytes in use)")]
    OutOfMemory { requested: usize, in_use: usize },

    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    /// Waiting for the device guard was interrupted. Nothing was touched.
    #[error("Restart requested: interrupted while waiting for the device lock")]
    RestartRequested,

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    /// The caller-side buffer could not be read from or written to.
    #[error("Copy fault: {0}")]
    CopyFault(#[source] io::Error),

    // -------------------------------------------------------------------------
    // Dispatch Errors
    // -------------------------------------------------------------------------
    #[error("No such device: index {index} (device count {count})")]
    NoSuchDevice { index: usize, count: usize },

    #[error("Invalid seek to offset {0}")]
    InvalidSeek(i128),

    #[error("Handle was not opened for writing")]
    ReadOnly,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<ScullError> for io::Error {
    fn from(err: ScullError) -> Self {
        let kind = match &err {
            ScullError::OutOfMemory { .. } => io::ErrorKind::OutOfMemory,
            ScullError::RestartRequested => io::ErrorKind::Interrupted,
            ScullError::CopyFault(_) => io::ErrorKind::Other,
            ScullError::NoSuchDevice { .. } => io::ErrorKind::NotFound,
            ScullError::InvalidSeek(_) | ScullError::Config(_) | ScullError::Parse(_) => {
                io::ErrorKind::InvalidInput
            }
            ScullError::ReadOnly => io::ErrorKind::PermissionDenied,
        };
        io::Error::new(kind, err)
    }
}
