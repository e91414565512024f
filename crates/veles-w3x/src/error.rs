//! Error types for the W3X crate.

use thiserror::Error;

/// Errors that can occur when working with map files.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error.
    #[error("{0}")]
    Common(#[from] veles_common::Error),

    /// A w3i format version this crate has no layout for.
    #[error("unsupported map info version: {0}")]
    UnsupportedVersion(u32),
}

/// Result type for W3X operations.
pub type Result<T> = std::result::Result<T, Error>;
