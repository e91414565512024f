//! Error types for the MPQ crate.

use thiserror::Error;

/// Errors that can occur when working with MPQ archives.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] veles_common::Error),

    /// No `MPQ\x1A` header at any 512-byte boundary.
    #[error("no MPQ header found")]
    HeaderNotFound,

    /// Format version this crate does not handle (only v0 archives).
    #[error("unsupported MPQ format version: {0}")]
    UnsupportedVersion(u16),

    /// A compression method mask with bits beyond zlib set.
    ///
    /// Reported per entry; other entries in the archive stay readable.
    #[error("unsupported compression method mask: {0:#04x}")]
    UnsupportedCompression(u8),

    /// Decompression error.
    #[error("decompression error: {0}")]
    Decompression(String),

    /// Entry not found.
    #[error("entry not found: {0}")]
    EntryNotFound(String),

    /// A table or sector lies outside the archive bounds.
    #[error("{what} out of bounds: offset {offset:#x}, len {len}")]
    OutOfBounds {
        what: &'static str,
        offset: usize,
        len: usize,
    },

    /// A decompressed sector or file did not match its declared size.
    #[error("size mismatch for {what}: expected {expected}, got {actual}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Result type for MPQ operations.
pub type Result<T> = std::result::Result<T, Error>;
