//! Error types for the MDLX crate.

use thiserror::Error;

/// Errors that can occur when working with MDX/MDL models.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error.
    #[error("{0}")]
    Common(#[from] veles_common::Error),

    /// Unrecognized token in an MDL stream.
    #[error("unexpected token {token:?} in {record}")]
    BadToken { token: String, record: &'static str },

    /// MDL stream ended while a record was still open.
    #[error("unexpected end of input in {record}")]
    UnexpectedEnd { record: &'static str },

    /// Unrecognized sub-chunk tag inside a record.
    #[error("unknown tag {tag:?} in {record}")]
    UnknownTag { tag: String, record: &'static str },

    /// A record's declared inclusive size disagrees with its content.
    #[error("size mismatch in {record}: declared {declared}, consumed {consumed}")]
    SizeMismatch {
        record: &'static str,
        declared: usize,
        consumed: usize,
    },
}

impl Error {
    /// Build a `BadToken` error from a token slice.
    pub(crate) fn bad_token(token: impl Into<String>, record: &'static str) -> Self {
        Error::BadToken {
            token: token.into(),
            record,
        }
    }

    /// Build an `UnknownTag` error from a four-character tag.
    pub(crate) fn unknown_tag(tag: [u8; 4], record: &'static str) -> Self {
        Error::UnknownTag {
            tag: String::from_utf8_lossy(&tag).into_owned(),
            record,
        }
    }
}

/// Result type for MDLX operations.
pub type Result<T> = std::result::Result<T, Error>;
