//! Common utilities for Veles.
//!
//! This crate provides the foundational types used across all Veles crates:
//!
//! - [`BinaryReader`] - Zero-copy binary reading from byte slices
//! - [`BinaryWriter`] - Position-tracked writing into pre-sized buffers
//! - Shared [`Error`] and [`Result`] types
//!
//! Every Warcraft III format is little-endian; both cursors read and write
//! little-endian exclusively.

mod error;
mod reader;
mod writer;

pub use error::{Error, Result};
pub use reader::BinaryReader;
pub use writer::BinaryWriter;

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Re-export memchr for fast byte searching
pub use memchr;
