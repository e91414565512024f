//! MPQ archive reader and writer for Warcraft III game files.
//!
//! MPQ is Blizzard's archive format: a header findable at any 512-byte
//! multiple, an encrypted hash table mapping hashed file names to blocks,
//! an encrypted block table describing file data, and per-sector
//! compression. This crate handles the format-version-0 layout that
//! Warcraft III and its map files (W3X/W3M) use:
//!
//! - Storm cipher hashing and table/file encryption
//! - sector-based and single-unit files, zlib compression (method 0x02);
//!   other method bits fail that entry alone with
//!   [`Error::UnsupportedCompression`]
//! - `(listfile)` enumeration
//! - [`MpqBuilder`] for writing complete archives
//!
//! # Example
//!
//! ```no_run
//! use veles_mpq::MpqArchive;
//!
//! let archive = MpqArchive::open("war3x.mpq")?;
//! for name in archive.list_files()? {
//!     println!("{name}");
//! }
//! let info = archive.read_file("war3map.w3i")?;
//! # Ok::<(), veles_mpq::Error>(())
//! ```

mod archive;
mod builder;
mod error;
mod tables;

pub mod crypto;

pub use archive::{MpqArchive, MpqEntry, COMPRESSION_ZLIB};
pub use builder::MpqBuilder;
pub use error::{Error, Result};
pub use tables::{BlockEntry, HashEntry, MpqHeader};
