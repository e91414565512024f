//! Veles - Warcraft III game file parsing and conversion library.
//!
//! This crate provides a unified interface to the Veles library ecosystem
//! for working with Warcraft III game files.
//!
//! # Crates
//!
//! - [`veles_common`] - Common utilities (binary reading and writing)
//! - [`veles_mdlx`] - MDX/MDL model format (binary and text notation)
//! - [`veles_mpq`] - MPQ archive reading and writing (Storm cipher + zlib)
//! - [`veles_blp`] - BLP texture decoding
//! - [`veles_w3x`] - Map info (war3map.w3i) records
//!
//! # Example
//!
//! ```no_run
//! use veles::prelude::*;
//!
//! // Open a map archive
//! let archive = MpqArchive::open("mymap.w3x")?;
//!
//! // Pull the map info out of it
//! let info = MapInfo::read(&archive.read_file("war3map.w3i")?)?;
//! println!("{} by {}", info.name, info.author);
//!
//! // Convert an embedded model to text notation
//! let model = Model::from_mdx(&archive.read_file("war3mapImported\\hero.mdx")?)?;
//! println!("{}", model.to_mdl());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use veles_blp as blp;
pub use veles_common as common;
pub use veles_mdlx as mdlx;
pub use veles_mpq as mpq;
pub use veles_w3x as w3x;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use veles_blp::{BlpTexture, RgbaImage};
    pub use veles_common::{BinaryReader, BinaryWriter};
    pub use veles_mdlx::{Model, TokenReader, TokenWriter};
    pub use veles_mpq::{MpqArchive, MpqBuilder, MpqEntry};
    pub use veles_w3x::MapInfo;
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
