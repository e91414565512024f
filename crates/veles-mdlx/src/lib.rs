//! MDX/MDL model format support for Warcraft III.
//!
//! MDX is a chunked binary format: a `MDLX` magic followed by tagged,
//! length-prefixed chunks (`VERS`, `MODL`, `SEQS`, `GEOS`, ...), each holding
//! one class of records. MDL is the equivalent brace-delimited text notation.
//! Both describe the same object graph, and both round-trip through the
//! [`Model`] type.
//!
//! Every record implements three symmetric operations:
//!
//! - `read` - load fields from a [`BinaryReader`](veles_common::BinaryReader)
//!   in format order, branching on the container version
//! - `write` - emit the identical layout into a pre-sized buffer
//! - `byte_len` - predict the exact serialized size without writing
//!
//! The byte-length contract is what lets [`Model::to_mdx`] allocate its
//! output buffer once and write linearly into it; any drift between
//! `byte_len` and `write` corrupts chunk framing and is covered by tests.
//!
//! # Example
//!
//! ```no_run
//! use veles_mdlx::Model;
//!
//! let data = std::fs::read("unit.mdx")?;
//! let mut model = Model::from_mdx(&data)?;
//!
//! model.sequences.retain(|s| s.name != "Decay");
//! std::fs::write("unit_trimmed.mdx", model.to_mdx()?)?;
//!
//! // Or go through the text notation
//! let mdl = model.to_mdl();
//! let reparsed = Model::from_mdl(&mdl)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod model;
mod tokens;

pub mod chunks;

pub use chunks::{
    Attachment, Bone, Camera, CollisionShape, EventObject, Extent, Geoset, Helper, Interpolation,
    Layer, Material, Node, Sequence, Shape, Texture, Track, TrackKey, TrackValue,
};
pub use error::{Error, Result};
pub use model::{Model, UnknownChunk};
pub use tokens::{TokenReader, TokenWriter};

/// MDX file magic bytes.
pub const MDX_MAGIC: &[u8; 4] = b"MDLX";

/// Sentinel for "no object" in index fields (parent ids, global sequences).
pub const NONE: u32 = 0xFFFF_FFFF;
