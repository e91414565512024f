//! MDX chunk record types.
//!
//! One module per structural unit of the format. Each record implements the
//! `read`/`write`/`byte_len` triple for the binary format, and where the MDL
//! notation has an equivalent, `read_mdl`/`write_mdl` for the text format.
//!
//! # Structure overview
//!
//! An MDX model contains:
//! - [`Sequence`]: animation timeline definitions (fixed 132-byte records)
//! - Global sequences: shared timeline durations (plain u32 per entry)
//! - [`Texture`]: texture references (fixed 268-byte records)
//! - [`Material`] / [`Layer`]: render state, with animated attributes
//! - [`Geoset`]: geometry (vertices, faces, skinning, texture coordinates)
//! - [`Bone`], [`Helper`], [`Attachment`], [`EventObject`],
//!   [`CollisionShape`]: node-backed scene objects built on [`Node`]
//! - [`Camera`]: cinematic cameras with animated targets
//!
//! Keyframe animation lives in [`Track`], a tagged sub-chunk generic over
//! its value arity through [`TrackValue`].

mod attachment;
mod bone;
mod camera;
mod collision_shape;
mod event_object;
mod extent;
mod geoset;
mod helper;
mod material;
mod node;
mod sequence;
mod texture;
mod track;

pub use attachment::Attachment;
pub use bone::Bone;
pub use camera::Camera;
pub use collision_shape::{CollisionShape, Shape};
pub use event_object::EventObject;
pub use extent::Extent;
pub use geoset::Geoset;
pub use helper::Helper;
pub use material::{Layer, Material};
pub use node::Node;
pub use sequence::Sequence;
pub use texture::Texture;
pub use track::{Interpolation, Track, TrackKey, TrackValue};
