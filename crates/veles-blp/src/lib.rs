//! BLP texture decoding for Warcraft III game files.
//!
//! BLP1 stores a texture either as paletted indices (256-entry BGRA
//! palette plus an optional packed alpha plane) or as JPEG content (a
//! shared JPEG header prefix with per-mipmap tails). Both decode to RGBA8
//! through [`BlpTexture::decode_mipmap`].
//!
//! Failures are scoped to the asset at hand: an unsupported layout or a
//! corrupt mipmap produces an [`Error`] for that texture only.
//!
//! # Example
//!
//! ```no_run
//! use veles_blp::BlpTexture;
//!
//! let data = std::fs::read("Footman.blp")?;
//! let texture = BlpTexture::parse(&data)?;
//! let image = texture.decode_mipmap(0)?;
//! println!("{}x{}", image.width, image.height);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod header;
mod texture;

pub use error::{Error, Result};
pub use header::BlpHeader;
pub use texture::{BlpTexture, RgbaImage, BLP_MAGIC};
