//! Error types for BLP handling.

use thiserror::Error;

/// Errors that can occur when working with BLP textures.
///
/// All of these are per-asset: a texture that fails to decode does not
/// affect decoding of its siblings.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error.
    #[error("{0}")]
    Common(#[from] veles_common::Error),

    /// Not a BLP1 file (BLP0 and BLP2 use different layouts).
    #[error("invalid BLP magic: expected 'BLP1', got {0:?}")]
    InvalidMagic([u8; 4]),

    /// Content kind other than JPEG (0) or paletted (1).
    #[error("unsupported BLP content kind: {0}")]
    UnsupportedContent(u32),

    /// Alpha depth other than 0, 1, 4, or 8 bits.
    #[error("unsupported BLP alpha depth: {0}")]
    UnsupportedAlphaDepth(u32),

    /// Header dimensions exceed what the format can store.
    #[error("invalid BLP dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Requested mipmap level is not present in the file.
    #[error("missing mipmap level {0}")]
    MissingMipmap(usize),

    /// A mipmap's offset and size point outside the file.
    #[error("mipmap {level} out of bounds: offset {offset}, size {size}")]
    MipmapOutOfBounds {
        level: usize,
        offset: usize,
        size: usize,
    },

    /// JPEG content failed to decode.
    #[error("JPEG decode error: {0}")]
    Jpeg(String),
}

/// Result type for BLP operations.
pub type Result<T> = std::result::Result<T, Error>;
