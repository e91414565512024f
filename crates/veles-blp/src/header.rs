//! BLP1 header structures.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// BLP1 file header (without the 4-byte magic).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct BlpHeader {
    /// 0 = JPEG content, 1 = paletted content.
    pub content: u32,
    /// Alpha depth: 0, 1, 4, or 8 bits per pixel.
    pub alpha_bits: u32,
    /// Base image width.
    pub width: u32,
    /// Base image height.
    pub height: u32,
    /// Picture type field; Warcraft III writes 4 or 5. Unused for decoding.
    pub extra: u32,
    /// Nonzero when mipmap levels past 0 are stored.
    pub has_mipmaps: u32,
    /// Absolute file offsets per mipmap level; 0 means the level is absent.
    pub mipmap_offsets: [u32; 16],
    /// Stored size per mipmap level.
    pub mipmap_sizes: [u32; 16],
}

impl BlpHeader {
    /// JPEG content kind.
    pub const CONTENT_JPEG: u32 = 0;
    /// Paletted content kind.
    pub const CONTENT_PALETTED: u32 = 1;

    /// Serialized header size, magic included.
    pub const BYTE_LEN: usize = 4 + 24 + 64 + 64;

    /// Dimensions of one mipmap level.
    pub fn mipmap_dimensions(&self, level: usize) -> (u32, u32) {
        (
            (self.width >> level).max(1),
            (self.height >> level).max(1),
        )
    }

    /// Number of mipmap levels that are actually stored.
    pub fn mipmap_count(&self) -> usize {
        // Copy out of the packed struct before taking references.
        let sizes = self.mipmap_sizes;
        sizes.iter().take_while(|&&s| s != 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_with_sizes(sizes: &[u32]) -> BlpHeader {
        let mut header = BlpHeader {
            content: BlpHeader::CONTENT_PALETTED,
            alpha_bits: 8,
            width: 64,
            height: 32,
            extra: 5,
            has_mipmaps: 1,
            mipmap_offsets: [0; 16],
            mipmap_sizes: [0; 16],
        };
        let mut mipmap_sizes = [0u32; 16];
        mipmap_sizes[..sizes.len()].copy_from_slice(sizes);
        header.mipmap_sizes = mipmap_sizes;
        header
    }

    #[test]
    fn test_mipmap_count_stops_at_first_empty() {
        assert_eq!(header_with_sizes(&[]).mipmap_count(), 0);
        assert_eq!(header_with_sizes(&[128, 64, 16]).mipmap_count(), 3);
        assert_eq!(header_with_sizes(&[128, 0, 16]).mipmap_count(), 1);
    }

    #[test]
    fn test_mipmap_dimensions_clamp_to_one() {
        let header = header_with_sizes(&[2048]);
        assert_eq!(header.mipmap_dimensions(0), (64, 32));
        assert_eq!(header.mipmap_dimensions(5), (2, 1));
        assert_eq!(header.mipmap_dimensions(10), (1, 1));
    }
}
