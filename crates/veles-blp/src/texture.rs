//! BLP1 texture decoding.

use veles_common::BinaryReader;

use crate::header::BlpHeader;
use crate::{Error, Result};

/// BLP1 file magic bytes.
pub const BLP_MAGIC: &[u8; 4] = b"BLP1";

/// A decoded mipmap level: tightly packed RGBA8 pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbaImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// A parsed BLP1 texture.
///
/// Parsing reads the header and the shared decoding state (palette or JPEG
/// header prefix) but leaves per-level pixel data in place; levels are
/// decoded on demand with [`decode_mipmap`](Self::decode_mipmap).
#[derive(Debug)]
pub struct BlpTexture {
    header: BlpHeader,
    /// 256 BGRA entries for paletted content.
    palette: Vec<u8>,
    /// Shared JPEG header prefix for JPEG content.
    jpeg_header: Vec<u8>,
    data: Vec<u8>,
}

impl BlpTexture {
    /// Parse a BLP1 buffer.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(data);

        let magic = reader.read_tag().map_err(Error::Common)?;
        if &magic != BLP_MAGIC {
            return Err(Error::InvalidMagic(magic));
        }

        let header: BlpHeader = reader.read_struct()?;
        match header.alpha_bits {
            0 | 1 | 4 | 8 => {}
            other => return Err(Error::UnsupportedAlphaDepth(other)),
        }
        // 16 mipmap slots bound the base dimensions; anything larger is a
        // hostile header and would overflow pixel-buffer arithmetic.
        if header.width == 0 || header.height == 0 || header.width > 65535 || header.height > 65535
        {
            return Err(Error::InvalidDimensions {
                width: header.width,
                height: header.height,
            });
        }

        let mut texture = Self {
            header,
            palette: Vec::new(),
            jpeg_header: Vec::new(),
            data: data.to_vec(),
        };

        match header.content {
            BlpHeader::CONTENT_JPEG => {
                let header_size = reader.read_u32()? as usize;
                texture.jpeg_header = reader.read_bytes(header_size)?.to_vec();
            }
            BlpHeader::CONTENT_PALETTED => {
                texture.palette = reader.read_bytes(256 * 4)?.to_vec();
            }
            other => return Err(Error::UnsupportedContent(other)),
        }

        Ok(texture)
    }

    pub fn header(&self) -> &BlpHeader {
        &self.header
    }

    pub fn width(&self) -> u32 {
        self.header.width
    }

    pub fn height(&self) -> u32 {
        self.header.height
    }

    /// Number of stored mipmap levels.
    pub fn mipmap_count(&self) -> usize {
        self.header.mipmap_count()
    }

    /// Decode one mipmap level to RGBA8.
    pub fn decode_mipmap(&self, level: usize) -> Result<RgbaImage> {
        let raw = self.mipmap_data(level)?;
        let (width, height) = self.header.mipmap_dimensions(level);

        let pixels = match self.header.content {
            BlpHeader::CONTENT_JPEG => self.decode_jpeg(raw, width, height)?,
            _ => self.decode_paletted(raw, level, width, height)?,
        };

        Ok(RgbaImage {
            width,
            height,
            pixels,
        })
    }

    fn mipmap_data(&self, level: usize) -> Result<&[u8]> {
        if level >= 16 {
            return Err(Error::MissingMipmap(level));
        }
        let offset = self.header.mipmap_offsets[level] as usize;
        let size = self.header.mipmap_sizes[level] as usize;
        if offset == 0 || size == 0 {
            return Err(Error::MissingMipmap(level));
        }
        self.data
            .get(offset..offset + size)
            .ok_or(Error::MipmapOutOfBounds {
                level,
                offset,
                size,
            })
    }

    /// JPEG content: the file-wide header prefix concatenated with the
    /// per-level tail forms a complete JPEG stream. Decoded channels come
    /// out in BGRA order and are swapped to RGBA.
    fn decode_jpeg(&self, raw: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
        let mut stream = Vec::with_capacity(self.jpeg_header.len() + raw.len());
        stream.extend_from_slice(&self.jpeg_header);
        stream.extend_from_slice(raw);

        let image = image::load_from_memory_with_format(&stream, image::ImageFormat::Jpeg)
            .map_err(|e| Error::Jpeg(e.to_string()))?;
        let mut pixels = image.into_rgba8().into_raw();

        pixels.truncate(width as usize * height as usize * 4);
        for pixel in pixels.chunks_exact_mut(4) {
            pixel.swap(0, 2);
        }
        Ok(pixels)
    }

    /// Paletted content: one palette index per pixel, then an alpha plane
    /// of `alpha_bits` bits per pixel. Palette entries are BGRA; the entry
    /// alpha is ignored, the plane (or full opacity) wins.
    fn decode_paletted(
        &self,
        raw: &[u8],
        level: usize,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>> {
        let count = width as usize * height as usize;
        let alpha_bits = self.header.alpha_bits as usize;
        let alpha_len = (count * alpha_bits).div_ceil(8);

        if raw.len() < count + alpha_len {
            return Err(Error::MipmapOutOfBounds {
                level,
                offset: self.header.mipmap_offsets[level] as usize,
                size: raw.len(),
            });
        }
        let (indices, alpha_plane) = raw.split_at(count);

        let mut pixels = vec![0u8; count * 4];
        for (i, &index) in indices.iter().enumerate() {
            let entry = &self.palette[index as usize * 4..index as usize * 4 + 4];
            pixels[i * 4] = entry[2];
            pixels[i * 4 + 1] = entry[1];
            pixels[i * 4 + 2] = entry[0];
            pixels[i * 4 + 3] = read_alpha(alpha_plane, i, alpha_bits);
        }
        Ok(pixels)
    }
}

/// Extract one pixel's alpha from the packed plane, scaled to 0-255.
/// A zero-bit plane means fully opaque.
fn read_alpha(plane: &[u8], index: usize, alpha_bits: usize) -> u8 {
    match alpha_bits {
        0 => 255,
        1 => {
            let bit = (plane[index / 8] >> (index % 8)) & 1;
            if bit != 0 {
                255
            } else {
                0
            }
        }
        4 => {
            let nibble = (plane[index / 2] >> ((index % 2) * 4)) & 0x0F;
            nibble * 17
        }
        _ => plane[index],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerocopy::IntoBytes;

    /// Build a minimal paletted BLP1 with a 2x2 level 0.
    fn paletted_fixture(alpha_bits: u32, alpha_plane: &[u8]) -> Vec<u8> {
        let mut header = BlpHeader {
            content: BlpHeader::CONTENT_PALETTED,
            alpha_bits,
            width: 2,
            height: 2,
            extra: 5,
            has_mipmaps: 0,
            mipmap_offsets: [0; 16],
            mipmap_sizes: [0; 16],
        };

        let data_offset = BlpHeader::BYTE_LEN + 256 * 4;
        let indices = [0u8, 1, 2, 3];
        header.mipmap_offsets[0] = data_offset as u32;
        header.mipmap_sizes[0] = (indices.len() + alpha_plane.len()) as u32;

        let mut file = Vec::new();
        file.extend_from_slice(BLP_MAGIC);
        file.extend_from_slice(header.as_bytes());
        // Palette: entry i = BGRA (i, 2i, 3i, 0)
        for i in 0..256u32 {
            file.extend_from_slice(&[i as u8, (i * 2) as u8, (i * 3) as u8, 0]);
        }
        file.extend_from_slice(&indices);
        file.extend_from_slice(alpha_plane);
        file
    }

    #[test]
    fn test_paletted_decode_swizzles_bgr() {
        let file = paletted_fixture(0, &[]);
        let texture = BlpTexture::parse(&file).unwrap();
        assert_eq!(texture.mipmap_count(), 1);

        let image = texture.decode_mipmap(0).unwrap();
        assert_eq!((image.width, image.height), (2, 2));
        // Index 1 -> palette BGRA (1, 2, 3, _) -> RGBA (3, 2, 1, 255)
        assert_eq!(&image.pixels[4..8], &[3, 2, 1, 255]);
    }

    #[test]
    fn test_paletted_eight_bit_alpha() {
        let file = paletted_fixture(8, &[0, 64, 128, 255]);
        let texture = BlpTexture::parse(&file).unwrap();

        let image = texture.decode_mipmap(0).unwrap();
        let alphas: Vec<u8> = image.pixels.chunks_exact(4).map(|p| p[3]).collect();
        assert_eq!(alphas, vec![0, 64, 128, 255]);
    }

    #[test]
    fn test_paletted_one_bit_alpha() {
        // Bits 0 and 3 set: pixels 0 and 3 opaque.
        let file = paletted_fixture(1, &[0b0000_1001]);
        let texture = BlpTexture::parse(&file).unwrap();

        let image = texture.decode_mipmap(0).unwrap();
        let alphas: Vec<u8> = image.pixels.chunks_exact(4).map(|p| p[3]).collect();
        assert_eq!(alphas, vec![255, 0, 0, 255]);
    }

    #[test]
    fn test_rejects_blp2() {
        let mut file = paletted_fixture(0, &[]);
        file[..4].copy_from_slice(b"BLP2");
        assert!(matches!(
            BlpTexture::parse(&file),
            Err(Error::InvalidMagic(_))
        ));
    }

    #[test]
    fn test_rejects_bad_alpha_depth() {
        let mut file = paletted_fixture(0, &[]);
        // alpha_bits field sits right after magic + content.
        file[8] = 3;
        assert!(matches!(
            BlpTexture::parse(&file),
            Err(Error::UnsupportedAlphaDepth(3))
        ));
    }

    #[test]
    fn test_rejects_hostile_dimensions() {
        let mut file = paletted_fixture(0, &[]);
        // width field follows content and alpha_bits.
        file[12..16].copy_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
        assert!(matches!(
            BlpTexture::parse(&file),
            Err(Error::InvalidDimensions { .. })
        ));

        let mut file = paletted_fixture(0, &[]);
        file[16..20].copy_from_slice(&0u32.to_le_bytes());
        assert!(matches!(
            BlpTexture::parse(&file),
            Err(Error::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_missing_mipmap() {
        let file = paletted_fixture(0, &[]);
        let texture = BlpTexture::parse(&file).unwrap();
        assert!(matches!(
            texture.decode_mipmap(1),
            Err(Error::MissingMipmap(1))
        ));
    }
}
