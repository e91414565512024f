//! Texture references.

use veles_common::{BinaryReader, BinaryWriter};

use crate::tokens::{TokenReader, TokenWriter};
use crate::{Error, Result};

/// One texture reference (`TEXS` chunk record, fixed 268 bytes).
///
/// A non-zero `replaceable_id` selects a game-supplied texture (team color,
/// team glow, ...) and usually leaves the path empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Texture {
    pub replaceable_id: u32,
    /// Path within the game data, stored in a 260-byte field.
    pub path: String,
    /// Bit 0: wrap width, bit 1: wrap height.
    pub flags: u32,
}

impl Texture {
    /// Fixed record size.
    pub const BYTE_LEN: usize = 268;

    const WRAP_WIDTH: u32 = 0x1;
    const WRAP_HEIGHT: u32 = 0x2;

    /// Read one texture record.
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        Ok(Self {
            replaceable_id: reader.read_u32()?,
            path: reader.read_string_block(260)?.to_string(),
            flags: reader.read_u32()?,
        })
    }

    /// Write one texture record.
    pub fn write(&self, writer: &mut BinaryWriter<'_>) -> Result<()> {
        writer.write_u32(self.replaceable_id)?;
        writer.write_string_block(&self.path, 260)?;
        writer.write_u32(self.flags)?;
        Ok(())
    }

    /// Read the MDL `Bitmap { ... }` body; the caller has consumed `Bitmap`.
    pub fn read_mdl(stream: &mut TokenReader<'_>) -> Result<Self> {
        const RECORD: &str = "Bitmap";

        let mut texture = Self::default();
        stream.enter_block(RECORD)?;
        while let Some(key) = stream.block_key(RECORD)? {
            match key {
                "Image" => texture.path = stream.word(RECORD)?.to_string(),
                "ReplaceableId" => texture.replaceable_id = stream.read_u32(RECORD)?,
                "WrapWidth" => texture.flags |= Self::WRAP_WIDTH,
                "WrapHeight" => texture.flags |= Self::WRAP_HEIGHT,
                other => return Err(Error::bad_token(other, RECORD)),
            }
        }
        Ok(texture)
    }

    /// Write the MDL form.
    pub fn write_mdl(&self, writer: &mut TokenWriter) {
        writer.start_block("Bitmap");
        writer.quoted("Image", &self.path);
        if self.replaceable_id != 0 {
            writer.attrib("ReplaceableId", self.replaceable_id);
        }
        if self.flags & Self::WRAP_WIDTH != 0 {
            writer.flag("WrapWidth");
        }
        if self.flags & Self::WRAP_HEIGHT != 0 {
            writer.flag("WrapHeight");
        }
        writer.end_block();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_roundtrip() {
        let texture = Texture {
            replaceable_id: 0,
            path: "Textures\\Footman.blp".to_string(),
            flags: 3,
        };

        let mut buffer = [0u8; Texture::BYTE_LEN];
        texture.write(&mut BinaryWriter::new(&mut buffer)).unwrap();

        let parsed = Texture::read(&mut BinaryReader::new(&buffer)).unwrap();
        assert_eq!(parsed, texture);
    }

    #[test]
    fn test_mdl_roundtrip() {
        let texture = Texture {
            replaceable_id: 2,
            path: String::new(),
            flags: 1,
        };

        let mut writer = TokenWriter::new();
        texture.write_mdl(&mut writer);
        let text = writer.finish();

        let mut stream = TokenReader::new(&text);
        assert_eq!(stream.next(), Some("Bitmap"));
        let parsed = Texture::read_mdl(&mut stream).unwrap();
        assert_eq!(parsed, texture);
    }
}
