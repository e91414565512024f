//! Animation sequences.

use veles_common::{BinaryReader, BinaryWriter};

use crate::tokens::{TokenReader, TokenWriter};
use crate::{Error, Result};

use super::Extent;

/// One animation timeline (`SEQS` chunk record, fixed 132 bytes).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sequence {
    /// Display name, stored in an 80-byte field.
    pub name: String,
    /// Start and end frame.
    pub interval: [u32; 2],
    pub move_speed: f32,
    /// Bit 0: non-looping.
    pub flags: u32,
    pub rarity: f32,
    pub sync_point: u32,
    pub extent: Extent,
}

impl Sequence {
    /// Fixed record size.
    pub const BYTE_LEN: usize = 132;

    const NON_LOOPING: u32 = 0x1;

    /// Read one sequence record.
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        Ok(Self {
            name: reader.read_string_block(80)?.to_string(),
            interval: [reader.read_u32()?, reader.read_u32()?],
            move_speed: reader.read_f32()?,
            flags: reader.read_u32()?,
            rarity: reader.read_f32()?,
            sync_point: reader.read_u32()?,
            extent: Extent::read(reader)?,
        })
    }

    /// Write one sequence record.
    pub fn write(&self, writer: &mut BinaryWriter<'_>) -> Result<()> {
        writer.write_string_block(&self.name, 80)?;
        writer.write_u32(self.interval[0])?;
        writer.write_u32(self.interval[1])?;
        writer.write_f32(self.move_speed)?;
        writer.write_u32(self.flags)?;
        writer.write_f32(self.rarity)?;
        writer.write_u32(self.sync_point)?;
        self.extent.write(writer)
    }

    /// Read the MDL `Anim "name" { ... }` form; the caller has consumed the
    /// `Anim` token.
    pub fn read_mdl(stream: &mut TokenReader<'_>) -> Result<Self> {
        const RECORD: &str = "Anim";

        let mut sequence = Self {
            name: stream.word(RECORD)?.to_string(),
            ..Self::default()
        };

        stream.enter_block(RECORD)?;
        while let Some(key) = stream.block_key(RECORD)? {
            if sequence.extent.read_mdl_token(key, stream, RECORD)? {
                continue;
            }
            match key {
                "Interval" => stream.read_u32_block(&mut sequence.interval, RECORD)?,
                "MoveSpeed" => sequence.move_speed = stream.read_f32(RECORD)?,
                "NonLooping" => sequence.flags |= Self::NON_LOOPING,
                "Rarity" => sequence.rarity = stream.read_f32(RECORD)?,
                other => return Err(Error::bad_token(other, RECORD)),
            }
        }

        Ok(sequence)
    }

    /// Write the MDL form.
    pub fn write_mdl(&self, writer: &mut TokenWriter) {
        writer.start_named_block("Anim", &self.name);
        writer.u32_block("Interval", &self.interval);
        if self.flags & Self::NON_LOOPING != 0 {
            writer.flag("NonLooping");
        }
        if self.move_speed != 0.0 {
            writer.attrib("MoveSpeed", self.move_speed);
        }
        if self.rarity != 0.0 {
            writer.attrib("Rarity", self.rarity);
        }
        self.extent.write_mdl(writer);
        writer.end_block();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Sequence {
        Sequence {
            name: "Stand - 2".to_string(),
            interval: [100, 2500],
            move_speed: 270.0,
            flags: 1,
            rarity: 4.0,
            sync_point: 0,
            extent: Extent {
                bounds_radius: 60.0,
                min: [-30.0, -30.0, 0.0],
                max: [30.0, 30.0, 90.0],
            },
        }
    }

    #[test]
    fn test_binary_roundtrip() {
        let sequence = sample();
        let mut buffer = [0u8; Sequence::BYTE_LEN];
        sequence.write(&mut BinaryWriter::new(&mut buffer)).unwrap();

        let parsed = Sequence::read(&mut BinaryReader::new(&buffer)).unwrap();
        assert_eq!(parsed, sequence);
    }

    #[test]
    fn test_mdl_roundtrip() {
        let sequence = sample();
        let mut writer = TokenWriter::new();
        sequence.write_mdl(&mut writer);
        let text = writer.finish();

        let mut stream = TokenReader::new(&text);
        assert_eq!(stream.next(), Some("Anim"));
        let parsed = Sequence::read_mdl(&mut stream).unwrap();
        assert_eq!(parsed, sequence);
    }

    #[test]
    fn test_mdl_unknown_token() {
        let mut stream = TokenReader::new("\"Walk\" { Speed 3, }");
        let err = Sequence::read_mdl(&mut stream).unwrap_err();
        assert!(err.to_string().contains("Speed"));
        assert!(err.to_string().contains("Anim"));
    }
}
