//! Force (team) records.

use veles_common::{BinaryReader, BinaryWriter};

use crate::Result;

use super::cstring_len;

/// One force: a named team of player slots.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Force {
    pub flags: u32,
    /// Bit mask of member player slots.
    pub player_mask: u32,
    pub name: String,
}

impl Force {
    /// Force flag: members are allied.
    pub const ALLIED: u32 = 0x01;
    /// Force flag: allied victory.
    pub const ALLIED_VICTORY: u32 = 0x02;
    /// Force flag: share vision.
    pub const SHARE_VISION: u32 = 0x08;
    /// Force flag: share unit control.
    pub const SHARE_UNIT_CONTROL: u32 = 0x10;
    /// Force flag: share advanced unit control.
    pub const SHARE_ADVANCED_UNIT_CONTROL: u32 = 0x20;

    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        Ok(Self {
            flags: reader.read_u32()?,
            player_mask: reader.read_u32()?,
            name: reader.read_cstring()?.to_string(),
        })
    }

    pub fn write(&self, writer: &mut BinaryWriter<'_>) -> Result<()> {
        writer.write_u32(self.flags)?;
        writer.write_u32(self.player_mask)?;
        writer.write_cstring(&self.name)?;
        Ok(())
    }

    pub fn byte_len(&self) -> usize {
        8 + cstring_len(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let force = Force {
            flags: Force::ALLIED | Force::ALLIED_VICTORY,
            player_mask: 0b1111,
            name: "Force 1".to_string(),
        };

        let mut buffer = vec![0u8; force.byte_len()];
        force.write(&mut BinaryWriter::new(&mut buffer)).unwrap();
        assert_eq!(
            Force::read(&mut BinaryReader::new(&buffer)).unwrap(),
            force
        );
    }
}
