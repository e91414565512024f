//! Player slot records.

use veles_common::{BinaryReader, BinaryWriter};

use crate::Result;

use super::cstring_len;

/// One player slot definition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Player {
    pub id: u32,
    /// 1 = human, 2 = computer, 3 = neutral, 4 = rescuable.
    pub controller: u32,
    /// 1 = human, 2 = orc, 3 = undead, 4 = night elf.
    pub race: u32,
    pub fixed_start_position: u32,
    pub name: String,
    pub start_x: f32,
    pub start_y: f32,
    /// Bit mask of player slots with forced low ally priority.
    pub ally_low_priorities: u32,
    /// Bit mask of player slots with forced high ally priority.
    pub ally_high_priorities: u32,
}

impl Player {
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        Ok(Self {
            id: reader.read_u32()?,
            controller: reader.read_u32()?,
            race: reader.read_u32()?,
            fixed_start_position: reader.read_u32()?,
            name: reader.read_cstring()?.to_string(),
            start_x: reader.read_f32()?,
            start_y: reader.read_f32()?,
            ally_low_priorities: reader.read_u32()?,
            ally_high_priorities: reader.read_u32()?,
        })
    }

    pub fn write(&self, writer: &mut BinaryWriter<'_>) -> Result<()> {
        writer.write_u32(self.id)?;
        writer.write_u32(self.controller)?;
        writer.write_u32(self.race)?;
        writer.write_u32(self.fixed_start_position)?;
        writer.write_cstring(&self.name)?;
        writer.write_f32(self.start_x)?;
        writer.write_f32(self.start_y)?;
        writer.write_u32(self.ally_low_priorities)?;
        writer.write_u32(self.ally_high_priorities)?;
        Ok(())
    }

    pub fn byte_len(&self) -> usize {
        32 + cstring_len(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let player = Player {
            id: 0,
            controller: 1,
            race: 2,
            fixed_start_position: 1,
            name: "Player 1".to_string(),
            start_x: -1024.0,
            start_y: 512.0,
            ally_low_priorities: 0b10,
            ally_high_priorities: 0,
        };

        let mut buffer = vec![0u8; player.byte_len()];
        player.write(&mut BinaryWriter::new(&mut buffer)).unwrap();

        let mut reader = BinaryReader::new(&buffer);
        assert_eq!(Player::read(&mut reader).unwrap(), player);
        assert!(reader.is_empty());
    }
}
