//! Upgrade and tech availability overrides.

use veles_common::{BinaryReader, BinaryWriter};

use crate::Result;

/// One upgrade availability change: which players, which upgrade, which
/// level, and whether it is available, unavailable, or pre-researched.
#[derive(Debug, Clone, PartialEq)]
pub struct UpgradeAvailability {
    /// Bit mask of affected player slots.
    pub player_mask: u32,
    /// Four-character upgrade id, e.g. `Rhme`.
    pub id: [u8; 4],
    pub level: u32,
    /// 0 = unavailable, 1 = available, 2 = researched.
    pub availability: u32,
}

impl UpgradeAvailability {
    /// Serialized size.
    pub const BYTE_LEN: usize = 16;

    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        Ok(Self {
            player_mask: reader.read_u32()?,
            id: reader.read_tag()?,
            level: reader.read_u32()?,
            availability: reader.read_u32()?,
        })
    }

    pub fn write(&self, writer: &mut BinaryWriter<'_>) -> Result<()> {
        writer.write_u32(self.player_mask)?;
        writer.write_tag(self.id)?;
        writer.write_u32(self.level)?;
        writer.write_u32(self.availability)?;
        Ok(())
    }
}

/// One tech availability change: the named tech is unavailable to the
/// masked players.
#[derive(Debug, Clone, PartialEq)]
pub struct TechAvailability {
    /// Bit mask of affected player slots.
    pub player_mask: u32,
    /// Four-character tech id, e.g. `hkee`.
    pub id: [u8; 4],
}

impl TechAvailability {
    /// Serialized size.
    pub const BYTE_LEN: usize = 8;

    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        Ok(Self {
            player_mask: reader.read_u32()?,
            id: reader.read_tag()?,
        })
    }

    pub fn write(&self, writer: &mut BinaryWriter<'_>) -> Result<()> {
        writer.write_u32(self.player_mask)?;
        writer.write_tag(self.id)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upgrade_roundtrip() {
        let upgrade = UpgradeAvailability {
            player_mask: 0xFF,
            id: *b"Rhme",
            level: 2,
            availability: 1,
        };

        let mut buffer = [0u8; UpgradeAvailability::BYTE_LEN];
        upgrade.write(&mut BinaryWriter::new(&mut buffer)).unwrap();
        assert_eq!(
            UpgradeAvailability::read(&mut BinaryReader::new(&buffer)).unwrap(),
            upgrade
        );
    }

    #[test]
    fn test_tech_roundtrip() {
        let tech = TechAvailability {
            player_mask: 0b11,
            id: *b"hkee",
        };

        let mut buffer = [0u8; TechAvailability::BYTE_LEN];
        tech.write(&mut BinaryWriter::new(&mut buffer)).unwrap();
        assert_eq!(
            TechAvailability::read(&mut BinaryReader::new(&buffer)).unwrap(),
            tech
        );
    }
}
