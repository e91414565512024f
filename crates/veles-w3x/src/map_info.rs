//! The war3map.w3i map info record.

use veles_common::{BinaryReader, BinaryWriter};

use crate::parts::{
    cstring_len, Force, Player, RandomItemTable, RandomUnitTable, TechAvailability,
    UpgradeAvailability,
};
use crate::{Error, Result};

/// Reign of Chaos map info format.
pub const VERSION_ROC: u32 = 18;
/// The Frozen Throne map info format.
pub const VERSION_TFT: u32 = 25;

/// Parsed war3map.w3i contents.
///
/// Two layouts share this type: version 18 (Reign of Chaos) and version 25
/// (The Frozen Throne). Fields only one version stores keep their `Default`
/// value in the other and are neither read, written, nor counted there.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapInfo {
    /// Format version; [`VERSION_ROC`] or [`VERSION_TFT`].
    pub version: u32,
    /// Number of saves; bumped by the world editor on each save.
    pub map_version: u32,
    pub editor_version: u32,
    pub name: String,
    pub author: String,
    pub description: String,
    pub recommended_players: String,
    pub camera_bounds: [f32; 8],
    pub camera_bounds_complements: [i32; 4],
    pub playable_width: u32,
    pub playable_height: u32,
    pub flags: u32,
    /// Main tileset id character, e.g. `b'L'` for Lordaeron Summer.
    pub tileset: u8,
    /// Campaign background number; the loading screen background in v25.
    pub campaign_background: u32,
    /// v25 only: custom loading screen model path.
    pub loading_screen_model: String,
    pub loading_screen_text: String,
    pub loading_screen_title: String,
    pub loading_screen_subtitle: String,
    /// v18 only: built-in loading screen number.
    pub loading_screen_number: u32,
    /// v25 only: game data set (0 = default, 1 = custom, 2 = melee).
    pub game_data_set: u32,
    /// v25 only: custom prologue screen model path.
    pub prologue_model: String,
    pub prologue_text: String,
    pub prologue_title: String,
    pub prologue_subtitle: String,
    /// v25 only: terrain fog.
    pub fog_style: u32,
    pub fog_start_z: f32,
    pub fog_end_z: f32,
    pub fog_density: f32,
    pub fog_color: [u8; 4],
    /// v25 only: global weather effect id, 0 for none.
    pub global_weather: u32,
    /// v25 only: custom sound environment.
    pub sound_environment: String,
    /// v25 only: tileset id driving the light environment.
    pub light_environment_tileset: u8,
    /// v25 only: water tinting color.
    pub water_color: [u8; 4],
    pub players: Vec<Player>,
    pub forces: Vec<Force>,
    pub upgrade_availabilities: Vec<UpgradeAvailability>,
    pub tech_availabilities: Vec<TechAvailability>,
    pub random_unit_tables: Vec<RandomUnitTable>,
    /// v25 only.
    pub random_item_tables: Vec<RandomItemTable>,
}

impl MapInfo {
    /// Map flag: hide minimap in preview screens.
    pub const FLAG_HIDE_MINIMAP: u32 = 0x0001;
    /// Map flag: melee map.
    pub const FLAG_MELEE: u32 = 0x0004;
    /// Map flag: masked areas are partially visible.
    pub const FLAG_MASKED_PARTIALLY_VISIBLE: u32 = 0x0010;
    /// Map flag: custom forces.
    pub const FLAG_CUSTOM_FORCES: u32 = 0x0040;

    /// Parse a war3map.w3i buffer.
    pub fn read(data: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(data);
        let version = reader.read_u32()?;
        if version != VERSION_ROC && version != VERSION_TFT {
            return Err(Error::UnsupportedVersion(version));
        }

        let mut info = Self {
            version,
            map_version: reader.read_u32()?,
            editor_version: reader.read_u32()?,
            name: reader.read_cstring()?.to_string(),
            author: reader.read_cstring()?.to_string(),
            description: reader.read_cstring()?.to_string(),
            recommended_players: reader.read_cstring()?.to_string(),
            ..Self::default()
        };

        let bounds = reader.read_f32_array(8)?;
        info.camera_bounds.copy_from_slice(&bounds);
        let complements = reader.read_i32_array(4)?;
        info.camera_bounds_complements.copy_from_slice(&complements);
        info.playable_width = reader.read_u32()?;
        info.playable_height = reader.read_u32()?;
        info.flags = reader.read_u32()?;
        info.tileset = reader.read_u8()?;

        info.campaign_background = reader.read_u32()?;
        if version >= VERSION_TFT {
            info.loading_screen_model = reader.read_cstring()?.to_string();
        }
        info.loading_screen_text = reader.read_cstring()?.to_string();
        info.loading_screen_title = reader.read_cstring()?.to_string();
        info.loading_screen_subtitle = reader.read_cstring()?.to_string();

        if version >= VERSION_TFT {
            info.game_data_set = reader.read_u32()?;
            info.prologue_model = reader.read_cstring()?.to_string();
        } else {
            info.loading_screen_number = reader.read_u32()?;
        }
        info.prologue_text = reader.read_cstring()?.to_string();
        info.prologue_title = reader.read_cstring()?.to_string();
        info.prologue_subtitle = reader.read_cstring()?.to_string();

        if version >= VERSION_TFT {
            info.fog_style = reader.read_u32()?;
            info.fog_start_z = reader.read_f32()?;
            info.fog_end_z = reader.read_f32()?;
            info.fog_density = reader.read_f32()?;
            info.fog_color = reader.read_tag()?;
            info.global_weather = reader.read_u32()?;
            info.sound_environment = reader.read_cstring()?.to_string();
            info.light_environment_tileset = reader.read_u8()?;
            info.water_color = reader.read_tag()?;
        }

        let count = reader.read_u32()? as usize;
        for _ in 0..count {
            info.players.push(Player::read(&mut reader)?);
        }
        let count = reader.read_u32()? as usize;
        for _ in 0..count {
            info.forces.push(Force::read(&mut reader)?);
        }
        let count = reader.read_u32()? as usize;
        for _ in 0..count {
            info.upgrade_availabilities
                .push(UpgradeAvailability::read(&mut reader)?);
        }
        let count = reader.read_u32()? as usize;
        for _ in 0..count {
            info.tech_availabilities
                .push(TechAvailability::read(&mut reader)?);
        }
        let count = reader.read_u32()? as usize;
        for _ in 0..count {
            info.random_unit_tables
                .push(RandomUnitTable::read(&mut reader)?);
        }
        if version >= VERSION_TFT {
            let count = reader.read_u32()? as usize;
            for _ in 0..count {
                info.random_item_tables
                    .push(RandomItemTable::read(&mut reader)?);
            }
        }

        Ok(info)
    }

    /// Serialize to a war3map.w3i buffer in this record's version.
    pub fn write(&self) -> Result<Vec<u8>> {
        if self.version != VERSION_ROC && self.version != VERSION_TFT {
            return Err(Error::UnsupportedVersion(self.version));
        }
        let tft = self.version >= VERSION_TFT;

        let mut data = vec![0u8; self.byte_len()];
        let mut writer = BinaryWriter::new(&mut data);

        writer.write_u32(self.version)?;
        writer.write_u32(self.map_version)?;
        writer.write_u32(self.editor_version)?;
        writer.write_cstring(&self.name)?;
        writer.write_cstring(&self.author)?;
        writer.write_cstring(&self.description)?;
        writer.write_cstring(&self.recommended_players)?;
        writer.write_f32_array(&self.camera_bounds)?;
        writer.write_i32_array(&self.camera_bounds_complements)?;
        writer.write_u32(self.playable_width)?;
        writer.write_u32(self.playable_height)?;
        writer.write_u32(self.flags)?;
        writer.write_u8(self.tileset)?;

        writer.write_u32(self.campaign_background)?;
        if tft {
            writer.write_cstring(&self.loading_screen_model)?;
        }
        writer.write_cstring(&self.loading_screen_text)?;
        writer.write_cstring(&self.loading_screen_title)?;
        writer.write_cstring(&self.loading_screen_subtitle)?;

        if tft {
            writer.write_u32(self.game_data_set)?;
            writer.write_cstring(&self.prologue_model)?;
        } else {
            writer.write_u32(self.loading_screen_number)?;
        }
        writer.write_cstring(&self.prologue_text)?;
        writer.write_cstring(&self.prologue_title)?;
        writer.write_cstring(&self.prologue_subtitle)?;

        if tft {
            writer.write_u32(self.fog_style)?;
            writer.write_f32(self.fog_start_z)?;
            writer.write_f32(self.fog_end_z)?;
            writer.write_f32(self.fog_density)?;
            writer.write_tag(self.fog_color)?;
            writer.write_u32(self.global_weather)?;
            writer.write_cstring(&self.sound_environment)?;
            writer.write_u8(self.light_environment_tileset)?;
            writer.write_tag(self.water_color)?;
        }

        writer.write_u32(self.players.len() as u32)?;
        for player in &self.players {
            player.write(&mut writer)?;
        }
        writer.write_u32(self.forces.len() as u32)?;
        for force in &self.forces {
            force.write(&mut writer)?;
        }
        writer.write_u32(self.upgrade_availabilities.len() as u32)?;
        for upgrade in &self.upgrade_availabilities {
            upgrade.write(&mut writer)?;
        }
        writer.write_u32(self.tech_availabilities.len() as u32)?;
        for tech in &self.tech_availabilities {
            tech.write(&mut writer)?;
        }
        writer.write_u32(self.random_unit_tables.len() as u32)?;
        for table in &self.random_unit_tables {
            table.write(&mut writer)?;
        }
        if tft {
            writer.write_u32(self.random_item_tables.len() as u32)?;
            for table in &self.random_item_tables {
                table.write(&mut writer)?;
            }
        }

        debug_assert_eq!(writer.remaining(), 0);
        Ok(data)
    }

    /// Exact serialized size for this record's version.
    pub fn byte_len(&self) -> usize {
        let tft = self.version >= VERSION_TFT;

        let mut size = 12
            + cstring_len(&self.name)
            + cstring_len(&self.author)
            + cstring_len(&self.description)
            + cstring_len(&self.recommended_players)
            + 32
            + 16
            + 13;

        // Loading screen and prologue arm.
        size += 4
            + cstring_len(&self.loading_screen_text)
            + cstring_len(&self.loading_screen_title)
            + cstring_len(&self.loading_screen_subtitle)
            + 4
            + cstring_len(&self.prologue_text)
            + cstring_len(&self.prologue_title)
            + cstring_len(&self.prologue_subtitle);
        if tft {
            size += cstring_len(&self.loading_screen_model) + cstring_len(&self.prologue_model);
            // Fog, weather, sound and light environment, water color.
            size += 20 + 4 + cstring_len(&self.sound_environment) + 1 + 4;
        }

        size += 4 + self.players.iter().map(Player::byte_len).sum::<usize>();
        size += 4 + self.forces.iter().map(Force::byte_len).sum::<usize>();
        size += 4 + self.upgrade_availabilities.len() * UpgradeAvailability::BYTE_LEN;
        size += 4 + self.tech_availabilities.len() * TechAvailability::BYTE_LEN;
        size += 4
            + self
                .random_unit_tables
                .iter()
                .map(RandomUnitTable::byte_len)
                .sum::<usize>();
        if tft {
            size += 4
                + self
                    .random_item_tables
                    .iter()
                    .map(RandomItemTable::byte_len)
                    .sum::<usize>();
        }
        size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parts::RandomItemSet;

    fn base_info(version: u32) -> MapInfo {
        MapInfo {
            version,
            map_version: 12,
            editor_version: 6059,
            name: "Plunder Isle".to_string(),
            author: "Blizzard Entertainment".to_string(),
            description: "A pirate-infested island.".to_string(),
            recommended_players: "1v1".to_string(),
            camera_bounds: [-3072.0, -3328.0, 3072.0, 3072.0, -3072.0, 3072.0, 3072.0, -3328.0],
            camera_bounds_complements: [6, 6, 4, 8],
            playable_width: 52,
            playable_height: 52,
            flags: MapInfo::FLAG_MELEE,
            tileset: b'L',
            players: vec![Player {
                id: 0,
                controller: 1,
                race: 1,
                name: "Player 1".to_string(),
                ..Player::default()
            }],
            forces: vec![Force {
                flags: 0,
                player_mask: 0xFFFF_FFFF,
                name: "Force 1".to_string(),
            }],
            ..MapInfo::default()
        }
    }

    #[test]
    fn test_roc_roundtrip() {
        let mut info = base_info(VERSION_ROC);
        info.loading_screen_number = 3;
        info.loading_screen_title = "Loading".to_string();

        let data = info.write().unwrap();
        assert_eq!(data.len(), info.byte_len());
        assert_eq!(MapInfo::read(&data).unwrap(), info);
    }

    #[test]
    fn test_tft_roundtrip() {
        let mut info = base_info(VERSION_TFT);
        info.loading_screen_model = "LoadingScreen.mdx".to_string();
        info.game_data_set = 0;
        info.fog_style = 0;
        info.fog_end_z = 5000.0;
        info.fog_density = 0.5;
        info.fog_color = [255, 255, 255, 255];
        info.sound_environment = "Default".to_string();
        info.light_environment_tileset = b'L';
        info.water_color = [255, 255, 255, 255];
        info.tech_availabilities.push(TechAvailability {
            player_mask: 1,
            id: *b"hgtw",
        });
        info.random_item_tables.push(RandomItemTable {
            id: 0,
            name: "Drops".to_string(),
            sets: vec![RandomItemSet {
                items: vec![(100, *b"ratc")],
            }],
        });

        let data = info.write().unwrap();
        assert_eq!(data.len(), info.byte_len());
        assert_eq!(MapInfo::read(&data).unwrap(), info);
    }

    #[test]
    fn test_version_gated_fields_stay_default() {
        let mut info = base_info(VERSION_ROC);
        // Set a TFT-only field; v18 serialization must not carry it.
        info.sound_environment = "Dungeon".to_string();

        let data = info.write().unwrap();
        let parsed = MapInfo::read(&data).unwrap();
        assert_eq!(parsed.sound_environment, "");
    }

    #[test]
    fn test_unknown_version() {
        let mut data = base_info(VERSION_ROC).write().unwrap();
        data[0] = 31;
        assert!(matches!(
            MapInfo::read(&data),
            Err(Error::UnsupportedVersion(31))
        ));
    }
}
