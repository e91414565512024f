//! Random unit and item tables.

use veles_common::{BinaryReader, BinaryWriter};

use crate::Result;

use super::cstring_len;

/// One row of a random unit table: a chance and one four-character id per
/// position column (`\0\0\0\0` meaning an empty cell).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RandomUnitGroup {
    /// Weight as a percentage chance.
    pub chance: u32,
    pub ids: Vec<[u8; 4]>,
}

/// A random unit table: named, with typed position columns (0 = unit,
/// 1 = building, 2 = item) and weighted rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RandomUnitTable {
    pub id: u32,
    pub name: String,
    pub position_types: Vec<u32>,
    pub groups: Vec<RandomUnitGroup>,
}

impl RandomUnitTable {
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let id = reader.read_u32()?;
        let name = reader.read_cstring()?.to_string();

        let position_count = reader.read_u32()? as usize;
        let position_types = reader.read_u32_array(position_count)?;

        let group_count = reader.read_u32()? as usize;
        let mut groups = Vec::with_capacity(group_count);
        for _ in 0..group_count {
            let chance = reader.read_u32()?;
            let mut ids = Vec::with_capacity(position_count);
            for _ in 0..position_count {
                ids.push(reader.read_tag()?);
            }
            groups.push(RandomUnitGroup { chance, ids });
        }

        Ok(Self {
            id,
            name,
            position_types,
            groups,
        })
    }

    pub fn write(&self, writer: &mut BinaryWriter<'_>) -> Result<()> {
        writer.write_u32(self.id)?;
        writer.write_cstring(&self.name)?;
        writer.write_u32(self.position_types.len() as u32)?;
        writer.write_u32_array(&self.position_types)?;
        writer.write_u32(self.groups.len() as u32)?;
        for group in &self.groups {
            writer.write_u32(group.chance)?;
            for id in &group.ids {
                writer.write_tag(*id)?;
            }
        }
        Ok(())
    }

    pub fn byte_len(&self) -> usize {
        12 + cstring_len(&self.name)
            + self.position_types.len() * 4
            + self
                .groups
                .iter()
                .map(|g| 4 + g.ids.len() * 4)
                .sum::<usize>()
    }
}

/// One set within a random item table: weighted item ids.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RandomItemSet {
    /// (chance, item id) pairs.
    pub items: Vec<(u32, [u8; 4])>,
}

/// A random item table, present from format version 25 on.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RandomItemTable {
    pub id: u32,
    pub name: String,
    pub sets: Vec<RandomItemSet>,
}

impl RandomItemTable {
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let id = reader.read_u32()?;
        let name = reader.read_cstring()?.to_string();

        let set_count = reader.read_u32()? as usize;
        let mut sets = Vec::with_capacity(set_count);
        for _ in 0..set_count {
            let item_count = reader.read_u32()? as usize;
            let mut items = Vec::with_capacity(item_count);
            for _ in 0..item_count {
                let chance = reader.read_u32()?;
                let item = reader.read_tag()?;
                items.push((chance, item));
            }
            sets.push(RandomItemSet { items });
        }

        Ok(Self { id, name, sets })
    }

    pub fn write(&self, writer: &mut BinaryWriter<'_>) -> Result<()> {
        writer.write_u32(self.id)?;
        writer.write_cstring(&self.name)?;
        writer.write_u32(self.sets.len() as u32)?;
        for set in &self.sets {
            writer.write_u32(set.items.len() as u32)?;
            for &(chance, item) in &set.items {
                writer.write_u32(chance)?;
                writer.write_tag(item)?;
            }
        }
        Ok(())
    }

    pub fn byte_len(&self) -> usize {
        8 + cstring_len(&self.name)
            + self
                .sets
                .iter()
                .map(|s| 4 + s.items.len() * 8)
                .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_table_roundtrip() {
        let table = RandomUnitTable {
            id: 0,
            name: "Creep Camp".to_string(),
            position_types: vec![0, 0],
            groups: vec![
                RandomUnitGroup {
                    chance: 60,
                    ids: vec![*b"ngno", *b"ngnb"],
                },
                RandomUnitGroup {
                    chance: 40,
                    ids: vec![*b"ngnw", *b"\0\0\0\0"],
                },
            ],
        };

        let mut buffer = vec![0u8; table.byte_len()];
        table.write(&mut BinaryWriter::new(&mut buffer)).unwrap();

        let mut reader = BinaryReader::new(&buffer);
        assert_eq!(RandomUnitTable::read(&mut reader).unwrap(), table);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_item_table_roundtrip() {
        let table = RandomItemTable {
            id: 1,
            name: "Boss Drops".to_string(),
            sets: vec![RandomItemSet {
                items: vec![(75, *b"ratc"), (25, *b"ratf")],
            }],
        };

        let mut buffer = vec![0u8; table.byte_len()];
        table.write(&mut BinaryWriter::new(&mut buffer)).unwrap();
        assert_eq!(
            RandomItemTable::read(&mut BinaryReader::new(&buffer)).unwrap(),
            table
        );
    }
}
