//! Bones.

use veles_common::{BinaryReader, BinaryWriter};

use crate::tokens::{TokenReader, TokenWriter};
use crate::{Error, Result, NONE};

use super::Node;

/// One bone (`BONE` chunk record): a node plus geoset bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub node: Node,
    /// Bound geoset index, or [`NONE`] for multiple.
    pub geoset_id: u32,
    /// Bound geoset animation index, or [`NONE`].
    pub geoset_animation_id: u32,
}

impl Default for Bone {
    fn default() -> Self {
        Self {
            node: Node::with_flags(Self::KIND),
            geoset_id: NONE,
            geoset_animation_id: NONE,
        }
    }
}

impl Bone {
    /// Object-kind bit in node flags.
    pub const KIND: u32 = 0x100;

    /// Read one bone record.
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        Ok(Self {
            node: Node::read(reader)?,
            geoset_id: reader.read_u32()?,
            geoset_animation_id: reader.read_u32()?,
        })
    }

    /// Write one bone record.
    pub fn write(&self, writer: &mut BinaryWriter<'_>) -> Result<()> {
        self.node.write(writer)?;
        writer.write_u32(self.geoset_id)?;
        writer.write_u32(self.geoset_animation_id)?;
        Ok(())
    }

    /// Exact serialized size.
    pub fn byte_len(&self) -> usize {
        self.node.byte_len() + 8
    }

    /// Read the MDL `Bone "name" { ... }` form; the caller has consumed
    /// `Bone`.
    pub fn read_mdl(stream: &mut TokenReader<'_>) -> Result<Self> {
        const RECORD: &str = "Bone";

        let mut bone = Self::default();
        bone.node.name = stream.word(RECORD)?.to_string();

        stream.enter_block(RECORD)?;
        while let Some(key) = stream.block_key(RECORD)? {
            if bone.node.read_mdl_token(key, stream, RECORD)? {
                continue;
            }
            match key {
                "GeosetId" => {
                    let word = stream.word(RECORD)?;
                    bone.geoset_id = if word == "Multiple" {
                        NONE
                    } else {
                        word.parse().map_err(|_| Error::bad_token(word, RECORD))?
                    };
                }
                "GeosetAnimId" => {
                    let word = stream.word(RECORD)?;
                    bone.geoset_animation_id = if word == "None" {
                        NONE
                    } else {
                        word.parse().map_err(|_| Error::bad_token(word, RECORD))?
                    };
                }
                other => return Err(Error::bad_token(other, RECORD)),
            }
        }
        Ok(bone)
    }

    /// Write the MDL form.
    pub fn write_mdl(&self, writer: &mut TokenWriter) {
        writer.start_named_block("Bone", &self.node.name);
        self.node.write_mdl_header(writer);
        if self.geoset_id == NONE {
            writer.attrib("GeosetId", "Multiple");
        } else {
            writer.attrib("GeosetId", self.geoset_id);
        }
        if self.geoset_animation_id == NONE {
            writer.attrib("GeosetAnimId", "None");
        } else {
            writer.attrib("GeosetAnimId", self.geoset_animation_id);
        }
        self.node.write_mdl_tracks(writer);
        writer.end_block();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_roundtrip() {
        let mut bone = Bone::default();
        bone.node.name = "Bone_Head".to_string();
        bone.node.object_id = 4;
        bone.geoset_id = 1;

        let mut buffer = vec![0u8; bone.byte_len()];
        bone.write(&mut BinaryWriter::new(&mut buffer)).unwrap();

        let parsed = Bone::read(&mut BinaryReader::new(&buffer)).unwrap();
        assert_eq!(parsed, bone);
    }

    #[test]
    fn test_mdl_sentinels() {
        let bone = Bone::default();
        let mut writer = TokenWriter::new();
        bone.write_mdl(&mut writer);
        let text = writer.finish();
        assert!(text.contains("GeosetId Multiple,"));
        assert!(text.contains("GeosetAnimId None,"));

        let mut stream = TokenReader::new(&text);
        assert_eq!(stream.next(), Some("Bone"));
        let parsed = Bone::read_mdl(&mut stream).unwrap();
        assert_eq!(parsed, bone);
    }
}
