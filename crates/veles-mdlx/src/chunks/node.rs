//! Generic scene object shared by node-backed records.

use veles_common::{BinaryReader, BinaryWriter};

use crate::tokens::{TokenReader, TokenWriter};
use crate::{Error, Result, NONE};

use super::Track;

/// The generic object prefix shared by bones, helpers, attachments, event
/// objects, and collision shapes: identity, hierarchy placement, behavior
/// flags, and the three transform tracks.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Display name, stored in an 80-byte field.
    pub name: String,
    pub object_id: u32,
    /// Parent object id, or [`NONE`] for roots.
    pub parent_id: u32,
    /// Behavior bits plus the object-kind bit set by the owning record.
    pub flags: u32,
    pub translation: Option<Track<[f32; 3]>>,
    pub rotation: Option<Track<[f32; 4]>>,
    pub scaling: Option<Track<[f32; 3]>>,
}

impl Node {
    pub const DONT_INHERIT_TRANSLATION: u32 = 0x1;
    pub const DONT_INHERIT_ROTATION: u32 = 0x2;
    pub const DONT_INHERIT_SCALING: u32 = 0x4;
    pub const BILLBOARDED: u32 = 0x8;
    pub const BILLBOARDED_LOCK_X: u32 = 0x10;
    pub const BILLBOARDED_LOCK_Y: u32 = 0x20;
    pub const BILLBOARDED_LOCK_Z: u32 = 0x40;
    pub const CAMERA_ANCHORED: u32 = 0x80;

    /// Create a node with the given object-kind flag bits.
    pub fn with_flags(flags: u32) -> Self {
        Self {
            name: String::new(),
            object_id: 0,
            parent_id: NONE,
            flags,
            translation: None,
            rotation: None,
            scaling: None,
        }
    }

    /// Read the node prefix, including its transform tracks. The declared
    /// inclusive size bounds the track scan.
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let start = reader.position();
        let inclusive_size = reader.read_u32()? as usize;

        let name = reader.read_string_block(80)?.to_string();
        let object_id = reader.read_u32()?;
        let parent_id = reader.read_u32()?;
        let flags = reader.read_u32()?;

        let mut translation = None;
        let mut rotation = None;
        let mut scaling = None;

        while reader.position() - start < inclusive_size {
            let tag = reader.read_tag()?;
            match &tag {
                b"KGTR" => translation = Some(Track::read(reader)?),
                b"KGRT" => rotation = Some(Track::read(reader)?),
                b"KGSC" => scaling = Some(Track::read(reader)?),
                _ => return Err(Error::unknown_tag(tag, "Node")),
            }
        }

        Ok(Self {
            name,
            object_id,
            parent_id,
            flags,
            translation,
            rotation,
            scaling,
        })
    }

    /// Write the node prefix and transform tracks.
    pub fn write(&self, writer: &mut BinaryWriter<'_>) -> Result<()> {
        writer.write_u32(self.byte_len() as u32)?;
        writer.write_string_block(&self.name, 80)?;
        writer.write_u32(self.object_id)?;
        writer.write_u32(self.parent_id)?;
        writer.write_u32(self.flags)?;

        if let Some(track) = &self.translation {
            track.write(writer, *b"KGTR")?;
        }
        if let Some(track) = &self.rotation {
            track.write(writer, *b"KGRT")?;
        }
        if let Some(track) = &self.scaling {
            track.write(writer, *b"KGSC")?;
        }

        Ok(())
    }

    /// Exact serialized size, inclusive-size field included.
    pub fn byte_len(&self) -> usize {
        let mut size = 96;
        if let Some(track) = &self.translation {
            size += track.byte_len();
        }
        if let Some(track) = &self.rotation {
            size += track.byte_len();
        }
        if let Some(track) = &self.scaling {
            size += track.byte_len();
        }
        size
    }

    /// Handle one MDL token shared by all node-backed records. Returns
    /// false for tokens the caller should dispatch itself.
    pub fn read_mdl_token(
        &mut self,
        token: &str,
        stream: &mut TokenReader<'_>,
        record: &'static str,
    ) -> Result<bool> {
        match token {
            "ObjectId" => self.object_id = stream.read_u32(record)?,
            "Parent" => self.parent_id = stream.read_u32(record)?,
            "Billboarded" => self.flags |= Self::BILLBOARDED,
            "BillboardedLockX" => self.flags |= Self::BILLBOARDED_LOCK_X,
            "BillboardedLockY" => self.flags |= Self::BILLBOARDED_LOCK_Y,
            "BillboardedLockZ" => self.flags |= Self::BILLBOARDED_LOCK_Z,
            "CameraAnchored" => self.flags |= Self::CAMERA_ANCHORED,
            "DontInherit" => {
                stream.enter_block(record)?;
                while let Some(key) = stream.block_key(record)? {
                    match key {
                        "Translation" => self.flags |= Self::DONT_INHERIT_TRANSLATION,
                        "Rotation" => self.flags |= Self::DONT_INHERIT_ROTATION,
                        "Scaling" => self.flags |= Self::DONT_INHERIT_SCALING,
                        other => return Err(Error::bad_token(other, record)),
                    }
                }
            }
            "Translation" => self.translation = Some(Track::read_mdl(stream, record)?),
            "Rotation" => self.rotation = Some(Track::read_mdl(stream, record)?),
            "Scaling" => self.scaling = Some(Track::read_mdl(stream, record)?),
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Write the MDL identity and flag lines (before record-specific fields).
    pub fn write_mdl_header(&self, writer: &mut TokenWriter) {
        writer.attrib("ObjectId", self.object_id);
        if self.parent_id != NONE {
            writer.attrib("Parent", self.parent_id);
        }

        let inherit = [
            (Self::DONT_INHERIT_TRANSLATION, "Translation"),
            (Self::DONT_INHERIT_ROTATION, "Rotation"),
            (Self::DONT_INHERIT_SCALING, "Scaling"),
        ];
        let inherited: Vec<&str> = inherit
            .iter()
            .filter(|(bit, _)| self.flags & bit != 0)
            .map(|&(_, name)| name)
            .collect();
        if !inherited.is_empty() {
            writer.line(&format!("DontInherit {{ {} }},", inherited.join(", ")));
        }

        if self.flags & Self::BILLBOARDED != 0 {
            writer.flag("Billboarded");
        }
        if self.flags & Self::BILLBOARDED_LOCK_X != 0 {
            writer.flag("BillboardedLockX");
        }
        if self.flags & Self::BILLBOARDED_LOCK_Y != 0 {
            writer.flag("BillboardedLockY");
        }
        if self.flags & Self::BILLBOARDED_LOCK_Z != 0 {
            writer.flag("BillboardedLockZ");
        }
        if self.flags & Self::CAMERA_ANCHORED != 0 {
            writer.flag("CameraAnchored");
        }
    }

    /// Write the MDL transform tracks (after record-specific fields).
    pub fn write_mdl_tracks(&self, writer: &mut TokenWriter) {
        if let Some(track) = &self.translation {
            track.write_mdl(writer, "Translation");
        }
        if let Some(track) = &self.rotation {
            track.write_mdl(writer, "Rotation");
        }
        if let Some(track) = &self.scaling {
            track.write_mdl(writer, "Scaling");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::{Interpolation, TrackKey};

    fn sample_node() -> Node {
        let mut node = Node::with_flags(0x100);
        node.name = "Bone_Turret".to_string();
        node.object_id = 3;
        node.parent_id = 1;
        node.flags |= Node::BILLBOARDED;
        node.translation = Some(Track {
            interpolation: Interpolation::Linear,
            global_sequence_id: NONE,
            keys: vec![TrackKey {
                frame: 0,
                value: [0.0, 1.0, 2.0],
                in_tan: [0.0; 3],
                out_tan: [0.0; 3],
            }],
        });
        node
    }

    #[test]
    fn test_binary_roundtrip() {
        let node = sample_node();
        let mut buffer = vec![0u8; node.byte_len()];
        node.write(&mut BinaryWriter::new(&mut buffer)).unwrap();

        let mut reader = BinaryReader::new(&buffer);
        let parsed = Node::read(&mut reader).unwrap();
        assert_eq!(parsed, node);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_tracks_absent_vs_empty() {
        let bare = Node::with_flags(0);
        assert_eq!(bare.byte_len(), 96);

        let mut with_empty = Node::with_flags(0);
        with_empty.scaling = Some(Track::default());
        assert_eq!(with_empty.byte_len(), 96 + 16);
    }

    #[test]
    fn test_unknown_track_tag() {
        let mut buffer = vec![0u8; 100];
        {
            let mut writer = BinaryWriter::new(&mut buffer);
            writer.write_u32(100).unwrap();
            writer.write_string_block("x", 80).unwrap();
            writer.write_u32(0).unwrap();
            writer.write_u32(NONE).unwrap();
            writer.write_u32(0).unwrap();
        }
        buffer[96..100].copy_from_slice(b"KXYZ");

        let err = Node::read(&mut BinaryReader::new(&buffer)).unwrap_err();
        assert!(err.to_string().contains("KXYZ"));
    }
}
