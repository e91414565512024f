//! Attachment points.

use veles_common::{BinaryReader, BinaryWriter};

use crate::tokens::{TokenReader, TokenWriter};
use crate::{Error, Result};

use super::{Node, Track};

/// One attachment point (`ATCH` chunk record): a node, an optional model
/// path, and an animated visibility.
///
/// Unlike most node-backed records, attachments wrap the node in an outer
/// inclusive size of their own, covering the path, id, and visibility track.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub node: Node,
    /// Attached model path, stored in a 260-byte field.
    pub path: String,
    pub attachment_id: u32,
    pub visibility: Option<Track<f32>>,
}

impl Default for Attachment {
    fn default() -> Self {
        Self {
            node: Node::with_flags(Self::KIND),
            path: String::new(),
            attachment_id: 0,
            visibility: None,
        }
    }
}

impl Attachment {
    /// Object-kind bit in node flags.
    pub const KIND: u32 = 0x800;

    /// Read one attachment record.
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let start = reader.position();
        let inclusive_size = reader.read_u32()? as usize;

        let mut attachment = Self {
            node: Node::read(reader)?,
            ..Self::default()
        };
        attachment.path = reader.read_string_block(260)?.to_string();
        attachment.attachment_id = reader.read_u32()?;

        while reader.position() - start < inclusive_size {
            let tag = reader.read_tag()?;
            match &tag {
                b"KATV" => attachment.visibility = Some(Track::read(reader)?),
                _ => return Err(Error::unknown_tag(tag, "Attachment")),
            }
        }

        Ok(attachment)
    }

    /// Write one attachment record.
    pub fn write(&self, writer: &mut BinaryWriter<'_>) -> Result<()> {
        writer.write_u32(self.byte_len() as u32)?;
        self.node.write(writer)?;
        writer.write_string_block(&self.path, 260)?;
        writer.write_u32(self.attachment_id)?;
        if let Some(track) = &self.visibility {
            track.write(writer, *b"KATV")?;
        }
        Ok(())
    }

    /// Exact serialized size, outer inclusive-size field included.
    pub fn byte_len(&self) -> usize {
        let mut size = 4 + self.node.byte_len() + 264;
        if let Some(track) = &self.visibility {
            size += track.byte_len();
        }
        size
    }

    /// Read the MDL `Attachment "name" { ... }` form; the caller has
    /// consumed `Attachment`.
    pub fn read_mdl(stream: &mut TokenReader<'_>) -> Result<Self> {
        const RECORD: &str = "Attachment";

        let mut attachment = Self::default();
        attachment.node.name = stream.word(RECORD)?.to_string();

        stream.enter_block(RECORD)?;
        while let Some(key) = stream.block_key(RECORD)? {
            if attachment.node.read_mdl_token(key, stream, RECORD)? {
                continue;
            }
            match key {
                "AttachmentID" => attachment.attachment_id = stream.read_u32(RECORD)?,
                "Path" => attachment.path = stream.word(RECORD)?.to_string(),
                "Visibility" => attachment.visibility = Some(Track::read_mdl(stream, RECORD)?),
                other => return Err(Error::bad_token(other, RECORD)),
            }
        }
        Ok(attachment)
    }

    /// Write the MDL form.
    pub fn write_mdl(&self, writer: &mut TokenWriter) {
        writer.start_named_block("Attachment", &self.node.name);
        self.node.write_mdl_header(writer);
        writer.attrib("AttachmentID", self.attachment_id);
        if !self.path.is_empty() {
            writer.quoted("Path", &self.path);
        }
        if let Some(track) = &self.visibility {
            track.write_mdl(writer, "Visibility");
        }
        self.node.write_mdl_tracks(writer);
        writer.end_block();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::{Interpolation, TrackKey};
    use crate::NONE;

    #[test]
    fn test_binary_roundtrip() {
        let mut attachment = Attachment::default();
        attachment.node.name = "Overhead Ref".to_string();
        attachment.attachment_id = 3;
        attachment.path = "Models\\Effect.mdx".to_string();
        attachment.visibility = Some(Track {
            interpolation: Interpolation::None,
            global_sequence_id: NONE,
            keys: vec![TrackKey {
                frame: 0,
                value: 1.0,
                ..Default::default()
            }],
        });

        let mut buffer = vec![0u8; attachment.byte_len()];
        attachment.write(&mut BinaryWriter::new(&mut buffer)).unwrap();

        let mut reader = BinaryReader::new(&buffer);
        let parsed = Attachment::read(&mut reader).unwrap();
        assert_eq!(parsed, attachment);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_mdl_roundtrip() {
        let mut attachment = Attachment::default();
        attachment.node.name = "Hand Left Ref".to_string();
        attachment.node.object_id = 12;
        attachment.attachment_id = 1;

        let mut writer = TokenWriter::new();
        attachment.write_mdl(&mut writer);
        let text = writer.finish();

        let mut stream = TokenReader::new(&text);
        assert_eq!(stream.next(), Some("Attachment"));
        assert_eq!(Attachment::read_mdl(&mut stream).unwrap(), attachment);
    }
}
