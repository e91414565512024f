//! Event objects (sound and spawn triggers keyed to animation frames).

use veles_common::{BinaryReader, BinaryWriter};

use crate::tokens::{TokenReader, TokenWriter};
use crate::{Error, Result, NONE};

use super::Node;

/// One event object (`EVTS` chunk record): a node followed by a `KEVT`
/// sub-chunk listing the frames the event fires on.
#[derive(Debug, Clone, PartialEq)]
pub struct EventObject {
    pub node: Node,
    /// Global sequence driving the frames, or [`NONE`].
    pub global_sequence_id: u32,
    pub frames: Vec<i32>,
}

impl Default for EventObject {
    fn default() -> Self {
        Self {
            node: Node::with_flags(Self::KIND),
            global_sequence_id: NONE,
            frames: Vec::new(),
        }
    }
}

impl EventObject {
    /// Object-kind bit in node flags.
    pub const KIND: u32 = 0x400;

    /// Read one event object record.
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let node = Node::read(reader)?;

        let tag = reader.read_tag()?;
        if &tag != b"KEVT" {
            return Err(Error::unknown_tag(tag, "EventObject"));
        }
        let count = reader.read_u32()? as usize;
        let global_sequence_id = reader.read_u32()?;
        let frames = reader.read_i32_array(count)?;

        Ok(Self {
            node,
            global_sequence_id,
            frames,
        })
    }

    /// Write one event object record. The `KEVT` sub-chunk is emitted even
    /// when the frame list is empty.
    pub fn write(&self, writer: &mut BinaryWriter<'_>) -> Result<()> {
        self.node.write(writer)?;
        writer.write_tag(*b"KEVT")?;
        writer.write_u32(self.frames.len() as u32)?;
        writer.write_u32(self.global_sequence_id)?;
        writer.write_i32_array(&self.frames)?;
        Ok(())
    }

    /// Exact serialized size.
    pub fn byte_len(&self) -> usize {
        self.node.byte_len() + 12 + 4 * self.frames.len()
    }

    /// Read the MDL `EventObject "name" { ... }` form; the caller has
    /// consumed `EventObject`.
    pub fn read_mdl(stream: &mut TokenReader<'_>) -> Result<Self> {
        const RECORD: &str = "EventObject";

        let mut event = Self::default();
        event.node.name = stream.word(RECORD)?.to_string();

        stream.enter_block(RECORD)?;
        while let Some(key) = stream.block_key(RECORD)? {
            if event.node.read_mdl_token(key, stream, RECORD)? {
                continue;
            }
            match key {
                "EventTrack" => {
                    let count = stream.read_u32(RECORD)? as usize;
                    stream.enter_block(RECORD)?;
                    for _ in 0..count {
                        event.frames.push(stream.read_i32(RECORD)?);
                    }
                    stream.expect("}", RECORD)?;
                }
                "GlobalSeqId" => event.global_sequence_id = stream.read_u32(RECORD)?,
                other => return Err(Error::bad_token(other, RECORD)),
            }
        }
        Ok(event)
    }

    /// Write the MDL form.
    pub fn write_mdl(&self, writer: &mut TokenWriter) {
        writer.start_named_block("EventObject", &self.node.name);
        self.node.write_mdl_header(writer);
        writer.start_counted_block("EventTrack", self.frames.len());
        for frame in &self.frames {
            writer.line(&format!("{frame},"));
        }
        writer.end_block();
        if self.global_sequence_id != NONE {
            writer.attrib("GlobalSeqId", self.global_sequence_id);
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
        let mut event = EventObject::default();
        event.node.name = "SNDxHIT1".to_string();
        event.node.object_id = 7;
        event.frames = vec![533, 1266, 2100];

        let mut buffer = vec![0u8; event.byte_len()];
        event.write(&mut BinaryWriter::new(&mut buffer)).unwrap();

        let mut reader = BinaryReader::new(&buffer);
        let parsed = EventObject::read(&mut reader).unwrap();
        assert_eq!(parsed, event);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_empty_track_still_carries_kevt() {
        let event = EventObject::default();
        // node + tag + count + global sequence id
        assert_eq!(event.byte_len(), event.node.byte_len() + 12);

        let mut buffer = vec![0u8; event.byte_len()];
        event.write(&mut BinaryWriter::new(&mut buffer)).unwrap();
        let parsed = EventObject::read(&mut BinaryReader::new(&buffer)).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_mdl_roundtrip() {
        let mut event = EventObject::default();
        event.node.name = "FPTxDUST".to_string();
        event.frames = vec![100];
        event.global_sequence_id = 2;

        let mut writer = TokenWriter::new();
        event.write_mdl(&mut writer);
        let text = writer.finish();

        let mut stream = TokenReader::new(&text);
        assert_eq!(stream.next(), Some("EventObject"));
        assert_eq!(EventObject::read_mdl(&mut stream).unwrap(), event);
    }
}
