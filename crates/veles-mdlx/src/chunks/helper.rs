//! Helper objects.

use veles_common::{BinaryReader, BinaryWriter};

use crate::tokens::{TokenReader, TokenWriter};
use crate::{Error, Result};

use super::Node;

/// One helper (`HELP` chunk record): a bare node used as a grouping or
/// animation target.
#[derive(Debug, Clone, PartialEq)]
pub struct Helper {
    pub node: Node,
}

impl Default for Helper {
    fn default() -> Self {
        Self {
            node: Node::with_flags(0),
        }
    }
}

impl Helper {
    /// Read one helper record.
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        Ok(Self {
            node: Node::read(reader)?,
        })
    }

    /// Write one helper record.
    pub fn write(&self, writer: &mut BinaryWriter<'_>) -> Result<()> {
        self.node.write(writer)
    }

    /// Exact serialized size.
    pub fn byte_len(&self) -> usize {
        self.node.byte_len()
    }

    /// Read the MDL `Helper "name" { ... }` form; the caller has consumed
    /// `Helper`.
    pub fn read_mdl(stream: &mut TokenReader<'_>) -> Result<Self> {
        const RECORD: &str = "Helper";

        let mut helper = Self::default();
        helper.node.name = stream.word(RECORD)?.to_string();

        stream.enter_block(RECORD)?;
        while let Some(key) = stream.block_key(RECORD)? {
            if !helper.node.read_mdl_token(key, stream, RECORD)? {
                return Err(Error::bad_token(key, RECORD));
            }
        }
        Ok(helper)
    }

    /// Write the MDL form.
    pub fn write_mdl(&self, writer: &mut TokenWriter) {
        writer.start_named_block("Helper", &self.node.name);
        self.node.write_mdl_header(writer);
        self.node.write_mdl_tracks(writer);
        writer.end_block();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let mut helper = Helper::default();
        helper.node.name = "Origin Ref".to_string();
        helper.node.object_id = 7;
        helper.node.parent_id = 0;

        let mut buffer = vec![0u8; helper.byte_len()];
        helper.write(&mut BinaryWriter::new(&mut buffer)).unwrap();
        let parsed = Helper::read(&mut BinaryReader::new(&buffer)).unwrap();
        assert_eq!(parsed, helper);

        let mut writer = TokenWriter::new();
        helper.write_mdl(&mut writer);
        let text = writer.finish();
        let mut stream = TokenReader::new(&text);
        assert_eq!(stream.next(), Some("Helper"));
        assert_eq!(Helper::read_mdl(&mut stream).unwrap(), helper);
    }
}
