//! Bounding extents.

use veles_common::{BinaryReader, BinaryWriter};

use crate::tokens::{TokenReader, TokenWriter};
use crate::Result;

/// A bounding sphere radius plus an axis-aligned bounding box.
///
/// Appears in the model header, in every sequence, and per geoset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Extent {
    pub bounds_radius: f32,
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Extent {
    /// Serialized size: radius + two corners.
    pub const BYTE_LEN: usize = 28;

    /// Read an extent in format order.
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        Ok(Self {
            bounds_radius: reader.read_f32()?,
            min: reader.read_f32_3()?,
            max: reader.read_f32_3()?,
        })
    }

    /// Write an extent in format order.
    pub fn write(&self, writer: &mut BinaryWriter<'_>) -> Result<()> {
        writer.write_f32(self.bounds_radius)?;
        writer.write_f32_array(&self.min)?;
        writer.write_f32_array(&self.max)?;
        Ok(())
    }

    /// Handle one of the three MDL extent tokens. Returns false for
    /// unrelated tokens so callers can continue their own dispatch.
    pub fn read_mdl_token(
        &mut self,
        token: &str,
        stream: &mut TokenReader<'_>,
        record: &'static str,
    ) -> Result<bool> {
        match token {
            "BoundsRadius" => self.bounds_radius = stream.read_f32(record)?,
            "MinimumExtent" => stream.read_f32_block(&mut self.min, record)?,
            "MaximumExtent" => stream.read_f32_block(&mut self.max, record)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Write the MDL extent lines, omitting all-zero components.
    pub fn write_mdl(&self, writer: &mut TokenWriter) {
        if self.min != [0.0; 3] {
            writer.float_block("MinimumExtent", &self.min);
        }
        if self.max != [0.0; 3] {
            writer.float_block("MaximumExtent", &self.max);
        }
        if self.bounds_radius != 0.0 {
            writer.attrib("BoundsRadius", self.bounds_radius);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_roundtrip() {
        let extent = Extent {
            bounds_radius: 12.5,
            min: [-1.0, -2.0, -3.0],
            max: [1.0, 2.0, 3.0],
        };

        let mut buffer = [0u8; Extent::BYTE_LEN];
        extent.write(&mut BinaryWriter::new(&mut buffer)).unwrap();

        let parsed = Extent::read(&mut BinaryReader::new(&buffer)).unwrap();
        assert_eq!(parsed, extent);
    }
}
