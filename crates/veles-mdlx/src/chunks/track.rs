//! Animated keyframe tracks.
//!
//! A track is a tagged sub-chunk (`KGTR`, `KMTA`, `KCTR`, ...) holding an
//! interpolation mode, an optional global-sequence binding, and a list of
//! keyframes. Hermite and bezier tracks carry in/out tangents per key.

use veles_common::{BinaryReader, BinaryWriter};

use crate::tokens::{TokenReader, TokenWriter};
use crate::{Error, Result, NONE};

/// Keyframe interpolation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    #[default]
    None,
    Linear,
    Hermite,
    Bezier,
}

impl Interpolation {
    /// Decode the binary interpolation field.
    pub fn from_u32(value: u32) -> Self {
        match value {
            1 => Self::Linear,
            2 => Self::Hermite,
            3 => Self::Bezier,
            _ => Self::None,
        }
    }

    /// The binary encoding.
    pub const fn as_u32(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Linear => 1,
            Self::Hermite => 2,
            Self::Bezier => 3,
        }
    }

    /// The MDL keyword.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::None => "DontInterp",
            Self::Linear => "Linear",
            Self::Hermite => "Hermite",
            Self::Bezier => "Bezier",
        }
    }

    /// Parse an MDL keyword.
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "DontInterp" => Some(Self::None),
            "Linear" => Some(Self::Linear),
            "Hermite" => Some(Self::Hermite),
            "Bezier" => Some(Self::Bezier),
            _ => None,
        }
    }

    /// Whether keys carry in/out tangents.
    pub const fn has_tangents(self) -> bool {
        matches!(self, Self::Hermite | Self::Bezier)
    }
}

/// A value that can be keyframed: a scalar or a small fixed vector.
pub trait TrackValue: Copy + Default + PartialEq + std::fmt::Debug {
    /// Serialized size of one value.
    const BYTE_LEN: usize;

    fn read(reader: &mut BinaryReader<'_>) -> veles_common::Result<Self>;
    fn write(&self, writer: &mut BinaryWriter<'_>) -> veles_common::Result<()>;

    /// Parse the MDL form: a bare scalar or a `{ ... }` vector.
    fn read_mdl(stream: &mut TokenReader<'_>, record: &'static str) -> Result<Self>;

    /// The MDL form as a line fragment.
    fn mdl_fragment(&self) -> String;
}

impl TrackValue for f32 {
    const BYTE_LEN: usize = 4;

    fn read(reader: &mut BinaryReader<'_>) -> veles_common::Result<Self> {
        reader.read_f32()
    }

    fn write(&self, writer: &mut BinaryWriter<'_>) -> veles_common::Result<()> {
        writer.write_f32(*self)
    }

    fn read_mdl(stream: &mut TokenReader<'_>, record: &'static str) -> Result<Self> {
        stream.read_f32(record)
    }

    fn mdl_fragment(&self) -> String {
        self.to_string()
    }
}

impl TrackValue for u32 {
    const BYTE_LEN: usize = 4;

    fn read(reader: &mut BinaryReader<'_>) -> veles_common::Result<Self> {
        reader.read_u32()
    }

    fn write(&self, writer: &mut BinaryWriter<'_>) -> veles_common::Result<()> {
        writer.write_u32(*self)
    }

    fn read_mdl(stream: &mut TokenReader<'_>, record: &'static str) -> Result<Self> {
        stream.read_u32(record)
    }

    fn mdl_fragment(&self) -> String {
        self.to_string()
    }
}

impl TrackValue for [f32; 3] {
    const BYTE_LEN: usize = 12;

    fn read(reader: &mut BinaryReader<'_>) -> veles_common::Result<Self> {
        reader.read_f32_3()
    }

    fn write(&self, writer: &mut BinaryWriter<'_>) -> veles_common::Result<()> {
        writer.write_f32_array(self)
    }

    fn read_mdl(stream: &mut TokenReader<'_>, record: &'static str) -> Result<Self> {
        let mut value = [0.0; 3];
        stream.read_f32_block(&mut value, record)?;
        Ok(value)
    }

    fn mdl_fragment(&self) -> String {
        format!("{{ {}, {}, {} }}", self[0], self[1], self[2])
    }
}

impl TrackValue for [f32; 4] {
    const BYTE_LEN: usize = 16;

    fn read(reader: &mut BinaryReader<'_>) -> veles_common::Result<Self> {
        reader.read_f32_4()
    }

    fn write(&self, writer: &mut BinaryWriter<'_>) -> veles_common::Result<()> {
        writer.write_f32_array(self)
    }

    fn read_mdl(stream: &mut TokenReader<'_>, record: &'static str) -> Result<Self> {
        let mut value = [0.0; 4];
        stream.read_f32_block(&mut value, record)?;
        Ok(value)
    }

    fn mdl_fragment(&self) -> String {
        format!("{{ {}, {}, {}, {} }}", self[0], self[1], self[2], self[3])
    }
}

/// One keyframe. Tangents are meaningful only for hermite/bezier tracks.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackKey<T: TrackValue> {
    pub frame: i32,
    pub value: T,
    pub in_tan: T,
    pub out_tan: T,
}

/// An animated attribute: interpolation mode, optional global sequence, and
/// keyframes.
#[derive(Debug, Clone, PartialEq)]
pub struct Track<T: TrackValue> {
    pub interpolation: Interpolation,
    /// Global sequence index, or [`NONE`] when keyed to sequence time.
    pub global_sequence_id: u32,
    pub keys: Vec<TrackKey<T>>,
}

impl<T: TrackValue> Default for Track<T> {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::default(),
            global_sequence_id: NONE,
            keys: Vec::new(),
        }
    }
}

impl<T: TrackValue> Track<T> {
    /// Read a track body. The caller has already consumed the tag.
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let count = reader.read_u32()? as usize;
        let interpolation = Interpolation::from_u32(reader.read_u32()?);
        let global_sequence_id = reader.read_u32()?;

        let mut keys = Vec::with_capacity(count);
        for _ in 0..count {
            let frame = reader.read_i32()?;
            let value = T::read(reader)?;
            let (in_tan, out_tan) = if interpolation.has_tangents() {
                (T::read(reader)?, T::read(reader)?)
            } else {
                (T::default(), T::default())
            };
            keys.push(TrackKey {
                frame,
                value,
                in_tan,
                out_tan,
            });
        }

        Ok(Self {
            interpolation,
            global_sequence_id,
            keys,
        })
    }

    /// Write the track including its tag.
    pub fn write(&self, writer: &mut BinaryWriter<'_>, tag: [u8; 4]) -> Result<()> {
        writer.write_tag(tag)?;
        writer.write_u32(self.keys.len() as u32)?;
        writer.write_u32(self.interpolation.as_u32())?;
        writer.write_u32(self.global_sequence_id)?;

        for key in &self.keys {
            writer.write_i32(key.frame)?;
            key.value.write(writer)?;
            if self.interpolation.has_tangents() {
                key.in_tan.write(writer)?;
                key.out_tan.write(writer)?;
            }
        }

        Ok(())
    }

    /// Exact serialized size, tag included.
    pub fn byte_len(&self) -> usize {
        let values_per_key = if self.interpolation.has_tangents() { 3 } else { 1 };
        16 + self.keys.len() * (4 + T::BYTE_LEN * values_per_key)
    }

    /// Read the MDL form. The caller has consumed the attribute name; the
    /// stream is positioned at the key count.
    pub fn read_mdl(stream: &mut TokenReader<'_>, record: &'static str) -> Result<Self> {
        let count = stream.read_u32(record)? as usize;
        stream.enter_block(record)?;

        let word = stream.word(record)?;
        let interpolation =
            Interpolation::from_keyword(word).ok_or_else(|| Error::bad_token(word, record))?;

        let mut global_sequence_id = NONE;
        if stream.peek() == Some("GlobalSeqId") {
            stream.next();
            global_sequence_id = stream.read_u32(record)?;
        }

        let mut keys = Vec::with_capacity(count);
        for _ in 0..count {
            let frame = stream.read_i32(record)?;
            let value = T::read_mdl(stream, record)?;
            let (in_tan, out_tan) = if interpolation.has_tangents() {
                stream.expect("InTan", record)?;
                let in_tan = T::read_mdl(stream, record)?;
                stream.expect("OutTan", record)?;
                let out_tan = T::read_mdl(stream, record)?;
                (in_tan, out_tan)
            } else {
                (T::default(), T::default())
            };
            keys.push(TrackKey {
                frame,
                value,
                in_tan,
                out_tan,
            });
        }

        stream.expect("}", record)?;

        Ok(Self {
            interpolation,
            global_sequence_id,
            keys,
        })
    }

    /// Write the MDL form under the given attribute name.
    pub fn write_mdl(&self, writer: &mut TokenWriter, name: &str) {
        writer.start_counted_block(name, self.keys.len());
        writer.flag(self.interpolation.keyword());
        if self.global_sequence_id != NONE {
            writer.attrib("GlobalSeqId", self.global_sequence_id);
        }
        for key in &self.keys {
            writer.line(&format!("{}: {},", key.frame, key.value.mdl_fragment()));
            if self.interpolation.has_tangents() {
                writer.line(&format!("\tInTan {},", key.in_tan.mdl_fragment()));
                writer.line(&format!("\tOutTan {},", key.out_tan.mdl_fragment()));
            }
        }
        writer.end_block();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_track() -> Track<[f32; 3]> {
        Track {
            interpolation: Interpolation::Hermite,
            global_sequence_id: 2,
            keys: vec![
                TrackKey {
                    frame: 0,
                    value: [1.0, 2.0, 3.0],
                    in_tan: [0.1, 0.2, 0.3],
                    out_tan: [0.4, 0.5, 0.6],
                },
                TrackKey {
                    frame: 1000,
                    value: [-1.0, 0.0, 1.0],
                    in_tan: [0.0; 3],
                    out_tan: [0.0; 3],
                },
            ],
        }
    }

    #[test]
    fn test_binary_roundtrip_with_tangents() {
        let track = sample_track();
        let mut buffer = vec![0u8; track.byte_len()];
        track
            .write(&mut BinaryWriter::new(&mut buffer), *b"KGTR")
            .unwrap();

        let mut reader = BinaryReader::new(&buffer);
        assert_eq!(&reader.read_tag().unwrap(), b"KGTR");
        let parsed = Track::<[f32; 3]>::read(&mut reader).unwrap();
        assert_eq!(parsed, track);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_byte_len_linear_vs_hermite() {
        let mut track = Track::<f32> {
            interpolation: Interpolation::Linear,
            global_sequence_id: NONE,
            keys: vec![TrackKey::default()],
        };
        assert_eq!(track.byte_len(), 16 + 8);

        track.interpolation = Interpolation::Bezier;
        assert_eq!(track.byte_len(), 16 + 8 + 8);
    }

    #[test]
    fn test_mdl_roundtrip() {
        let track = sample_track();
        let mut writer = TokenWriter::new();
        track.write_mdl(&mut writer, "Translation");
        let text = writer.finish();

        let mut stream = TokenReader::new(&text);
        assert_eq!(stream.next(), Some("Translation"));
        let parsed = Track::<[f32; 3]>::read_mdl(&mut stream, "test").unwrap();
        assert_eq!(parsed, track);
    }

    #[test]
    fn test_empty_track() {
        let track = Track::<u32>::default();
        assert_eq!(track.byte_len(), 16);

        let mut buffer = vec![0u8; 16];
        track
            .write(&mut BinaryWriter::new(&mut buffer), *b"KMTF")
            .unwrap();
        let mut reader = BinaryReader::new(&buffer[4..]);
        let parsed = Track::<u32>::read(&mut reader).unwrap();
        assert!(parsed.keys.is_empty());
    }
}
