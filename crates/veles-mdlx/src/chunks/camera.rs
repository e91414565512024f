//! Cameras.

use veles_common::{BinaryReader, BinaryWriter};

use crate::tokens::{TokenReader, TokenWriter};
use crate::{Error, Result};

use super::Track;

/// One camera (`CAMS` chunk record). Cameras are not nodes; they carry
/// their own inclusive size, an 80-byte name, and their own track set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Camera {
    pub name: String,
    pub position: [f32; 3],
    pub field_of_view: f32,
    pub far_clipping_plane: f32,
    pub near_clipping_plane: f32,
    pub target_position: [f32; 3],
    /// `KCTR` camera position animation.
    pub translation: Option<Track<[f32; 3]>>,
    /// `KTTR` target position animation.
    pub target_translation: Option<Track<[f32; 3]>>,
    /// `KCRL` roll animation.
    pub rotation: Option<Track<f32>>,
}

impl Camera {
    /// Read one camera record.
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let start = reader.position();
        let inclusive_size = reader.read_u32()? as usize;

        let mut camera = Self {
            name: reader.read_string_block(80)?.to_string(),
            position: reader.read_f32_3()?,
            field_of_view: reader.read_f32()?,
            far_clipping_plane: reader.read_f32()?,
            near_clipping_plane: reader.read_f32()?,
            target_position: reader.read_f32_3()?,
            ..Self::default()
        };

        while reader.position() - start < inclusive_size {
            let tag = reader.read_tag()?;
            match &tag {
                b"KCTR" => camera.translation = Some(Track::read(reader)?),
                b"KTTR" => camera.target_translation = Some(Track::read(reader)?),
                b"KCRL" => camera.rotation = Some(Track::read(reader)?),
                _ => return Err(Error::unknown_tag(tag, "Camera")),
            }
        }

        Ok(camera)
    }

    /// Write one camera record.
    pub fn write(&self, writer: &mut BinaryWriter<'_>) -> Result<()> {
        writer.write_u32(self.byte_len() as u32)?;
        writer.write_string_block(&self.name, 80)?;
        writer.write_f32_array(&self.position)?;
        writer.write_f32(self.field_of_view)?;
        writer.write_f32(self.far_clipping_plane)?;
        writer.write_f32(self.near_clipping_plane)?;
        writer.write_f32_array(&self.target_position)?;
        if let Some(track) = &self.translation {
            track.write(writer, *b"KCTR")?;
        }
        if let Some(track) = &self.rotation {
            track.write(writer, *b"KCRL")?;
        }
        if let Some(track) = &self.target_translation {
            track.write(writer, *b"KTTR")?;
        }
        Ok(())
    }

    /// Exact serialized size, inclusive-size field included.
    pub fn byte_len(&self) -> usize {
        let mut size = 120;
        if let Some(track) = &self.translation {
            size += track.byte_len();
        }
        if let Some(track) = &self.rotation {
            size += track.byte_len();
        }
        if let Some(track) = &self.target_translation {
            size += track.byte_len();
        }
        size
    }

    /// Read the MDL `Camera "name" { ... }` form; the caller has
    /// consumed `Camera`.
    pub fn read_mdl(stream: &mut TokenReader<'_>) -> Result<Self> {
        const RECORD: &str = "Camera";

        let mut camera = Self {
            name: stream.word(RECORD)?.to_string(),
            ..Self::default()
        };

        stream.enter_block(RECORD)?;
        while let Some(key) = stream.block_key(RECORD)? {
            match key {
                "Position" => stream.read_f32_block(&mut camera.position, RECORD)?,
                "Translation" => camera.translation = Some(Track::read_mdl(stream, RECORD)?),
                "Rotation" => camera.rotation = Some(Track::read_mdl(stream, RECORD)?),
                "FieldOfView" => camera.field_of_view = stream.read_f32(RECORD)?,
                "FarClip" => camera.far_clipping_plane = stream.read_f32(RECORD)?,
                "NearClip" => camera.near_clipping_plane = stream.read_f32(RECORD)?,
                "Target" => {
                    stream.enter_block(RECORD)?;
                    while let Some(target_key) = stream.block_key(RECORD)? {
                        match target_key {
                            "Position" => {
                                stream.read_f32_block(&mut camera.target_position, RECORD)?
                            }
                            "Translation" => {
                                camera.target_translation =
                                    Some(Track::read_mdl(stream, RECORD)?)
                            }
                            other => return Err(Error::bad_token(other, RECORD)),
                        }
                    }
                }
                other => return Err(Error::bad_token(other, RECORD)),
            }
        }
        Ok(camera)
    }

    /// Write the MDL form.
    pub fn write_mdl(&self, writer: &mut TokenWriter) {
        writer.start_named_block("Camera", &self.name);
        writer.float_block("Position", &self.position);
        if let Some(track) = &self.translation {
            track.write_mdl(writer, "Translation");
        }
        if let Some(track) = &self.rotation {
            track.write_mdl(writer, "Rotation");
        }
        writer.attrib("FieldOfView", self.field_of_view);
        writer.attrib("FarClip", self.far_clipping_plane);
        writer.attrib("NearClip", self.near_clipping_plane);
        writer.start_block("Target");
        writer.float_block("Position", &self.target_position);
        if let Some(track) = &self.target_translation {
            track.write_mdl(writer, "Translation");
        }
        writer.end_block();
        writer.end_block();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::{Interpolation, TrackKey};
    use crate::NONE;

    #[test]
    fn test_base_size_without_tracks() {
        assert_eq!(Camera::default().byte_len(), 120);
    }

    #[test]
    fn test_binary_roundtrip() {
        let camera = Camera {
            name: "CameraPortrait".to_string(),
            position: [350.0, 0.0, 110.0],
            field_of_view: 0.9774,
            far_clipping_plane: 10000.0,
            near_clipping_plane: 16.0,
            target_position: [0.0, 0.0, 95.0],
            translation: Some(Track {
                interpolation: Interpolation::Linear,
                global_sequence_id: NONE,
                keys: vec![TrackKey {
                    frame: 0,
                    value: [350.0, 0.0, 110.0],
                    ..Default::default()
                }],
            }),
            ..Camera::default()
        };

        let mut buffer = vec![0u8; camera.byte_len()];
        camera.write(&mut BinaryWriter::new(&mut buffer)).unwrap();

        let mut reader = BinaryReader::new(&buffer);
        let parsed = Camera::read(&mut reader).unwrap();
        assert_eq!(parsed, camera);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_mdl_roundtrip() {
        let camera = Camera {
            name: "CameraPortrait".to_string(),
            position: [320.0, 0.0, 120.0],
            field_of_view: 0.9774,
            far_clipping_plane: 10000.0,
            near_clipping_plane: 16.0,
            target_position: [0.0, 0.0, 100.0],
            ..Camera::default()
        };

        let mut writer = TokenWriter::new();
        camera.write_mdl(&mut writer);
        let text = writer.finish();

        let mut stream = TokenReader::new(&text);
        assert_eq!(stream.next(), Some("Camera"));
        assert_eq!(Camera::read_mdl(&mut stream).unwrap(), camera);
    }
}
