//! Materials and layers.
//!
//! Materials are the clearest example of version branching in MDX: version
//! 800 files have no shader name, 900 adds the shader field and layer
//! emissive gain, and 1000 adds the fresnel fields. `read`, `write`, and
//! `byte_len` all branch on the same version comparisons.

use veles_common::{BinaryReader, BinaryWriter};

use crate::tokens::{TokenReader, TokenWriter};
use crate::{Error, Result};

use super::Track;

/// One material (`MTLS` chunk record, variable size).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Material {
    pub priority_plane: i32,
    /// Bit 0: constant color, bit 4: sort primitives far Z,
    /// bit 5: full resolution.
    pub flags: u32,
    /// HD pipeline shader name; present only in version > 800.
    pub shader: String,
    pub layers: Vec<Layer>,
}

impl Material {
    const CONSTANT_COLOR: u32 = 0x1;
    const SORT_PRIMS_FAR_Z: u32 = 0x10;
    const FULL_RESOLUTION: u32 = 0x20;

    /// Read one material record.
    pub fn read(reader: &mut BinaryReader<'_>, version: u32) -> Result<Self> {
        let _inclusive_size = reader.read_u32()?;

        let priority_plane = reader.read_i32()?;
        let flags = reader.read_u32()?;
        let shader = if version > 800 {
            reader.read_string_block(80)?.to_string()
        } else {
            String::new()
        };

        let tag = reader.read_tag()?;
        if &tag != b"LAYS" {
            return Err(Error::unknown_tag(tag, "Material"));
        }
        let count = reader.read_u32()? as usize;
        let mut layers = Vec::with_capacity(count);
        for _ in 0..count {
            layers.push(Layer::read(reader, version)?);
        }

        Ok(Self {
            priority_plane,
            flags,
            shader,
            layers,
        })
    }

    /// Write one material record.
    pub fn write(&self, writer: &mut BinaryWriter<'_>, version: u32) -> Result<()> {
        writer.write_u32(self.byte_len(version) as u32)?;
        writer.write_i32(self.priority_plane)?;
        writer.write_u32(self.flags)?;
        if version > 800 {
            writer.write_string_block(&self.shader, 80)?;
        }

        writer.write_tag(*b"LAYS")?;
        writer.write_u32(self.layers.len() as u32)?;
        for layer in &self.layers {
            layer.write(writer, version)?;
        }
        Ok(())
    }

    /// Exact serialized size for the given version.
    pub fn byte_len(&self, version: u32) -> usize {
        let mut size = 20;
        if version > 800 {
            size += 80;
        }
        size + self
            .layers
            .iter()
            .map(|l| l.byte_len(version))
            .sum::<usize>()
    }

    /// Read the MDL `Material { ... }` body; the caller has consumed
    /// `Material`.
    pub fn read_mdl(stream: &mut TokenReader<'_>) -> Result<Self> {
        const RECORD: &str = "Material";

        let mut material = Self::default();
        stream.enter_block(RECORD)?;
        while let Some(key) = stream.block_key(RECORD)? {
            match key {
                "ConstantColor" => material.flags |= Self::CONSTANT_COLOR,
                "SortPrimsFarZ" => material.flags |= Self::SORT_PRIMS_FAR_Z,
                "FullResolution" => material.flags |= Self::FULL_RESOLUTION,
                "PriorityPlane" => material.priority_plane = stream.read_i32(RECORD)?,
                "Shader" => material.shader = stream.word(RECORD)?.to_string(),
                "Layer" => material.layers.push(Layer::read_mdl(stream)?),
                other => return Err(Error::bad_token(other, RECORD)),
            }
        }
        Ok(material)
    }

    /// Write the MDL form.
    pub fn write_mdl(&self, writer: &mut TokenWriter) {
        writer.start_block("Material");
        if self.flags & Self::CONSTANT_COLOR != 0 {
            writer.flag("ConstantColor");
        }
        if self.flags & Self::SORT_PRIMS_FAR_Z != 0 {
            writer.flag("SortPrimsFarZ");
        }
        if self.flags & Self::FULL_RESOLUTION != 0 {
            writer.flag("FullResolution");
        }
        if self.priority_plane != 0 {
            writer.attrib("PriorityPlane", self.priority_plane);
        }
        if !self.shader.is_empty() {
            writer.quoted("Shader", &self.shader);
        }
        for layer in &self.layers {
            layer.write_mdl(writer);
        }
        writer.end_block();
    }
}

/// One render pass within a material.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// 0 none, 1 transparent, 2 blend, 3 additive, 4 add-alpha,
    /// 5 modulate, 6 modulate 2x.
    pub filter_mode: u32,
    /// Bit 0: unshaded, bit 1: sphere env map, bit 4: two sided,
    /// bit 5: unfogged, bit 6: no depth test, bit 7: no depth set.
    pub shading_flags: u32,
    pub texture_id: u32,
    pub texture_animation_id: u32,
    pub coord_id: u32,
    pub alpha: f32,
    /// Version > 800.
    pub emissive_gain: f32,
    /// Version > 900. Stored B,G,R like all MDL colors.
    pub fresnel_color: [f32; 3],
    /// Version > 900.
    pub fresnel_opacity: f32,
    /// Version > 900.
    pub fresnel_team_color: u32,
    pub texture_id_track: Option<Track<u32>>,
    pub alpha_track: Option<Track<f32>>,
    pub emissive_gain_track: Option<Track<f32>>,
    pub fresnel_color_track: Option<Track<[f32; 3]>>,
    pub fresnel_opacity_track: Option<Track<f32>>,
    pub fresnel_team_color_track: Option<Track<u32>>,
}

impl Default for Layer {
    fn default() -> Self {
        Self {
            filter_mode: 0,
            shading_flags: 0,
            texture_id: 0,
            texture_animation_id: crate::NONE,
            coord_id: 0,
            alpha: 1.0,
            emissive_gain: 1.0,
            fresnel_color: [1.0; 3],
            fresnel_opacity: 0.0,
            fresnel_team_color: 0,
            texture_id_track: None,
            alpha_track: None,
            emissive_gain_track: None,
            fresnel_color_track: None,
            fresnel_opacity_track: None,
            fresnel_team_color_track: None,
        }
    }
}

impl Layer {
    const UNSHADED: u32 = 0x1;
    const SPHERE_ENV_MAP: u32 = 0x2;
    const TWO_SIDED: u32 = 0x10;
    const UNFOGGED: u32 = 0x20;
    const NO_DEPTH_TEST: u32 = 0x40;
    const NO_DEPTH_SET: u32 = 0x80;

    const FILTER_MODES: [&'static str; 7] = [
        "None",
        "Transparent",
        "Blend",
        "Additive",
        "AddAlpha",
        "Modulate",
        "Modulate2x",
    ];

    /// Read one layer record.
    pub fn read(reader: &mut BinaryReader<'_>, version: u32) -> Result<Self> {
        let start = reader.position();
        let inclusive_size = reader.read_u32()? as usize;

        let mut layer = Self {
            filter_mode: reader.read_u32()?,
            shading_flags: reader.read_u32()?,
            texture_id: reader.read_u32()?,
            texture_animation_id: reader.read_u32()?,
            coord_id: reader.read_u32()?,
            alpha: reader.read_f32()?,
            ..Self::default()
        };

        if version > 800 {
            layer.emissive_gain = reader.read_f32()?;
        }
        if version > 900 {
            layer.fresnel_color = reader.read_f32_3()?;
            layer.fresnel_opacity = reader.read_f32()?;
            layer.fresnel_team_color = reader.read_u32()?;
        }

        while reader.position() - start < inclusive_size {
            let tag = reader.read_tag()?;
            match &tag {
                b"KMTF" => layer.texture_id_track = Some(Track::read(reader)?),
                b"KMTA" => layer.alpha_track = Some(Track::read(reader)?),
                b"KMTE" => layer.emissive_gain_track = Some(Track::read(reader)?),
                b"KFC3" => layer.fresnel_color_track = Some(Track::read(reader)?),
                b"KFCA" => layer.fresnel_opacity_track = Some(Track::read(reader)?),
                b"KFTC" => layer.fresnel_team_color_track = Some(Track::read(reader)?),
                _ => return Err(Error::unknown_tag(tag, "Layer")),
            }
        }

        Ok(layer)
    }

    /// Write one layer record.
    pub fn write(&self, writer: &mut BinaryWriter<'_>, version: u32) -> Result<()> {
        writer.write_u32(self.byte_len(version) as u32)?;
        writer.write_u32(self.filter_mode)?;
        writer.write_u32(self.shading_flags)?;
        writer.write_u32(self.texture_id)?;
        writer.write_u32(self.texture_animation_id)?;
        writer.write_u32(self.coord_id)?;
        writer.write_f32(self.alpha)?;

        if version > 800 {
            writer.write_f32(self.emissive_gain)?;
        }
        if version > 900 {
            writer.write_f32_array(&self.fresnel_color)?;
            writer.write_f32(self.fresnel_opacity)?;
            writer.write_u32(self.fresnel_team_color)?;
        }

        if let Some(track) = &self.texture_id_track {
            track.write(writer, *b"KMTF")?;
        }
        if let Some(track) = &self.alpha_track {
            track.write(writer, *b"KMTA")?;
        }
        if version > 800 {
            if let Some(track) = &self.emissive_gain_track {
                track.write(writer, *b"KMTE")?;
            }
        }
        if version > 900 {
            if let Some(track) = &self.fresnel_color_track {
                track.write(writer, *b"KFC3")?;
            }
            if let Some(track) = &self.fresnel_opacity_track {
                track.write(writer, *b"KFCA")?;
            }
            if let Some(track) = &self.fresnel_team_color_track {
                track.write(writer, *b"KFTC")?;
            }
        }

        Ok(())
    }

    /// Exact serialized size for the given version. Version-gated fields and
    /// tracks contribute nothing under versions that lack them.
    pub fn byte_len(&self, version: u32) -> usize {
        let mut size = 28;
        if version > 800 {
            size += 4;
            if let Some(track) = &self.emissive_gain_track {
                size += track.byte_len();
            }
        }
        if version > 900 {
            size += 20;
            if let Some(track) = &self.fresnel_color_track {
                size += track.byte_len();
            }
            if let Some(track) = &self.fresnel_opacity_track {
                size += track.byte_len();
            }
            if let Some(track) = &self.fresnel_team_color_track {
                size += track.byte_len();
            }
        }
        if let Some(track) = &self.texture_id_track {
            size += track.byte_len();
        }
        if let Some(track) = &self.alpha_track {
            size += track.byte_len();
        }
        size
    }

    /// Read the MDL `Layer { ... }` body; the caller has consumed `Layer`.
    pub fn read_mdl(stream: &mut TokenReader<'_>) -> Result<Self> {
        const RECORD: &str = "Layer";

        let mut layer = Self::default();
        stream.enter_block(RECORD)?;
        while let Some(key) = stream.block_key(RECORD)? {
            // `static X value` marks an unanimated attribute.
            let (key, is_static) = if key == "static" {
                (stream.word(RECORD)?, true)
            } else {
                (key, false)
            };

            match key {
                "FilterMode" => {
                    let word = stream.word(RECORD)?;
                    layer.filter_mode = Self::FILTER_MODES
                        .iter()
                        .position(|&m| m == word)
                        .ok_or_else(|| Error::bad_token(word, RECORD))?
                        as u32;
                }
                "Unshaded" => layer.shading_flags |= Self::UNSHADED,
                "SphereEnvMap" => layer.shading_flags |= Self::SPHERE_ENV_MAP,
                "TwoSided" => layer.shading_flags |= Self::TWO_SIDED,
                "Unfogged" => layer.shading_flags |= Self::UNFOGGED,
                "NoDepthTest" => layer.shading_flags |= Self::NO_DEPTH_TEST,
                "NoDepthSet" => layer.shading_flags |= Self::NO_DEPTH_SET,
                "CoordId" => layer.coord_id = stream.read_u32(RECORD)?,
                "TVertexAnimId" => layer.texture_animation_id = stream.read_u32(RECORD)?,
                "TextureID" if is_static => layer.texture_id = stream.read_u32(RECORD)?,
                "TextureID" => layer.texture_id_track = Some(Track::read_mdl(stream, RECORD)?),
                "Alpha" if is_static => layer.alpha = stream.read_f32(RECORD)?,
                "Alpha" => layer.alpha_track = Some(Track::read_mdl(stream, RECORD)?),
                "EmissiveGain" if is_static => layer.emissive_gain = stream.read_f32(RECORD)?,
                "EmissiveGain" => {
                    layer.emissive_gain_track = Some(Track::read_mdl(stream, RECORD)?)
                }
                "FresnelColor" if is_static => {
                    stream.read_color(&mut layer.fresnel_color, RECORD)?
                }
                "FresnelColor" => {
                    layer.fresnel_color_track = Some(Track::read_mdl(stream, RECORD)?)
                }
                "FresnelOpacity" if is_static => {
                    layer.fresnel_opacity = stream.read_f32(RECORD)?
                }
                "FresnelOpacity" => {
                    layer.fresnel_opacity_track = Some(Track::read_mdl(stream, RECORD)?)
                }
                "FresnelTeamColor" if is_static => {
                    layer.fresnel_team_color = stream.read_u32(RECORD)?
                }
                "FresnelTeamColor" => {
                    layer.fresnel_team_color_track = Some(Track::read_mdl(stream, RECORD)?)
                }
                other => return Err(Error::bad_token(other, RECORD)),
            }
        }
        Ok(layer)
    }

    /// Write the MDL form.
    pub fn write_mdl(&self, writer: &mut TokenWriter) {
        writer.start_block("Layer");
        writer.line(&format!(
            "FilterMode {},",
            Self::FILTER_MODES[self.filter_mode.min(6) as usize]
        ));
        if self.shading_flags & Self::UNSHADED != 0 {
            writer.flag("Unshaded");
        }
        if self.shading_flags & Self::SPHERE_ENV_MAP != 0 {
            writer.flag("SphereEnvMap");
        }
        if self.shading_flags & Self::TWO_SIDED != 0 {
            writer.flag("TwoSided");
        }
        if self.shading_flags & Self::UNFOGGED != 0 {
            writer.flag("Unfogged");
        }
        if self.shading_flags & Self::NO_DEPTH_TEST != 0 {
            writer.flag("NoDepthTest");
        }
        if self.shading_flags & Self::NO_DEPTH_SET != 0 {
            writer.flag("NoDepthSet");
        }
        if self.coord_id != 0 {
            writer.attrib("CoordId", self.coord_id);
        }
        if self.texture_animation_id != crate::NONE {
            writer.attrib("TVertexAnimId", self.texture_animation_id);
        }
        match &self.texture_id_track {
            Some(track) => track.write_mdl(writer, "TextureID"),
            None => writer.attrib("static TextureID", self.texture_id),
        }
        match &self.alpha_track {
            Some(track) => track.write_mdl(writer, "Alpha"),
            None => {
                if self.alpha != 1.0 {
                    writer.attrib("static Alpha", self.alpha);
                }
            }
        }
        match &self.emissive_gain_track {
            Some(track) => track.write_mdl(writer, "EmissiveGain"),
            None => {
                if self.emissive_gain != 1.0 {
                    writer.attrib("static EmissiveGain", self.emissive_gain);
                }
            }
        }
        match &self.fresnel_color_track {
            Some(track) => track.write_mdl(writer, "FresnelColor"),
            None => {
                if self.fresnel_color != [1.0; 3] {
                    writer.color("static FresnelColor", &self.fresnel_color);
                }
            }
        }
        match &self.fresnel_opacity_track {
            Some(track) => track.write_mdl(writer, "FresnelOpacity"),
            None => {
                if self.fresnel_opacity != 0.0 {
                    writer.attrib("static FresnelOpacity", self.fresnel_opacity);
                }
            }
        }
        match &self.fresnel_team_color_track {
            Some(track) => track.write_mdl(writer, "FresnelTeamColor"),
            None => {
                if self.fresnel_team_color != 0 {
                    writer.attrib("static FresnelTeamColor", self.fresnel_team_color);
                }
            }
        }
        writer.end_block();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::{Interpolation, TrackKey};
    use crate::NONE;

    fn sample_material() -> Material {
        Material {
            priority_plane: -1,
            flags: 0x11,
            shader: "Shader_HD_DefaultUnit".to_string(),
            layers: vec![
                Layer {
                    filter_mode: 2,
                    shading_flags: 0x10,
                    texture_id: 1,
                    alpha_track: Some(Track {
                        interpolation: Interpolation::Linear,
                        global_sequence_id: NONE,
                        keys: vec![
                            TrackKey {
                                frame: 0,
                                value: 0.0,
                                ..Default::default()
                            },
                            TrackKey {
                                frame: 500,
                                value: 1.0,
                                ..Default::default()
                            },
                        ],
                    }),
                    ..Default::default()
                },
                Layer::default(),
            ],
        }
    }

    fn roundtrip(material: &Material, version: u32) -> Material {
        let mut buffer = vec![0u8; material.byte_len(version)];
        material
            .write(&mut BinaryWriter::new(&mut buffer), version)
            .unwrap();
        let mut reader = BinaryReader::new(&buffer);
        let parsed = Material::read(&mut reader, version).unwrap();
        assert!(reader.is_empty(), "byte_len drifted from write");
        parsed
    }

    #[test]
    fn test_roundtrip_v800_drops_shader() {
        let material = sample_material();
        let parsed = roundtrip(&material, 800);

        // The shader field does not exist in 800; it is lost, not zeroed.
        assert_eq!(parsed.shader, "");
        assert_eq!(parsed.layers.len(), 2);
        assert_eq!(parsed.layers[0].alpha_track, material.layers[0].alpha_track);
    }

    #[test]
    fn test_roundtrip_v1000_keeps_everything() {
        let mut material = sample_material();
        material.layers[0].fresnel_opacity = 0.5;
        material.layers[0].emissive_gain = 2.0;

        let parsed = roundtrip(&material, 1000);
        assert_eq!(parsed, material);
    }

    #[test]
    fn test_version_gated_defaults() {
        // A layer saved under 1000 and reloaded under 800 gets documented
        // defaults for the fields 800 lacks.
        let mut material = sample_material();
        material.layers[0].emissive_gain = 3.0;

        let parsed = roundtrip(&material, 800);
        assert_eq!(parsed.layers[0].emissive_gain, 1.0);
        assert_eq!(parsed.layers[0].fresnel_color, [1.0; 3]);
    }

    #[test]
    fn test_mdl_roundtrip() {
        let mut material = sample_material();
        material.shader.clear();

        let mut writer = TokenWriter::new();
        material.write_mdl(&mut writer);
        let text = writer.finish();

        let mut stream = TokenReader::new(&text);
        assert_eq!(stream.next(), Some("Material"));
        let parsed = Material::read_mdl(&mut stream).unwrap();
        assert_eq!(parsed, material);
    }

    #[test]
    fn test_mdl_keeps_hd_layer_attributes() {
        let layer = Layer {
            fresnel_color: [0.25, 0.5, 1.0],
            fresnel_opacity: 0.75,
            fresnel_team_color: 1,
            emissive_gain_track: Some(Track {
                interpolation: Interpolation::Linear,
                global_sequence_id: NONE,
                keys: vec![TrackKey {
                    frame: 100,
                    value: 4.0,
                    ..Default::default()
                }],
            }),
            ..Default::default()
        };
        let material = Material {
            layers: vec![layer],
            ..Default::default()
        };

        let mut writer = TokenWriter::new();
        material.write_mdl(&mut writer);
        let text = writer.finish();

        let mut stream = TokenReader::new(&text);
        assert_eq!(stream.next(), Some("Material"));
        let parsed = Material::read_mdl(&mut stream).unwrap();
        assert_eq!(parsed, material);
    }
}
