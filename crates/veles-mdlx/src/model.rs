//! The model container: chunk framing for MDX and top-level MDL dispatch.

use veles_common::{BinaryReader, BinaryWriter};

use crate::chunks::{
    Attachment, Bone, Camera, CollisionShape, EventObject, Extent, Geoset, Helper, Material,
    Sequence, Texture,
};
use crate::tokens::{TokenReader, TokenWriter};
use crate::{Error, Result, MDX_MAGIC};

/// A chunk this library has no record type for, preserved verbatim so that
/// loading and saving a model does not silently drop data written by newer
/// tools.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownChunk {
    pub tag: [u8; 4],
    pub data: Vec<u8>,
}

/// A complete model: every known chunk decoded into records, everything
/// else kept as [`UnknownChunk`]s.
///
/// `version` gates the layout of several records (`Material`, `Layer`,
/// `Geoset`); 800 is the classic layout, above 800 adds shaders, level of
/// detail, and skin weights, above 900 adds fresnel terms.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub version: u32,
    pub name: String,
    pub animation_file: String,
    pub extent: Extent,
    pub blend_time: u32,
    pub sequences: Vec<Sequence>,
    pub global_sequences: Vec<u32>,
    pub materials: Vec<Material>,
    pub textures: Vec<Texture>,
    pub geosets: Vec<Geoset>,
    pub bones: Vec<Bone>,
    pub helpers: Vec<Helper>,
    pub attachments: Vec<Attachment>,
    pub pivot_points: Vec<[f32; 3]>,
    pub cameras: Vec<Camera>,
    pub event_objects: Vec<EventObject>,
    pub collision_shapes: Vec<CollisionShape>,
    pub unknown_chunks: Vec<UnknownChunk>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            version: 800,
            name: String::new(),
            animation_file: String::new(),
            extent: Extent::default(),
            blend_time: 0,
            sequences: Vec::new(),
            global_sequences: Vec::new(),
            materials: Vec::new(),
            textures: Vec::new(),
            geosets: Vec::new(),
            bones: Vec::new(),
            helpers: Vec::new(),
            attachments: Vec::new(),
            pivot_points: Vec::new(),
            cameras: Vec::new(),
            event_objects: Vec::new(),
            collision_shapes: Vec::new(),
            unknown_chunks: Vec::new(),
        }
    }
}

/// Decode records until the chunk window is exhausted. Each record is
/// bounds-checked against the window, so a bad count inside one record
/// fails its read instead of bleeding into the next chunk.
fn read_all<T>(
    sub: &mut BinaryReader<'_>,
    mut read_one: impl FnMut(&mut BinaryReader<'_>) -> Result<T>,
) -> Result<Vec<T>> {
    let mut records = Vec::new();
    while !sub.is_empty() {
        records.push(read_one(sub)?);
    }
    Ok(records)
}

impl Model {
    /// Parse a binary MDX buffer.
    ///
    /// Chunk order is not assumed beyond `VERS` preceding the version-gated
    /// chunks, which every writer satisfies. Unrecognized chunks are kept.
    pub fn from_mdx(data: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(data);
        reader.expect_magic(MDX_MAGIC)?;

        let mut model = Self::default();
        while !reader.is_empty() {
            let tag = reader.read_tag()?;
            let size = reader.read_u32()? as usize;
            let mut sub = reader.substream(size)?;
            reader.advance(size);

            let version = model.version;
            match &tag {
                b"VERS" => model.version = sub.read_u32()?,
                b"MODL" => {
                    model.name = sub.read_string_block(80)?.to_string();
                    model.animation_file = sub.read_string_block(260)?.to_string();
                    model.extent = Extent::read(&mut sub)?;
                    model.blend_time = sub.read_u32()?;
                }
                b"SEQS" => model.sequences = read_all(&mut sub, Sequence::read)?,
                b"GLBS" => {
                    model.global_sequences = read_all(&mut sub, |r| Ok(r.read_u32()?))?
                }
                b"MTLS" => {
                    model.materials = read_all(&mut sub, |r| Material::read(r, version))?
                }
                b"TEXS" => model.textures = read_all(&mut sub, Texture::read)?,
                b"GEOS" => model.geosets = read_all(&mut sub, |r| Geoset::read(r, version))?,
                b"BONE" => model.bones = read_all(&mut sub, Bone::read)?,
                b"HELP" => model.helpers = read_all(&mut sub, Helper::read)?,
                b"ATCH" => model.attachments = read_all(&mut sub, Attachment::read)?,
                b"PIVT" => {
                    model.pivot_points = read_all(&mut sub, |r| Ok(r.read_f32_3()?))?
                }
                b"CAMS" => model.cameras = read_all(&mut sub, Camera::read)?,
                b"EVTS" => model.event_objects = read_all(&mut sub, EventObject::read)?,
                b"CLID" => {
                    model.collision_shapes = read_all(&mut sub, CollisionShape::read)?
                }
                _ => model.unknown_chunks.push(UnknownChunk {
                    tag,
                    data: sub.remaining_bytes().to_vec(),
                }),
            }
        }
        Ok(model)
    }

    /// Serialize to binary MDX.
    ///
    /// The output buffer is sized up front from the `byte_len` of every
    /// record, then written linearly.
    pub fn to_mdx(&self) -> Result<Vec<u8>> {
        let total = self.mdx_len();
        let mut data = vec![0u8; total];
        let mut writer = BinaryWriter::new(&mut data);

        writer.write_bytes(MDX_MAGIC)?;

        writer.write_tag(*b"VERS")?;
        writer.write_u32(4)?;
        writer.write_u32(self.version)?;

        writer.write_tag(*b"MODL")?;
        writer.write_u32(372)?;
        writer.write_string_block(&self.name, 80)?;
        writer.write_string_block(&self.animation_file, 260)?;
        self.extent.write(&mut writer)?;
        writer.write_u32(self.blend_time)?;

        self.write_chunk(&mut writer, *b"SEQS", &self.sequences, |w, s| s.write(w))?;
        self.write_chunk(&mut writer, *b"GLBS", &self.global_sequences, |w, g| {
            Ok(w.write_u32(*g)?)
        })?;
        self.write_chunk(&mut writer, *b"MTLS", &self.materials, |w, m| {
            m.write(w, self.version)
        })?;
        self.write_chunk(&mut writer, *b"TEXS", &self.textures, |w, t| t.write(w))?;
        self.write_chunk(&mut writer, *b"GEOS", &self.geosets, |w, g| {
            g.write(w, self.version)
        })?;
        self.write_chunk(&mut writer, *b"BONE", &self.bones, |w, b| b.write(w))?;
        self.write_chunk(&mut writer, *b"HELP", &self.helpers, |w, h| h.write(w))?;
        self.write_chunk(&mut writer, *b"ATCH", &self.attachments, |w, a| a.write(w))?;
        self.write_chunk(&mut writer, *b"PIVT", &self.pivot_points, |w, p| {
            Ok(w.write_f32_array(p)?)
        })?;
        self.write_chunk(&mut writer, *b"CAMS", &self.cameras, |w, c| c.write(w))?;
        self.write_chunk(&mut writer, *b"EVTS", &self.event_objects, |w, e| e.write(w))?;
        self.write_chunk(&mut writer, *b"CLID", &self.collision_shapes, |w, c| {
            c.write(w)
        })?;

        for chunk in &self.unknown_chunks {
            writer.write_tag(chunk.tag)?;
            writer.write_u32(chunk.data.len() as u32)?;
            writer.write_bytes(&chunk.data)?;
        }

        debug_assert_eq!(writer.position(), total);
        Ok(data)
    }

    fn write_chunk<T>(
        &self,
        writer: &mut BinaryWriter<'_>,
        tag: [u8; 4],
        records: &[T],
        mut write_one: impl FnMut(&mut BinaryWriter<'_>, &T) -> Result<()>,
    ) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let size: usize = self.chunk_payload_len(&tag);
        writer.write_tag(tag)?;
        writer.write_u32(size as u32)?;
        for record in records {
            write_one(writer, record)?;
        }
        Ok(())
    }

    fn chunk_payload_len(&self, tag: &[u8; 4]) -> usize {
        match tag {
            b"SEQS" => self.sequences.len() * Sequence::BYTE_LEN,
            b"GLBS" => self.global_sequences.len() * 4,
            b"MTLS" => self
                .materials
                .iter()
                .map(|m| m.byte_len(self.version))
                .sum(),
            b"TEXS" => self.textures.len() * Texture::BYTE_LEN,
            b"GEOS" => self.geosets.iter().map(|g| g.byte_len(self.version)).sum(),
            b"BONE" => self.bones.iter().map(Bone::byte_len).sum(),
            b"HELP" => self.helpers.iter().map(Helper::byte_len).sum(),
            b"ATCH" => self.attachments.iter().map(Attachment::byte_len).sum(),
            b"PIVT" => self.pivot_points.len() * 12,
            b"CAMS" => self.cameras.iter().map(Camera::byte_len).sum(),
            b"EVTS" => self.event_objects.iter().map(EventObject::byte_len).sum(),
            b"CLID" => self.collision_shapes.iter().map(CollisionShape::byte_len).sum(),
            _ => 0,
        }
    }

    /// Total serialized MDX size.
    pub fn mdx_len(&self) -> usize {
        // magic + VERS + MODL
        let mut size = 4 + 12 + 8 + 372;
        for tag in [
            b"SEQS", b"GLBS", b"MTLS", b"TEXS", b"GEOS", b"BONE", b"HELP", b"ATCH", b"PIVT",
            b"CAMS", b"EVTS", b"CLID",
        ] {
            let payload = self.chunk_payload_len(tag);
            if payload > 0 {
                size += 8 + payload;
            }
        }
        for chunk in &self.unknown_chunks {
            size += 8 + chunk.data.len();
        }
        size
    }

    /// Parse the MDL text notation.
    pub fn from_mdl(text: &str) -> Result<Self> {
        const RECORD: &str = "Model";

        let mut model = Self::default();
        let mut stream = TokenReader::new(text);

        while let Some(token) = stream.next() {
            match token {
                "Version" => {
                    stream.enter_block(RECORD)?;
                    stream.expect("FormatVersion", RECORD)?;
                    model.version = stream.read_u32(RECORD)?;
                    stream.expect("}", RECORD)?;
                }
                "Model" => {
                    model.name = stream.word(RECORD)?.to_string();
                    stream.enter_block(RECORD)?;
                    while let Some(key) = stream.block_key(RECORD)? {
                        if model.extent.read_mdl_token(key, &mut stream, RECORD)? {
                            continue;
                        }
                        match key {
                            "BlendTime" => model.blend_time = stream.read_u32(RECORD)?,
                            "AnimationFile" => {
                                model.animation_file = stream.word(RECORD)?.to_string()
                            }
                            // Counts are derived from the record lists.
                            key if key.starts_with("Num") => {
                                stream.read_u32(RECORD)?;
                            }
                            other => return Err(Error::bad_token(other, RECORD)),
                        }
                    }
                }
                "Sequences" => {
                    let count = stream.read_u32(RECORD)? as usize;
                    model.sequences.reserve(count);
                    stream.enter_block(RECORD)?;
                    while let Some(key) = stream.block_key(RECORD)? {
                        match key {
                            "Anim" => model.sequences.push(Sequence::read_mdl(&mut stream)?),
                            other => return Err(Error::bad_token(other, RECORD)),
                        }
                    }
                }
                "GlobalSequences" => {
                    let count = stream.read_u32(RECORD)? as usize;
                    model.global_sequences.reserve(count);
                    stream.enter_block(RECORD)?;
                    while let Some(key) = stream.block_key(RECORD)? {
                        match key {
                            "Duration" => {
                                model.global_sequences.push(stream.read_u32(RECORD)?)
                            }
                            other => return Err(Error::bad_token(other, RECORD)),
                        }
                    }
                }
                "Textures" => {
                    let count = stream.read_u32(RECORD)? as usize;
                    model.textures.reserve(count);
                    stream.enter_block(RECORD)?;
                    while let Some(key) = stream.block_key(RECORD)? {
                        match key {
                            "Bitmap" => model.textures.push(Texture::read_mdl(&mut stream)?),
                            other => return Err(Error::bad_token(other, RECORD)),
                        }
                    }
                }
                "Materials" => {
                    let count = stream.read_u32(RECORD)? as usize;
                    model.materials.reserve(count);
                    stream.enter_block(RECORD)?;
                    while let Some(key) = stream.block_key(RECORD)? {
                        match key {
                            "Material" => model.materials.push(Material::read_mdl(&mut stream)?),
                            other => return Err(Error::bad_token(other, RECORD)),
                        }
                    }
                }
                "Geoset" => model.geosets.push(Geoset::read_mdl(&mut stream)?),
                "Bone" => model.bones.push(Bone::read_mdl(&mut stream)?),
                "Helper" => model.helpers.push(Helper::read_mdl(&mut stream)?),
                "Attachment" => model.attachments.push(Attachment::read_mdl(&mut stream)?),
                "PivotPoints" => {
                    let count = stream.read_u32(RECORD)? as usize;
                    stream.enter_block(RECORD)?;
                    for _ in 0..count {
                        let mut point = [0.0f32; 3];
                        stream.read_f32_block(&mut point, RECORD)?;
                        model.pivot_points.push(point);
                    }
                    stream.expect("}", RECORD)?;
                }
                "Camera" => model.cameras.push(Camera::read_mdl(&mut stream)?),
                "EventObject" => model.event_objects.push(EventObject::read_mdl(&mut stream)?),
                "CollisionShape" => {
                    model.collision_shapes.push(CollisionShape::read_mdl(&mut stream)?)
                }
                other => return Err(Error::bad_token(other, RECORD)),
            }
        }
        Ok(model)
    }

    /// Serialize to the MDL text notation.
    ///
    /// Unknown binary chunks have no text form and are not emitted.
    pub fn to_mdl(&self) -> String {
        let mut writer = TokenWriter::new();

        writer.start_block("Version");
        writer.attrib("FormatVersion", self.version);
        writer.end_block();

        writer.start_named_block("Model", &self.name);
        if !self.animation_file.is_empty() {
            writer.quoted("AnimationFile", &self.animation_file);
        }
        if !self.geosets.is_empty() {
            writer.attrib("NumGeosets", self.geosets.len());
        }
        if !self.bones.is_empty() {
            writer.attrib("NumBones", self.bones.len());
        }
        if !self.helpers.is_empty() {
            writer.attrib("NumHelpers", self.helpers.len());
        }
        if !self.attachments.is_empty() {
            writer.attrib("NumAttachments", self.attachments.len());
        }
        if !self.event_objects.is_empty() {
            writer.attrib("NumEvents", self.event_objects.len());
        }
        writer.attrib("BlendTime", self.blend_time);
        self.extent.write_mdl(&mut writer);
        writer.end_block();

        if !self.sequences.is_empty() {
            writer.start_counted_block("Sequences", self.sequences.len());
            for sequence in &self.sequences {
                sequence.write_mdl(&mut writer);
            }
            writer.end_block();
        }

        if !self.global_sequences.is_empty() {
            writer.start_counted_block("GlobalSequences", self.global_sequences.len());
            for duration in &self.global_sequences {
                writer.attrib("Duration", duration);
            }
            writer.end_block();
        }

        if !self.textures.is_empty() {
            writer.start_counted_block("Textures", self.textures.len());
            for texture in &self.textures {
                texture.write_mdl(&mut writer);
            }
            writer.end_block();
        }

        if !self.materials.is_empty() {
            writer.start_counted_block("Materials", self.materials.len());
            for material in &self.materials {
                material.write_mdl(&mut writer);
            }
            writer.end_block();
        }

        for geoset in &self.geosets {
            geoset.write_mdl(&mut writer, self.version);
        }
        for bone in &self.bones {
            bone.write_mdl(&mut writer);
        }
        for helper in &self.helpers {
            helper.write_mdl(&mut writer);
        }
        for attachment in &self.attachments {
            attachment.write_mdl(&mut writer);
        }

        if !self.pivot_points.is_empty() {
            writer.start_counted_block("PivotPoints", self.pivot_points.len());
            for point in &self.pivot_points {
                writer.vector(point);
            }
            writer.end_block();
        }

        for camera in &self.cameras {
            camera.write_mdl(&mut writer);
        }
        for event in &self.event_objects {
            event.write_mdl(&mut writer);
        }
        for collision in &self.collision_shapes {
            collision.write_mdl(&mut writer);
        }

        writer.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::{Layer, Node};

    fn sample_model() -> Model {
        let mut model = Model {
            version: 800,
            name: "Footman".to_string(),
            blend_time: 150,
            ..Model::default()
        };
        model.extent.bounds_radius = 120.0;

        model.sequences.push(Sequence {
            name: "Stand".to_string(),
            interval: [0, 1000],
            ..Sequence::default()
        });
        model.global_sequences.push(2000);
        model.textures.push(Texture {
            path: "Textures\\Footman.blp".to_string(),
            ..Texture::default()
        });
        model.materials.push(Material {
            layers: vec![Layer::default()],
            ..Material::default()
        });

        let mut geoset = Geoset::default();
        geoset.vertices = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        geoset.normals = vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0];
        geoset.face_type_groups = vec![4];
        geoset.face_groups = vec![3];
        geoset.faces = vec![0, 1, 2];
        geoset.vertex_groups = vec![0, 0, 0];
        geoset.matrix_groups = vec![1];
        geoset.matrix_indices = vec![0];
        geoset.uv_sets = vec![vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0]];
        model.geosets.push(geoset);

        let mut bone = Bone::default();
        bone.node.name = "Root".to_string();
        model.bones.push(bone);
        model.helpers.push(Helper {
            node: Node {
                name: "Mesh".to_string(),
                object_id: 1,
                ..Node::with_flags(0)
            },
        });
        model.pivot_points.push([0.0, 0.0, 0.0]);
        model.pivot_points.push([0.0, 0.0, 50.0]);
        model
    }

    #[test]
    fn test_mdx_roundtrip() {
        let model = sample_model();
        let data = model.to_mdx().unwrap();
        assert_eq!(data.len(), model.mdx_len());
        assert_eq!(&data[0..4], b"MDLX");

        let parsed = Model::from_mdx(&data).unwrap();
        assert_eq!(parsed, model);
    }

    #[test]
    fn test_mdl_roundtrip() {
        let model = sample_model();
        let text = model.to_mdl();
        let parsed = Model::from_mdl(&text).unwrap();
        assert_eq!(parsed, model);
    }

    #[test]
    fn test_unknown_chunks_survive_resave() {
        let mut model = sample_model();
        model.unknown_chunks.push(UnknownChunk {
            tag: *b"FAFX",
            data: vec![1, 2, 3, 4, 5, 6, 7, 8],
        });

        let data = model.to_mdx().unwrap();
        let parsed = Model::from_mdx(&data).unwrap();
        assert_eq!(parsed.unknown_chunks, model.unknown_chunks);

        let resaved = parsed.to_mdx().unwrap();
        assert_eq!(resaved, data);
    }

    #[test]
    fn test_bad_magic() {
        let err = Model::from_mdx(b"MDX\0????").unwrap_err();
        assert!(matches!(
            err,
            Error::Common(veles_common::Error::InvalidMagic { .. })
        ));
    }

    #[test]
    fn test_truncated_chunk() {
        let model = sample_model();
        let data = model.to_mdx().unwrap();
        assert!(Model::from_mdx(&data[..data.len() - 4]).is_err());
    }

    #[test]
    fn test_empty_lists_emit_no_chunks() {
        let model = Model::default();
        let data = model.to_mdx().unwrap();
        // magic + VERS chunk + MODL chunk only
        assert_eq!(data.len(), 4 + 12 + 8 + 372);
    }
}
