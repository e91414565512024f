//! Geometry sets.

use veles_common::{BinaryReader, BinaryWriter};

use crate::tokens::{TokenReader, TokenWriter};
use crate::{Error, Result};

use super::Extent;

/// One geometry set (`GEOS` chunk record, variable size).
///
/// Vertex attributes are stored flat: `vertices` holds 3 floats per vertex,
/// `uv_sets` 2 floats per vertex per set, `tangents` 4 floats per vertex,
/// `skin` 8 bytes per vertex (4 bone indices + 4 weights).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Geoset {
    pub vertices: Vec<f32>,
    pub normals: Vec<f32>,
    /// Primitive type per face group (4 = triangles).
    pub face_type_groups: Vec<u32>,
    /// Index count per face group.
    pub face_groups: Vec<u32>,
    pub faces: Vec<u16>,
    /// Matrix group per vertex.
    pub vertex_groups: Vec<u8>,
    /// Matrix count per group.
    pub matrix_groups: Vec<u32>,
    /// Flattened bone indices for all groups.
    pub matrix_indices: Vec<u32>,
    pub material_id: u32,
    pub selection_group: u32,
    /// Bit 2: unselectable.
    pub selection_flags: u32,
    /// Version > 800.
    pub lod: i32,
    /// Version > 800, stored in an 80-byte field.
    pub lod_name: String,
    pub extent: Extent,
    /// Per-sequence extents, in sequence order.
    pub sequence_extents: Vec<Extent>,
    /// Version > 800, optional.
    pub tangents: Vec<f32>,
    /// Version > 800, optional.
    pub skin: Vec<u8>,
    pub uv_sets: Vec<Vec<f32>>,
}

fn expect_tag(reader: &mut BinaryReader<'_>, expected: &[u8; 4]) -> Result<()> {
    let tag = reader.read_tag()?;
    if &tag != expected {
        return Err(Error::unknown_tag(tag, "Geoset"));
    }
    Ok(())
}

impl Geoset {
    const UNSELECTABLE: u32 = 0x4;

    /// Read one geoset record.
    pub fn read(reader: &mut BinaryReader<'_>, version: u32) -> Result<Self> {
        let _inclusive_size = reader.read_u32()?;
        let mut geoset = Self::default();

        expect_tag(reader, b"VRTX")?;
        let count = reader.read_u32()? as usize;
        geoset.vertices = reader.read_f32_array(count * 3)?;

        expect_tag(reader, b"NRMS")?;
        let count = reader.read_u32()? as usize;
        geoset.normals = reader.read_f32_array(count * 3)?;

        expect_tag(reader, b"PTYP")?;
        let count = reader.read_u32()? as usize;
        geoset.face_type_groups = reader.read_u32_array(count)?;

        expect_tag(reader, b"PCNT")?;
        let count = reader.read_u32()? as usize;
        geoset.face_groups = reader.read_u32_array(count)?;

        expect_tag(reader, b"PVTX")?;
        let count = reader.read_u32()? as usize;
        geoset.faces = reader.read_u16_array(count)?;

        expect_tag(reader, b"GNDX")?;
        let count = reader.read_u32()? as usize;
        geoset.vertex_groups = reader.read_u8_array(count)?;

        expect_tag(reader, b"MTGC")?;
        let count = reader.read_u32()? as usize;
        geoset.matrix_groups = reader.read_u32_array(count)?;

        expect_tag(reader, b"MATS")?;
        let count = reader.read_u32()? as usize;
        geoset.matrix_indices = reader.read_u32_array(count)?;

        geoset.material_id = reader.read_u32()?;
        geoset.selection_group = reader.read_u32()?;
        geoset.selection_flags = reader.read_u32()?;

        if version > 800 {
            geoset.lod = reader.read_i32()?;
            geoset.lod_name = reader.read_string_block(80)?.to_string();
        }

        geoset.extent = Extent::read(reader)?;
        let count = reader.read_u32()? as usize;
        geoset.sequence_extents.reserve(count);
        for _ in 0..count {
            geoset.sequence_extents.push(Extent::read(reader)?);
        }

        // Optional TANG/SKIN (version > 800) precede the texture coordinate
        // sets, which always close the record.
        loop {
            let tag = reader.read_tag()?;
            match &tag {
                b"TANG" => {
                    let count = reader.read_u32()? as usize;
                    geoset.tangents = reader.read_f32_array(count * 4)?;
                }
                b"SKIN" => {
                    let count = reader.read_u32()? as usize;
                    geoset.skin = reader.read_u8_array(count)?;
                }
                b"UVAS" => {
                    let sets = reader.read_u32()? as usize;
                    for _ in 0..sets {
                        expect_tag(reader, b"UVBS")?;
                        let count = reader.read_u32()? as usize;
                        geoset.uv_sets.push(reader.read_f32_array(count * 2)?);
                    }
                    break;
                }
                _ => return Err(Error::unknown_tag(tag, "Geoset")),
            }
        }

        Ok(geoset)
    }

    /// Write one geoset record.
    pub fn write(&self, writer: &mut BinaryWriter<'_>, version: u32) -> Result<()> {
        writer.write_u32(self.byte_len(version) as u32)?;

        writer.write_tag(*b"VRTX")?;
        writer.write_u32((self.vertices.len() / 3) as u32)?;
        writer.write_f32_array(&self.vertices)?;

        writer.write_tag(*b"NRMS")?;
        writer.write_u32((self.normals.len() / 3) as u32)?;
        writer.write_f32_array(&self.normals)?;

        writer.write_tag(*b"PTYP")?;
        writer.write_u32(self.face_type_groups.len() as u32)?;
        writer.write_u32_array(&self.face_type_groups)?;

        writer.write_tag(*b"PCNT")?;
        writer.write_u32(self.face_groups.len() as u32)?;
        writer.write_u32_array(&self.face_groups)?;

        writer.write_tag(*b"PVTX")?;
        writer.write_u32(self.faces.len() as u32)?;
        writer.write_u16_array(&self.faces)?;

        writer.write_tag(*b"GNDX")?;
        writer.write_u32(self.vertex_groups.len() as u32)?;
        writer.write_bytes(&self.vertex_groups)?;

        writer.write_tag(*b"MTGC")?;
        writer.write_u32(self.matrix_groups.len() as u32)?;
        writer.write_u32_array(&self.matrix_groups)?;

        writer.write_tag(*b"MATS")?;
        writer.write_u32(self.matrix_indices.len() as u32)?;
        writer.write_u32_array(&self.matrix_indices)?;

        writer.write_u32(self.material_id)?;
        writer.write_u32(self.selection_group)?;
        writer.write_u32(self.selection_flags)?;

        if version > 800 {
            writer.write_i32(self.lod)?;
            writer.write_string_block(&self.lod_name, 80)?;
        }

        self.extent.write(writer)?;
        writer.write_u32(self.sequence_extents.len() as u32)?;
        for extent in &self.sequence_extents {
            extent.write(writer)?;
        }

        if version > 800 && !self.tangents.is_empty() {
            writer.write_tag(*b"TANG")?;
            writer.write_u32((self.tangents.len() / 4) as u32)?;
            writer.write_f32_array(&self.tangents)?;
        }
        if version > 800 && !self.skin.is_empty() {
            writer.write_tag(*b"SKIN")?;
            writer.write_u32(self.skin.len() as u32)?;
            writer.write_bytes(&self.skin)?;
        }

        writer.write_tag(*b"UVAS")?;
        writer.write_u32(self.uv_sets.len() as u32)?;
        for set in &self.uv_sets {
            writer.write_tag(*b"UVBS")?;
            writer.write_u32((set.len() / 2) as u32)?;
            writer.write_f32_array(set)?;
        }

        Ok(())
    }

    /// Exact serialized size for the given version.
    pub fn byte_len(&self, version: u32) -> usize {
        let mut size = 4; // inclusive size
        size += 8 + self.vertices.len() * 4;
        size += 8 + self.normals.len() * 4;
        size += 8 + self.face_type_groups.len() * 4;
        size += 8 + self.face_groups.len() * 4;
        size += 8 + self.faces.len() * 2;
        size += 8 + self.vertex_groups.len();
        size += 8 + self.matrix_groups.len() * 4;
        size += 8 + self.matrix_indices.len() * 4;
        size += 12;
        if version > 800 {
            size += 84;
            if !self.tangents.is_empty() {
                size += 8 + self.tangents.len() * 4;
            }
            if !self.skin.is_empty() {
                size += 8 + self.skin.len();
            }
        }
        size += Extent::BYTE_LEN + 4 + self.sequence_extents.len() * Extent::BYTE_LEN;
        size += 8;
        for set in &self.uv_sets {
            size += 8 + set.len() * 4;
        }
        size
    }

    /// Read the MDL `Geoset { ... }` body; the caller has consumed `Geoset`.
    pub fn read_mdl(stream: &mut TokenReader<'_>) -> Result<Self> {
        const RECORD: &str = "Geoset";

        let mut geoset = Self::default();
        stream.enter_block(RECORD)?;
        while let Some(key) = stream.block_key(RECORD)? {
            if geoset.extent.read_mdl_token(key, stream, RECORD)? {
                continue;
            }
            match key {
                "Vertices" => {
                    let count = stream.read_u32(RECORD)? as usize;
                    stream.read_vector_block(&mut geoset.vertices, count, 3, RECORD)?;
                }
                "Normals" => {
                    let count = stream.read_u32(RECORD)? as usize;
                    stream.read_vector_block(&mut geoset.normals, count, 3, RECORD)?;
                }
                "TVertices" => {
                    let count = stream.read_u32(RECORD)? as usize;
                    let mut set = Vec::new();
                    stream.read_vector_block(&mut set, count, 2, RECORD)?;
                    geoset.uv_sets.push(set);
                }
                "Tangents" => {
                    let count = stream.read_u32(RECORD)? as usize;
                    stream.read_vector_block(&mut geoset.tangents, count, 4, RECORD)?;
                }
                "SkinWeights" => {
                    let count = stream.read_u32(RECORD)? as usize;
                    stream.enter_block(RECORD)?;
                    geoset.skin.reserve(count * 8);
                    for _ in 0..count * 8 {
                        geoset.skin.push(stream.read_u32(RECORD)? as u8);
                    }
                    stream.expect("}", RECORD)?;
                }
                "VertexGroup" => {
                    stream.enter_block(RECORD)?;
                    while let Some(token) = stream.block_key(RECORD)? {
                        let group = token
                            .parse::<u8>()
                            .map_err(|_| Error::bad_token(token, RECORD))?;
                        geoset.vertex_groups.push(group);
                    }
                }
                "Faces" => {
                    // Written as one triangle group holding all indices.
                    let _groups = stream.read_u32(RECORD)?;
                    let count = stream.read_u32(RECORD)? as usize;
                    stream.enter_block(RECORD)?;
                    stream.expect("Triangles", RECORD)?;
                    stream.enter_block(RECORD)?;
                    stream.enter_block(RECORD)?;
                    geoset.faces.reserve(count);
                    for _ in 0..count {
                        geoset.faces.push(stream.read_u32(RECORD)? as u16);
                    }
                    stream.expect("}", RECORD)?;
                    stream.expect("}", RECORD)?;
                    stream.expect("}", RECORD)?;
                    geoset.face_type_groups = vec![4];
                    geoset.face_groups = vec![count as u32];
                }
                "Groups" => {
                    let group_count = stream.read_u32(RECORD)? as usize;
                    let _total = stream.read_u32(RECORD)?;
                    stream.enter_block(RECORD)?;
                    for _ in 0..group_count {
                        stream.expect("Matrices", RECORD)?;
                        stream.enter_block(RECORD)?;
                        let mut len = 0u32;
                        while let Some(token) = stream.block_key(RECORD)? {
                            let index = token
                                .parse::<u32>()
                                .map_err(|_| Error::bad_token(token, RECORD))?;
                            geoset.matrix_indices.push(index);
                            len += 1;
                        }
                        geoset.matrix_groups.push(len);
                    }
                    stream.expect("}", RECORD)?;
                }
                "Anim" => {
                    let mut extent = Extent::default();
                    stream.enter_block(RECORD)?;
                    while let Some(token) = stream.block_key(RECORD)? {
                        if !extent.read_mdl_token(token, stream, RECORD)? {
                            return Err(Error::bad_token(token, RECORD));
                        }
                    }
                    geoset.sequence_extents.push(extent);
                }
                "MaterialID" => geoset.material_id = stream.read_u32(RECORD)?,
                "SelectionGroup" => geoset.selection_group = stream.read_u32(RECORD)?,
                "Unselectable" => geoset.selection_flags |= Self::UNSELECTABLE,
                "LevelOfDetail" => geoset.lod = stream.read_i32(RECORD)?,
                "Name" => geoset.lod_name = stream.word(RECORD)?.to_string(),
                other => return Err(Error::bad_token(other, RECORD)),
            }
        }
        Ok(geoset)
    }

    /// Write the MDL form.
    pub fn write_mdl(&self, writer: &mut TokenWriter, version: u32) {
        writer.start_block("Geoset");

        writer.start_counted_block("Vertices", self.vertices.len() / 3);
        for vertex in self.vertices.chunks_exact(3) {
            writer.vector(vertex);
        }
        writer.end_block();

        writer.start_counted_block("Normals", self.normals.len() / 3);
        for normal in self.normals.chunks_exact(3) {
            writer.vector(normal);
        }
        writer.end_block();

        for set in &self.uv_sets {
            writer.start_counted_block("TVertices", set.len() / 2);
            for uv in set.chunks_exact(2) {
                writer.vector(uv);
            }
            writer.end_block();
        }

        if version > 800 && !self.tangents.is_empty() {
            writer.start_counted_block("Tangents", self.tangents.len() / 4);
            for tangent in self.tangents.chunks_exact(4) {
                writer.vector(tangent);
            }
            writer.end_block();
        }
        if version > 800 && !self.skin.is_empty() {
            writer.start_counted_block("SkinWeights", self.skin.len() / 8);
            for weights in self.skin.chunks(8) {
                let joined = weights
                    .iter()
                    .map(u8::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                writer.line(&format!("{},", joined));
            }
            writer.end_block();
        }

        writer.start_block("VertexGroup");
        for group in &self.vertex_groups {
            writer.line(&format!("{},", group));
        }
        writer.end_block();

        writer.start_raw_block(&format!("Faces 1 {}", self.faces.len()));
        writer.start_block("Triangles");
        let joined = self
            .faces
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        writer.line(&format!("{{ {} }},", joined));
        writer.end_block();
        writer.end_block();

        writer.start_raw_block(&format!(
            "Groups {} {}",
            self.matrix_groups.len(),
            self.matrix_indices.len()
        ));
        let mut offset = 0usize;
        for &len in &self.matrix_groups {
            let group = &self.matrix_indices[offset..offset + len as usize];
            let joined = group
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            writer.line(&format!("Matrices {{ {} }},", joined));
            offset += len as usize;
        }
        writer.end_block();

        self.extent.write_mdl(writer);
        for extent in &self.sequence_extents {
            writer.start_block("Anim");
            extent.write_mdl(writer);
            writer.end_block();
        }

        writer.attrib("MaterialID", self.material_id);
        writer.attrib("SelectionGroup", self.selection_group);
        if self.selection_flags & Self::UNSELECTABLE != 0 {
            writer.flag("Unselectable");
        }
        if version > 800 {
            writer.attrib("LevelOfDetail", self.lod);
            writer.quoted("Name", &self.lod_name);
        }

        writer.end_block();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Geoset {
        Geoset {
            vertices: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            normals: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            face_type_groups: vec![4],
            face_groups: vec![3],
            faces: vec![0, 1, 2],
            vertex_groups: vec![0, 0, 1],
            matrix_groups: vec![1, 2],
            matrix_indices: vec![0, 0, 1],
            material_id: 2,
            selection_group: 0,
            selection_flags: 4,
            lod: 0,
            lod_name: "High".to_string(),
            extent: Extent {
                bounds_radius: 1.5,
                min: [0.0; 3],
                max: [1.0, 1.0, 0.0],
            },
            sequence_extents: vec![Extent::default(), Extent::default()],
            tangents: vec![0.0; 12],
            skin: vec![0, 1, 0, 0, 128, 127, 0, 0, 0, 1, 0, 0, 128, 127, 0, 0, 0, 1, 0, 0, 128, 127, 0, 0],
            uv_sets: vec![vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0]],
        }
    }

    fn roundtrip(geoset: &Geoset, version: u32) -> Geoset {
        let mut buffer = vec![0u8; geoset.byte_len(version)];
        geoset
            .write(&mut BinaryWriter::new(&mut buffer), version)
            .unwrap();
        let mut reader = BinaryReader::new(&buffer);
        let parsed = Geoset::read(&mut reader, version).unwrap();
        assert!(reader.is_empty(), "byte_len drifted from write");
        parsed
    }

    #[test]
    fn test_binary_roundtrip_v1000() {
        let geoset = sample();
        assert_eq!(roundtrip(&geoset, 1000), geoset);
    }

    #[test]
    fn test_v800_drops_reforged_fields() {
        let geoset = sample();
        let parsed = roundtrip(&geoset, 800);

        assert!(parsed.tangents.is_empty());
        assert!(parsed.skin.is_empty());
        assert_eq!(parsed.lod_name, "");
        // Everything else survives.
        assert_eq!(parsed.vertices, geoset.vertices);
        assert_eq!(parsed.faces, geoset.faces);
        assert_eq!(parsed.uv_sets, geoset.uv_sets);
    }

    #[test]
    fn test_mdl_roundtrip() {
        let geoset = sample();
        let mut writer = TokenWriter::new();
        geoset.write_mdl(&mut writer, 1000);
        let text = writer.finish();

        let mut stream = TokenReader::new(&text);
        assert_eq!(stream.next(), Some("Geoset"));
        let parsed = Geoset::read_mdl(&mut stream).unwrap();
        assert_eq!(parsed, geoset);
    }

    #[test]
    fn test_empty_sublists_byte_len() {
        let geoset = Geoset::default();
        let expected = 4 + 8 * 8 + 12 + 28 + 4 + 8;
        assert_eq!(geoset.byte_len(800), expected);
        assert_eq!(roundtrip(&geoset, 800), geoset);
    }
}
