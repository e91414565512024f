//! Collision shapes used for hit testing.

use veles_common::{BinaryReader, BinaryWriter};

use crate::tokens::{TokenReader, TokenWriter};
use crate::{Error, Result};

use super::Node;

/// Shape geometry of a collision record.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Cube { vertices: [[f32; 3]; 2] },
    Plane { vertices: [[f32; 3]; 2] },
    Sphere { center: [f32; 3], radius: f32 },
    Cylinder { vertices: [[f32; 3]; 2], radius: f32 },
}

impl Default for Shape {
    fn default() -> Self {
        Self::Cube {
            vertices: [[0.0; 3]; 2],
        }
    }
}

impl Shape {
    fn type_id(&self) -> u32 {
        match self {
            Self::Cube { .. } => 0,
            Self::Plane { .. } => 1,
            Self::Sphere { .. } => 2,
            Self::Cylinder { .. } => 3,
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            Self::Cube { .. } => "Box",
            Self::Plane { .. } => "Plane",
            Self::Sphere { .. } => "Sphere",
            Self::Cylinder { .. } => "Cylinder",
        }
    }

    /// Vertex count plus optional radius, in bytes, after the type field.
    fn byte_len(&self) -> usize {
        match self {
            Self::Cube { .. } | Self::Plane { .. } => 24,
            Self::Sphere { .. } => 16,
            Self::Cylinder { .. } => 28,
        }
    }
}

/// One collision shape (`CLID` chunk record): a node, a shape type, and
/// the vertices that describe it.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionShape {
    pub node: Node,
    pub shape: Shape,
}

impl Default for CollisionShape {
    fn default() -> Self {
        Self {
            node: Node::with_flags(Self::KIND),
            shape: Shape::default(),
        }
    }
}

impl CollisionShape {
    /// Object-kind bit in node flags.
    pub const KIND: u32 = 0x2000;

    /// Read one collision shape record.
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let node = Node::read(reader)?;
        let type_id = reader.read_u32()?;
        let shape = match type_id {
            0 => Shape::Cube {
                vertices: [reader.read_f32_3()?, reader.read_f32_3()?],
            },
            1 => Shape::Plane {
                vertices: [reader.read_f32_3()?, reader.read_f32_3()?],
            },
            2 => Shape::Sphere {
                center: reader.read_f32_3()?,
                radius: reader.read_f32()?,
            },
            3 => Shape::Cylinder {
                vertices: [reader.read_f32_3()?, reader.read_f32_3()?],
                radius: reader.read_f32()?,
            },
            other => {
                return Err(Error::bad_token(other.to_string(), "CollisionShape"));
            }
        };
        Ok(Self { node, shape })
    }

    /// Write one collision shape record.
    pub fn write(&self, writer: &mut BinaryWriter<'_>) -> Result<()> {
        self.node.write(writer)?;
        writer.write_u32(self.shape.type_id())?;
        match &self.shape {
            Shape::Cube { vertices } | Shape::Plane { vertices } => {
                writer.write_f32_array(&vertices[0])?;
                writer.write_f32_array(&vertices[1])?;
            }
            Shape::Sphere { center, radius } => {
                writer.write_f32_array(center)?;
                writer.write_f32(*radius)?;
            }
            Shape::Cylinder { vertices, radius } => {
                writer.write_f32_array(&vertices[0])?;
                writer.write_f32_array(&vertices[1])?;
                writer.write_f32(*radius)?;
            }
        }
        Ok(())
    }

    /// Exact serialized size.
    pub fn byte_len(&self) -> usize {
        self.node.byte_len() + 4 + self.shape.byte_len()
    }

    /// Read the MDL `CollisionShape "name" { ... }` form; the caller has
    /// consumed `CollisionShape`.
    pub fn read_mdl(stream: &mut TokenReader<'_>) -> Result<Self> {
        const RECORD: &str = "CollisionShape";

        let mut collision = Self::default();
        collision.node.name = stream.word(RECORD)?.to_string();

        let mut vertices: Vec<[f32; 3]> = Vec::new();
        let mut keyword = "Box";
        let mut radius = 0.0f32;

        stream.enter_block(RECORD)?;
        while let Some(key) = stream.block_key(RECORD)? {
            if collision.node.read_mdl_token(key, stream, RECORD)? {
                continue;
            }
            match key {
                "Box" | "Plane" | "Sphere" | "Cylinder" => keyword = key,
                "Vertices" => {
                    let count = stream.read_u32(RECORD)? as usize;
                    stream.enter_block(RECORD)?;
                    for _ in 0..count {
                        let mut vertex = [0.0f32; 3];
                        stream.read_f32_block(&mut vertex, RECORD)?;
                        vertices.push(vertex);
                    }
                    stream.expect("}", RECORD)?;
                }
                "BoundsRadius" => radius = stream.read_f32(RECORD)?,
                other => return Err(Error::bad_token(other, RECORD)),
            }
        }

        let pair = |vertices: &[[f32; 3]]| -> [[f32; 3]; 2] {
            [
                vertices.first().copied().unwrap_or_default(),
                vertices.get(1).copied().unwrap_or_default(),
            ]
        };
        collision.shape = match keyword {
            "Box" => Shape::Cube {
                vertices: pair(&vertices),
            },
            "Plane" => Shape::Plane {
                vertices: pair(&vertices),
            },
            "Sphere" => Shape::Sphere {
                center: vertices.first().copied().unwrap_or_default(),
                radius,
            },
            _ => Shape::Cylinder {
                vertices: pair(&vertices),
                radius,
            },
        };
        Ok(collision)
    }

    /// Write the MDL form.
    pub fn write_mdl(&self, writer: &mut TokenWriter) {
        writer.start_named_block("CollisionShape", &self.node.name);
        self.node.write_mdl_header(writer);
        writer.flag(self.shape.keyword());
        match &self.shape {
            Shape::Cube { vertices } | Shape::Plane { vertices } => {
                writer.start_counted_block("Vertices", 2);
                writer.vector(&vertices[0]);
                writer.vector(&vertices[1]);
                writer.end_block();
            }
            Shape::Sphere { center, radius } => {
                writer.start_counted_block("Vertices", 1);
                writer.vector(center);
                writer.end_block();
                writer.attrib("BoundsRadius", radius);
            }
            Shape::Cylinder { vertices, radius } => {
                writer.start_counted_block("Vertices", 2);
                writer.vector(&vertices[0]);
                writer.vector(&vertices[1]);
                writer.end_block();
                writer.attrib("BoundsRadius", radius);
            }
        }
        self.node.write_mdl_tracks(writer);
        writer.end_block();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_roundtrip_sphere() {
        let mut collision = CollisionShape::default();
        collision.node.name = "HitSphere".to_string();
        collision.shape = Shape::Sphere {
            center: [0.0, 0.0, 60.0],
            radius: 40.0,
        };

        let mut buffer = vec![0u8; collision.byte_len()];
        collision.write(&mut BinaryWriter::new(&mut buffer)).unwrap();

        let mut reader = BinaryReader::new(&buffer);
        let parsed = CollisionShape::read(&mut reader).unwrap();
        assert_eq!(parsed, collision);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_binary_roundtrip_cylinder() {
        let mut collision = CollisionShape::default();
        collision.shape = Shape::Cylinder {
            vertices: [[0.0, 0.0, 0.0], [0.0, 0.0, 100.0]],
            radius: 25.0,
        };

        let mut buffer = vec![0u8; collision.byte_len()];
        collision.write(&mut BinaryWriter::new(&mut buffer)).unwrap();
        let parsed = CollisionShape::read(&mut BinaryReader::new(&buffer)).unwrap();
        assert_eq!(parsed, collision);
    }

    #[test]
    fn test_mdl_roundtrip_box() {
        let mut collision = CollisionShape::default();
        collision.node.name = "HitBox".to_string();
        collision.shape = Shape::Cube {
            vertices: [[-32.0, -32.0, 0.0], [32.0, 32.0, 128.0]],
        };

        let mut writer = TokenWriter::new();
        collision.write_mdl(&mut writer);
        let text = writer.finish();

        let mut stream = TokenReader::new(&text);
        assert_eq!(stream.next(), Some("CollisionShape"));
        assert_eq!(CollisionShape::read_mdl(&mut stream).unwrap(), collision);
    }
}
