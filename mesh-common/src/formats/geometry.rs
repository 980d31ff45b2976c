//! Geometry file format
//!
//! One file per authored geometry, holding every submesh of it.
//!
//! # Layout
//! ```text
//! 0x00: format_version i32
//! 0x04: mesh_count i32
//! 0x08: material names, mesh_count parsable strings ("none" when unnamed)
//! var:  mesh blocks, mesh_count times (see `mesh`)
//! ```

use super::{FormatError, MeshBlock};
use crate::packing::{ByteReader, pack_i32, pack_parsable_string};

/// Current geometry format version
pub const GEOMETRY_FORMAT_VERSION: i32 = 1;

/// Material name written for submeshes without a material
pub const NO_MATERIAL: &str = "none";

/// A decoded (or about to be encoded) geometry file
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryFile {
    pub version: i32,
    /// One name per mesh, parallel to `meshes`
    pub materials: Vec<String>,
    pub meshes: Vec<MeshBlock>,
}

impl GeometryFile {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        pack_i32(&mut out, self.version);
        pack_i32(&mut out, self.meshes.len() as i32);
        for material in &self.materials {
            pack_parsable_string(&mut out, material);
        }
        for mesh in &self.meshes {
            mesh.write(&mut out);
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        let mut r = ByteReader::new(bytes);
        let version = r.read_i32()?;
        let mesh_count = r.read_count("mesh_count")?;

        let materials = (0..mesh_count)
            .map(|_| r.read_parsable_string())
            .collect::<Result<Vec<_>, _>>()?;
        let meshes = (0..mesh_count)
            .map(|_| MeshBlock::read(&mut r))
            .collect::<Result<Vec<_>, _>>()?;

        if r.remaining() != 0 {
            return Err(FormatError::TrailingBytes(r.remaining()));
        }

        Ok(Self {
            version,
            materials,
            meshes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{IDENTITY_MATRIX, IndexFormat, MeshBlockHeader};

    fn triangle_block() -> MeshBlock {
        MeshBlock {
            header: MeshBlockHeader {
                min_extent: [0.0, 0.0, 0.0],
                max_extent: [1.0, 1.0, 0.0],
                vertex_count: 3,
                index_format: IndexFormat::U16,
                position_float_count: 12,
                vertex_buffer_float_count: 12,
                index_count: 3,
                collision_float_count: 0,
                skinned: false,
                joint_bind_float_count: 0,
                bind_shape_matrix: IDENTITY_MATRIX,
            },
            joint_bind_matrices: Vec::new(),
            position_buffer: vec![
                0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0,
            ],
            vertex_buffer: vec![
                0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0,
            ],
            index_buffer: vec![2, 1, 0],
            collision_vertices: Vec::new(),
        }
    }

    #[test]
    fn test_geometry_file_roundtrip() {
        let file = GeometryFile {
            version: GEOMETRY_FORMAT_VERSION,
            materials: vec!["brick".to_string(), NO_MATERIAL.to_string()],
            meshes: vec![triangle_block(), triangle_block()],
        };
        let bytes = file.to_bytes();
        assert_eq!(&bytes[0..4], &GEOMETRY_FORMAT_VERSION.to_le_bytes());
        assert_eq!(&bytes[4..8], &2i32.to_le_bytes());

        let parsed = GeometryFile::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, file);
        assert_eq!(parsed.to_bytes(), bytes);
    }

    #[test]
    fn test_geometry_file_truncated() {
        let file = GeometryFile {
            version: GEOMETRY_FORMAT_VERSION,
            materials: vec![NO_MATERIAL.to_string()],
            meshes: vec![triangle_block()],
        };
        let bytes = file.to_bytes();
        let err = GeometryFile::from_bytes(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, FormatError::Truncated { .. }));
    }

    #[test]
    fn test_geometry_file_trailing_bytes() {
        let file = GeometryFile {
            version: GEOMETRY_FORMAT_VERSION,
            materials: Vec::new(),
            meshes: Vec::new(),
        };
        let mut bytes = file.to_bytes();
        bytes.extend_from_slice(&[0, 0]);
        assert_eq!(
            GeometryFile::from_bytes(&bytes),
            Err(FormatError::TrailingBytes(2))
        );
    }
}
