//! Mesh block binary format
//!
//! One block per submesh, appended after the geometry file header.
//!
//! # Layout
//! ```text
//! 0x00: min_extent f32[3]
//! 0x0C: max_extent f32[3]
//! 0x18: vertex_count i32
//! 0x1C: index_element_size i32 (2 or 4)
//! 0x20: position_float_count i32
//! 0x24: vertex_buffer_float_count i32
//! 0x28: index_count i32
//! 0x2C: collision_float_count i32
//! 0x30: skinned i32 (0/1)
//! 0x34: joint_bind_float_count i32
//! 0x38: bind_shape_matrix f32[16]
//! 0x78: joint_bind_matrices f32[joint_bind_float_count], if skinned
//! var:  position_buffer f32[position_float_count]
//! var:  vertex_buffer f32[vertex_buffer_float_count]
//! var:  index_buffer u16/u32[index_count]
//! var:  collision_vertices f32[collision_float_count]
//! ```
//!
//! Counts are written as `i32` and are never negative.

use super::FormatError;
use crate::packing::{ByteReader, pack_f32_slice, pack_i32, pack_u16, pack_u32};

/// Meshes with this many vertices or more need 32-bit indices
pub const U16_INDEX_LIMIT: usize = u16::MAX as usize;

/// Row-major 4x4 identity
pub const IDENTITY_MATRIX: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// Width of one index buffer element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    U16,
    U32,
}

impl IndexFormat {
    /// 16-bit when every index fits below 65535, otherwise 32-bit
    pub fn for_vertex_count(vertex_count: usize) -> Self {
        if vertex_count < U16_INDEX_LIMIT {
            Self::U16
        } else {
            Self::U32
        }
    }

    /// Element size in bytes
    pub const fn element_size(self) -> u32 {
        match self {
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }

    pub fn from_element_size(size: u32) -> Option<Self> {
        match size {
            2 => Some(Self::U16),
            4 => Some(Self::U32),
            _ => None,
        }
    }
}

/// Mesh block header (120 bytes)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshBlockHeader {
    pub min_extent: [f32; 3],
    pub max_extent: [f32; 3],
    pub vertex_count: u32,
    pub index_format: IndexFormat,
    /// Floats in the position-only buffer (4 per vertex)
    pub position_float_count: u32,
    /// Floats in the interleaved vertex buffer
    pub vertex_buffer_float_count: u32,
    pub index_count: u32,
    pub collision_float_count: u32,
    pub skinned: bool,
    pub joint_bind_float_count: u32,
    /// Row-major, already coordinate corrected
    pub bind_shape_matrix: [f32; 16],
}

impl MeshBlockHeader {
    pub const SIZE: usize = 120;

    /// Floats per interleaved vertex record, 0 for an empty mesh
    pub fn record_width(&self) -> u32 {
        if self.vertex_count == 0 {
            0
        } else {
            self.vertex_buffer_float_count / self.vertex_count
        }
    }

    /// Byte length of the data that follows the header
    pub fn body_size(&self) -> usize {
        let joint_floats = if self.skinned {
            self.joint_bind_float_count as usize
        } else {
            0
        };
        let floats = joint_floats
            + self.position_float_count as usize
            + self.vertex_buffer_float_count as usize
            + self.collision_float_count as usize;
        floats * 4 + self.index_count as usize * self.index_format.element_size() as usize
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = Vec::with_capacity(Self::SIZE);
        pack_f32_slice(&mut out, &self.min_extent);
        pack_f32_slice(&mut out, &self.max_extent);
        pack_i32(&mut out, self.vertex_count as i32);
        pack_i32(&mut out, self.index_format.element_size() as i32);
        pack_i32(&mut out, self.position_float_count as i32);
        pack_i32(&mut out, self.vertex_buffer_float_count as i32);
        pack_i32(&mut out, self.index_count as i32);
        pack_i32(&mut out, self.collision_float_count as i32);
        pack_i32(&mut out, self.skinned as i32);
        pack_i32(&mut out, self.joint_bind_float_count as i32);
        pack_f32_slice(&mut out, &self.bind_shape_matrix);

        let mut bytes = [0u8; Self::SIZE];
        bytes.copy_from_slice(&out);
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        Self::read(&mut ByteReader::new(bytes)).ok()
    }

    /// Read header fields, advancing the reader past them
    pub fn read(r: &mut ByteReader<'_>) -> Result<Self, FormatError> {
        let min_extent = [r.read_f32()?, r.read_f32()?, r.read_f32()?];
        let max_extent = [r.read_f32()?, r.read_f32()?, r.read_f32()?];
        let vertex_count = read_u32_count(r, "vertex_count")?;
        let element_size = read_u32_count(r, "index_element_size")?;
        let index_format = IndexFormat::from_element_size(element_size)
            .ok_or(FormatError::InvalidIndexSize(element_size))?;
        let position_float_count = read_u32_count(r, "position_float_count")?;
        let vertex_buffer_float_count = read_u32_count(r, "vertex_buffer_float_count")?;
        let index_count = read_u32_count(r, "index_count")?;
        let collision_float_count = read_u32_count(r, "collision_float_count")?;
        let skinned = r.read_i32()? != 0;
        let joint_bind_float_count = read_u32_count(r, "joint_bind_float_count")?;

        let mut bind_shape_matrix = [0.0f32; 16];
        for v in bind_shape_matrix.iter_mut() {
            *v = r.read_f32()?;
        }

        Ok(Self {
            min_extent,
            max_extent,
            vertex_count,
            index_format,
            position_float_count,
            vertex_buffer_float_count,
            index_count,
            collision_float_count,
            skinned,
            joint_bind_float_count,
            bind_shape_matrix,
        })
    }
}

fn read_u32_count(r: &mut ByteReader<'_>, field: &'static str) -> Result<u32, FormatError> {
    Ok(r.read_count(field)? as u32)
}

/// A complete mesh block: header plus buffers
#[derive(Debug, Clone, PartialEq)]
pub struct MeshBlock {
    pub header: MeshBlockHeader,
    /// Row-major 4x4 matrices, 16 floats per joint
    pub joint_bind_matrices: Vec<f32>,
    pub position_buffer: Vec<f32>,
    pub vertex_buffer: Vec<f32>,
    pub index_buffer: Vec<u32>,
    pub collision_vertices: Vec<f32>,
}

impl MeshBlock {
    /// Append header and body to `out`
    ///
    /// Header counts are taken as given; callers build them from the same
    /// buffers. Indices are narrowed to u16 when the header says so.
    pub fn write(&self, out: &mut Vec<u8>) {
        out.reserve(MeshBlockHeader::SIZE + self.header.body_size());
        out.extend_from_slice(&self.header.to_bytes());

        if self.header.skinned {
            pack_f32_slice(out, &self.joint_bind_matrices);
        }
        pack_f32_slice(out, &self.position_buffer);
        pack_f32_slice(out, &self.vertex_buffer);
        match self.header.index_format {
            IndexFormat::U16 => {
                for &i in &self.index_buffer {
                    pack_u16(out, i as u16);
                }
            }
            IndexFormat::U32 => {
                for &i in &self.index_buffer {
                    pack_u32(out, i);
                }
            }
        }
        pack_f32_slice(out, &self.collision_vertices);
    }

    /// Read one block, advancing the reader past it
    pub fn read(r: &mut ByteReader<'_>) -> Result<Self, FormatError> {
        let header = MeshBlockHeader::read(r)?;

        let joint_bind_matrices = if header.skinned {
            r.read_f32_vec(header.joint_bind_float_count as usize)?
        } else {
            Vec::new()
        };
        let position_buffer = r.read_f32_vec(header.position_float_count as usize)?;
        let vertex_buffer = r.read_f32_vec(header.vertex_buffer_float_count as usize)?;
        let element_size = header.index_format.element_size() as usize;
        let index_bytes = (header.index_count as usize)
            .checked_mul(element_size)
            .ok_or(FormatError::Overflow)?;
        let index_bytes = r.take(index_bytes)?;
        let index_buffer = match header.index_format {
            IndexFormat::U16 => index_bytes
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]) as u32)
                .collect(),
            IndexFormat::U32 => index_bytes
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        };
        let collision_vertices = r.read_f32_vec(header.collision_float_count as usize)?;

        Ok(Self {
            header,
            joint_bind_matrices,
            position_buffer,
            vertex_buffer,
            index_buffer,
            collision_vertices,
        })
    }
}
