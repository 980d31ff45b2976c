//! Built mesh

use super::{Extents, IndexBuffer};

/// One submesh, fully built and ready to serialize
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub material: Option<String>,
    /// Position records only, one per corner
    pub positions: Vec<[f32; 4]>,
    /// Interleaved records, `record_width` floats per corner
    pub vertex_buffer: Vec<f32>,
    pub record_width: usize,
    pub index_buffer: IndexBuffer,
    pub extents: Extents,
    /// Not produced by the converter, kept for the block layout
    pub collision_vertices: Vec<f32>,
    pub skinned: bool,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Flattened position-only buffer
    pub fn position_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Interleaved record for one corner
    pub fn record(&self, corner: usize) -> &[f32] {
        let start = corner * self.record_width;
        &self.vertex_buffer[start..start + self.record_width]
    }
}
