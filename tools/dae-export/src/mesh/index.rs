//! Index buffer generation and bounding extents

use mesh_common::IndexFormat;

/// Triangle list indices with the element width the loader should use
#[derive(Debug, Clone, PartialEq)]
pub struct IndexBuffer {
    pub format: IndexFormat,
    pub indices: Vec<u32>,
}

impl IndexBuffer {
    /// Indices for unshared corners with the winding reversed
    ///
    /// Every consecutive corner triple `(i, i+1, i+2)` becomes
    /// `(i+2, i+1, i)`. The up-axis remap flips handedness, so front faces
    /// keep their orientation.
    pub fn rewound(vertex_count: usize) -> Self {
        let mut indices = Vec::with_capacity(vertex_count);
        for i in (0..vertex_count as u32).step_by(3) {
            indices.extend_from_slice(&[i + 2, i + 1, i]);
        }
        Self {
            format: IndexFormat::for_vertex_count(vertex_count),
            indices,
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Axis-aligned bounds of a mesh's positions
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Extents {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Extents {
    pub fn from_point(p: [f32; 3]) -> Self {
        Self { min: p, max: p }
    }

    pub fn grow(&mut self, p: [f32; 3]) {
        for i in 0..3 {
            if p[i] <= self.min[i] {
                self.min[i] = p[i];
            }
            if p[i] >= self.max[i] {
                self.max[i] = p[i];
            }
        }
    }

    /// Grow `extents`, starting from `p` when nothing was recorded yet
    pub fn include(extents: &mut Option<Extents>, p: [f32; 3]) {
        match extents {
            Some(e) => e.grow(p),
            None => *extents = Some(Self::from_point(p)),
        }
    }
}
