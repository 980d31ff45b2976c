//! Coordinate-space correction
//!
//! Authoring tools disagree on the up axis. A [`CoordinateSpace`] maps the
//! source convention to the engine's Y-up space; the strategy is picked by
//! [`ConvertConfig::coordinate_space`](crate::ConvertConfig::coordinate_space).

use glam::{Mat4, Vec4};

use crate::mesh::AttributeSlot;

pub trait CoordinateSpace {
    /// Remap one `(x, y, z, w)` record
    fn correct_vector(&self, v: [f32; 4]) -> [f32; 4];

    /// Remap a transform so it acts on corrected vectors
    fn correct_matrix(&self, m: Mat4) -> Mat4;

    /// Correct a record written into `slot`; only geometric slots are remapped
    fn correct_record(&self, slot: AttributeSlot, v: [f32; 4]) -> [f32; 4] {
        if slot.is_geometric() {
            self.correct_vector(v)
        } else {
            v
        }
    }

    /// Correct a row-major 4x4 matrix as stored in the source text
    fn correct_row_major(&self, m: &[f32; 16]) -> [f32; 16] {
        let matrix = Mat4::from_cols_array(m).transpose();
        self.correct_matrix(matrix).transpose().to_cols_array()
    }
}

/// Source already matches the engine convention
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeSpace;

impl CoordinateSpace for NativeSpace {
    fn correct_vector(&self, v: [f32; 4]) -> [f32; 4] {
        v
    }

    fn correct_matrix(&self, m: Mat4) -> Mat4 {
        m
    }
}

/// Z-up source: `(x, y, z) -> (x, z, -y)`
#[derive(Debug, Clone, Copy, Default)]
pub struct ZUpSpace;

impl ZUpSpace {
    fn basis() -> Mat4 {
        Mat4::from_cols(
            Vec4::new(1.0, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 0.0, -1.0, 0.0),
            Vec4::new(0.0, 1.0, 0.0, 0.0),
            Vec4::W,
        )
    }
}

impl CoordinateSpace for ZUpSpace {
    fn correct_vector(&self, v: [f32; 4]) -> [f32; 4] {
        [v[0], v[2], -v[1], v[3]]
    }

    fn correct_matrix(&self, m: Mat4) -> Mat4 {
        let basis = Self::basis();
        basis * m * basis.transpose()
    }
}
