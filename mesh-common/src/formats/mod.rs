//! Engine geometry binary formats
//!
//! POD formats - no magic bytes. A geometry file holds a small file header
//! (version, mesh count, material names) followed by one mesh block per
//! submesh. All mesh blocks share the fixed-size [`MeshBlockHeader`].

mod error;
pub mod geometry;
pub mod mesh;

pub use error::FormatError;
pub use geometry::*;
pub use mesh::*;
