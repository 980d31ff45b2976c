//! Geometry export library
//!
//! Converts COLLADA-style mesh trees into engine geometry blocks: one
//! interleaved vertex buffer per submesh with a fixed attribute layout, a
//! triangle index buffer, bounding extents and optional four-influence
//! skinning data.
//!
//! The document is handed over as an already parsed [`Node`] tree. Writing
//! the resulting blocks to disk is left to the caller.

pub mod config;
pub mod coords;
pub mod error;
pub mod geometry;
pub mod mesh;
pub mod node;
pub mod output;
pub mod skin;
pub mod source;

pub use config::{AuthoringTool, ControllerLookup, ConvertConfig, UpAxis};
pub use coords::{CoordinateSpace, NativeSpace, ZUpSpace};
pub use error::ConvertError;
pub use geometry::{GeometryContainer, convert_geometry};
pub use mesh::{AttributeSlot, Extents, IndexBuffer, Mesh, MeshBuilder};
pub use node::Node;
pub use output::{
    ConversionSummary, ExportContext, GeometryEntry, GeometryFailure, OutputFile,
    write_geometry_block,
};
pub use skin::{SkinBinding, find_skin_controller, resolve_influences};
