//! Shared types for the engine geometry block format
//!
//! This crate is shared between:
//! - `dae-export` (asset pipeline, writes blocks)
//! - runtime loaders and tooling (read blocks back)
//!
//! # Modules
//!
//! - [`packing`] - Little-endian scalar packers and a bounds-checked byte reader
//! - [`formats`] - Geometry file and mesh block layouts

pub mod formats;
pub mod packing;

pub use formats::{
    FormatError, GEOMETRY_FORMAT_VERSION, GeometryFile, IDENTITY_MATRIX, IndexFormat, MeshBlock,
    MeshBlockHeader, NO_MATERIAL, U16_INDEX_LIMIT,
};
pub use packing::{
    ByteReader, pack_f32, pack_f32_slice, pack_i32, pack_parsable_string, pack_u16, pack_u32,
};
