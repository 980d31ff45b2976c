//! Mesh building (source streams -> interleaved vertex buffer + indices)

mod builder;
mod index;
mod slots;
mod types;

pub use builder::MeshBuilder;
pub use index::{Extents, IndexBuffer};
pub use slots::{AttributeSlot, SlotStreams};
pub use types::Mesh;
