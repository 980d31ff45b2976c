//! Canonical vertex attribute slots

use crate::error::ConvertError;

/// Vertex attribute slot, in canonical interleave order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeSlot {
    Position,
    Normal,
    TexCoord0,
    TexCoord1,
    Tangent,
    Binormal,
    BlendIndices,
    BlendWeights,
}

impl AttributeSlot {
    pub const COUNT: usize = 8;

    pub const ALL: [AttributeSlot; Self::COUNT] = [
        Self::Position,
        Self::Normal,
        Self::TexCoord0,
        Self::TexCoord1,
        Self::Tangent,
        Self::Binormal,
        Self::BlendIndices,
        Self::BlendWeights,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Required slots are zero-filled when the source has no data for them
    pub const fn is_required(self) -> bool {
        !matches!(self, Self::BlendIndices | Self::BlendWeights)
    }

    /// Slots holding directions or positions, subject to coordinate correction
    pub const fn is_geometric(self) -> bool {
        matches!(
            self,
            Self::Position | Self::Normal | Self::Tangent | Self::Binormal
        )
    }

    /// Map a source semantic and set to its slot
    pub fn from_semantic(semantic: &str, set: Option<u32>) -> Result<Self, ConvertError> {
        let slot = match (semantic, set) {
            ("POSITION", _) => Self::Position,
            ("NORMAL", _) => Self::Normal,
            ("TEXCOORD", None | Some(0)) => Self::TexCoord0,
            ("TEXCOORD", Some(1)) => Self::TexCoord1,
            ("TEXTANGENT" | "TANGENT", _) => Self::Tangent,
            ("TEXBINORMAL" | "BINORMAL", _) => Self::Binormal,
            _ => {
                return Err(ConvertError::UnsupportedSemantic {
                    semantic: semantic.to_string(),
                    set,
                });
            }
        };
        Ok(slot)
    }
}

/// Per-slot record streams for one mesh under construction
#[derive(Debug, Clone, Default)]
pub struct SlotStreams {
    streams: [Vec<[f32; 4]>; AttributeSlot::COUNT],
}

impl SlotStreams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, slot: AttributeSlot, record: [f32; 4]) {
        self.streams[slot.index()].push(record);
    }

    pub fn get(&self, slot: AttributeSlot) -> &[[f32; 4]] {
        &self.streams[slot.index()]
    }

    pub fn len(&self, slot: AttributeSlot) -> usize {
        self.streams[slot.index()].len()
    }

    pub fn is_empty(&self, slot: AttributeSlot) -> bool {
        self.streams[slot.index()].is_empty()
    }

    /// Fill an empty slot with `count` zero records
    pub fn zero_fill(&mut self, slot: AttributeSlot, count: usize) {
        self.streams[slot.index()] = vec![[0.0; 4]; count];
    }

    pub fn take(&mut self, slot: AttributeSlot) -> Vec<[f32; 4]> {
        std::mem::take(&mut self.streams[slot.index()])
    }
}
