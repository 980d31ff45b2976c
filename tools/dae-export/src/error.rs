//! Conversion errors
//!
//! Every variant is fatal for the geometry being converted. Recoverable
//! conditions (mismatched stream lengths, excess bone influences) are
//! reported through `tracing` instead.

/// Error raised while converting one geometry
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConvertError {
    /// A source id that names neither a float source nor a vertex declaration
    #[error("unresolved source reference '#{0}'")]
    UnresolvedSource(String),

    /// A semantic that has no attribute slot
    #[error("unsupported vertex semantic '{semantic}' (set {set:?})")]
    UnsupportedSemantic { semantic: String, set: Option<u32> },

    /// Accessor stride outside 1..=4
    #[error("source '{source_id}' has unsupported stride {stride} (must be 1-4)")]
    UnsupportedStride { source_id: String, stride: usize },

    /// Numeric text that does not parse
    #[error("invalid number '{token}' in <{element}>")]
    InvalidNumber { element: String, token: String },

    /// Index stream shorter than its inputs require
    #[error("malformed index stream: {0}")]
    MalformedIndexStream(String),

    /// A corner references a record past the end of its source
    #[error("index {index} out of range for source '{source_id}' ({records} records)")]
    SourceIndexOutOfRange {
        source_id: String,
        index: usize,
        records: usize,
    },

    /// Skin weight index past the end of the weight table
    #[error("weight index {index} out of range ({count} weights) at vertex {vertex}")]
    WeightIndexOutOfRange {
        vertex: usize,
        /// As stored in the stream, possibly negative
        index: i32,
        count: usize,
    },

    /// Attribute records were written but no positions
    #[error("mesh has attribute data but no POSITION stream")]
    MissingPositions,

    /// Polylist with a polygon that is not a triangle
    #[error("polylist polygon {polygon} has {vertices} vertices (only triangles are supported)")]
    NonTriangulatedPolygon { polygon: usize, vertices: u32 },

    /// Required child element missing
    #[error("<{parent}> is missing required <{child}>")]
    MissingElement { parent: String, child: String },

    /// Matrix text with the wrong number of values
    #[error("<{element}> holds {count} floats, expected a multiple of 16")]
    InvalidMatrix { element: String, count: usize },
}
