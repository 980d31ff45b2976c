//! Typed extraction of a `<mesh>` element
//!
//! Runs once per mesh, right after parsing, and turns the element tree into
//! float sources, vertex declarations and primitive blocks. Everything
//! downstream works on these types only.

use hashbrown::HashMap;

use crate::error::ConvertError;
use crate::node::Node;

/// Named array of floats with a fixed record width
#[derive(Debug, Clone, PartialEq)]
pub struct FloatSource {
    pub id: String,
    /// Floats per record, 1..=4
    pub stride: usize,
    pub values: Vec<f32>,
}

impl FloatSource {
    pub fn new(
        id: impl Into<String>,
        stride: usize,
        values: Vec<f32>,
    ) -> Result<Self, ConvertError> {
        let id = id.into();
        if !(1..=4).contains(&stride) {
            return Err(ConvertError::UnsupportedStride {
                source_id: id,
                stride,
            });
        }
        Ok(Self { id, stride, values })
    }

    pub fn record_count(&self) -> usize {
        self.values.len() / self.stride
    }

    /// Record `index` widened to 4 components, defaults `(0, 0, 0, 1)`
    pub fn record(&self, index: usize) -> Result<[f32; 4], ConvertError> {
        let start = index * self.stride;
        let values = self
            .values
            .get(start..start + self.stride)
            .ok_or_else(|| ConvertError::SourceIndexOutOfRange {
                source_id: self.id.clone(),
                index,
                records: self.record_count(),
            })?;

        let mut record = [0.0, 0.0, 0.0, 1.0];
        record[..self.stride].copy_from_slice(values);
        Ok(record)
    }
}

/// One `<input>`: a semantic bound to a source at an offset within a corner
#[derive(Debug, Clone, PartialEq)]
pub struct InputBinding {
    pub semantic: String,
    pub set: Option<u32>,
    /// Source id without the leading `#`
    pub source: String,
    pub offset: usize,
}

impl InputBinding {
    pub fn new(semantic: &str, source: &str, offset: usize) -> Self {
        Self {
            semantic: semantic.to_string(),
            set: None,
            source: source.trim_start_matches('#').to_string(),
            offset,
        }
    }

    pub fn with_set(mut self, set: u32) -> Self {
        self.set = Some(set);
        self
    }

    fn from_node(node: &Node) -> Result<Self, ConvertError> {
        let source = node.attr("source").ok_or_else(|| ConvertError::MissingElement {
            parent: "input".to_string(),
            child: "source".to_string(),
        })?;
        let set = node.attr_usize("set")?.map(|s| s as u32);
        Ok(Self {
            semantic: node.attr("semantic").unwrap_or_default().to_string(),
            set,
            source: source.trim_start_matches('#').to_string(),
            offset: node.attr_usize("offset")?.unwrap_or(0),
        })
    }
}

/// `<vertices>`: an alias that groups per-vertex inputs under one id
#[derive(Debug, Clone, PartialEq)]
pub struct VertexDeclaration {
    pub id: String,
    pub inputs: Vec<InputBinding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Triangles,
    Polylist,
}

/// One `<triangles>` or `<polylist>` block: a submesh
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveBlock {
    pub kind: PrimitiveKind,
    pub material: Option<String>,
    pub count: usize,
    pub inputs: Vec<InputBinding>,
    /// Flattened per-corner index stream
    pub indices: Vec<u32>,
    /// Vertices per polygon (polylist only)
    pub vcount: Vec<u32>,
}

impl PrimitiveBlock {
    /// Indices consumed per corner
    pub fn index_stride(&self) -> usize {
        self.inputs.iter().map(|i| i.offset + 1).max().unwrap_or(0)
    }

    pub fn corner_count(&self) -> usize {
        match self.index_stride() {
            0 => 0,
            stride => self.indices.len() / stride,
        }
    }

    fn from_node(kind: PrimitiveKind, node: &Node) -> Result<Self, ConvertError> {
        let inputs = node
            .descendants("input")
            .map(InputBinding::from_node)
            .collect::<Result<Vec<_>, _>>()?;

        let mut indices = Vec::new();
        for p in node.descendants("p") {
            indices.extend(p.uints()?);
        }

        let vcount = match node.first_descendant("vcount") {
            Some(v) => v.uints()?,
            None => Vec::new(),
        };

        Ok(Self {
            kind,
            material: node.attr("material").map(str::to_string),
            count: node.attr_usize("count")?.unwrap_or(0),
            inputs,
            indices,
            vcount,
        })
    }
}

/// What a source id resolves to
#[derive(Debug, Clone, Copy)]
pub enum SourceRef<'a> {
    Float(&'a FloatSource),
    Vertices(&'a VertexDeclaration),
}

/// Float sources and vertex declarations of one `<mesh>`
#[derive(Debug, Clone, Default)]
pub struct MeshSources {
    pub sources: HashMap<String, FloatSource>,
    pub vertices: Vec<VertexDeclaration>,
}

impl MeshSources {
    pub fn add_source(&mut self, source: FloatSource) {
        self.sources.insert(source.id.clone(), source);
    }

    /// Float sources win over vertex declarations sharing the same id
    pub fn resolve(&self, id: &str) -> Result<SourceRef<'_>, ConvertError> {
        if let Some(source) = self.sources.get(id) {
            return Ok(SourceRef::Float(source));
        }
        self.vertices
            .iter()
            .find(|v| v.id == id)
            .map(SourceRef::Vertices)
            .ok_or_else(|| ConvertError::UnresolvedSource(id.to_string()))
    }

    pub fn float_source(&self, id: &str) -> Result<&FloatSource, ConvertError> {
        self.sources
            .get(id)
            .ok_or_else(|| ConvertError::UnresolvedSource(id.to_string()))
    }
}

/// Collect every float source and vertex declaration below a `<mesh>`
pub fn extract_sources(mesh: &Node) -> Result<MeshSources, ConvertError> {
    let mut out = MeshSources::default();

    for src in mesh.descendants("source") {
        let Some(array) = src.first_descendant("float_array") else {
            continue;
        };
        let id = src.attr("id").unwrap_or_default();
        let stride = match src.first_descendant("accessor") {
            Some(accessor) => accessor.attr_usize("stride")?.unwrap_or(1),
            None => 1,
        };
        out.add_source(FloatSource::new(id, stride, array.floats()?)?);
    }

    for v in mesh.descendants("vertices") {
        let inputs = v
            .children_named("input")
            .map(InputBinding::from_node)
            .collect::<Result<Vec<_>, _>>()?;
        out.vertices.push(VertexDeclaration {
            id: v.attr("id").unwrap_or_default().to_string(),
            inputs,
        });
    }

    Ok(out)
}

/// Every `<polylist>` then every `<triangles>` block below a `<mesh>`
pub fn extract_primitives(mesh: &Node) -> Result<Vec<PrimitiveBlock>, ConvertError> {
    let polylists = mesh
        .descendants("polylist")
        .map(|n| PrimitiveBlock::from_node(PrimitiveKind::Polylist, n));
    let triangles = mesh
        .descendants("triangles")
        .map(|n| PrimitiveBlock::from_node(PrimitiveKind::Triangles, n));
    polylists.chain(triangles).collect()
}
