//! Binary geometry blocks and the per-document output accumulator

use mesh_common::{GeometryFile, IDENTITY_MATRIX, MeshBlock, MeshBlockHeader, NO_MATERIAL};

use crate::config::ConvertConfig;
use crate::coords::CoordinateSpace;
use crate::error::ConvertError;
use crate::geometry::{GeometryContainer, convert_geometry};
use crate::mesh::Mesh;
use crate::node::Node;

/// Serialize a converted geometry
///
/// Returns `None` when the geometry produced no meshes; such geometries get
/// no output entry at all.
pub fn write_geometry_block(
    container: &GeometryContainer,
    config: &ConvertConfig,
    space: &dyn CoordinateSpace,
) -> Option<Vec<u8>> {
    if container.is_empty() {
        return None;
    }

    let (bind_shape_matrix, joint_bind_matrices) = match &container.skin {
        Some(skin) => (
            space.correct_row_major(&skin.bind_shape_matrix),
            correct_matrices(space, &skin.joint_bind_matrices),
        ),
        None => (IDENTITY_MATRIX, Vec::new()),
    };

    let file = GeometryFile {
        version: config.format_version,
        materials: container
            .materials()
            .map(|m| m.unwrap_or(NO_MATERIAL).to_string())
            .collect(),
        meshes: container
            .meshes
            .iter()
            .map(|mesh| mesh_block(mesh, bind_shape_matrix, &joint_bind_matrices))
            .collect(),
    };
    Some(file.to_bytes())
}

fn correct_matrices(space: &dyn CoordinateSpace, matrices: &[f32]) -> Vec<f32> {
    let mut out = Vec::with_capacity(matrices.len());
    for chunk in matrices.chunks_exact(16) {
        let mut m = [0.0f32; 16];
        m.copy_from_slice(chunk);
        out.extend_from_slice(&space.correct_row_major(&m));
    }
    out
}

fn mesh_block(
    mesh: &Mesh,
    bind_shape_matrix: [f32; 16],
    joint_bind_matrices: &[f32],
) -> MeshBlock {
    let joint_bind_matrices = if mesh.skinned {
        joint_bind_matrices.to_vec()
    } else {
        Vec::new()
    };
    let position_buffer = mesh.position_floats().to_vec();

    MeshBlock {
        header: MeshBlockHeader {
            min_extent: mesh.extents.min,
            max_extent: mesh.extents.max,
            vertex_count: mesh.vertex_count() as u32,
            index_format: mesh.index_buffer.format,
            position_float_count: position_buffer.len() as u32,
            vertex_buffer_float_count: mesh.vertex_buffer.len() as u32,
            index_count: mesh.index_buffer.len() as u32,
            collision_float_count: mesh.collision_vertices.len() as u32,
            skinned: mesh.skinned,
            joint_bind_float_count: joint_bind_matrices.len() as u32,
            bind_shape_matrix: if mesh.skinned {
                bind_shape_matrix
            } else {
                IDENTITY_MATRIX
            },
        },
        joint_bind_matrices,
        position_buffer,
        vertex_buffer: mesh.vertex_buffer.clone(),
        index_buffer: mesh.index_buffer.indices.clone(),
        collision_vertices: mesh.collision_vertices.clone(),
    }
}

/// One serialized geometry
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryEntry {
    pub name: String,
    pub data: Vec<u8>,
}

/// Serialized geometries of one document, in document order
#[derive(Debug, Clone, Default)]
pub struct OutputFile {
    pub entries: Vec<GeometryEntry>,
}

impl OutputFile {
    pub fn geometry_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Byte length of each block, parallel to `geometry_names`
    pub fn geometry_sizes(&self) -> Vec<usize> {
        self.entries.iter().map(|e| e.data.len()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.data.as_slice())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// A geometry that failed to convert
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryFailure {
    pub geometry: String,
    pub error: ConvertError,
}

/// Outcome of one `convert_document` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionSummary {
    pub converted: usize,
    /// Geometries with no primitive blocks
    pub empty: usize,
    pub failed: usize,
}

/// Conversion state for a run over one or more documents
///
/// Each `convert_document` call starts from an empty output; geometries are
/// converted one after another and a failure aborts only the geometry it
/// occurred in.
#[derive(Debug, Default)]
pub struct ExportContext {
    pub config: ConvertConfig,
    pub output: OutputFile,
    pub failures: Vec<GeometryFailure>,
}

impl ExportContext {
    pub fn new(config: ConvertConfig) -> Self {
        Self {
            config,
            output: OutputFile::default(),
            failures: Vec::new(),
        }
    }

    /// Convert one geometry with this context's settings
    pub fn convert_geometry(
        &self,
        geometry: &Node,
        controllers: Option<&Node>,
    ) -> Result<GeometryContainer, ConvertError> {
        let space = self.config.coordinate_space();
        convert_geometry(geometry, controllers, &self.config, space.as_ref())
    }

    /// Convert every `<geometry>` under `library_geometries`
    pub fn convert_document(&mut self, root: &Node) -> ConversionSummary {
        self.output.clear();
        self.failures.clear();

        let space = self.config.coordinate_space();
        let controllers = root.first_descendant("library_controllers");
        let mut summary = ConversionSummary::default();

        let Some(geometries) = root.first_descendant("library_geometries") else {
            tracing::warn!("Document has no library_geometries");
            return summary;
        };

        for geometry in geometries.children_named("geometry") {
            let label = geometry
                .attr("name")
                .or_else(|| geometry.attr("id"))
                .unwrap_or_default()
                .to_string();

            let container = match self.convert_geometry(geometry, controllers) {
                Ok(container) => container,
                Err(error) => {
                    tracing::error!("Failed to convert geometry '{}': {}", label, error);
                    self.failures.push(GeometryFailure {
                        geometry: label,
                        error,
                    });
                    summary.failed += 1;
                    continue;
                }
            };

            match write_geometry_block(&container, &self.config, space.as_ref()) {
                Some(data) => {
                    tracing::info!(
                        "Converted geometry '{}': {} meshes, {} vertices, {} bytes{}",
                        container.name,
                        container.meshes.len(),
                        container.meshes.iter().map(Mesh::vertex_count).sum::<usize>(),
                        data.len(),
                        if container.skin.is_some() { ", skinned" } else { "" }
                    );
                    self.output.entries.push(GeometryEntry {
                        name: container.name,
                        data,
                    });
                    summary.converted += 1;
                }
                None => {
                    tracing::debug!(
                        "Geometry '{}' has no primitive blocks, skipped",
                        container.name
                    );
                    summary.empty += 1;
                }
            }
        }

        summary
    }
}
