//! Skin controller lookup and bone-weight resolution
//!
//! Source documents store a variable number of (joint, weight) influences
//! per vertex. The runtime consumes exactly four, so each vertex is reduced
//! to its four heaviest influences.

use crate::config::ControllerLookup;
use crate::error::ConvertError;
use crate::node::Node;
use mesh_common::IDENTITY_MATRIX;

/// Influences the runtime reads per vertex
pub const MAX_INFLUENCES: usize = 4;

/// Working slots per vertex; influences past this are read and dropped
pub const MAX_INPUT_INFLUENCES: usize = 32;

/// Bind pose and per-vertex influences bound to one geometry
#[derive(Debug, Clone, PartialEq)]
pub struct SkinBinding {
    /// Row-major, as stored in the source
    pub bind_shape_matrix: [f32; 16],
    pub joint_names: Vec<String>,
    /// Row-major 4x4 per joint, 16 floats each
    pub joint_bind_matrices: Vec<f32>,
    /// Four joint indices per source vertex
    pub blend_indices: Vec<[f32; 4]>,
    /// Four weights per source vertex, heaviest first
    pub blend_weights: Vec<[f32; 4]>,
    /// Vertices that had more than four influences
    pub over_budget_vertices: usize,
}

impl SkinBinding {
    pub fn joint_count(&self) -> usize {
        self.joint_bind_matrices.len() / 16
    }

    pub fn vertex_count(&self) -> usize {
        self.blend_indices.len()
    }
}

/// Reduced influences for every vertex of a skin
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedWeights {
    pub indices: Vec<[f32; 4]>,
    pub weights: Vec<[f32; 4]>,
    pub over_budget_vertices: usize,
}

/// Reduce every vertex's influence list to four slots
///
/// `vcount[v]` influences are read for vertex `v` from `stream` as
/// (joint index, weight index) pairs. Slots are sorted by (weight, joint)
/// descending and the top four kept; vertices with fewer are zero padded.
pub fn resolve_influences(
    vcount: &[u32],
    stream: &[i32],
    weight_table: &[f32],
    renormalize: bool,
) -> Result<ResolvedWeights, ConvertError> {
    let mut out = ResolvedWeights {
        indices: Vec::with_capacity(vcount.len()),
        weights: Vec::with_capacity(vcount.len()),
        over_budget_vertices: 0,
    };

    let mut pos = 0usize;
    for (vertex, &count) in vcount.iter().enumerate() {
        let count = count as usize;
        if count > MAX_INFLUENCES {
            out.over_budget_vertices += 1;
        }

        // (weight, joint)
        let mut slots = [(0.0f32, 0i32); MAX_INPUT_INFLUENCES];
        for i in 0..count {
            let pair = stream.get(pos..pos + 2).ok_or_else(|| {
                ConvertError::MalformedIndexStream(format!(
                    "skin influence stream ends at vertex {vertex} (needs {} entries, has {})",
                    pos + 2,
                    stream.len()
                ))
            })?;
            pos += 2;

            if i >= MAX_INPUT_INFLUENCES {
                continue;
            }
            let weight = usize::try_from(pair[1])
                .ok()
                .and_then(|w| weight_table.get(w).copied())
                .ok_or(ConvertError::WeightIndexOutOfRange {
                    vertex,
                    index: pair[1],
                    count: weight_table.len(),
                })?;
            slots[i] = (weight, pair[0]);
        }

        slots.sort_by(|a, b| b.0.total_cmp(&a.0).then(b.1.cmp(&a.1)));

        let mut indices = [0.0f32; 4];
        let mut weights = [0.0f32; 4];
        for (k, &(weight, joint)) in slots.iter().take(MAX_INFLUENCES).enumerate() {
            indices[k] = joint as f32;
            weights[k] = weight;
        }

        if renormalize {
            let total: f32 = weights.iter().sum();
            if total > 0.0 {
                for w in weights.iter_mut() {
                    *w /= total;
                }
            }
        }

        out.indices.push(indices);
        out.weights.push(weights);
    }

    Ok(out)
}

/// `#geom-<name>` or `#<name>`
fn skin_targets(skin: &Node, geometry_name: &str) -> bool {
    let Some(target) = skin.attr("source").and_then(|s| s.strip_prefix('#')) else {
        return false;
    };
    target == geometry_name || target.strip_prefix("geom-") == Some(geometry_name)
}

/// Find the skin controller bound to a geometry
///
/// With [`ControllerLookup::FirstSkin`] only the first `<skin>` in the
/// library is considered: a geometry bound by any later controller is
/// reported as unskinned.
pub fn find_skin_controller(
    controllers: &Node,
    geometry_name: &str,
    lookup: ControllerLookup,
    renormalize: bool,
) -> Result<Option<SkinBinding>, ConvertError> {
    for controller in controllers.descendants("controller") {
        for skin in controller.descendants("skin") {
            if skin_targets(skin, geometry_name) {
                return parse_skin(controller, skin, renormalize).map(Some);
            }
            if lookup == ControllerLookup::FirstSkin {
                return Ok(None);
            }
        }
    }
    Ok(None)
}

fn parse_skin(
    controller: &Node,
    skin: &Node,
    renormalize: bool,
) -> Result<SkinBinding, ConvertError> {
    let bind_shape_matrix = match controller.first_descendant("bind_shape_matrix") {
        Some(node) => {
            let values = node.floats()?;
            <[f32; 16]>::try_from(values.as_slice()).map_err(|_| ConvertError::InvalidMatrix {
                element: "bind_shape_matrix".to_string(),
                count: values.len(),
            })?
        }
        None => IDENTITY_MATRIX,
    };

    let mut joint_names = Vec::new();
    let mut weight_table = Vec::new();
    let mut joint_bind_matrices = Vec::new();
    for src in skin.descendants("source") {
        let param = src.first_descendant("param").and_then(|p| p.attr("name"));
        if let Some(names) = src.first_descendant("Name_array") {
            joint_names = names.tokens();
        }
        if let Some(floats) = src.first_descendant("float_array") {
            match param {
                Some("WEIGHT") => weight_table = floats.floats()?,
                Some("TRANSFORM") => joint_bind_matrices = floats.floats()?,
                _ => {}
            }
        }
    }
    if joint_bind_matrices.len() % 16 != 0 {
        return Err(ConvertError::InvalidMatrix {
            element: "TRANSFORM float_array".to_string(),
            count: joint_bind_matrices.len(),
        });
    }

    let vertex_weights = skin.first_descendant("vertex_weights").ok_or_else(|| {
        ConvertError::MissingElement {
            parent: "skin".to_string(),
            child: "vertex_weights".to_string(),
        }
    })?;
    let vcount = match vertex_weights.first_descendant("vcount") {
        Some(n) => n.uints()?,
        None => Vec::new(),
    };
    let stream = match vertex_weights.first_descendant("v") {
        Some(n) => n.ints()?,
        None => Vec::new(),
    };

    let resolved = resolve_influences(&vcount, &stream, &weight_table, renormalize)?;
    if resolved.over_budget_vertices > 0 {
        tracing::warn!(
            "More than {} influences on {} vertices of skin '{}'; excess weights discarded{}",
            MAX_INFLUENCES,
            resolved.over_budget_vertices,
            skin.attr("source").unwrap_or_default(),
            if renormalize {
                " and the remaining renormalized"
            } else {
                ", remaining weights left as authored"
            }
        );
    }

    Ok(SkinBinding {
        bind_shape_matrix,
        joint_names,
        joint_bind_matrices,
        blend_indices: resolved.indices,
        blend_weights: resolved.weights,
        over_budget_vertices: resolved.over_budget_vertices,
    })
}
