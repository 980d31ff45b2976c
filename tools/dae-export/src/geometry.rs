//! Geometry conversion: one `<geometry>` element to its submeshes

use crate::config::ConvertConfig;
use crate::coords::CoordinateSpace;
use crate::error::ConvertError;
use crate::mesh::{Mesh, MeshBuilder};
use crate::node::Node;
use crate::skin::{SkinBinding, find_skin_controller};
use crate::source::{extract_primitives, extract_sources};

/// Every submesh of one geometry plus its optional skin
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryContainer {
    pub id: String,
    pub name: String,
    pub meshes: Vec<Mesh>,
    pub skin: Option<SkinBinding>,
}

impl GeometryContainer {
    /// Material per mesh, `None` where the block named none
    pub fn materials(&self) -> impl Iterator<Item = Option<&str>> {
        self.meshes.iter().map(|m| m.material.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

/// Convert one `<geometry>`
///
/// The skin is looked up by the geometry's `name`, falling back to its `id`.
/// Every `<mesh>` below the geometry contributes one mesh per primitive block.
pub fn convert_geometry(
    geometry: &Node,
    controllers: Option<&Node>,
    config: &ConvertConfig,
    space: &dyn CoordinateSpace,
) -> Result<GeometryContainer, ConvertError> {
    let id = geometry.attr("id").unwrap_or_default().to_string();
    let name = geometry.attr("name").map(str::to_string).unwrap_or_else(|| id.clone());

    let skin = match controllers {
        Some(library) => find_skin_controller(
            library,
            &name,
            config.controller_lookup,
            config.renormalize_weights,
        )?,
        None => None,
    };
    if let Some(skin) = &skin {
        tracing::debug!(
            "Geometry '{}' is skinned: {} joints, {} weighted vertices",
            name,
            skin.joint_count(),
            skin.vertex_count()
        );
    }

    let mut meshes = Vec::new();
    for mesh in geometry.descendants("mesh") {
        let sources = extract_sources(mesh)?;
        let builder = MeshBuilder::new(&sources, skin.as_ref(), space);
        for block in extract_primitives(mesh)? {
            meshes.push(builder.build(&block)?);
        }
    }

    Ok(GeometryContainer {
        id,
        name,
        meshes,
        skin,
    })
}
