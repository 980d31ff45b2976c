//! Conversion settings (dae-export.toml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::coords::{CoordinateSpace, NativeSpace, ZUpSpace};

/// Tool that authored the source document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthoringTool {
    #[default]
    Max,
    Maya,
    Blender,
    Other,
}

impl AuthoringTool {
    /// Up axis the tool exports with
    pub fn up_axis(self) -> UpAxis {
        match self {
            Self::Max => UpAxis::Z,
            Self::Maya | Self::Blender | Self::Other => UpAxis::Y,
        }
    }
}

/// Up axis of the source document; output is always Y-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpAxis {
    #[serde(rename = "y")]
    Y,
    #[serde(rename = "z")]
    Z,
}

/// How a geometry's skin controller is looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControllerLookup {
    /// Only the first `<skin>` in the controller library is tested
    #[default]
    FirstSkin,
    /// Every controller is scanned for a skin bound to the geometry
    AnyMatching,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertConfig {
    #[serde(default = "default_format_version")]
    pub format_version: i32,
    #[serde(default)]
    pub authoring_tool: AuthoringTool,
    /// Overrides the authoring tool's up axis
    #[serde(default)]
    pub up_axis: Option<UpAxis>,
    /// Rescale the four kept bone weights to sum to 1
    #[serde(default)]
    pub renormalize_weights: bool,
    #[serde(default)]
    pub controller_lookup: ControllerLookup,
}

fn default_format_version() -> i32 {
    mesh_common::GEOMETRY_FORMAT_VERSION
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            format_version: default_format_version(),
            authoring_tool: AuthoringTool::default(),
            up_axis: None,
            renormalize_weights: false,
            controller_lookup: ControllerLookup::default(),
        }
    }
}

impl ConvertConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse conversion config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        Self::from_toml_str(&content).with_context(|| format!("Invalid config: {:?}", path))
    }

    pub fn up_axis(&self) -> UpAxis {
        self.up_axis.unwrap_or(self.authoring_tool.up_axis())
    }

    /// Coordinate correction strategy for this configuration
    pub fn coordinate_space(&self) -> Box<dyn CoordinateSpace> {
        match self.up_axis() {
            UpAxis::Y => Box::new(NativeSpace),
            UpAxis::Z => Box::new(ZUpSpace),
        }
    }
}
