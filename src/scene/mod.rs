//! Scene data model and the composition pipeline.
//!
//! A free-text query is turned into a [`SceneComposition`] (the plan), each
//! planned element is resolved against the model catalog, and the result is
//! a [`ComposedScene`] ready for a render sink.

pub mod composer;
pub mod resolver;
pub mod validator;

pub use composer::SceneComposer;

use serde::{Deserialize, Serialize};

use crate::catalog::AssetCandidate;

/// Scene-space point. Y is up; `y = 0` is ground level.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// One planned object, before asset resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneElementSpec {
    /// Term used to look the asset up in the catalog.
    pub search_query: String,

    /// Display name shown to the user and passed to annotation requests.
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_element_position")]
    pub position: Vec3,

    /// 1.0 is "normal real-world size".
    #[serde(default = "default_element_scale")]
    pub scale: f32,

    /// Rotation about the vertical axis.
    #[serde(rename = "rotation", default)]
    pub rotation_degrees: f32,
}

pub(crate) fn default_element_position() -> Vec3 {
    Vec3::new(0.0, 0.0, 5.0)
}

pub(crate) fn default_element_scale() -> f32 {
    1.0
}

/// Lighting/mood intent for the render sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ambiance {
    Bright,
    Dim,
    Dramatic,
    #[default]
    Natural,
}

impl Ambiance {
    /// Tolerant wire parse; unknown tags fold to `Natural`.
    pub fn from_wire(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "bright" => Self::Bright,
            "dim" => Self::Dim,
            "dramatic" => Self::Dramatic,
            _ => Self::Natural,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bright => "bright",
            Self::Dim => "dim",
            Self::Dramatic => "dramatic",
            Self::Natural => "natural",
        }
    }
}

/// The structured plan for a whole scene, produced by the director.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneComposition {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub elements: Vec<SceneElementSpec>,
    #[serde(default = "default_camera_position")]
    pub camera_position: Vec3,
    #[serde(default)]
    pub ambiance: Ambiance,
}

pub(crate) fn default_camera_position() -> Vec3 {
    Vec3::new(0.0, 1.6, -5.0)
}

impl SceneComposition {
    /// Initial state shown while the director is thinking.
    pub fn placeholder() -> Self {
        Self {
            title: "Loading...".to_string(),
            description: "Composing your scene...".to_string(),
            elements: Vec::new(),
            camera_position: default_camera_position(),
            ambiance: Ambiance::Natural,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    #[default]
    Pending,
    Loaded,
    Failed,
}

/// A planned element paired with the catalog asset chosen for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSceneElement {
    #[serde(flatten)]
    pub spec: SceneElementSpec,

    /// The chosen asset.
    #[serde(rename = "model")]
    pub asset: AssetCandidate,

    #[serde(default)]
    pub load_state: LoadState,

    /// Render-engine mesh identifiers, filled in by the sink after loading.
    #[serde(default)]
    pub mesh_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneStatus {
    Loading,
    Partial,
    Complete,
    Error,
}

/// Running output of one compose invocation.
///
/// Owned by that invocation and mutated in place as elements resolve; the
/// update callback receives a shared reference and must copy anything it
/// wants to retain. Unresolvable elements are dropped, so `elements` may be
/// strictly shorter than `composition.elements`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposedScene {
    pub composition: SceneComposition,
    pub elements: Vec<ResolvedSceneElement>,
    pub status: SceneStatus,
    /// 0-100.
    pub progress: f32,
}
