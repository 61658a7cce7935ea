//! Layout validation: the wire types exchanged with the validation backend
//! and the pure pass that applies its placement corrections.

use serde::{Deserialize, Serialize};

use super::{ResolvedSceneElement, Vec3};

/// Element snapshot sent to the validation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementPlacement {
    pub name: String,
    pub position: Vec3,
    pub scale: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl ElementPlacement {
    pub fn from_resolved(element: &ResolvedSceneElement) -> Self {
        Self {
            name: element.spec.name.clone(),
            position: element.spec.position,
            scale: element.spec.scale,
            thumbnail_url: (!element.asset.thumbnail.is_empty())
                .then(|| element.asset.thumbnail.clone()),
        }
    }
}

/// Partial position override; omitted axes keep their current value.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PartialVec3 {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
}

/// One correction proposed by the validation backend.
///
/// `element_index` refers to the resolved element list as it was sent to the
/// validator, not the original plan (unresolvable plan entries were dropped).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSuggestion {
    pub element_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_position: Option<PartialVec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_scale: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    #[serde(default = "default_is_valid")]
    pub is_valid: bool,
    #[serde(default)]
    pub layout_score: f32,
    #[serde(default)]
    pub suggestions: Vec<LayoutSuggestion>,
    #[serde(default)]
    pub overall_feedback: String,
}

fn default_is_valid() -> bool {
    true
}

/// Apply placement corrections to a copy of `elements`.
///
/// Out-of-range indices are skipped without affecting the rest of the batch
/// (the backend occasionally hallucinates indices). Scale is applied only
/// when strictly positive. The input is never mutated.
pub fn apply_suggestions(
    elements: &[ResolvedSceneElement],
    suggestions: &[LayoutSuggestion],
) -> Vec<ResolvedSceneElement> {
    let mut adjusted = elements.to_vec();

    for suggestion in suggestions {
        let Ok(index) = usize::try_from(suggestion.element_index) else {
            continue;
        };
        let Some(element) = adjusted.get_mut(index) else {
            continue;
        };

        if let Some(position) = &suggestion.suggested_position {
            let current = element.spec.position;
            element.spec.position = Vec3 {
                x: position.x.unwrap_or(current.x),
                y: position.y.unwrap_or(current.y),
                z: position.z.unwrap_or(current.z),
            };
        }

        if let Some(scale) = suggestion.suggested_scale
            && scale > 0.0
        {
            element.spec.scale = scale;
        }
    }

    adjusted
}
