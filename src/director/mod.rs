//! Reasoning backends: scene planning, annotations, layout validation.
//!
//! The pipeline consumes these through the [`SceneDirector`] trait so the
//! composer never depends on a concrete API. One backend is provided,
//! modeled on a Gemini-style generative endpoint.

pub mod gemini;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scene::SceneComposition;
use crate::scene::validator::{ElementPlacement, ValidationReport};

pub use gemini::GeminiDirector;

/// Failure at the reasoning boundary. These are the only errors the compose
/// pipeline surfaces to callers; everything element-level degrades instead.
#[derive(Debug, Error)]
pub enum DirectorError {
    #[error("director request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("director API error: {message}")]
    Api { message: String },

    #[error("unparsable director response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Explanation register for annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationLevel {
    Child,
    #[default]
    Teen,
    Adult,
}

impl AnnotationLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "child" => Some(Self::Child),
            "teen" => Some(Self::Teen),
            "adult" => Some(Self::Adult),
            _ => None,
        }
    }

    pub fn prompt_guide(&self) -> &'static str {
        match self {
            Self::Child => {
                "Explain like talking to a curious 8 year old. Use simple words and fun comparisons."
            }
            Self::Teen => {
                "Explain clearly for a middle/high school student. Be engaging and informative."
            }
            Self::Adult => {
                "Explain with detail appropriate for a college student or adult learner."
            }
        }
    }
}

/// Educational annotation for one clicked object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub title: String,
    pub explanation: String,
    #[serde(default)]
    pub fun_fact: String,
    #[serde(default)]
    pub related_topics: Vec<String>,
}

#[async_trait]
pub trait SceneDirector: Send + Sync {
    /// Turn a free-text query into a structured scene plan. Implementations
    /// must normalize sparse output (missing positions, scales, rotations)
    /// before returning.
    async fn compose_scene(&self, query: &str) -> Result<SceneComposition, DirectorError>;

    /// Short educational annotation for a clicked object.
    async fn annotate_object(
        &self,
        object_name: &str,
        context: &str,
        level: AnnotationLevel,
    ) -> Result<Annotation, DirectorError>;

    /// Score a resolved layout and propose per-element corrections.
    async fn validate_layout(
        &self,
        elements: &[ElementPlacement],
        scene_goal: &str,
    ) -> Result<ValidationReport, DirectorError>;

    /// Related queries for the current scene title. Static table, no
    /// network.
    fn suggest_related(&self, current_title: &str) -> Vec<String> {
        const SUGGESTIONS: &[(&str, &[&str; 4])] = &[
            (
                "animal",
                &["dog breeds", "cat behavior", "wildlife habitats", "endangered species"],
            ),
            (
                "nature",
                &["rainforest", "ocean life", "desert ecosystem", "mountain geology"],
            ),
            (
                "space",
                &["solar system", "mars exploration", "black holes", "galaxies"],
            ),
            (
                "history",
                &["ancient rome", "medieval castles", "egyptian pyramids", "world war"],
            ),
            (
                "science",
                &["human anatomy", "cell structure", "chemistry lab", "physics experiments"],
            ),
        ];

        let lowered = current_title.to_lowercase();
        for (key, values) in SUGGESTIONS {
            if lowered.contains(key) {
                return values.iter().map(|s| s.to_string()).collect();
            }
        }

        ["solar system", "rainforest ecosystem", "human anatomy", "medieval castle"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}
