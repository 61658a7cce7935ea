//! Gemini-style HTTP backend for the [`SceneDirector`] trait.
//!
//! Calls a generative-language endpoint (`models/{model}:generateContent`),
//! strips markdown code fences from the reply, and decodes the JSON payload
//! tolerantly into canonical scene types. Scene planning tries a configured
//! model list in order, since individual models get overloaded.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::{Annotation, AnnotationLevel, DirectorError, SceneDirector};
use crate::config::DirectorConfig;
use crate::scene::validator::{ElementPlacement, ValidationReport};
use crate::scene::{
    Ambiance, SceneComposition, SceneElementSpec, Vec3, default_camera_position,
    default_element_position,
};

pub struct GeminiDirector {
    client: Client,
    base_url: String,
    api_key: String,
    compose_models: Vec<String>,
    annotate_model: String,
    validate_model: String,
}

impl GeminiDirector {
    pub fn new(config: &DirectorConfig) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            compose_models: config.compose_models.clone(),
            annotate_model: config.annotate_model.clone(),
            validate_model: config.validate_model.clone(),
        })
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String, DirectorError> {
        if self.api_key.is_empty() {
            return Err(DirectorError::Api {
                message: "API key not configured".to_string(),
            });
        }

        let body = json!({
            "contents": [{"parts": [{"text": prompt}]}]
        });

        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, model))
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let payload: Value = response.json().await?;
        debug!(model, "director response: {}", payload);

        if let Some(error) = payload.get("error") {
            return Err(DirectorError::Api {
                message: error["message"]
                    .as_str()
                    .unwrap_or("unknown upstream error")
                    .to_string(),
            });
        }

        let text: String = payload["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part["text"].as_str())
                    .collect()
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(DirectorError::Api {
                message: format!("model {model} returned no text"),
            });
        }

        Ok(text)
    }

    /// Try the configured compose models in order until one answers.
    async fn generate_with_fallback(&self, prompt: &str) -> Result<String, DirectorError> {
        let mut last_error = None;
        for model in &self.compose_models {
            match self.generate(model, prompt).await {
                Ok(text) => return Ok(text),
                Err(err) => {
                    warn!(model = %model, error = %err, "compose model failed, trying next");
                    last_error = Some(err);
                }
            }
        }
        Err(last_error.unwrap_or(DirectorError::Api {
            message: "no compose models configured".to_string(),
        }))
    }
}

#[async_trait]
impl SceneDirector for GeminiDirector {
    async fn compose_scene(&self, query: &str) -> Result<SceneComposition, DirectorError> {
        let text = self.generate_with_fallback(&compose_prompt(query)).await?;
        let wire: WireComposition = serde_json::from_str(&strip_code_fences(&text))?;
        Ok(normalize_composition(query, wire))
    }

    async fn annotate_object(
        &self,
        object_name: &str,
        context: &str,
        level: AnnotationLevel,
    ) -> Result<Annotation, DirectorError> {
        let prompt = annotate_prompt(object_name, context, level);
        let text = self.generate(&self.annotate_model, &prompt).await?;
        let annotation: Annotation = serde_json::from_str(&strip_code_fences(&text))?;
        Ok(annotation)
    }

    async fn validate_layout(
        &self,
        elements: &[ElementPlacement],
        scene_goal: &str,
    ) -> Result<ValidationReport, DirectorError> {
        let prompt = validate_prompt(elements, scene_goal);
        let text = self.generate(&self.validate_model, &prompt).await?;
        let report: ValidationReport = serde_json::from_str(&strip_code_fences(&text))?;
        Ok(report)
    }
}

// -- prompts -----------------------------------------------------------------

fn compose_prompt(query: &str) -> String {
    format!(
        r#"You are a 3D scene composer for an educational platform. Create an explorable 3D scene.

Use simple, common 1-2 word search terms for each element, for example:
- Animals: dog, cat, fox, bird, fish, horse, elephant, lion, bear, deer
- Nature: tree, flower, plant, rock, mountain, grass, mushroom, cactus
- Buildings: house, castle, tower, church, barn, tent, lighthouse, windmill
- Vehicles: car, truck, bus, airplane, helicopter, boat, bicycle, train
- Food: apple, banana, orange, bread, cake, pizza, burger
- Furniture: chair, table, lamp, bed, sofa, desk, bookshelf
- Objects: book, clock, phone, camera, guitar, piano, ball, sword, lantern
- Science: microscope, telescope, globe, beaker
- Fantasy: dragon, unicorn, wizard, knight, treasure

USER QUERY: "{query}"

RESPOND WITH VALID JSON ONLY (no markdown, no backticks):
{{
  "title": "Scene title",
  "description": "Educational description (2-3 sentences)",
  "elements": [
    {{
      "searchQuery": "simple 1-2 word search term",
      "name": "Display name for the object",
      "description": "Brief educational description",
      "position": {{ "x": 0, "y": 0, "z": 5 }},
      "scale": 1.0,
      "rotation": 0
    }}
  ],
  "cameraPosition": {{ "x": 0, "y": 1.6, "z": -5 }},
  "ambiance": "natural"
}}

POSITIONING RULES:
- Center main subject at (0, 0, 5)
- Y is up: ground level is 0, objects sit ON the ground
- Spread elements naturally, like a museum exhibit or diorama
- Use x from -15 to 15, z from 0 to 30 for variety
- Scale: 1.0 = normal (about 1-2 meters), adjust based on real-world proportions
- ambiance is one of: bright, dim, dramatic, natural

IMPORTANT:
- Create 1-5 elements maximum for performance
- Think like a museum curator designing an educational exhibit"#
    )
}

fn annotate_prompt(object_name: &str, context: &str, level: AnnotationLevel) -> String {
    format!(
        r#"You are an educational AI assistant explaining objects in a 3D learning environment.

OBJECT CLICKED: "{object_name}"
SCENE CONTEXT: "{context}"
EXPLANATION LEVEL: {guide}

Generate an educational annotation. RESPOND WITH VALID JSON ONLY:
{{
  "title": "Catchy 3-5 word title",
  "explanation": "1-2 sentence educational explanation",
  "funFact": "One surprising or interesting fact",
  "relatedTopics": ["topic1", "topic2", "topic3"]
}}"#,
        guide = level.prompt_guide(),
    )
}

fn validate_prompt(elements: &[ElementPlacement], scene_goal: &str) -> String {
    let listing = elements
        .iter()
        .enumerate()
        .map(|(i, el)| {
            format!(
                "{}. {} at position ({}, {}, {}) with scale {}",
                i + 1,
                el.name,
                el.position.x,
                el.position.y,
                el.position.z,
                el.scale
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a 3D scene layout validator. Analyze these elements and their arrangement for the scene goal: "{scene_goal}"

ELEMENTS IN SCENE:
{listing}

RESPOND WITH VALID JSON ONLY:
{{
  "isValid": true,
  "layoutScore": 7,
  "suggestions": [
    {{
      "elementIndex": 0,
      "issue": "description of issue",
      "suggestedPosition": {{ "x": 0, "y": 0, "z": 0 }},
      "suggestedScale": 1.0
    }}
  ],
  "overallFeedback": "One sentence about the scene composition"
}}"#
    )
}

// -- response decoding -------------------------------------------------------

/// Models wrap JSON in markdown fences despite being told not to.
fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireComposition {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    elements: Vec<WireElement>,
    #[serde(default)]
    camera_position: Option<Vec3>,
    #[serde(default)]
    ambiance: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireElement {
    #[serde(default)]
    search_query: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    position: Option<Vec3>,
    #[serde(default)]
    scale: Option<f32>,
    #[serde(default)]
    rotation: Option<f32>,
}

/// Upstream output is not contractually complete; fill every gap with
/// defaults before anything downstream sees the plan.
fn normalize_composition(query: &str, wire: WireComposition) -> SceneComposition {
    SceneComposition {
        title: wire.title.unwrap_or_else(|| query.to_string()),
        description: wire.description.unwrap_or_default(),
        elements: wire.elements.into_iter().map(normalize_element).collect(),
        camera_position: wire.camera_position.unwrap_or_else(default_camera_position),
        ambiance: wire
            .ambiance
            .as_deref()
            .map(Ambiance::from_wire)
            .unwrap_or_default(),
    }
}

fn normalize_element(wire: WireElement) -> SceneElementSpec {
    SceneElementSpec {
        name: if wire.name.is_empty() {
            wire.search_query.clone()
        } else {
            wire.name
        },
        search_query: wire.search_query,
        description: wire.description,
        position: wire.position.unwrap_or_else(default_element_position),
        scale: match wire.scale {
            Some(scale) if scale.is_finite() && scale > 0.0 => scale,
            _ => 1.0,
        },
        rotation_degrees: wire.rotation.unwrap_or(0.0),
    }
}
