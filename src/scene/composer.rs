//! Pipeline orchestrator: query → plan → per-element resolution → scene.
//!
//! One invocation owns one [`ComposedScene`] and streams intermediate
//! states through the update callback. Only a director failure aborts a
//! compose; an element with no usable candidate is dropped and the rest of
//! the scene still completes. Callers that allow overlapping invocations
//! must guard against stale completions themselves.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::resolver::choose_best_model;
use super::validator::{self, ElementPlacement, ValidationReport};
use super::{
    Ambiance, ComposedScene, LoadState, ResolvedSceneElement, SceneComposition, SceneElementSpec,
    SceneStatus, Vec3,
};
use crate::catalog::ModelCatalog;
use crate::director::{Annotation, AnnotationLevel, DirectorError, SceneDirector};

pub struct SceneComposer {
    director: Arc<dyn SceneDirector>,
    catalog: Arc<dyn ModelCatalog>,
    candidate_limit: usize,
}

impl SceneComposer {
    pub fn new(
        director: Arc<dyn SceneDirector>,
        catalog: Arc<dyn ModelCatalog>,
        candidate_limit: usize,
    ) -> Self {
        Self {
            director,
            catalog,
            candidate_limit: candidate_limit.max(1),
        }
    }

    /// Compose a scene from a free-text query.
    ///
    /// `on_update` fires after every state change with the scene so far;
    /// progress is monotonically non-decreasing and reaches 100 on success.
    pub async fn compose_from_query<F>(
        &self,
        query: &str,
        mut on_update: F,
    ) -> Result<ComposedScene, DirectorError>
    where
        F: FnMut(&ComposedScene),
    {
        let mut scene = ComposedScene {
            composition: SceneComposition::placeholder(),
            elements: Vec::new(),
            status: SceneStatus::Loading,
            progress: 0.0,
        };
        on_update(&scene);

        info!(query, "requesting scene composition");
        let composition = match self.director.compose_scene(query).await {
            Ok(composition) => composition,
            Err(err) => {
                scene.status = SceneStatus::Error;
                on_update(&scene);
                return Err(err);
            }
        };

        scene.composition = composition;
        scene.progress = 20.0;
        on_update(&scene);

        // Elements resolve strictly in plan order. Sequential on purpose:
        // progress stays deterministic and the catalog sees bounded load.
        let planned = scene.composition.elements.clone();
        let total = planned.len();
        for (index, spec) in planned.into_iter().enumerate() {
            debug!(search = %spec.search_query, "searching catalog");
            let candidates = match self.catalog.search(&spec.search_query, self.candidate_limit).await
            {
                Ok(outcome) => outcome.models,
                Err(err) => {
                    // A catalog outage costs this element, never the scene.
                    warn!(
                        search = %spec.search_query,
                        error = %format!("{err:#}"),
                        "catalog search failed"
                    );
                    Vec::new()
                }
            };

            match choose_best_model(&spec, &candidates) {
                Some(asset) => {
                    info!(element = %spec.name, asset = %asset.title, "resolved element");
                    scene.elements.push(ResolvedSceneElement {
                        asset: asset.clone(),
                        spec,
                        load_state: LoadState::Pending,
                        mesh_ids: Vec::new(),
                    });
                }
                None => {
                    warn!(
                        element = %spec.name,
                        search = %spec.search_query,
                        "no suitable model, dropping element"
                    );
                }
            }

            scene.progress = 20.0 + 60.0 * (index + 1) as f32 / total as f32;
            scene.status = SceneStatus::Partial;
            on_update(&scene);
        }

        scene.status = SceneStatus::Complete;
        scene.progress = 100.0;
        on_update(&scene);
        info!(
            resolved = scene.elements.len(),
            planned = total,
            "scene composition complete"
        );
        Ok(scene)
    }

    /// Skip the director entirely: search the catalog for one term and
    /// build a single-element scene around the result.
    pub async fn quick_compose(&self, search_term: &str) -> anyhow::Result<ComposedScene> {
        let outcome = self.catalog.search(search_term, 1).await?;
        let Some(asset) = outcome.models.into_iter().next() else {
            anyhow::bail!("no models found for: {search_term}");
        };

        let spec = SceneElementSpec {
            search_query: search_term.to_string(),
            name: asset.title.clone(),
            description: String::new(),
            position: Vec3::new(0.0, 0.0, 5.0),
            scale: 1.0,
            rotation_degrees: 0.0,
        };

        Ok(ComposedScene {
            composition: SceneComposition {
                title: asset.title.clone(),
                description: format!("Exploring: {}", asset.title),
                elements: vec![spec.clone()],
                camera_position: Vec3::new(0.0, 1.6, -3.0),
                ambiance: Ambiance::Natural,
            },
            elements: vec![ResolvedSceneElement {
                spec,
                asset,
                load_state: LoadState::Pending,
                mesh_ids: Vec::new(),
            }],
            status: SceneStatus::Complete,
            progress: 100.0,
        })
    }

    /// Ask the validation backend to score the resolved layout and apply
    /// any placement corrections it proposes.
    pub async fn refine_layout(
        &self,
        scene: &mut ComposedScene,
        goal: &str,
    ) -> Result<ValidationReport, DirectorError> {
        let placements: Vec<ElementPlacement> = scene
            .elements
            .iter()
            .map(ElementPlacement::from_resolved)
            .collect();

        let report = self.director.validate_layout(&placements, goal).await?;
        info!(
            score = report.layout_score,
            suggestions = report.suggestions.len(),
            "layout validated"
        );

        if !report.suggestions.is_empty() {
            scene.elements = validator::apply_suggestions(&scene.elements, &report.suggestions);
        }
        Ok(report)
    }

    /// Annotation for a clicked mesh. The mesh is mapped back to its owning
    /// element's display name; an unrecognized mesh keeps the raw name the
    /// host reported.
    pub async fn annotate_clicked(
        &self,
        scene: &ComposedScene,
        object_name: &str,
        mesh_id: Option<&str>,
        level: AnnotationLevel,
    ) -> Result<Annotation, DirectorError> {
        let context = if scene.composition.description.is_empty() {
            "Exploring a 3D scene"
        } else {
            scene.composition.description.as_str()
        };

        let name = mesh_id
            .and_then(|id| element_name_for_mesh(scene, id))
            .unwrap_or(object_name);

        self.director.annotate_object(name, context, level).await
    }

    pub fn suggest_related(&self, scene: &ComposedScene) -> Vec<String> {
        self.director.suggest_related(&scene.composition.title)
    }
}

/// Display name of the element owning `mesh_id`, if any.
pub fn element_name_for_mesh<'a>(scene: &'a ComposedScene, mesh_id: &str) -> Option<&'a str> {
    scene
        .elements
        .iter()
        .find(|element| element.mesh_ids.iter().any(|id| id == mesh_id))
        .map(|element| element.spec.name.as_str())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::catalog::{AssetCandidate, SearchOutcome};

    fn spec(search_query: &str, name: &str) -> SceneElementSpec {
        SceneElementSpec {
            search_query: search_query.to_string(),
            name: name.to_string(),
            description: String::new(),
            position: Vec3::new(0.0, 0.0, 5.0),
            scale: 1.0,
            rotation_degrees: 0.0,
        }
    }

    fn candidate(id: &str, title: &str) -> AssetCandidate {
        AssetCandidate {
            id: id.to_string(),
            title: title.to_string(),
            author: "test".to_string(),
            download_url: format!("https://example.com/{id}.glb"),
            thumbnail: String::new(),
            license: "CC0".to_string(),
            category: None,
        }
    }

    fn composition(elements: Vec<SceneElementSpec>) -> SceneComposition {
        SceneComposition {
            title: "Test Scene".to_string(),
            description: "A scene for tests.".to_string(),
            elements,
            camera_position: Vec3::new(0.0, 1.6, -5.0),
            ambiance: Ambiance::Natural,
        }
    }

    /// Director stub returning one pre-loaded compose result.
    struct StubDirector {
        composition: Mutex<Option<Result<SceneComposition, DirectorError>>>,
        validation: Mutex<Option<ValidationReport>>,
    }

    impl StubDirector {
        fn composing(composition: SceneComposition) -> Self {
            Self {
                composition: Mutex::new(Some(Ok(composition))),
                validation: Mutex::new(None),
            }
        }

        fn failing() -> Self {
            Self {
                composition: Mutex::new(Some(Err(DirectorError::Api {
                    message: "overloaded".to_string(),
                }))),
                validation: Mutex::new(None),
            }
        }

        fn with_validation(self, report: ValidationReport) -> Self {
            *self.validation.lock().unwrap() = Some(report);
            self
        }
    }

    #[async_trait]
    impl SceneDirector for StubDirector {
        async fn compose_scene(&self, _query: &str) -> Result<SceneComposition, DirectorError> {
            self.composition
                .lock()
                .unwrap()
                .take()
                .expect("unexpected compose call")
        }

        async fn annotate_object(
            &self,
            object_name: &str,
            context: &str,
            _level: AnnotationLevel,
        ) -> Result<Annotation, DirectorError> {
            Ok(Annotation {
                title: object_name.to_string(),
                explanation: format!("{object_name} in context: {context}"),
                fun_fact: String::new(),
                related_topics: Vec::new(),
            })
        }

        async fn validate_layout(
            &self,
            _elements: &[ElementPlacement],
            _scene_goal: &str,
        ) -> Result<ValidationReport, DirectorError> {
            Ok(self
                .validation
                .lock()
                .unwrap()
                .take()
                .expect("unexpected validate call"))
        }
    }

    /// Catalog stub serving canned results per query.
    struct TableCatalog {
        responses: HashMap<String, Vec<AssetCandidate>>,
    }

    impl TableCatalog {
        fn new(entries: &[(&str, Vec<AssetCandidate>)]) -> Self {
            Self {
                responses: entries
                    .iter()
                    .map(|(query, models)| (query.to_string(), models.clone()))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl ModelCatalog for TableCatalog {
        async fn search(&self, query: &str, limit: usize) -> anyhow::Result<SearchOutcome> {
            let models = self
                .responses
                .get(query)
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .take(limit)
                .collect::<Vec<_>>();
            Ok(SearchOutcome {
                total: models.len(),
                models,
                query: query.to_string(),
            })
        }
    }

    struct BrokenCatalog;

    #[async_trait]
    impl ModelCatalog for BrokenCatalog {
        async fn search(&self, _query: &str, _limit: usize) -> anyhow::Result<SearchOutcome> {
            anyhow::bail!("catalog offline")
        }
    }

    fn composer(
        director: StubDirector,
        catalog: impl ModelCatalog + 'static,
    ) -> SceneComposer {
        SceneComposer::new(Arc::new(director), Arc::new(catalog), 8)
    }

    #[tokio::test]
    async fn unresolvable_elements_are_dropped_and_the_scene_completes() {
        let director = StubDirector::composing(composition(vec![
            spec("dog", "Dog"),
            spec("unobtainium", "Unobtainium"),
            spec("tree", "Tree"),
        ]));
        let catalog = TableCatalog::new(&[
            ("dog", vec![candidate("fox", "fox")]),
            ("tree", vec![candidate("plant", "plant")]),
        ]);

        let scene = composer(director, catalog)
            .compose_from_query("a dog under a tree", |_| {})
            .await
            .unwrap();

        assert_eq!(scene.elements.len(), 2);
        assert_eq!(scene.status, SceneStatus::Complete);
        assert_eq!(scene.progress, 100.0);
    }

    #[tokio::test]
    async fn progress_is_monotonic_and_ends_at_one_hundred() {
        let director = StubDirector::composing(composition(vec![
            spec("dog", "Dog"),
            spec("tree", "Tree"),
        ]));
        let catalog = TableCatalog::new(&[
            ("dog", vec![candidate("fox", "fox")]),
            ("tree", vec![candidate("plant", "plant")]),
        ]);

        let mut updates: Vec<(f32, SceneStatus)> = Vec::new();
        let scene = composer(director, catalog)
            .compose_from_query("a dog in a park", |scene| {
                updates.push((scene.progress, scene.status));
            })
            .await
            .unwrap();

        assert!(updates.windows(2).all(|pair| pair[0].0 <= pair[1].0));
        let (progress, status) = *updates.last().unwrap();
        assert_eq!(progress, 100.0);
        assert_eq!(status, SceneStatus::Complete);
        assert_eq!(scene.progress, 100.0);
    }

    #[tokio::test]
    async fn director_failure_marks_the_scene_error_and_propagates() {
        let catalog = TableCatalog::new(&[]);
        let mut last_status = None;
        let result = composer(StubDirector::failing(), catalog)
            .compose_from_query("anything", |scene| {
                last_status = Some(scene.status);
            })
            .await;

        assert!(matches!(result, Err(DirectorError::Api { .. })));
        assert_eq!(last_status, Some(SceneStatus::Error));
    }

    #[tokio::test]
    async fn catalog_outage_degrades_to_an_empty_scene_not_an_error() {
        let director = StubDirector::composing(composition(vec![spec("dog", "Dog")]));

        let scene = composer(director, BrokenCatalog)
            .compose_from_query("a dog", |_| {})
            .await
            .unwrap();

        assert!(scene.elements.is_empty());
        assert_eq!(scene.status, SceneStatus::Complete);
    }

    #[tokio::test]
    async fn resolver_scores_candidates_from_the_catalog() {
        // No literal "dog" or "tree" assets exist; substring/token scoring
        // still lands on the closest titles.
        let director = StubDirector::composing(composition(vec![
            spec("dog", "Dog"),
            spec("tree", "Tree"),
        ]));
        let catalog = TableCatalog::new(&[
            (
                "dog",
                vec![candidate("fox", "fox"), candidate("sofa", "velvet sofa")],
            ),
            ("tree", vec![candidate("plant", "plant")]),
        ]);

        let scene = composer(director, catalog)
            .compose_from_query("a dog in a park", |_| {})
            .await
            .unwrap();

        assert_eq!(scene.elements.len(), 2);
        assert_eq!(scene.elements[0].asset.title, "fox");
        assert_eq!(scene.elements[1].asset.title, "plant");
        assert_eq!(scene.status, SceneStatus::Complete);
        assert_eq!(scene.progress, 100.0);
    }

    #[tokio::test]
    async fn empty_plan_completes_immediately() {
        let director = StubDirector::composing(composition(Vec::new()));
        let scene = composer(director, TableCatalog::new(&[]))
            .compose_from_query("nothing", |_| {})
            .await
            .unwrap();

        assert!(scene.elements.is_empty());
        assert_eq!(scene.status, SceneStatus::Complete);
        assert_eq!(scene.progress, 100.0);
    }

    #[tokio::test]
    async fn quick_compose_builds_a_complete_single_element_scene() {
        let director = StubDirector::composing(composition(Vec::new()));
        let catalog = TableCatalog::new(&[("fox", vec![candidate("fox", "Fox")])]);

        let scene = composer(director, catalog).quick_compose("fox").await.unwrap();
        assert_eq!(scene.elements.len(), 1);
        assert_eq!(scene.composition.title, "Fox");
        assert_eq!(scene.status, SceneStatus::Complete);
        assert_eq!(scene.progress, 100.0);
    }

    #[tokio::test]
    async fn quick_compose_errors_when_nothing_is_found() {
        let director = StubDirector::composing(composition(Vec::new()));
        let result = composer(director, TableCatalog::new(&[]))
            .quick_compose("unobtainium")
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn refine_layout_applies_suggestions_to_the_scene() {
        use crate::scene::validator::{LayoutSuggestion, PartialVec3};

        let director = StubDirector::composing(composition(vec![spec("dog", "Dog")]))
            .with_validation(ValidationReport {
                is_valid: false,
                layout_score: 4.0,
                suggestions: vec![LayoutSuggestion {
                    element_index: 0,
                    issue: Some("too close to camera".to_string()),
                    suggested_position: Some(PartialVec3 {
                        x: None,
                        y: None,
                        z: Some(12.0),
                    }),
                    suggested_scale: None,
                }],
                overall_feedback: "Spread things out.".to_string(),
            });
        let catalog = TableCatalog::new(&[("dog", vec![candidate("fox", "fox")])]);

        let composer = composer(director, catalog);
        let mut scene = composer
            .compose_from_query("a dog", |_| {})
            .await
            .unwrap();

        let report = composer.refine_layout(&mut scene, "a dog").await.unwrap();
        assert!(!report.is_valid);
        assert_eq!(scene.elements[0].spec.position, Vec3::new(0.0, 0.0, 12.0));
    }

    #[tokio::test]
    async fn annotate_clicked_maps_meshes_back_to_element_names() {
        let director = StubDirector::composing(composition(vec![spec("dog", "Dog")]));
        let catalog = TableCatalog::new(&[("dog", vec![candidate("fox", "fox")])]);

        let composer = composer(director, catalog);
        let mut scene = composer.compose_from_query("a dog", |_| {}).await.unwrap();
        scene.elements[0].mesh_ids.push("mesh-7".to_string());

        let annotation = composer
            .annotate_clicked(&scene, "mesh-7", Some("mesh-7"), AnnotationLevel::Teen)
            .await
            .unwrap();
        assert_eq!(annotation.title, "Dog");

        // Unknown meshes keep the raw name the host reported.
        let annotation = composer
            .annotate_clicked(&scene, "mystery", Some("mesh-99"), AnnotationLevel::Teen)
            .await
            .unwrap();
        assert_eq!(annotation.title, "mystery");
    }

    #[test]
    fn element_name_lookup_returns_none_for_unknown_mesh() {
        let scene = ComposedScene {
            composition: composition(Vec::new()),
            elements: Vec::new(),
            status: SceneStatus::Complete,
            progress: 100.0,
        };
        assert!(element_name_for_mesh(&scene, "mesh-1").is_none());
    }
}
