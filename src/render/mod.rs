//! Render sink seam.
//!
//! The host application owns the actual engine: mesh loading, grounding,
//! camera, collision. The pipeline only needs this narrow contract, plus a
//! recording implementation for tests and the CLI dry-run output.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use crate::scene::{Ambiance, LoadState, ResolvedSceneElement, Vec3};

#[async_trait]
pub trait RenderSink: Send + Sync {
    /// Load elements in order. Implementations set each element's
    /// `load_state`, record the engine-assigned mesh ids on it, and report
    /// progress through `on_progress(loaded, total)`.
    async fn load_elements(
        &self,
        elements: &mut [ResolvedSceneElement],
        on_progress: &mut (dyn FnMut(usize, usize) + Send),
    ) -> Result<()>;

    fn set_camera_position(&self, position: Vec3);

    fn set_ambiance(&self, ambiance: Ambiance);
}

/// Sink that records what it was asked to render instead of driving an
/// engine.
#[derive(Default)]
pub struct RecordingSink {
    camera: Mutex<Option<Vec3>>,
    ambiance: Mutex<Option<Ambiance>>,
}

impl RecordingSink {
    pub fn camera(&self) -> Option<Vec3> {
        *self.camera.lock().unwrap()
    }

    pub fn ambiance(&self) -> Option<Ambiance> {
        *self.ambiance.lock().unwrap()
    }
}

#[async_trait]
impl RenderSink for RecordingSink {
    async fn load_elements(
        &self,
        elements: &mut [ResolvedSceneElement],
        on_progress: &mut (dyn FnMut(usize, usize) + Send),
    ) -> Result<()> {
        let total = elements.len();
        for (index, element) in elements.iter_mut().enumerate() {
            element.load_state = LoadState::Loaded;
            element.mesh_ids.push(format!("{}-mesh-{}", element.asset.id, index));
            on_progress(index + 1, total);
        }
        Ok(())
    }

    fn set_camera_position(&self, position: Vec3) {
        *self.camera.lock().unwrap() = Some(position);
    }

    fn set_ambiance(&self, ambiance: Ambiance) {
        *self.ambiance.lock().unwrap() = Some(ambiance);
    }
}
