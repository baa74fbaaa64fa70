//! Interactive rendering state: a fixed scene, a moving camera and the
//! frame generation that navigation invalidates.

use crate::camera::{Camera, NavigationEvent};
use crate::frame::FrameCounter;
use crate::renderer::{render_frame, RenderConfig, RenderContext, RenderError, RenderOutput};
use crate::scene::Scene;

pub struct Session {
    scene: Scene,
    camera: Camera,
    config: RenderConfig,
    frames: FrameCounter,
}

impl Session {
    pub fn new(scene: Scene, camera: Camera, config: RenderConfig) -> Self {
        log::info!(
            "Session: {} objects, {} triangles, {}x{}",
            scene.objects().len(),
            scene.triangle_count(),
            camera.width,
            camera.height
        );

        Self {
            scene,
            camera,
            config,
            frames: FrameCounter::new(),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Handle for cancelling in-flight frames from another thread.
    pub fn frames(&self) -> FrameCounter {
        self.frames.clone()
    }

    /// Move the camera and supersede any frame rendered from the old view.
    pub fn apply(&mut self, event: NavigationEvent) {
        self.camera.apply(event);
        self.frames.invalidate();
    }

    /// Render the current view from a camera snapshot.
    pub fn render(&self) -> Result<RenderOutput, RenderError> {
        let ticket = self.frames.begin();
        let context = RenderContext::new(&self.scene, self.camera.clone());
        render_frame(&context, &self.config, &ticket)
    }
}
