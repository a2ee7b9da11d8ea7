//! Headless rendering surface.
//!
//! Stands in for an on-screen element when the client runs without a UI.
//! The surface is laid out at the device's displayed size with its origin
//! at (0, 0), so host coordinates equal device coordinates at rotation 0.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use mirror_core::{DeviceSize, SurfaceRect};
use tracing::debug;
use uuid::Uuid;

use crate::application::{
    demux::RendererHandle,
    session::{ListenerId, RenderSurface},
};

#[derive(Debug, Default)]
struct SurfaceState {
    size: Option<DeviceSize>,
    renderer: Option<RendererHandle>,
    listeners: HashSet<ListenerId>,
}

/// A [`RenderSurface`] with no window behind it.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    state: Mutex<SurfaceState>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn renderer(&self) -> Option<RendererHandle> {
        self.state().renderer
    }

    pub fn has_listeners(&self) -> bool {
        !self.state().listeners.is_empty()
    }
}

impl RenderSurface for HeadlessSurface {
    fn bounding_rect(&self) -> Option<SurfaceRect> {
        let state = self.state();
        // Without a renderer there is nothing on screen to hit-test.
        state.renderer?;
        state
            .size
            .map(|s| SurfaceRect::new(0.0, 0.0, f64::from(s.width), f64::from(s.height)))
    }

    fn attach_renderer(&self, renderer: RendererHandle) {
        self.state().renderer = Some(renderer);
    }

    fn detach_renderer(&self, renderer: RendererHandle) {
        let mut state = self.state();
        if state.renderer == Some(renderer) {
            state.renderer = None;
        }
    }

    fn add_input_listeners(&self) -> ListenerId {
        let id = ListenerId(Uuid::new_v4());
        self.state().listeners.insert(id);
        id
    }

    fn remove_input_listeners(&self, id: ListenerId) {
        self.state().listeners.remove(&id);
    }

    fn resize(&self, size: DeviceSize) {
        debug!(width = size.width, height = size.height, "surface resized");
        self.state().size = Some(size);
    }
}
