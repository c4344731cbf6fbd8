//! Render context provider.
//!
//! The tracker asks a [`RenderContextProvider`] for the current render
//! settings when it composes a completion notification. The host bridge
//! keeps a [`SharedRenderContext`] up to date from the lifecycle messages it
//! receives, which also records where the latest render result was written.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use rendermail_core::render::RenderInfo;

/// Error returned when no render metadata can be read.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("Render context unavailable")]
    Unavailable,
}

/// Source of render metadata for notifications.
pub trait RenderContextProvider: Send + Sync {
    /// Current resolution, engine, samples and frame range.
    fn render_info(&self) -> Result<RenderInfo, ContextError>;
}

#[derive(Debug, Default)]
struct HostSnapshot {
    info: Option<RenderInfo>,
    render_result: Option<PathBuf>,
}

/// Latest host-reported render state, cheap to clone and share.
#[derive(Debug, Clone, Default)]
pub struct SharedRenderContext {
    inner: Arc<RwLock<HostSnapshot>>,
}

impl SharedRenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored render metadata.
    pub fn update_info(&self, info: RenderInfo) {
        if let Ok(mut snapshot) = self.inner.write() {
            snapshot.info = Some(info);
        }
    }

    /// Record the path of the most recent render result image.
    pub fn set_render_result(&self, path: PathBuf) {
        if let Ok(mut snapshot) = self.inner.write() {
            snapshot.render_result = Some(path);
        }
    }

    /// Forget the previous job's metadata and render result.
    pub fn clear(&self) {
        if let Ok(mut snapshot) = self.inner.write() {
            *snapshot = HostSnapshot::default();
        }
    }

    /// Path of the most recent render result image, if the host reported one.
    pub fn render_result(&self) -> Option<PathBuf> {
        self.inner
            .read()
            .ok()
            .and_then(|snapshot| snapshot.render_result.clone())
    }
}

impl RenderContextProvider for SharedRenderContext {
    fn render_info(&self) -> Result<RenderInfo, ContextError> {
        self.inner
            .read()
            .map_err(|_| ContextError::Unavailable)?
            .info
            .clone()
            .ok_or(ContextError::Unavailable)
    }
}
