//! Preview image capture for completion emails.
//!
//! [`FilePreviewCapture`] takes the latest render result reported by the
//! host, re-encodes it as JPEG and writes it to a scratch directory so the
//! dispatcher can attach it. Capture is **best-effort**: any failure is
//! logged and reported as "no preview" instead of blocking the notification.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::context::SharedRenderContext;

/// File name of the preview written for attachment.
pub const PREVIEW_FILE_NAME: &str = "render_preview.jpg";

#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error("No render result found")]
    NoRenderResult,

    #[error("Preview I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preview image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Produces a preview image of the most recent render, if there is one.
#[async_trait]
pub trait PreviewCapture: Send + Sync {
    /// Persist a preview and return its path, or `None` when no renderable
    /// image is available.
    async fn capture(&self) -> Option<PathBuf>;
}

/// Captures previews from the render result path the host reports.
pub struct FilePreviewCapture {
    context: SharedRenderContext,
    output_dir: PathBuf,
}

impl FilePreviewCapture {
    pub fn new(context: SharedRenderContext, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            context,
            output_dir: output_dir.into(),
        }
    }

    /// Where the JPEG preview is written.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(PREVIEW_FILE_NAME)
    }
}

#[async_trait]
impl PreviewCapture for FilePreviewCapture {
    async fn capture(&self) -> Option<PathBuf> {
        let Some(source) = self.context.render_result() else {
            tracing::warn!(error = %PreviewError::NoRenderResult, "Skipping preview");
            return None;
        };
        let dest = self.output_path();

        let result = tokio::task::spawn_blocking(move || save_as_jpeg(&source, &dest)).await;

        match result {
            Ok(Ok(path)) => {
                tracing::info!(path = %path.display(), "Preview saved");
                Some(path)
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Failed to save preview");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Preview task did not complete");
                None
            }
        }
    }
}

/// Decode `source` and write it to `dest` as an RGB JPEG.
///
/// JPEG has no alpha channel, so the image is flattened to RGB first.
pub fn save_as_jpeg(source: &Path, dest: &Path) -> Result<PathBuf, PreviewError> {
    let image = image::open(source)?;
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    image
        .to_rgb8()
        .save_with_format(dest, image::ImageFormat::Jpeg)?;
    Ok(dest.to_path_buf())
}
