//! Host bridge: newline-delimited JSON lifecycle messages to render signals.
//!
//! The host application (a render handler script) writes one JSON object
//! per line:
//!
//! ```text
//! {"signal":"render_init"}
//! {"signal":"render_complete","current_frame":10,"end_frame":10,"is_animation":true,
//!  "context":{"resolution_x":1920,"resolution_y":1080,"engine":"CYCLES","samples":128,
//!             "frame_start":1,"frame_end":10,"frame_current":10},
//!  "render_result":"/tmp/frame_0010.png"}
//! {"signal":"render_cancel"}
//! ```
//!
//! `context` and `render_result` are optional. When present they update the
//! [`SharedRenderContext`] before the signal is published, so the tracker
//! sees the metadata that belongs to the signal. `render_init` clears the
//! context first.

use std::path::PathBuf;

use rendermail_core::render::RenderInfo;
use rendermail_events::{RenderSignal, SharedRenderContext, SignalBus};
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub const SIGNAL_RENDER_INIT: &str = "render_init";
pub const SIGNAL_RENDER_COMPLETE: &str = "render_complete";
pub const SIGNAL_RENDER_CANCEL: &str = "render_cancel";
/// Render errors are reported like cancellations.
pub const SIGNAL_RENDER_ERROR: &str = "render_error";

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Malformed host message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown render signal: {0}")]
    UnknownSignal(String),

    #[error("Host input error: {0}")]
    Io(#[from] std::io::Error),
}

/// One line of host input.
#[derive(Debug, Deserialize)]
pub struct HostMessage {
    pub signal: String,
    #[serde(default)]
    pub current_frame: Option<i32>,
    #[serde(default)]
    pub end_frame: Option<i32>,
    #[serde(default)]
    pub is_animation: bool,
    #[serde(default)]
    pub context: Option<RenderInfo>,
    #[serde(default)]
    pub render_result: Option<PathBuf>,
}

impl HostMessage {
    /// Translate into a lifecycle signal.
    ///
    /// Completion frames default to the context's frame numbers, and to a
    /// single-frame still when neither is given.
    pub fn to_signal(&self) -> Result<RenderSignal, BridgeError> {
        match self.signal.as_str() {
            SIGNAL_RENDER_INIT => Ok(RenderSignal::Started),
            SIGNAL_RENDER_COMPLETE => {
                let current_frame = self
                    .current_frame
                    .or_else(|| self.context.as_ref().map(|c| c.frame_current))
                    .unwrap_or(1);
                let end_frame = self
                    .end_frame
                    .or_else(|| self.context.as_ref().map(|c| c.frame_end))
                    .unwrap_or(current_frame);
                Ok(RenderSignal::Completed {
                    current_frame,
                    end_frame,
                    is_animation: self.is_animation,
                })
            }
            SIGNAL_RENDER_CANCEL | SIGNAL_RENDER_ERROR => Ok(RenderSignal::Cancelled),
            other => Err(BridgeError::UnknownSignal(other.to_string())),
        }
    }
}

/// Parse one line, update the shared context and publish the signal.
///
/// Blank lines yield `Ok(None)`.
pub fn apply_line(
    line: &str,
    context: &SharedRenderContext,
    bus: &SignalBus,
) -> Result<Option<RenderSignal>, BridgeError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let message: HostMessage = serde_json::from_str(line)?;
    let signal = message.to_signal()?;

    // A new job must not inherit the previous job's metadata or preview.
    if signal == RenderSignal::Started {
        context.clear();
    }
    if let Some(info) = message.context {
        context.update_info(info);
    }
    if let Some(path) = message.render_result {
        context.set_render_result(path);
    }

    bus.publish(signal.clone());
    Ok(Some(signal))
}

/// Read host messages until EOF, returning how many signals were published.
///
/// Malformed lines are logged and skipped; only read errors end the loop
/// early.
pub async fn run<R>(
    reader: R,
    context: &SharedRenderContext,
    bus: &SignalBus,
) -> Result<u64, BridgeError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut published = 0u64;

    while let Some(line) = lines.next_line().await? {
        match apply_line(&line, context, bus) {
            Ok(Some(signal)) => {
                published += 1;
                tracing::debug!(signal = signal.name(), "Host signal published");
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, raw = %line, "Skipping host message");
            }
        }
    }

    Ok(published)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use rendermail_events::RenderContextProvider;

    use super::*;

    fn parse(line: &str) -> HostMessage {
        serde_json::from_str(line).expect("valid host message")
    }

    #[test]
    fn init_and_cancel_signals() {
        assert_eq!(
            parse(r#"{"signal":"render_init"}"#).to_signal().unwrap(),
            RenderSignal::Started
        );
        assert_eq!(
            parse(r#"{"signal":"render_cancel"}"#).to_signal().unwrap(),
            RenderSignal::Cancelled
        );
        assert_eq!(
            parse(r#"{"signal":"render_error"}"#).to_signal().unwrap(),
            RenderSignal::Cancelled
        );
    }

    #[test]
    fn completion_without_frames_is_a_still() {
        assert_eq!(
            parse(r#"{"signal":"render_complete"}"#).to_signal().unwrap(),
            RenderSignal::Completed {
                current_frame: 1,
                end_frame: 1,
                is_animation: false,
            }
        );
    }

    #[test]
    fn completion_frames_fall_back_to_context() {
        let msg = parse(
            r#"{"signal":"render_complete","is_animation":true,
                "context":{"resolution_x":1920,"resolution_y":1080,"engine":"CYCLES",
                           "samples":64,"frame_start":1,"frame_end":24,"frame_current":7}}"#,
        );
        assert_eq!(
            msg.to_signal().unwrap(),
            RenderSignal::Completed {
                current_frame: 7,
                end_frame: 24,
                is_animation: true,
            }
        );
    }

    #[test]
    fn unknown_signal_is_rejected() {
        let err = parse(r#"{"signal":"render_pre"}"#).to_signal().unwrap_err();
        assert_matches!(err, BridgeError::UnknownSignal(name) if name == "render_pre");
    }

    #[test]
    fn blank_line_publishes_nothing() {
        let ctx = SharedRenderContext::new();
        let bus = SignalBus::default();
        assert!(apply_line("   ", &ctx, &bus).unwrap().is_none());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let ctx = SharedRenderContext::new();
        let bus = SignalBus::default();
        assert_matches!(apply_line("{not json", &ctx, &bus), Err(BridgeError::Json(_)));
    }

    #[test]
    fn render_init_clears_previous_job_context() {
        let ctx = SharedRenderContext::new();
        let bus = SignalBus::default();
        apply_line(
            r#"{"signal":"render_complete","render_result":"/tmp/old.png",
                "context":{"resolution_x":1920,"resolution_y":1080,"engine":"CYCLES",
                           "samples":64,"frame_start":1,"frame_end":1,"frame_current":1}}"#,
            &ctx,
            &bus,
        )
        .unwrap();

        apply_line(r#"{"signal":"render_init"}"#, &ctx, &bus).unwrap();

        assert!(ctx.render_info().is_err());
        assert_eq!(ctx.render_result(), None);
    }
}
