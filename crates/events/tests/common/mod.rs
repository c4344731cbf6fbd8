//! Test doubles for the tracker's collaborators.
//!
//! Each double records what it was asked to do so tests can assert on the
//! exact number and content of dispatches.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rendermail_core::message::{Notification, SENT_NOTICE};
use rendermail_core::render::{RenderInfo, ENGINE_CYCLES};
use rendermail_events::context::ContextError;
use rendermail_events::{
    Collaborators, DispatchOutcome, Dispatcher, NoticeLevel, NoticeSurface, PreviewCapture,
    RenderContextProvider,
};

/// Dispatcher that records every notification and answers with a fixed outcome.
pub struct RecordingDispatcher {
    pub sent: Mutex<Vec<Notification>>,
    succeed: bool,
    latency: Option<Duration>,
}

impl RecordingDispatcher {
    pub fn succeeding() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            succeed: true,
            latency: None,
        }
    }

    pub fn failing() -> Self {
        Self {
            succeed: false,
            ..Self::succeeding()
        }
    }

    /// Succeeds, but each send holds the caller for `latency` first, like a
    /// slow mail server.
    pub fn slow(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::succeeding()
        }
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<Notification> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Dispatcher for RecordingDispatcher {
    async fn send(&self, notification: &Notification) -> DispatchOutcome {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.sent.lock().unwrap().push(notification.clone());
        if self.succeed {
            DispatchOutcome::sent(SENT_NOTICE)
        } else {
            DispatchOutcome::failed("Failed to send email: connection refused")
        }
    }
}

/// Context provider returning a fixed snapshot, or nothing.
pub struct FixedContext(pub Option<RenderInfo>);

impl RenderContextProvider for FixedContext {
    fn render_info(&self) -> Result<RenderInfo, ContextError> {
        self.0.clone().ok_or(ContextError::Unavailable)
    }
}

/// Preview capture returning a fixed path, or nothing.
pub struct FixedPreview(pub Option<PathBuf>);

#[async_trait]
impl PreviewCapture for FixedPreview {
    async fn capture(&self) -> Option<PathBuf> {
        self.0.clone()
    }
}

#[derive(Default)]
pub struct RecordingNotice {
    pub shown: Mutex<Vec<(NoticeLevel, String)>>,
}

impl NoticeSurface for RecordingNotice {
    fn show(&self, level: NoticeLevel, message: &str) {
        self.shown.lock().unwrap().push((level, message.to_string()));
    }
}

/// 1920x1080 Cycles still at 128 samples.
pub fn cycles_still() -> RenderInfo {
    RenderInfo {
        resolution_x: 1920,
        resolution_y: 1080,
        engine: ENGINE_CYCLES.to_string(),
        samples: Some(128),
        frame_start: 1,
        frame_end: 1,
        frame_current: 1,
    }
}

pub struct Harness {
    pub dispatcher: Arc<RecordingDispatcher>,
    pub notice: Arc<RecordingNotice>,
    pub collaborators: Collaborators,
}

pub fn harness_with(
    dispatcher: RecordingDispatcher,
    info: Option<RenderInfo>,
    preview: Option<PathBuf>,
) -> Harness {
    let dispatcher = Arc::new(dispatcher);
    let notice = Arc::new(RecordingNotice::default());
    let collaborators = Collaborators {
        context: Arc::new(FixedContext(info)),
        preview: Arc::new(FixedPreview(preview)),
        dispatcher: dispatcher.clone(),
        notice: notice.clone(),
    };
    Harness {
        dispatcher,
        notice,
        collaborators,
    }
}

pub fn harness() -> Harness {
    harness_with(RecordingDispatcher::succeeding(), Some(cycles_still()), None)
}
