//! Render lifecycle tracker.
//!
//! [`RenderTracker`] owns the per-job [`RenderJobState`] and decides, from
//! the host's start / complete / cancel signals, when the single outcome
//! notification of a render job goes out. All state lives in the tracker;
//! the service loop is its only writer.
//!
//! Job phases:
//!
//! ```text
//! Idle               --start-->                  Rendering
//! Rendering          --complete, frame < end-->  AwaitingFinalFrame
//! Rendering          --complete (still)-->       Notified
//! AwaitingFinalFrame --complete, last frame-->   Notified
//! Rendering|Awaiting --cancel / error-->         Notified
//! any                --start-->                  Rendering (fresh job)
//! ```
//!
//! Completion does not send immediately: it returns
//! [`CompletionDecision::Schedule`] and the caller runs
//! [`RenderTracker::deliver_completion_notification`] after a short delay so
//! the host has flushed the render result before the preview is read.

use std::sync::Arc;

use chrono::Utc;
use rendermail_core::duration::elapsed_since;
use rendermail_core::message::{Notification, SENT_NOTICE};
use rendermail_core::types::{JobId, Timestamp};

use crate::context::RenderContextProvider;
use crate::delivery::notice::{NoticeLevel, NoticeSurface};
use crate::delivery::{DispatchOutcome, Dispatcher};
use crate::preview::PreviewCapture;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Phase of the current render job, derived from [`RenderJobState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    Idle,
    Rendering,
    AwaitingFinalFrame,
    Notified,
}

/// Mutable state of the current render job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderJobState {
    /// Incremented on every start signal; `0` before the first job.
    pub job_id: JobId,
    pub started_at: Option<Timestamp>,
    /// Guards against a second notification for the same job.
    pub notification_sent: bool,
    /// True between the start signal and the terminal signal.
    pub in_progress: bool,
    /// Set once an intermediate animation frame has completed.
    pub is_animation_job: bool,
}

impl RenderJobState {
    pub fn phase(&self) -> RenderPhase {
        if self.notification_sent {
            RenderPhase::Notified
        } else if !self.in_progress {
            RenderPhase::Idle
        } else if self.is_animation_job {
            RenderPhase::AwaitingFinalFrame
        } else {
            RenderPhase::Rendering
        }
    }
}

/// What the caller should do after a completion signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionDecision {
    /// No job in progress; the signal is stale or unmatched.
    Ignored,
    /// An animation frame finished but more frames follow.
    AwaitingFinalFrame,
    /// The job is done; deliver the notification for `job_id` after the delay.
    Schedule { job_id: JobId },
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// External services the tracker consults when it notifies.
#[derive(Clone)]
pub struct Collaborators {
    pub context: Arc<dyn RenderContextProvider>,
    pub preview: Arc<dyn PreviewCapture>,
    pub dispatcher: Arc<dyn Dispatcher>,
    pub notice: Arc<dyn NoticeSurface>,
}

type Clock = Arc<dyn Fn() -> Timestamp + Send + Sync>;

// ---------------------------------------------------------------------------
// RenderTracker
// ---------------------------------------------------------------------------

pub struct RenderTracker {
    state: RenderJobState,
    collaborators: Collaborators,
    clock: Clock,
}

impl RenderTracker {
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            state: RenderJobState::default(),
            collaborators,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock, for deterministic durations.
    pub fn with_clock(mut self, clock: impl Fn() -> Timestamp + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn state(&self) -> &RenderJobState {
        &self.state
    }

    pub fn phase(&self) -> RenderPhase {
        self.state.phase()
    }

    /// Begin a fresh job, discarding whatever the previous one left behind.
    pub fn on_render_start(&mut self) -> JobId {
        self.state = RenderJobState {
            job_id: self.state.job_id + 1,
            started_at: Some((self.clock)()),
            notification_sent: false,
            in_progress: true,
            is_animation_job: false,
        };
        tracing::info!(job_id = self.state.job_id, "Render started - timer reset");
        self.state.job_id
    }

    /// Handle a frame or still completion.
    pub fn on_render_complete(
        &mut self,
        current_frame: i32,
        end_frame: i32,
        is_animation: bool,
    ) -> CompletionDecision {
        if !self.state.in_progress || self.state.notification_sent {
            tracing::debug!(current_frame, "Completion without an active render ignored");
            return CompletionDecision::Ignored;
        }

        if is_animation && current_frame < end_frame {
            self.state.is_animation_job = true;
            tracing::debug!(
                job_id = self.state.job_id,
                current_frame,
                end_frame,
                "Animation frame complete, awaiting final frame",
            );
            return CompletionDecision::AwaitingFinalFrame;
        }

        tracing::info!(job_id = self.state.job_id, "Render complete - scheduling email");
        CompletionDecision::Schedule {
            job_id: self.state.job_id,
        }
    }

    /// The delayed completion path. Sends at most once per job.
    ///
    /// Returns `None` when the invocation is stale: the job already
    /// notified, is no longer in progress, or a newer job has started.
    pub async fn deliver_completion_notification(
        &mut self,
        job_id: JobId,
    ) -> Option<DispatchOutcome> {
        if job_id != self.state.job_id || self.state.notification_sent || !self.state.in_progress {
            tracing::debug!(
                job_id,
                current_job = self.state.job_id,
                "Stale completion delivery ignored"
            );
            return None;
        }

        self.state.notification_sent = true;
        self.state.in_progress = false;

        let elapsed = elapsed_since(self.state.started_at, (self.clock)());
        let info = match self.collaborators.context.render_info() {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::warn!(error = %e, "Render metadata unavailable, using placeholders");
                None
            }
        };

        tracing::info!(job_id, "Saving render preview");
        let preview = self.collaborators.preview.capture().await;

        let notification = Notification::completion(elapsed, info.as_ref()).with_attachment(preview);

        tracing::info!(
            job_id,
            elapsed_secs = elapsed.as_secs(),
            attachment = notification.attachment.is_some(),
            "Sending completion email",
        );
        let outcome = self.collaborators.dispatcher.send(&notification).await;

        if outcome.success {
            self.collaborators.notice.show(NoticeLevel::Info, SENT_NOTICE);
        }

        Some(outcome)
    }

    /// Handle cancellation or a render error. Sends immediately.
    ///
    /// Returns `None` when the job already concluded or never started.
    pub async fn on_render_cancel_or_error(&mut self) -> Option<DispatchOutcome> {
        if self.state.notification_sent || !self.state.in_progress {
            tracing::debug!("Cancel without an active render ignored");
            return None;
        }

        self.state.notification_sent = true;
        self.state.in_progress = false;
        self.state.is_animation_job = false;

        tracing::warn!(job_id = self.state.job_id, "Render cancelled - sending notification");
        Some(
            self.collaborators
                .dispatcher
                .send(&Notification::cancellation())
                .await,
        )
    }
}
