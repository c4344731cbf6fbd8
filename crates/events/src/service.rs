//! Notifier service loop.
//!
//! [`NotifierService`] is a single long-lived Tokio task that feeds bus
//! signals into the [`RenderTracker`] one at a time. Completion deliveries
//! are deferred by a one-shot timer whose wake-up comes back through the
//! same loop, so every mutation of the job state happens on this task.
//!
//! Each scheduled delivery captures a [`CancellationToken`] and the job id it
//! belongs to. A new start signal (or a cancel) cancels the pending timer,
//! and a wake-up for an outdated job is ignored by the tracker.
//!
//! When the bus closes (the host stopped sending) a pending delivery is
//! still made before the loop exits; cancelling the shutdown token drops it.

use std::time::Duration;

use rendermail_core::config::DEFAULT_DELIVERY_DELAY;
use rendermail_core::types::JobId;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::signal::{RenderSignal, SignalReceiver};
use crate::tracker::{CompletionDecision, RenderTracker};

/// A delivery timer that has not fired yet.
struct PendingDelivery {
    job_id: JobId,
    cancel: CancellationToken,
}

pub struct NotifierService {
    tracker: RenderTracker,
    delay: Duration,
    pending: Option<PendingDelivery>,
}

impl NotifierService {
    /// Create a service with the default 500 ms delivery delay.
    pub fn new(tracker: RenderTracker) -> Self {
        Self {
            tracker,
            delay: DEFAULT_DELIVERY_DELAY,
            pending: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Run until the bus closes or `shutdown` is cancelled.
    ///
    /// When the bus closes, a delivery still waiting on its timer is given
    /// the chance to fire before the loop exits. On `shutdown` it is dropped.
    pub async fn run(mut self, mut signals: SignalReceiver, shutdown: CancellationToken) {
        let (wake_tx, mut wake_rx) = mpsc::channel::<JobId>(8);
        let mut bus_open = true;
        tracing::info!(
            delay_ms = self.delay.as_millis() as u64,
            "Render notifier started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Render notifier shutting down");
                    break;
                }
                Some(job_id) = wake_rx.recv() => {
                    self.on_timer(job_id).await;
                    if !bus_open && self.pending.is_none() {
                        tracing::info!("Pending notification delivered, render notifier stopping");
                        break;
                    }
                }
                signal = signals.recv(), if bus_open => {
                    match signal {
                        Some(signal) => self.handle(signal, &wake_tx).await,
                        None => {
                            bus_open = false;
                            match &self.pending {
                                Some(pending) => tracing::info!(
                                    job_id = pending.job_id,
                                    "Signal bus closed, waiting for pending notification",
                                ),
                                None => {
                                    tracing::info!("Signal bus closed, render notifier stopping");
                                    break;
                                }
                            }
                        }
                    }
                }
            }
        }

        if let Some(pending) = self.pending.take() {
            pending.cancel.cancel();
            tracing::warn!(job_id = pending.job_id, "Pending notification dropped");
        }
    }

    async fn handle(&mut self, signal: RenderSignal, wake_tx: &mpsc::Sender<JobId>) {
        tracing::debug!(signal = signal.name(), "Render signal received");

        match signal {
            RenderSignal::Started => {
                self.cancel_pending();
                self.tracker.on_render_start();
            }
            RenderSignal::Completed {
                current_frame,
                end_frame,
                is_animation,
            } => {
                let decision = self
                    .tracker
                    .on_render_complete(current_frame, end_frame, is_animation);
                if let CompletionDecision::Schedule { job_id } = decision {
                    self.schedule(job_id, wake_tx);
                }
            }
            RenderSignal::Cancelled => {
                self.cancel_pending();
                if let Some(outcome) = self.tracker.on_render_cancel_or_error().await {
                    tracing::info!(success = outcome.success, message = %outcome.message, "Cancellation notice dispatched");
                }
            }
        }
    }

    /// Arm the one-shot delivery timer for `job_id`.
    ///
    /// A second terminal signal for a job whose timer is already armed
    /// does not arm another one.
    fn schedule(&mut self, job_id: JobId, wake_tx: &mpsc::Sender<JobId>) {
        if self.pending.as_ref().is_some_and(|p| p.job_id == job_id) {
            tracing::debug!(job_id, "Delivery already scheduled");
            return;
        }
        self.cancel_pending();

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let tx = wake_tx.clone();
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    // The loop only goes away on shutdown, when the wake-up is moot.
                    let _ = tx.send(job_id).await;
                }
            }
        });

        self.pending = Some(PendingDelivery { job_id, cancel });
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.cancel.cancel();
            tracing::debug!(job_id = pending.job_id, "Pending delivery cancelled");
        }
    }

    async fn on_timer(&mut self, job_id: JobId) {
        if self.pending.as_ref().is_some_and(|p| p.job_id == job_id) {
            self.pending = None;
        }
        if let Some(outcome) = self.tracker.deliver_completion_notification(job_id).await {
            tracing::info!(
                job_id,
                success = outcome.success,
                message = %outcome.message,
                "Completion notice dispatched",
            );
        }
    }
}
