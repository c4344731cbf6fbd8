//! Host render lifecycle signals and the in-process bus that carries them.
//!
//! [`SignalBus`] lets the host bridge publish [`RenderSignal`]s while the
//! notifier service (and any other observer) consumes them independently.
//! Every subscriber gets its own unbounded queue, so a subscriber that is
//! busy sending an email still sees every signal, in order, once it is free.

use std::sync::Mutex;

use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// RenderSignal
// ---------------------------------------------------------------------------

/// A lifecycle signal emitted by the host's render pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderSignal {
    /// A render job began.
    Started,

    /// A frame (or the whole still image) finished rendering.
    Completed {
        current_frame: i32,
        end_frame: i32,
        /// True when the job renders a frame range rather than a still.
        is_animation: bool,
    },

    /// The render was cancelled by the user or aborted with an error.
    Cancelled,
}

impl RenderSignal {
    /// Short name used in log fields.
    pub fn name(&self) -> &'static str {
        match self {
            RenderSignal::Started => "render_start",
            RenderSignal::Completed { .. } => "render_complete",
            RenderSignal::Cancelled => "render_cancel",
        }
    }
}

// ---------------------------------------------------------------------------
// SignalBus
// ---------------------------------------------------------------------------

/// Receiving half of a bus subscription.
pub type SignalReceiver = mpsc::UnboundedReceiver<RenderSignal>;

/// In-process fan-out bus for render signals.
///
/// Subscriptions never drop signals. Dropping the bus closes every
/// subscription once its queued signals have been read.
///
/// # Usage
///
/// ```rust
/// use rendermail_events::signal::{RenderSignal, SignalBus};
///
/// let bus = SignalBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(RenderSignal::Started);
/// assert_eq!(rx.try_recv().unwrap(), RenderSignal::Started);
/// ```
#[derive(Default)]
pub struct SignalBus {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<RenderSignal>>>,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a signal to all current subscribers.
    ///
    /// Signals published while nobody is subscribed are dropped. Subscribers
    /// whose receiver has gone away are pruned.
    pub fn publish(&self, signal: RenderSignal) {
        let Ok(mut subscribers) = self.subscribers.lock() else {
            tracing::error!(signal = signal.name(), "Signal bus poisoned, signal dropped");
            return;
        };
        subscribers.retain(|tx| tx.send(signal.clone()).is_ok());
    }

    /// Subscribe to every signal published after this call.
    pub fn subscribe(&self) -> SignalReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        match self.subscribers.lock() {
            Ok(mut subscribers) => subscribers.push(tx),
            Err(_) => tracing::error!("Signal bus poisoned, subscription closed"),
        }
        rx
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
