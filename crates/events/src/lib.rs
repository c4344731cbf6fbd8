//! Render lifecycle tracking and notification delivery.
//!
//! - [`SignalBus`] -- in-process fan-out of host [`RenderSignal`]s, one
//!   lossless queue per subscriber.
//! - [`RenderTracker`] -- the per-job state machine deciding when exactly one
//!   notification is sent.
//! - [`NotifierService`] -- single-task loop that feeds signals to the
//!   tracker and owns the delayed-delivery timer.
//! - [`context`], [`preview`] and [`delivery`] -- the boundary collaborators
//!   the tracker consults (render metadata, preview image, SMTP transport,
//!   user notices).

pub mod context;
pub mod delivery;
pub mod preview;
pub mod service;
pub mod signal;
pub mod tracker;

pub use context::{RenderContextProvider, SharedRenderContext};
pub use delivery::email::{EmailDispatcher, SmtpSubmission, TransportFailure};
pub use delivery::notice::{LogNotice, NoticeLevel, NoticeSurface};
pub use delivery::{DispatchOutcome, Dispatcher};
pub use preview::{FilePreviewCapture, PreviewCapture};
pub use service::NotifierService;
pub use signal::{RenderSignal, SignalBus, SignalReceiver};
pub use tracker::{Collaborators, CompletionDecision, RenderJobState, RenderPhase, RenderTracker};
