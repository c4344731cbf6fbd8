//! Notification subjects and bodies.
//!
//! [`Notification`] is the transport-agnostic message handed to a
//! dispatcher: subject, plain-text body and an optional image attachment.

use std::path::PathBuf;
use std::time::Duration;

use crate::duration::format_hms;
use crate::render::{RenderInfo, NOT_APPLICABLE};

/// Subject of the completion notification.
pub const SUBJECT_COMPLETE: &str = "📸 Blender Render Complete";

/// Subject of the cancellation/error notification.
pub const SUBJECT_CANCELLED: &str = "⚠️ Blender Render Cancelled";

/// Body of the cancellation/error notification.
pub const BODY_CANCELLED: &str = "The render was cancelled or encountered an error.";

/// Subject of the configuration test email.
pub const SUBJECT_TEST: &str = "🧪 Blender Email Notifier - Test";

/// Body of the configuration test email.
pub const BODY_TEST: &str = "This is email test from Blender Render Email Notifier Add-on.

If you receive this email, the add-on has been successfully installed and can send an email after rendering is complete.

Happy rendering! 😊
";

/// Notice shown to the user after a successful send.
pub const SENT_NOTICE: &str = "📤 Email sent successfully!";

/// An outbound notification, independent of the transport that sends it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
    /// Image to attach, if one could be captured.
    pub attachment: Option<PathBuf>,
}

impl Notification {
    /// Create a notification without an attachment.
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            attachment: None,
        }
    }

    /// Attach an image, if any.
    pub fn with_attachment(mut self, attachment: Option<PathBuf>) -> Self {
        self.attachment = attachment;
        self
    }

    /// Completion notification for a render that took `elapsed`.
    ///
    /// Missing render metadata renders every field as `N/A`.
    pub fn completion(elapsed: Duration, info: Option<&RenderInfo>) -> Self {
        Self::new(SUBJECT_COMPLETE, completion_body(elapsed, info))
    }

    /// Fixed cancellation/error notification. Never carries an attachment.
    pub fn cancellation() -> Self {
        Self::new(SUBJECT_CANCELLED, BODY_CANCELLED)
    }

    /// Fixed test email used to check the sender configuration.
    pub fn test() -> Self {
        Self::new(SUBJECT_TEST, BODY_TEST)
    }
}

fn completion_body(elapsed: Duration, info: Option<&RenderInfo>) -> String {
    let na = || NOT_APPLICABLE.to_string();
    let (resolution, samples, engine, frame_start, frame_end, frame_current) = match info {
        Some(info) => (
            info.resolution(),
            info.samples_label(),
            info.engine.clone(),
            info.frame_start.to_string(),
            info.frame_end.to_string(),
            info.frame_current.to_string(),
        ),
        None => (na(), na(), na(), na(), na(), na()),
    };

    format!(
        "🎉 Render Complete!\n\
         - Duration: {} ({:.2} seconds)\n\
         - Resolution: {resolution}\n\
         - Samples: {samples}\n\
         - Engine: {engine}\n\
         - Frame Range: {frame_start} to {frame_end}\n\
         - Current Frame: {frame_current}\n",
        format_hms(elapsed),
        elapsed.as_secs_f64(),
    )
}
