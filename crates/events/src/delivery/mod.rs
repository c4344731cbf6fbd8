//! Outbound delivery of render notifications.
//!
//! [`Dispatcher`] is the boundary the tracker calls; [`email`] implements it
//! over SMTP and [`notice`] is the user-facing surface that success and
//! failure messages are shown on.

pub mod email;
pub mod notice;

use async_trait::async_trait;
use rendermail_core::message::Notification;

/// Result of a dispatch attempt, already rendered for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub success: bool,
    pub message: String,
}

impl DispatchOutcome {
    pub fn sent(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Sends a single notification.
///
/// Implementations never fail past this boundary: configuration and
/// transport errors come back as an unsuccessful [`DispatchOutcome`].
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn send(&self, notification: &Notification) -> DispatchOutcome;
}
