//! User-facing notice surface.

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Displays a short message to the user.
///
/// Display is best-effort; implementations swallow their own failures.
pub trait NoticeSurface: Send + Sync {
    fn show(&self, level: NoticeLevel, message: &str);
}

/// Notice surface that writes notices to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotice;

impl NoticeSurface for LogNotice {
    fn show(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => tracing::info!(notice = message, "User notice"),
            NoticeLevel::Error => tracing::error!(notice = message, "User notice"),
        }
    }
}
