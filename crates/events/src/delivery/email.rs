//! Email notification delivery via SMTP.
//!
//! [`EmailDispatcher`] validates the sender and recipient configuration,
//! assembles a plain-text message (multipart when a preview image is
//! attached) and hands it to a [`MailTransport`]. [`SmtpSubmission`] is the
//! production transport, built on `lettre`'s async SMTP client and
//! authenticating with the sender address and app password.
//!
//! Every failure is converted to a [`DispatchOutcome`] and shown on the
//! notice surface; nothing is retried.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use rendermail_core::config::NotifierConfig;
use rendermail_core::message::{Notification, SENT_NOTICE};

use super::notice::{NoticeLevel, NoticeSurface};
use super::{DispatchOutcome, Dispatcher};
use crate::preview::PREVIEW_FILE_NAME;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The sender is empty or not an address.
    #[error("Invalid sender email")]
    InvalidSender,

    /// No usable recipient after applying the send-to-self policy.
    #[error("No recipient email")]
    NoRecipients,

    /// A sender or recipient address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The attachment could not be read. Logged; the email goes out without it.
    #[error("Failed to attach file: {0}")]
    Attachment(#[source] std::io::Error),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    /// The server rejected the credentials.
    #[error("{} ({})", TransportFailure::Authentication.user_message(), .0)]
    Authentication(#[source] lettre::transport::smtp::Error),

    /// No SMTP session could be established (DNS, TCP, TLS).
    #[error("{} ({})", TransportFailure::Connection.user_message(), .0)]
    Connection(#[source] lettre::transport::smtp::Error),

    /// Any other SMTP-level failure.
    #[error("{} ({})", TransportFailure::Send.user_message(), .0)]
    Transport(#[source] lettre::transport::smtp::Error),
}

impl DispatchError {
    /// True for problems with the notifier configuration rather than the
    /// mail server.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DispatchError::InvalidSender | DispatchError::NoRecipients | DispatchError::Address(_)
        )
    }
}

/// SMTP reply codes meaning the login was refused.
const AUTH_FAILURE_CODES: &[&str] = &["530", "534", "535"];

/// Kind of SMTP failure, as reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    Authentication,
    Connection,
    Send,
}

impl TransportFailure {
    /// Classify from the server's reply code, if there was one, and whether
    /// the client itself gave up (e.g. an unparseable reply).
    pub fn classify(status: Option<&str>, is_client: bool) -> Self {
        match status {
            Some(code) if AUTH_FAILURE_CODES.contains(&code) => TransportFailure::Authentication,
            Some(_) => TransportFailure::Send,
            None if is_client => TransportFailure::Send,
            None => TransportFailure::Connection,
        }
    }

    pub fn user_message(self) -> &'static str {
        match self {
            TransportFailure::Authentication => {
                "Failed to send email: authentication failed, check the sender address and app password"
            }
            TransportFailure::Connection => "Failed to send email: could not connect to mail server",
            TransportFailure::Send => "Failed to send email",
        }
    }
}

/// Map a `lettre` SMTP error to the user-facing taxonomy.
pub fn classify_transport_error(err: lettre::transport::smtp::Error) -> DispatchError {
    let status = err.status().map(|code| code.to_string());
    match TransportFailure::classify(status.as_deref(), err.is_client()) {
        TransportFailure::Authentication => DispatchError::Authentication(err),
        TransportFailure::Connection => DispatchError::Connection(err),
        TransportFailure::Send => DispatchError::Transport(err),
    }
}

// ---------------------------------------------------------------------------
// MailTransport
// ---------------------------------------------------------------------------

/// Submits a fully built message to a mail server.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn submit(&self, message: Message) -> Result<(), DispatchError>;
}

/// Port on which the submission server expects TLS from the first byte.
const IMPLICIT_TLS_PORT: u16 = 465;

/// Authenticated SMTP submission over an encrypted connection.
///
/// Port 465 uses implicit TLS; any other port negotiates STARTTLS.
pub struct SmtpSubmission {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpSubmission {
    pub fn from_config(config: &NotifierConfig) -> Result<Self, DispatchError> {
        let builder = if config.smtp_port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        }
        .map_err(classify_transport_error)?;

        let transport = builder
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.sender.trim().to_string(),
                config.password.clone(),
            ))
            .build();

        Ok(Self { transport })
    }
}

#[async_trait]
impl MailTransport for SmtpSubmission {
    async fn submit(&self, message: Message) -> Result<(), DispatchError> {
        self.transport
            .send(message)
            .await
            .map_err(classify_transport_error)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// EmailDispatcher
// ---------------------------------------------------------------------------

/// Sends render notifications by email.
pub struct EmailDispatcher {
    config: NotifierConfig,
    transport: Arc<dyn MailTransport>,
    notice: Arc<dyn NoticeSurface>,
}

impl EmailDispatcher {
    pub fn new(
        config: NotifierConfig,
        transport: Arc<dyn MailTransport>,
        notice: Arc<dyn NoticeSurface>,
    ) -> Self {
        Self {
            config,
            transport,
            notice,
        }
    }

    /// Create a dispatcher that submits over SMTP using `config`.
    pub fn smtp(
        config: NotifierConfig,
        notice: Arc<dyn NoticeSurface>,
    ) -> Result<Self, DispatchError> {
        let transport = SmtpSubmission::from_config(&config)?;
        Ok(Self::new(config, Arc::new(transport), notice))
    }

    /// Validate the configured sender and resolve the recipients.
    fn envelope(&self) -> Result<(Mailbox, Vec<Mailbox>), DispatchError> {
        let sender = self.config.sender.trim();
        if !sender.contains('@') {
            return Err(DispatchError::InvalidSender);
        }

        let recipients = self.config.resolved_recipients();
        if recipients.is_empty() {
            return Err(DispatchError::NoRecipients);
        }

        let from: Mailbox = sender.parse()?;
        let to = recipients
            .iter()
            .map(|r| r.parse::<Mailbox>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok((from, to))
    }

    /// Assemble the MIME message for `notification`.
    ///
    /// `attachment` holds the already-read preview bytes; when present the
    /// message becomes `multipart/mixed` with the image as a JPEG part.
    pub fn build_message(
        &self,
        notification: &Notification,
        attachment: Option<Vec<u8>>,
    ) -> Result<Message, DispatchError> {
        let (from, to) = self.envelope()?;

        let mut builder = Message::builder()
            .from(from)
            .subject(notification.subject.clone());
        for mailbox in to {
            builder = builder.to(mailbox);
        }

        let message = match attachment {
            Some(bytes) => {
                let jpeg = ContentType::parse("image/jpeg")
                    .map_err(|e| DispatchError::Build(e.to_string()))?;
                builder.multipart(
                    MultiPart::mixed()
                        .singlepart(SinglePart::plain(notification.body.clone()))
                        .singlepart(Attachment::new(PREVIEW_FILE_NAME.to_string()).body(bytes, jpeg)),
                )
            }
            None => builder
                .header(ContentType::TEXT_PLAIN)
                .body(notification.body.clone()),
        }
        .map_err(|e| DispatchError::Build(e.to_string()))?;

        Ok(message)
    }

    async fn try_send(&self, notification: &Notification) -> Result<(), DispatchError> {
        // Fail on configuration problems before touching the attachment.
        self.envelope()?;

        let attachment = match &notification.attachment {
            Some(path) => match read_attachment(path).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Sending without attachment");
                    None
                }
            },
            None => None,
        };

        let message = self.build_message(notification, attachment)?;
        self.transport.submit(message).await
    }
}

#[async_trait]
impl Dispatcher for EmailDispatcher {
    async fn send(&self, notification: &Notification) -> DispatchOutcome {
        match self.try_send(notification).await {
            Ok(()) => {
                tracing::info!(subject = %notification.subject, "Notification email sent");
                if let Some(path) = &notification.attachment {
                    remove_attachment(path).await;
                }
                DispatchOutcome::sent(SENT_NOTICE)
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(
                    error = %e,
                    configuration = e.is_configuration(),
                    "Notification email not sent",
                );
                self.notice.show(NoticeLevel::Error, &message);
                DispatchOutcome::failed(message)
            }
        }
    }
}

async fn read_attachment(path: &Path) -> Result<Vec<u8>, DispatchError> {
    tokio::fs::read(path).await.map_err(DispatchError::Attachment)
}

/// Delete the temporary preview after it has been delivered.
async fn remove_attachment(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed delivered preview"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove preview"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
