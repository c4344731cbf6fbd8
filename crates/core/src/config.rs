//! Notifier configuration: sender credentials, recipients and delivery knobs.
//!
//! Loaded from environment variables by [`NotifierConfig::from_env`]. The
//! sender address doubles as the SMTP username, and the password is an
//! app-specific credential held in plain text.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use validator::ValidateEmail;

use crate::error::CoreError;

/* --------------------------------------------------------------------------
Defaults
-------------------------------------------------------------------------- */

/// Default mail submission host.
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

/// Default mail submission port (implicit TLS).
pub const DEFAULT_SMTP_PORT: u16 = 465;

/// Delay between the terminal completion signal and the delivery attempt.
pub const DEFAULT_DELIVERY_DELAY: Duration = Duration::from_millis(500);

/// Message returned when the sender address fails validation on edit.
pub const INVALID_SENDER_MESSAGE: &str = "Please enter a valid email address";

/* --------------------------------------------------------------------------
NotifierConfig
-------------------------------------------------------------------------- */

/// Configuration for the render notifier.
#[derive(Clone)]
pub struct NotifierConfig {
    /// Sender address; also the SMTP login.
    pub sender: String,
    /// App-specific password for the sender account.
    pub password: String,
    /// Recipients as entered; blank entries are ignored.
    pub recipients: Vec<String>,
    /// Send only to the sender, ignoring `recipients`.
    pub send_to_self: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub delivery_delay: Duration,
    /// Directory the preview JPEG is written to.
    pub preview_dir: PathBuf,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            sender: String::new(),
            password: String::new(),
            recipients: Vec::new(),
            send_to_self: false,
            smtp_host: DEFAULT_SMTP_HOST.to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
            delivery_delay: DEFAULT_DELIVERY_DELAY,
            preview_dir: std::env::temp_dir(),
        }
    }
}

impl fmt::Debug for NotifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifierConfig")
            .field("sender", &self.sender)
            .field("password", &"<redacted>")
            .field("recipients", &self.recipients)
            .field("send_to_self", &self.send_to_self)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("delivery_delay", &self.delivery_delay)
            .field("preview_dir", &self.preview_dir)
            .finish()
    }
}

impl NotifierConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default            |
    /// |---------------------------|--------------------|
    /// | `RENDERMAIL_SENDER`       | empty              |
    /// | `RENDERMAIL_PASSWORD`     | empty              |
    /// | `RENDERMAIL_RECIPIENTS`   | empty (comma list) |
    /// | `RENDERMAIL_SEND_TO_SELF` | `false`            |
    /// | `SMTP_HOST`               | `smtp.gmail.com`   |
    /// | `SMTP_PORT`               | `465`              |
    /// | `RENDERMAIL_DELAY_MS`     | `500`              |
    /// | `RENDERMAIL_PREVIEW_DIR`  | system temp dir    |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unparseable numeric or boolean values are reported as
    /// [`CoreError::Config`]. The sender goes through the same check as an
    /// edit, so an implausible address fails with [`CoreError::Validation`].
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let defaults = Self::default();

        let send_to_self = match lookup("RENDERMAIL_SEND_TO_SELF") {
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                CoreError::Config(format!(
                    "RENDERMAIL_SEND_TO_SELF must be true or false (got '{raw}')"
                ))
            })?,
            None => defaults.send_to_self,
        };

        let smtp_port = match lookup("SMTP_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| CoreError::Config(format!("SMTP_PORT must be a valid u16 (got '{raw}')")))?,
            None => defaults.smtp_port,
        };

        let delivery_delay = match lookup("RENDERMAIL_DELAY_MS") {
            Some(raw) => raw.trim().parse().map(Duration::from_millis).map_err(|_| {
                CoreError::Config(format!("RENDERMAIL_DELAY_MS must be a valid u64 (got '{raw}')"))
            })?,
            None => defaults.delivery_delay,
        };

        let mut config = Self {
            password: lookup("RENDERMAIL_PASSWORD").unwrap_or_default(),
            send_to_self,
            smtp_host: lookup("SMTP_HOST").unwrap_or(defaults.smtp_host),
            smtp_port,
            delivery_delay,
            preview_dir: lookup("RENDERMAIL_PREVIEW_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.preview_dir),
            ..Self::default()
        };

        if let Some(sender) = lookup("RENDERMAIL_SENDER") {
            config.set_sender(&sender)?;
        }
        if let Some(list) = lookup("RENDERMAIL_RECIPIENTS") {
            list.split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .for_each(|r| config.add_recipient(r));
        }

        Ok(config)
    }

    /// Replace the sender address, validating it first.
    ///
    /// An invalid address clears the stored sender so a half-typed value
    /// can never be used for delivery.
    pub fn set_sender(&mut self, address: &str) -> Result<(), CoreError> {
        let address = address.trim();
        if !address.is_empty() && !is_plausible_email(address) {
            self.sender.clear();
            return Err(CoreError::Validation(INVALID_SENDER_MESSAGE.to_string()));
        }
        self.sender = address.to_string();
        Ok(())
    }

    /// Append a recipient entry.
    pub fn add_recipient(&mut self, address: impl Into<String>) {
        self.recipients.push(address.into());
    }

    /// Addresses a notification goes to.
    ///
    /// With `send_to_self` the list is just the sender. Otherwise blank
    /// entries are dropped; the result may be empty, which the dispatcher
    /// reports as a configuration error.
    pub fn resolved_recipients(&self) -> Vec<String> {
        if self.send_to_self {
            return vec![self.sender.clone()];
        }
        self.recipients
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Address check applied when the sender is edited: a syntactically valid
/// email whose domain contains a dot.
pub fn is_plausible_email(address: &str) -> bool {
    address.validate_email()
        && address
            .rsplit_once('@')
            .is_some_and(|(_, domain)| domain.contains('.'))
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = NotifierConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config.smtp_host, DEFAULT_SMTP_HOST);
        assert_eq!(config.smtp_port, DEFAULT_SMTP_PORT);
        assert_eq!(config.delivery_delay, DEFAULT_DELIVERY_DELAY);
        assert!(config.sender.is_empty());
        assert!(config.recipients.is_empty());
        assert!(!config.send_to_self);
    }

    #[test]
    fn parses_recipient_list_and_flags() {
        let config = NotifierConfig::from_vars(vars(&[
            ("RENDERMAIL_SENDER", " artist@studio.example "),
            ("RENDERMAIL_RECIPIENTS", "a@x.example, ,b@x.example"),
            ("RENDERMAIL_SEND_TO_SELF", "yes"),
            ("SMTP_PORT", "587"),
            ("RENDERMAIL_DELAY_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(config.sender, "artist@studio.example");
        assert_eq!(config.recipients, vec!["a@x.example", "b@x.example"]);
        assert!(config.send_to_self);
        assert_eq!(config.smtp_port, 587);
        assert_eq!(config.delivery_delay, Duration::from_millis(250));
    }

    #[test]
    fn rejects_unparseable_port() {
        let result = NotifierConfig::from_vars(vars(&[("SMTP_PORT", "smtp")]));
        assert_matches!(result, Err(CoreError::Config(msg)) if msg.contains("SMTP_PORT"));
    }

    #[test]
    fn rejects_unparseable_flag() {
        let result = NotifierConfig::from_vars(vars(&[("RENDERMAIL_SEND_TO_SELF", "maybe")]));
        assert_matches!(result, Err(CoreError::Config(_)));
    }

    #[test]
    fn debug_redacts_password() {
        let config = NotifierConfig {
            password: "hunter2".to_string(),
            ..Default::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn set_sender_accepts_valid_address() {
        let mut config = NotifierConfig::default();
        config.set_sender("artist@studio.example").unwrap();
        assert_eq!(config.sender, "artist@studio.example");
    }

    #[test]
    fn set_sender_rejects_and_clears_invalid_address() {
        let mut config = NotifierConfig {
            sender: "old@studio.example".to_string(),
            ..Default::default()
        };
        let result = config.set_sender("artist-at-studio");
        assert_matches!(result, Err(CoreError::Validation(msg)) if msg == INVALID_SENDER_MESSAGE);
        assert!(config.sender.is_empty());
    }

    #[test]
    fn set_sender_requires_dotted_domain() {
        let mut config = NotifierConfig::default();
        assert!(config.set_sender("artist@localhost").is_err());
    }

    #[test]
    fn set_sender_allows_clearing() {
        let mut config = NotifierConfig {
            sender: "old@studio.example".to_string(),
            ..Default::default()
        };
        config.set_sender("").unwrap();
        assert!(config.sender.is_empty());
    }

    #[test]
    fn implausible_sender_from_env_is_rejected() {
        for sender in ["artist-at-localhost", "artist@localhost"] {
            let result = NotifierConfig::from_vars(vars(&[("RENDERMAIL_SENDER", sender)]));
            assert_matches!(
                result,
                Err(CoreError::Validation(msg)) if msg == INVALID_SENDER_MESSAGE,
                "sender {:?} should be rejected",
                sender
            );
        }
    }

    #[test]
    fn blank_sender_from_env_loads_empty() {
        let config = NotifierConfig::from_vars(vars(&[("RENDERMAIL_SENDER", "   ")])).unwrap();
        assert!(config.sender.is_empty());
    }

    #[test]
    fn add_recipient_appends_in_order() {
        let mut config = NotifierConfig::default();
        config.add_recipient("a@x.example");
        config.add_recipient(String::from("b@x.example"));
        assert_eq!(config.recipients, vec!["a@x.example", "b@x.example"]);
    }

    #[test]
    fn send_to_self_overrides_recipients() {
        let config = NotifierConfig {
            sender: "me@studio.example".to_string(),
            recipients: vec!["other@studio.example".to_string()],
            send_to_self: true,
            ..Default::default()
        };
        assert_eq!(config.resolved_recipients(), vec!["me@studio.example"]);
    }

    #[test]
    fn blank_recipients_resolve_to_empty() {
        let config = NotifierConfig {
            sender: "me@studio.example".to_string(),
            recipients: vec!["  ".to_string(), String::new()],
            ..Default::default()
        };
        assert!(config.resolved_recipients().is_empty());
    }
}
