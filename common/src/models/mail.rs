//! Notification models.
//!
//! Contains the mail transport configuration, the outgoing message and the
//! Slack webhook configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::{optional_env, parse_env, required_env};
use crate::errors::{AppError, AppResult};

/// Default content type for attachments.
pub const DEFAULT_ATTACHMENT_TYPE: &str = "application/octet-stream";

/// Connection security for the mail transport.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Encryption {
    /// Plain SMTP, no TLS.
    None,
    /// Plain connection upgraded with STARTTLS.
    #[default]
    StartTls,
    /// TLS from the first byte (SMTPS).
    Tls,
}

impl Encryption {
    /// Returns the conventional port for this mode.
    pub fn default_port(&self) -> u16 {
        match self {
            Encryption::None => 25,
            Encryption::StartTls => 587,
            Encryption::Tls => 465,
        }
    }
}

impl std::fmt::Display for Encryption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Encryption::None => write!(f, "none"),
            Encryption::StartTls => write!(f, "starttls"),
            Encryption::Tls => write!(f, "tls"),
        }
    }
}

impl std::str::FromStr for Encryption {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "plain" => Ok(Encryption::None),
            "starttls" => Ok(Encryption::StartTls),
            "tls" | "ssl" | "smtps" => Ok(Encryption::Tls),
            other => Err(AppError::Validation(format!("unknown encryption mode `{other}`"))),
        }
    }
}

/// Mail transport configuration.
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct TransportConfig {
    /// SMTP server host.
    #[validate(length(min = 1, message = "host is required"))]
    pub host: String,
    /// SMTP server port.
    #[validate(range(min = 1, message = "port must be positive"))]
    pub port: u16,
    /// Login username; no AUTH is attempted when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Login password (not serialized).
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
    /// Connection security.
    #[serde(default)]
    pub encryption: Encryption,
    /// Network timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl TransportConfig {
    /// Creates a config using the conventional port for `encryption`.
    pub fn new(host: impl Into<String>, encryption: Encryption) -> Self {
        Self {
            host: host.into(),
            port: encryption.default_port(),
            username: None,
            password: None,
            encryption,
            timeout_secs: None,
        }
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets login credentials.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets the network timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Builds a config from `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`,
    /// `SMTP_PASSWORD`, `SMTP_ENCRYPTION` and `SMTP_TIMEOUT_SECS`.
    ///
    /// # Errors
    /// Returns `AppError::Validation` if `SMTP_HOST` is missing or a value
    /// does not parse.
    pub fn from_env() -> AppResult<Self> {
        let encryption = parse_env::<Encryption>("SMTP_ENCRYPTION")?.unwrap_or_default();
        let mut config = Self::new(required_env("SMTP_HOST")?, encryption);
        if let Some(port) = parse_env("SMTP_PORT")? {
            config.port = port;
        }
        config.username = optional_env("SMTP_USERNAME");
        config.password = optional_env("SMTP_PASSWORD");
        config.timeout_secs = parse_env("SMTP_TIMEOUT_SECS")?;
        Ok(config)
    }
}

impl std::fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("encryption", &self.encryption)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// How the message body is rendered.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BodyFormat {
    /// `text/plain`.
    #[default]
    Plain,
    /// `text/html`.
    Html,
}

/// A file attached to an email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// File name shown to the recipient.
    pub filename: String,
    /// Raw file content.
    pub content: Vec<u8>,
    /// MIME type; `application/octet-stream` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl Attachment {
    /// Creates an attachment from in-memory bytes.
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
            content_type: None,
        }
    }

    /// Sets the MIME type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Reads an attachment from disk, naming it after the file.
    ///
    /// # Errors
    /// Returns `AppError::Validation` if `path` is not a file, or `AppError::Io`
    /// if it cannot be read.
    pub fn from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(AppError::Validation(format!(
                "attachment not found: {}",
                path.display()
            )));
        }
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| AppError::Validation(format!("no file name: {}", path.display())))?;
        let content = std::fs::read(path)?;
        Ok(Self::new(filename, content))
    }

    /// Returns the effective MIME type.
    pub fn mime_type(&self) -> &str {
        self.content_type.as_deref().unwrap_or(DEFAULT_ATTACHMENT_TYPE)
    }
}

/// An outgoing email.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EmailMessage {
    /// Sender address.
    #[validate(length(min = 1, message = "sender is required"))]
    pub sender: String,
    /// Recipient addresses.
    #[validate(length(min = 1, message = "at least one recipient is required"))]
    pub recipients: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Body text.
    pub body: String,
    /// Body rendering.
    #[serde(default)]
    pub format: BodyFormat,
    /// Attached files.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl EmailMessage {
    /// Creates a plain-text message without attachments.
    pub fn new<I, S>(
        sender: impl Into<String>,
        recipients: I,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sender: sender.into(),
            recipients: recipients.into_iter().map(Into::into).collect(),
            subject: subject.into(),
            body: body.into(),
            format: BodyFormat::Plain,
            attachments: Vec::new(),
        }
    }

    /// Renders the body as HTML.
    pub fn html(mut self) -> Self {
        self.format = BodyFormat::Html;
        self
    }

    /// Adds an attachment.
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// Slack incoming-webhook configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WebhookConfig {
    /// Webhook URL.
    #[validate(url(message = "webhook url is invalid"))]
    pub url: String,
    /// Display name override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Channel override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl WebhookConfig {
    /// Creates a config for `url` with no overrides.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            channel: None,
            timeout_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_recipients_fail_validation() {
        let msg = EmailMessage::new("a@x.com", Vec::<String>::new(), "Hi", "body");
        let err: AppError = msg.validate().unwrap_err().into();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_transport_defaults_port_from_encryption() {
        assert_eq!(TransportConfig::new("smtp", Encryption::Tls).port, 465);
        assert_eq!(TransportConfig::new("smtp", Encryption::StartTls).port, 587);
    }

    #[test]
    fn test_attachment_from_missing_path() {
        let err = Attachment::from_path("/definitely/not/here.jpg").unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(err.to_string().contains("here.jpg"));
    }

    #[test]
    fn test_attachment_from_path_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"id,name\n1,a\n")
            .unwrap();

        let attachment = Attachment::from_path(&path).unwrap();
        assert_eq!(attachment.filename, "report.csv");
        assert_eq!(attachment.content, b"id,name\n1,a\n");
        assert_eq!(attachment.mime_type(), DEFAULT_ATTACHMENT_TYPE);
    }

    #[test]
    fn test_webhook_url_validation() {
        assert!(WebhookConfig::new("not a url").validate().is_err());
        assert!(WebhookConfig::new("https://hooks.slack.com/services/T/B/X")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_encryption_parse() {
        assert_eq!("SSL".parse::<Encryption>().unwrap(), Encryption::Tls);
        assert!("maybe".parse::<Encryption>().is_err());
    }
}
