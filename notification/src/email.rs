//! 邮件发送
//!
//! 先校验、再组装 MIME 报文，最后通过 SMTP 传输发送。校验未通过时不会产生任何网络访问。

use std::time::{Duration, Instant};

use common::errors::{AppError, AppResult};
use common::models::{BodyFormat, EmailMessage, Encryption, TransportConfig};
use common::utils::IdGenerator;
use lettre::message::header::{ContentTransferEncoding, ContentType};
use lettre::message::{Attachment, Body, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::{smtp, stub};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use validator::Validate;

/// Converts a transport's send error into the toolkit taxonomy.
///
/// Implemented for the SMTP and stub transports so [`send_email_with`] can
/// report failures from either one the same way.
pub trait SendFailure {
    /// Maps the error onto an [`AppError`] variant.
    fn into_app_error(self) -> AppError;
}

impl SendFailure for smtp::Error {
    fn into_app_error(self) -> AppError {
        classify_smtp(&self)
    }
}

impl SendFailure for stub::Error {
    fn into_app_error(self) -> AppError {
        AppError::Transport(self.to_string())
    }
}

/// SMTP 认证失败相关的应答码
const AUTH_FAILURE_CODES: [&str; 3] = ["530", "534", "535"];

fn classify_smtp(err: &smtp::Error) -> AppError {
    if let Some(code) = err.status() {
        let code = code.to_string();
        if AUTH_FAILURE_CODES.contains(&code.as_str()) {
            return AppError::Authentication(err.to_string());
        }
        return AppError::Transport(err.to_string());
    }
    if err.is_timeout() {
        return AppError::Connection(err.to_string());
    }
    if err.is_response() || err.is_client() {
        return AppError::Transport(err.to_string());
    }
    AppError::Connection(err.to_string())
}

fn parse_mailbox(address: &str) -> AppResult<Mailbox> {
    address
        .trim()
        .parse()
        .map_err(|e| AppError::Validation(format!("invalid address `{address}`: {e}")))
}

/// Validates `message` and builds the MIME message with its `Message-ID`.
fn build(message: &EmailMessage) -> AppResult<(Message, String)> {
    message.validate()?;

    let sender = parse_mailbox(&message.sender)?;
    let message_id = IdGenerator::message_id(sender.email.domain());

    let mut builder = Message::builder()
        .from(sender)
        .subject(message.subject.as_str())
        .message_id(Some(message_id.clone()))
        .date_now();
    for recipient in &message.recipients {
        builder = builder.to(parse_mailbox(recipient)?);
    }

    let text = match message.format {
        BodyFormat::Plain => SinglePart::plain(message.body.clone()),
        BodyFormat::Html => SinglePart::html(message.body.clone()),
    };
    let mut body = MultiPart::mixed().singlepart(text);
    for attachment in &message.attachments {
        let content_type = ContentType::parse(attachment.mime_type()).map_err(|e| {
            AppError::Validation(format!(
                "attachment `{}` has invalid content type: {e}",
                attachment.filename
            ))
        })?;
        let content =
            Body::new_with_encoding(attachment.content.clone(), ContentTransferEncoding::Base64)
                .unwrap_or_else(Body::new);
        body = body.singlepart(
            Attachment::new(attachment.filename.clone()).body(content, content_type),
        );
    }

    let email = builder
        .multipart(body)
        .map_err(|e| AppError::Validation(format!("cannot build message: {e}")))?;
    Ok((email, message_id))
}

/// Validates `message` and composes it without sending.
///
/// The result is a `multipart/mixed` message with one text part and one
/// base64 part per attachment.
///
/// # Errors
/// Returns `AppError::Validation` for an empty recipient list, a malformed
/// address, or an unparsable attachment content type.
pub fn compose(message: &EmailMessage) -> AppResult<Message> {
    build(message).map(|(email, _)| email)
}

/// Sends `message` through an already built transport.
///
/// # Returns
/// The `Message-ID` assigned to the message.
///
/// # Errors
/// Validation errors as for [`compose`], raised before the transport is used;
/// send failures as classified by the transport's [`SendFailure`] impl.
pub async fn send_email_with<T>(transport: &T, message: &EmailMessage) -> AppResult<String>
where
    T: AsyncTransport + Sync,
    T::Error: SendFailure,
{
    let (email, message_id) = build(message)?;
    let start = Instant::now();

    match transport.send(email).await {
        Ok(_) => {
            tracing::info!(
                message_id = %message_id,
                recipients = message.recipients.len(),
                attachments = message.attachments.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "邮件已发送"
            );
            Ok(message_id)
        }
        Err(e) => {
            let err = e.into_app_error();
            tracing::warn!(message_id = %message_id, error = %err, "邮件发送失败");
            Err(err)
        }
    }
}

/// Builds the SMTP transport described by `config`.
///
/// No connection is made until a message is sent. Without `timeout_secs` the
/// transport keeps lettre's default timeout.
fn build_transport(config: &TransportConfig) -> AppResult<AsyncSmtpTransport<Tokio1Executor>> {
    let builder = match config.encryption {
        Encryption::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
        Encryption::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| AppError::Transport(format!("tls setup failed: {e}")))?,
        Encryption::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| AppError::Transport(format!("tls setup failed: {e}")))?,
    };

    let mut builder = builder.port(config.port);
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Some(Duration::from_secs(secs)));
    }
    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
    }
    Ok(builder.build())
}

/// Sends `message` over SMTP and returns its `Message-ID`.
///
/// Exactly one email is handed to the server per successful call; nothing is
/// retried.
///
/// # Errors
/// - `AppError::Validation` if `config` or `message` is invalid (checked before
///   any network traffic).
/// - `AppError::Authentication` if the server rejects the credentials.
/// - `AppError::Connection` if the server is unreachable or times out.
/// - `AppError::Transport` for other SMTP failures.
pub async fn send_email(config: &TransportConfig, message: &EmailMessage) -> AppResult<String> {
    config.validate()?;
    let transport = build_transport(config)?;
    tracing::debug!(host = %config.host, port = config.port, encryption = %config.encryption, "准备发送邮件");
    send_email_with(&transport, message).await
}
