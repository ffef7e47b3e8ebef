//! Slack Incoming Webhook 通知

use std::time::{Duration, Instant};

use common::errors::{AppError, AppResult};
use common::models::WebhookConfig;
use serde::Serialize;
use validator::Validate;

/// 默认请求超时（秒）
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct Payload<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<&'a str>,
}

/// Posts messages to a Slack incoming webhook.
pub struct SlackWebhook {
    config: WebhookConfig,
    http_client: reqwest::Client,
}

impl SlackWebhook {
    /// Creates a notifier for `config`.
    ///
    /// # Errors
    /// Returns `AppError::Validation` if the URL is invalid, or
    /// `AppError::Transport` if the HTTP client cannot be built.
    pub fn new(config: WebhookConfig) -> AppResult<Self> {
        config.validate()?;
        let timeout = config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .map_err(|e| AppError::Transport(format!("无法创建 HTTP 客户端: {e}")))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    /// Posts `text` to the channel.
    ///
    /// # Errors
    /// - `AppError::Validation` if `text` is blank.
    /// - `AppError::Connection` if the webhook is unreachable or times out.
    /// - `AppError::Transport` if Slack answers with a non-2xx status.
    pub async fn send(&self, text: &str) -> AppResult<()> {
        if text.trim().is_empty() {
            return Err(AppError::Validation("message text is empty".into()));
        }
        let payload = Payload {
            text,
            username: self.config.username.as_deref(),
            channel: self.config.channel.as_deref(),
        };
        let start = Instant::now();

        let response = self
            .http_client
            .post(&self.config.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let err = if e.is_connect() || e.is_timeout() {
                    AppError::Connection(format!("无法连接到 Slack: {e}"))
                } else {
                    AppError::Transport(e.to_string())
                };
                tracing::warn!(error = %err, "Slack 通知失败");
                err
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Slack 返回错误状态");
            return Err(AppError::Transport(format!("HTTP {status}: {body}")));
        }

        tracing::info!(elapsed_ms = start.elapsed().as_millis() as u64, "Slack 通知已发送");
        Ok(())
    }
}
