//! 日志告警转发
//!
//! [`alert_layer`] 返回一个 tracing `Layer` 和一个转发器。Layer 只把达到级别的事件
//! 格式化成文本放入通道；真正的发送由调用方 spawn 的 [`AlertForwarder::run`] 完成，
//! 因此记录日志的一方永远不会被网络阻塞。

use std::fmt::{self, Write as _};

use common::errors::AppResult;
use common::models::{EmailMessage, TransportConfig};
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::email::send_email;
use crate::slack::SlackWebhook;

/// 本 crate 自身的事件不转发，发送失败的日志不会再次触发告警
const OWN_TARGET: &str = "notification";

/// Where forwarded log events are delivered.
pub enum AlertSink {
    /// Posts each event as one Slack message.
    Slack(SlackWebhook),
    /// Sends one email per event, using `template` with the event text as body.
    Email {
        transport: TransportConfig,
        template: EmailMessage,
    },
}

impl AlertSink {
    async fn deliver(&self, text: &str) -> AppResult<()> {
        match self {
            AlertSink::Slack(hook) => hook.send(text).await,
            AlertSink::Email {
                transport,
                template,
            } => {
                let mut message = template.clone();
                message.body = text.to_string();
                send_email(transport, &message).await.map(|_| ())
            }
        }
    }
}

/// Creates a layer forwarding events at `min_level` or more severe to `sink`.
///
/// Add the layer to the subscriber and spawn [`AlertForwarder::run`] on the
/// runtime:
///
/// ```no_run
/// # async fn demo(hook: notification::SlackWebhook) {
/// use tracing_subscriber::layer::SubscriberExt;
/// use tracing_subscriber::util::SubscriberInitExt;
///
/// let (layer, forwarder) = notification::alert_layer(
///     notification::AlertSink::Slack(hook),
///     tracing::Level::ERROR,
/// );
/// tracing_subscriber::registry().with(layer).init();
/// tokio::spawn(forwarder.run());
/// # }
/// ```
pub fn alert_layer(sink: AlertSink, min_level: Level) -> (AlertLayer, AlertForwarder) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (
        AlertLayer { min_level, sender },
        AlertForwarder { receiver, sink },
    )
}

/// `tracing` layer half of [`alert_layer`].
pub struct AlertLayer {
    min_level: Level,
    sender: mpsc::UnboundedSender<String>,
}

impl<S: Subscriber> Layer<S> for AlertLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if *meta.level() > self.min_level || meta.target().starts_with(OWN_TARGET) {
            return;
        }
        let mut text = AlertText::default();
        event.record(&mut text);
        // 转发器已停止时直接丢弃
        let _ = self.sender.send(text.render(meta.level(), meta.target()));
    }
}

/// Delivery half of [`alert_layer`].
pub struct AlertForwarder {
    receiver: mpsc::UnboundedReceiver<String>,
    sink: AlertSink,
}

impl AlertForwarder {
    /// Delivers queued events one at a time until every [`AlertLayer`] is dropped.
    ///
    /// A failed delivery is logged and skipped; nothing is retried.
    pub async fn run(mut self) {
        while let Some(text) = self.receiver.recv().await {
            if let Err(e) = self.sink.deliver(&text).await {
                tracing::warn!(error = %e, "告警转发失败");
            }
        }
        tracing::debug!("告警转发器已停止");
    }
}

#[derive(Default)]
struct AlertText {
    message: String,
    fields: String,
}

impl AlertText {
    fn render(self, level: &Level, target: &str) -> String {
        format!("[{level}] {target}: {}{}", self.message, self.fields)
    }
}

impl Visit for AlertText {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }
}
