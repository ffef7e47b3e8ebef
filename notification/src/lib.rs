//! 通知助手
//!
//! - [`send_email`]: 通过 SMTP 发送带附件的邮件
//! - [`compose`]: 仅校验并组装 MIME 报文
//! - [`SlackWebhook`]: 向 Slack Incoming Webhook 推送消息
//! - [`alert_layer`]: 把达到级别的 tracing 事件转发到 Slack 或邮件

mod alert;
mod email;
mod slack;

pub use alert::{alert_layer, AlertForwarder, AlertLayer, AlertSink};
pub use email::{compose, send_email, send_email_with, SendFailure};
pub use slack::SlackWebhook;
