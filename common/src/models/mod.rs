//! Shared data models for all components.

pub mod connection;
pub mod mail;
pub mod row;

// Re-export commonly used types
pub use connection::{ConnectionParams, SslMode};
pub use mail::{Attachment, BodyFormat, EmailMessage, Encryption, TransportConfig, WebhookConfig};
pub use row::{Row, Value};
