//! Unique ID generator.
//!
//! Provides utilities for generating unique identifiers.

use uuid::Uuid;

/// Generates unique identifiers for various entities.
pub struct IdGenerator;

impl IdGenerator {
    /// Generates an RFC 5322 `Message-ID` value for `domain`.
    ///
    /// # Returns
    /// A string of the form `<uuid@domain>`.
    pub fn message_id(domain: &str) -> String {
        format!("<{}@{}>", Uuid::new_v4().simple(), domain)
    }

    /// Generates a short unique ID (first 8 characters of UUID).
    ///
    /// # Returns
    /// An 8-character unique string.
    pub fn short_id() -> String {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(8);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_is_unique() {
        let id1 = IdGenerator::message_id("example.com");
        let id2 = IdGenerator::message_id("example.com");
        assert_ne!(id1, id2);
        assert!(id1.starts_with('<'));
        assert!(id1.ends_with("@example.com>"));
    }

    #[test]
    fn test_short_id_length() {
        let id = IdGenerator::short_id();
        assert_eq!(id.len(), 8);
    }
}
