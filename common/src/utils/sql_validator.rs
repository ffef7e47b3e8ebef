//! SQL identifier validation and statement helpers.
//!
//! Table and column names cannot be bound as parameters, so every name that
//! ends up in generated SQL goes through [`SqlValidator`] first.

use crate::errors::AppError;

/// Longest identifier PostgreSQL keeps without truncation.
const MAX_IDENTIFIER_LEN: usize = 63;

/// Validates and quotes SQL identifiers.
pub struct SqlValidator;

impl SqlValidator {
    /// Validates a possibly schema-qualified identifier such as `public.users`.
    ///
    /// # Errors
    /// Returns `AppError::Validation` if any part is empty, too long, or
    /// contains characters other than ASCII letters, digits, `_` and `$`.
    pub fn validate_identifier(name: &str) -> Result<(), AppError> {
        let parts: Vec<&str> = name.split('.').collect();
        if parts.len() > 2 {
            return Err(AppError::Validation(format!(
                "identifier `{name}` has too many parts"
            )));
        }
        for part in parts {
            Self::validate_part(name, part)?;
        }
        Ok(())
    }

    fn validate_part(full: &str, part: &str) -> Result<(), AppError> {
        let mut chars = part.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
        if !valid_start || !valid_rest {
            return Err(AppError::Validation(format!("invalid identifier `{full}`")));
        }
        if part.len() > MAX_IDENTIFIER_LEN {
            return Err(AppError::Validation(format!(
                "identifier `{part}` exceeds {MAX_IDENTIFIER_LEN} characters"
            )));
        }
        Ok(())
    }

    /// Quotes a validated identifier, keeping the schema qualifier.
    ///
    /// # Errors
    /// Returns `AppError::Validation` if the identifier is invalid.
    pub fn quote_identifier(name: &str) -> Result<String, AppError> {
        Self::validate_identifier(name)?;
        Ok(name
            .split('.')
            .map(|part| format!("\"{part}\""))
            .collect::<Vec<_>>()
            .join("."))
    }

    /// Quotes an unqualified column name.
    ///
    /// # Errors
    /// Returns `AppError::Validation` if the name is invalid or qualified.
    pub fn quote_column(name: &str) -> Result<String, AppError> {
        Self::validate_part(name, name)?;
        Ok(format!("\"{name}\""))
    }
}

/// Builds a parenthesised list of `n` numbered placeholders starting after `offset`.
///
/// `value_placeholders(3, 0)` gives `($1,$2,$3)`.
pub fn value_placeholders(n: usize, offset: usize) -> String {
    let list = (offset + 1..=offset + n)
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(",");
    format!("({list})")
}
