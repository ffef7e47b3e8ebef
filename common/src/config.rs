//! Environment-based configuration helpers.
//!
//! Nothing here is global state: these helpers only read the process
//! environment so that config structs can offer `from_env()` constructors.

use std::path::Path;
use std::str::FromStr;

use crate::errors::{AppError, AppResult};

/// Load a `.env` file from the working directory (best-effort, no error if missing).
pub fn load_dotenv() {
    load_dotenv_from(Path::new(".env"));
}

/// Load `KEY=VALUE` lines from `path` into the environment.
///
/// Variables already present in the environment are never overridden.
pub fn load_dotenv_from(path: &Path) {
    if !path.exists() {
        return;
    }
    let Ok(content) = std::fs::read_to_string(path) else {
        return;
    };
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            let value = value.trim().trim_matches('"');
            if std::env::var(key).is_err() {
                std::env::set_var(key, value);
            }
        }
    }
}

/// Reads a required environment variable.
///
/// # Errors
/// Returns `AppError::Validation` naming the variable if it is unset or empty.
pub fn required_env(name: &str) -> AppResult<String> {
    optional_env(name).ok_or_else(|| AppError::Validation(format!("{name} is not set")))
}

/// Reads an optional environment variable, treating empty values as unset.
pub fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Reads and parses an optional environment variable.
///
/// # Errors
/// Returns `AppError::Validation` if the variable is set but does not parse.
pub fn parse_env<T: FromStr>(name: &str) -> AppResult<Option<T>> {
    match optional_env(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AppError::Validation(format!("{name} has invalid value `{raw}`"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_dotenv_does_not_override_existing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "AUTOS_CFG_TEST_NEW=\"fresh\"").unwrap();
        writeln!(file, "AUTOS_CFG_TEST_KEEP=from-file").unwrap();
        std::env::set_var("AUTOS_CFG_TEST_KEEP", "from-env");

        load_dotenv_from(file.path());

        assert_eq!(std::env::var("AUTOS_CFG_TEST_NEW").unwrap(), "fresh");
        assert_eq!(std::env::var("AUTOS_CFG_TEST_KEEP").unwrap(), "from-env");
    }

    #[test]
    fn test_required_env_names_missing_variable() {
        let err = required_env("AUTOS_CFG_TEST_MISSING").unwrap_err();
        assert!(err.to_string().contains("AUTOS_CFG_TEST_MISSING"));
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("AUTOS_CFG_TEST_PORT", "fifty");
        assert!(parse_env::<u16>("AUTOS_CFG_TEST_PORT").is_err());
        std::env::set_var("AUTOS_CFG_TEST_PORT2", " 2525 ");
        assert_eq!(parse_env::<u16>("AUTOS_CFG_TEST_PORT2").unwrap(), Some(2525));
    }
}
