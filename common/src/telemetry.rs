//! Tracing bootstrap for scripts.
//!
//! The library crates only emit `tracing` events; installing a subscriber is
//! left to the calling script, which can use [`init_tracing`] for the usual setup.

use std::fmt::Display;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a global `fmt` subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Returns `false` if a
/// global subscriber was already installed.
pub fn init_tracing(default_filter: &str, json: bool) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .is_ok()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .is_ok()
    }
}

/// Logs the error side of a `Result` and passes it through unchanged.
pub trait LogErr {
    /// Emits an `error!` event with `context` if `self` is an error.
    fn log_err(self, context: &str) -> Self;
}

impl<T, E: Display> LogErr for Result<T, E> {
    fn log_err(self, context: &str) -> Self {
        if let Err(e) = &self {
            tracing::error!(context, error = %e, "operation failed");
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;

    #[test]
    fn test_log_err_passes_result_through() {
        let ok: Result<u8, AppError> = Ok(7);
        assert_eq!(ok.log_err("ok path").unwrap(), 7);

        let err: Result<u8, AppError> = Err(AppError::Query("bad".into()));
        let err = err.log_err("err path").unwrap_err();
        assert_eq!(err.code(), "QUERY_ERROR");
    }

    #[test]
    fn test_second_init_reports_false() {
        init_tracing("warn", false);
        assert!(!init_tracing("warn", true));
    }
}
