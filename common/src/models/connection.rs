//! Database connection parameter models.
//!
//! Contains the explicit connection descriptor passed to every database call.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::{optional_env, parse_env, required_env};
use crate::errors::{AppError, AppResult};

/// Default PostgreSQL port.
pub const DEFAULT_PG_PORT: u16 = 5432;

/// TLS negotiation mode for the database connection.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SslMode {
    /// Plain TCP only.
    Disable,
    /// Try TLS, fall back to plain TCP.
    #[default]
    Prefer,
    /// Fail unless TLS can be negotiated.
    Require,
}

impl std::fmt::Display for SslMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SslMode::Disable => write!(f, "disable"),
            SslMode::Prefer => write!(f, "prefer"),
            SslMode::Require => write!(f, "require"),
        }
    }
}

impl std::str::FromStr for SslMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "disable" => Ok(SslMode::Disable),
            "prefer" | "allow" => Ok(SslMode::Prefer),
            "require" | "verify-ca" | "verify-full" => Ok(SslMode::Require),
            other => Err(AppError::Validation(format!("unknown ssl mode `{other}`"))),
        }
    }
}

/// Connection descriptor for one database call.
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct ConnectionParams {
    /// Database host.
    #[validate(length(min = 1, message = "host is required"))]
    pub host: String,
    /// Database port.
    #[serde(default = "default_port")]
    #[validate(range(min = 1, message = "port must be positive"))]
    pub port: u16,
    /// Database name.
    #[validate(length(min = 1, message = "database is required"))]
    pub database: String,
    /// Database username.
    #[validate(length(min = 1, message = "user is required"))]
    pub user: String,
    /// Database password (not serialized).
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
    /// Connect timeout in seconds; no timeout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_secs: Option<u64>,
    /// TLS mode.
    #[serde(default)]
    pub ssl_mode: SslMode,
}

fn default_port() -> u16 {
    DEFAULT_PG_PORT
}

impl ConnectionParams {
    /// Creates connection parameters with the default port and no password.
    pub fn new(
        host: impl Into<String>,
        database: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PG_PORT,
            database: database.into(),
            user: user.into(),
            password: None,
            connect_timeout_secs: None,
            ssl_mode: SslMode::default(),
        }
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = Some(secs);
        self
    }

    /// Sets the TLS mode.
    pub fn with_ssl_mode(mut self, ssl_mode: SslMode) -> Self {
        self.ssl_mode = ssl_mode;
        self
    }

    /// Builds parameters from the standard libpq variables.
    ///
    /// Reads `PGHOST`, `PGPORT`, `PGDATABASE`, `PGUSER`, `PGPASSWORD`,
    /// `PGCONNECT_TIMEOUT` and `PGSSLMODE`.
    ///
    /// # Errors
    /// Returns `AppError::Validation` if a required variable is missing or a
    /// numeric one does not parse.
    pub fn from_env() -> AppResult<Self> {
        let mut params = Self::new(
            required_env("PGHOST")?,
            required_env("PGDATABASE")?,
            required_env("PGUSER")?,
        );
        if let Some(port) = parse_env("PGPORT")? {
            params.port = port;
        }
        params.password = optional_env("PGPASSWORD");
        params.connect_timeout_secs = parse_env("PGCONNECT_TIMEOUT")?;
        if let Some(mode) = parse_env::<SslMode>("PGSSLMODE")? {
            params.ssl_mode = mode;
        }
        Ok(params)
    }

    /// Validates the parameters, mapping failures to `AppError::Validation`.
    pub fn check(&self) -> AppResult<()> {
        self.validate()?;
        if self.host.trim().is_empty() || self.user.trim().is_empty() {
            return Err(AppError::Validation("host and user must not be blank".into()));
        }
        Ok(())
    }

    /// Returns `host:port/database` for log fields.
    pub fn target(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

impl std::fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}
