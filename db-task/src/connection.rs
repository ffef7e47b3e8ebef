//! 单次调用的数据库连接
//!
//! 每个操作自行打开连接，返回前关闭，不做连接池。

use std::time::Duration;

use common::errors::{AppError, AppResult};
use common::models::connection::{ConnectionParams, SslMode};
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use sqlx::{Connection, PgConnection};

use crate::errors::classify;

const APPLICATION_NAME: &str = "autos";

/// 根据连接参数构建 sqlx 连接选项
pub(crate) fn build_connect_options(params: &ConnectionParams) -> PgConnectOptions {
    let ssl_mode = match params.ssl_mode {
        SslMode::Disable => PgSslMode::Disable,
        SslMode::Prefer => PgSslMode::Prefer,
        SslMode::Require => PgSslMode::Require,
    };

    let options = PgConnectOptions::new_without_pgpass()
        .host(&params.host)
        .port(params.port)
        .database(&params.database)
        .username(&params.user)
        .ssl_mode(ssl_mode)
        .application_name(APPLICATION_NAME);

    match &params.password {
        Some(password) => options.password(password),
        None => options,
    }
}

/// 校验参数并打开连接；参数不合法按连接错误处理
pub(crate) async fn open(params: &ConnectionParams) -> AppResult<PgConnection> {
    params.check().map_err(|e| match e {
        AppError::Validation(msg) => {
            AppError::Connection(format!("malformed connection parameters: {msg}"))
        }
        other => other,
    })?;
    let options = build_connect_options(params);
    let connect = PgConnection::connect_with(&options);

    let result = match params.connect_timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), connect)
            .await
            .map_err(|_| {
                AppError::Connection(format!(
                    "timed out after {secs}s connecting to {}",
                    params.target()
                ))
            })?,
        None => connect.await,
    };

    result.map_err(|e| {
        let err = classify(e);
        tracing::warn!(target_db = %params.target(), error = %err, "连接数据库失败");
        err
    })
}

/// 关闭连接；关闭失败只记录日志，不覆盖操作结果
pub(crate) async fn close(conn: PgConnection) {
    if let Err(e) = conn.close().await {
        tracing::debug!(error = %e, "关闭数据库连接失败");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_carry_params() {
        let params = ConnectionParams::new("db.internal", "analytics", "etl")
            .with_port(6543)
            .with_password("secret");
        let options = build_connect_options(&params);
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_database(), Some("analytics"));
        assert_eq!(options.get_username(), "etl");
    }

    #[tokio::test]
    async fn test_invalid_params_fail_before_connecting() {
        let params = ConnectionParams::new("", "analytics", "etl");
        let err = open(&params).await.unwrap_err();
        assert_eq!(err.code(), "CONNECTION_ERROR");
        assert!(err.to_string().contains("malformed connection parameters"));

        let params = ConnectionParams::new("db.internal", "", "etl");
        assert_eq!(open(&params).await.unwrap_err().code(), "CONNECTION_ERROR");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_connection_error() {
        let params = ConnectionParams::new("127.0.0.1", "analytics", "etl")
            .with_port(1)
            .with_ssl_mode(SslMode::Disable)
            .with_connect_timeout(5);
        let err = open(&params).await.unwrap_err();
        assert_eq!(err.code(), "CONNECTION_ERROR");
    }
}
