//! 查询导出与语句执行

use std::time::Instant;

use common::errors::{AppError, AppResult};
use common::models::{ConnectionParams, Row};
use common::utils::SqlValidator;
use sqlx::PgConnection;

use crate::codec::decode_row;
use crate::connection;
use crate::errors::{as_query_error, classify};

/// Runs `query` and returns its rows in the order the query produces them.
///
/// # Errors
/// - `AppError::Query` if the query is empty, malformed, references unknown
///   objects, lacks permission, or returns a column type that cannot be decoded.
/// - `AppError::Connection` / `AppError::Authentication` if the connection
///   parameters are malformed, the database is unreachable, or it rejects
///   the credentials.
pub async fn extract(params: &ConnectionParams, query: &str) -> AppResult<Vec<Row>> {
    if query.trim().is_empty() {
        return Err(AppError::Query("query is empty".into()));
    }

    let start = Instant::now();
    let mut conn = connection::open(params).await?;
    let result = fetch_rows(&mut conn, query).await.map_err(as_query_error);
    connection::close(conn).await;

    match &result {
        Ok(rows) => tracing::info!(
            rows = rows.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "查询完成"
        ),
        Err(e) => tracing::warn!(error = %e, "查询失败"),
    }
    result
}

async fn fetch_rows(conn: &mut PgConnection, query: &str) -> AppResult<Vec<Row>> {
    let rows = sqlx::query(query).fetch_all(conn).await.map_err(classify)?;
    rows.iter().map(decode_row).collect()
}

/// Runs one or more SQL statements and returns the total rows affected.
///
/// # Errors
/// Same classification as [`crate::load`] for database failures;
/// `AppError::Query` if `statement` is empty.
pub async fn execute(params: &ConnectionParams, statement: &str) -> AppResult<u64> {
    if statement.trim().is_empty() {
        return Err(AppError::Query("statement is empty".into()));
    }

    let mut conn = connection::open(params).await?;
    let result = sqlx::raw_sql(statement)
        .execute(&mut conn)
        .await
        .map(|done| done.rows_affected())
        .map_err(classify);
    connection::close(conn).await;

    match &result {
        Ok(affected) => tracing::info!(rows_affected = affected, "语句执行完成"),
        Err(e) => tracing::warn!(error = %e, "语句执行失败"),
    }
    result
}

/// Empties `table_name`.
///
/// # Errors
/// `AppError::Validation` for an invalid name; `AppError::Schema` if the table
/// does not exist; connection failures as for [`execute`].
pub async fn truncate(params: &ConnectionParams, table_name: &str) -> AppResult<()> {
    let quoted = SqlValidator::quote_identifier(table_name)?;
    execute(params, &format!("TRUNCATE TABLE {quoted}")).await?;
    tracing::info!(table = table_name, "表已清空");
    Ok(())
}
