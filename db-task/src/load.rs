//! 数据装载
//!
//! 把一批行写入目标表：先在本地和表结构上校验，再在单个事务内批量 INSERT。
//! 任一环节失败则整体回滚。

use std::time::Instant;

use common::errors::{AppError, AppResult};
use common::models::{ConnectionParams, Row};
use common::utils::SqlValidator;
use sqlx::{Connection, PgConnection};

use crate::codec::bind_value;
use crate::connection;
use crate::errors::{classify, classify_insert};
use crate::schema::{self, TableColumn};

/// PostgreSQL 单条语句可绑定的参数上限
const MAX_BIND_PARAMS: usize = 65_535;

/// Writes `rows` into `table_name` and returns the number of rows written.
///
/// All rows must share the same column set. The load is all-or-nothing: rows
/// are inserted inside one transaction that is rolled back on any failure.
/// Loading the same rows twice inserts them twice.
///
/// # Errors
/// - `AppError::Validation` for invalid table or column names.
/// - `AppError::Schema` if rows differ in shape, the table does not exist, or a
///   column is not in the table.
/// - `AppError::Data` if a value cannot be stored in its column.
/// - `AppError::Connection` / `AppError::Authentication` if the connection
///   parameters are malformed, the database is unreachable, or it rejects
///   the credentials.
pub async fn load(params: &ConnectionParams, table_name: &str, rows: &[Row]) -> AppResult<u64> {
    let quoted_table = SqlValidator::quote_identifier(table_name)?;
    let Some(first) = rows.first() else {
        return Ok(0);
    };
    for column in first.column_names() {
        SqlValidator::quote_column(column)?;
    }
    schema::check_uniform(rows)?;

    let start = Instant::now();
    tracing::debug!(table = table_name, rows = rows.len(), target_db = %params.target(), "开始装载");

    let mut conn = connection::open(params).await?;
    let result = load_rows(&mut conn, &quoted_table, table_name, first, rows).await;
    connection::close(conn).await;

    match &result {
        Ok(written) => tracing::info!(
            table = table_name,
            rows = written,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "装载完成"
        ),
        Err(e) => tracing::warn!(table = table_name, error = %e, "装载失败，已回滚"),
    }
    result
}

async fn load_rows(
    conn: &mut PgConnection,
    quoted_table: &str,
    table_name: &str,
    first: &Row,
    rows: &[Row],
) -> AppResult<u64> {
    let table = schema::table_columns(conn, quoted_table).await?;
    let columns = schema::resolve_columns(first, &table, table_name)?;
    schema::check_values(rows, &columns)?;

    let mut tx = conn.begin().await.map_err(classify)?;
    match insert_rows(&mut tx, quoted_table, &columns, rows).await {
        Ok(written) => {
            tx.commit().await.map_err(classify)?;
            Ok(written)
        }
        Err(e) => {
            if let Err(rb) = tx.rollback().await {
                tracing::debug!(error = %rb, "回滚失败");
            }
            Err(e)
        }
    }
}

async fn insert_rows(
    conn: &mut PgConnection,
    quoted_table: &str,
    columns: &[&TableColumn],
    rows: &[Row],
) -> AppResult<u64> {
    let column_list = columns
        .iter()
        .map(|c| SqlValidator::quote_column(&c.name))
        .collect::<AppResult<Vec<_>>>()?
        .join(", ");
    let mut written = 0;
    for batch in rows.chunks(rows_per_statement(columns.len())) {
        let sql = insert_statement(quoted_table, &column_list, columns, batch.len());
        let mut query = sqlx::query(&sql);
        for row in batch {
            for column in columns {
                let value = row.get(&column.name).ok_or_else(|| {
                    AppError::Schema(format!("row is missing column `{}`", column.name))
                })?;
                query = bind_value(query, value);
            }
        }
        written += query
            .execute(&mut *conn)
            .await
            .map_err(classify_insert)?
            .rows_affected();
    }
    Ok(written)
}

/// Largest number of rows whose parameters fit in one statement.
fn rows_per_statement(width: usize) -> usize {
    (MAX_BIND_PARAMS / width.max(1)).max(1)
}

/// Builds a multi-row INSERT with every placeholder cast to its column type.
fn insert_statement(
    quoted_table: &str,
    column_list: &str,
    columns: &[&TableColumn],
    row_count: usize,
) -> String {
    let width = columns.len();
    let tuples = (0..row_count)
        .map(|r| {
            let cells = columns
                .iter()
                .enumerate()
                .map(|(i, c)| format!("${}::{}", r * width + i + 1, cast_type(&c.data_type)))
                .collect::<Vec<_>>()
                .join(",");
            format!("({cells})")
        })
        .collect::<Vec<_>>()
        .join(",");
    format!("INSERT INTO {quoted_table} ({column_list}) VALUES {tuples}")
}

/// Bare `character` and `bit` mean length 1 in a cast; use the unbounded forms.
fn cast_type(data_type: &str) -> &str {
    match data_type {
        "character" => "bpchar",
        "bit" => "bit varying",
        other => other,
    }
}
