//! 目标表结构查询与行校验

use common::errors::{AppError, AppResult};
use common::models::Row;
use sqlx::PgConnection;

use crate::codec::value_fits;
use crate::errors::classify;

/// A column of the target table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TableColumn {
    /// Column name.
    pub name: String,
    /// Type name without modifiers, as reported by `format_type`.
    pub data_type: String,
    /// Whether the column accepts NULL.
    pub nullable: bool,
}

/// Loads the columns of `table` (validated, possibly schema-qualified).
///
/// # Errors
/// Returns `AppError::Schema` if the table does not exist.
pub(crate) async fn table_columns(
    conn: &mut PgConnection,
    quoted_table: &str,
) -> AppResult<Vec<TableColumn>> {
    let columns = sqlx::query_as::<_, TableColumn>(
        "SELECT a.attname::text AS name,
                format_type(a.atttypid, NULL) AS data_type,
                NOT a.attnotnull AS nullable
         FROM pg_catalog.pg_attribute a
         WHERE a.attrelid = to_regclass($1)
           AND a.attnum > 0
           AND NOT a.attisdropped
         ORDER BY a.attnum",
    )
    .bind(quoted_table)
    .fetch_all(conn)
    .await
    .map_err(classify)?;

    if columns.is_empty() {
        return Err(AppError::Schema(format!("table {quoted_table} does not exist")));
    }
    Ok(columns)
}

/// Checks that every row has the same column set as the first one.
pub(crate) fn check_uniform(rows: &[Row]) -> AppResult<()> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    if first.is_empty() {
        return Err(AppError::Schema("rows must have at least one column".into()));
    }
    for (index, row) in rows.iter().enumerate().skip(1) {
        if !first.has_same_columns(row) {
            return Err(AppError::Schema(format!(
                "row {index} has columns [{}], expected [{}]",
                row.column_names().collect::<Vec<_>>().join(", "),
                first.column_names().collect::<Vec<_>>().join(", "),
            )));
        }
    }
    Ok(())
}

/// Resolves the row columns against the table, in the first row's order.
///
/// # Errors
/// Returns `AppError::Schema` for a column missing from the table.
pub(crate) fn resolve_columns<'t>(
    first: &Row,
    table: &'t [TableColumn],
    table_name: &str,
) -> AppResult<Vec<&'t TableColumn>> {
    first
        .column_names()
        .map(|name| {
            table.iter().find(|c| c.name == name).ok_or_else(|| {
                AppError::Schema(format!("column `{name}` does not exist in {table_name}"))
            })
        })
        .collect()
}

/// Checks every value against its column's type and nullability.
///
/// # Errors
/// Returns `AppError::Data` naming the first offending row and column.
pub(crate) fn check_values(rows: &[Row], columns: &[&TableColumn]) -> AppResult<()> {
    for (index, row) in rows.iter().enumerate() {
        for column in columns {
            let value = row.get(&column.name).ok_or_else(|| {
                AppError::Schema(format!("row {index} is missing column `{}`", column.name))
            })?;
            if value.is_null() && !column.nullable {
                return Err(AppError::Data(format!(
                    "row {index}: column `{}` does not accept NULL",
                    column.name
                )));
            }
            if !value_fits(value, &column.data_type) {
                return Err(AppError::Data(format!(
                    "row {index}: {} value cannot be stored in `{}` ({})",
                    value.type_name(),
                    column.name,
                    column.data_type
                )));
            }
        }
    }
    Ok(())
}
