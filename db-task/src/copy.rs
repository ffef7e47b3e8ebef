//! COPY 文件导入导出
//!
//! 通过 `COPY ... TO STDOUT` / `COPY ... FROM STDIN` 在本地 CSV 文件与数据表之间搬运数据，
//! 由数据库负责 CSV 的解析与格式化。

use std::path::{Path, PathBuf};
use std::time::Instant;

use common::errors::{AppError, AppResult};
use common::models::ConnectionParams;
use common::utils::file::remove_file;
use common::utils::SqlValidator;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use sqlx::{Connection, PgConnection};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::connection;
use crate::errors::{as_query_error, classify};

/// 每次发送给服务端的文件块大小
const CHUNK_SIZE: usize = 64 * 1024;

/// CSV format options shared by dumps and loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    /// Field delimiter.
    pub delimiter: char,
    /// Whether the file has (or gets) a header line.
    pub header: bool,
    /// String that represents NULL.
    pub null: String,
    /// File encoding name as PostgreSQL spells it.
    pub encoding: String,
    /// Restrict the copy to these columns, in this order.
    pub columns: Option<Vec<String>>,
    /// Empty the table before loading (loads only).
    pub truncate_first: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: '\t',
            header: true,
            null: String::new(),
            encoding: "UTF8".to_string(),
            columns: None,
            truncate_first: false,
        }
    }
}

impl CsvOptions {
    /// Comma-delimited CSV.
    pub fn comma() -> Self {
        Self {
            delimiter: ',',
            ..Default::default()
        }
    }

    /// Sets the column list.
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Builds the `WITH (...)` clause.
    fn with_clause(&self) -> AppResult<String> {
        if !self.delimiter.is_ascii() || matches!(self.delimiter, '"' | '\n' | '\r') {
            return Err(AppError::Validation(format!(
                "unsupported delimiter {:?}",
                self.delimiter
            )));
        }
        if self.encoding.is_empty()
            || !self
                .encoding
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(AppError::Validation(format!(
                "invalid encoding `{}`",
                self.encoding
            )));
        }
        Ok(format!(
            "(FORMAT CSV, HEADER {}, NULL '{}', DELIMITER '{}', ENCODING '{}')",
            if self.header { "TRUE" } else { "FALSE" },
            self.null.replace('\'', "''"),
            self.delimiter.to_string().replace('\'', "''"),
            self.encoding
        ))
    }

    /// Builds the optional ` ("a", "b")` column list.
    fn column_list(&self) -> AppResult<String> {
        match &self.columns {
            None => Ok(String::new()),
            Some(columns) if columns.is_empty() => {
                Err(AppError::Validation("column list must not be empty".into()))
            }
            Some(columns) => {
                let quoted = columns
                    .iter()
                    .map(|c| SqlValidator::quote_column(c))
                    .collect::<AppResult<Vec<_>>>()?;
                Ok(format!(" ({})", quoted.join(", ")))
            }
        }
    }
}

/// What a dump reads from.
#[derive(Debug, Clone, Copy)]
pub enum CopySource<'a> {
    /// A whole table (optionally restricted by `CsvOptions::columns`).
    Table(&'a str),
    /// The result of a query.
    Query(&'a str),
}

impl CopySource<'_> {
    fn copy_out_statement(&self, options: &CsvOptions) -> AppResult<String> {
        let with = options.with_clause()?;
        match self {
            CopySource::Table(table) => Ok(format!(
                "COPY {}{} TO STDOUT WITH {with}",
                SqlValidator::quote_identifier(table)?,
                options.column_list()?
            )),
            CopySource::Query(query) => {
                let query = query.trim().trim_end_matches(';');
                if query.is_empty() {
                    return Err(AppError::Query("query is empty".into()));
                }
                Ok(format!("COPY ({query}) TO STDOUT WITH {with}"))
            }
        }
    }
}

/// Writes a table or query result to a local CSV file.
///
/// The file is created only after the server accepts the COPY and is
/// overwritten if it exists. A failed dump leaves no file behind.
///
/// # Returns
/// The number of bytes written.
///
/// # Errors
/// `AppError::Validation` for bad options or identifiers, `AppError::Io` for
/// local file failures, and database failures classified as for
/// [`crate::extract`] (query sources) or [`crate::load`] (table sources).
pub async fn dump_to_file(
    params: &ConnectionParams,
    source: CopySource<'_>,
    path: impl AsRef<Path>,
    options: &CsvOptions,
) -> AppResult<u64> {
    let path = path.as_ref();
    let statement = source.copy_out_statement(options)?;
    let start = Instant::now();

    let mut conn = connection::open(params).await?;
    let mut result = copy_out(&mut conn, &statement, path).await;
    connection::close(conn).await;

    if matches!(source, CopySource::Query(_)) {
        result = result.map_err(as_query_error);
    }
    match &result {
        Ok(bytes) => tracing::info!(
            path = %path.display(),
            bytes,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "导出完成"
        ),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "导出失败"),
    }
    result
}

/// Runs the COPY and streams it into `path`.
///
/// The file is created only once the server has accepted the statement and
/// is removed again if the stream fails part way.
async fn copy_out(conn: &mut PgConnection, statement: &str, path: &Path) -> AppResult<u64> {
    let mut stream = conn.copy_out_raw(statement).await.map_err(classify)?;
    let mut file = File::create(path).await?;

    let result = async {
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(classify)?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok::<_, AppError>(written)
    }
    .await;

    if result.is_err() {
        drop(file);
        if let Err(e) = remove_file(path) {
            tracing::debug!(path = %path.display(), error = %e, "清理未完成的导出文件失败");
        }
    }
    result
}

/// Loads a local CSV file into `table_name` and returns the rows copied.
///
/// Runs in one transaction together with the optional truncate.
///
/// # Errors
/// `AppError::Validation` if the file does not exist or options are invalid;
/// `AppError::Data` for rows the server cannot parse; other database failures
/// as for [`crate::load`].
pub async fn load_from_file(
    params: &ConnectionParams,
    table_name: &str,
    path: impl AsRef<Path>,
    options: &CsvOptions,
) -> AppResult<u64> {
    let path = path.as_ref();
    let quoted_table = SqlValidator::quote_identifier(table_name)?;
    if !path.is_file() {
        return Err(AppError::Validation(format!(
            "file not found: {}",
            path.display()
        )));
    }
    let statement = format!(
        "COPY {quoted_table}{} FROM STDIN WITH {}",
        options.column_list()?,
        options.with_clause()?
    );
    let start = Instant::now();

    let mut conn = connection::open(params).await?;
    let result = copy_in(&mut conn, &quoted_table, &statement, path, options.truncate_first).await;
    connection::close(conn).await;

    match &result {
        Ok(rows) => tracing::info!(
            table = table_name,
            path = %path.display(),
            rows,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "文件装载完成"
        ),
        Err(e) => tracing::warn!(table = table_name, path = %path.display(), error = %e, "文件装载失败"),
    }
    result
}

async fn copy_in(
    conn: &mut PgConnection,
    quoted_table: &str,
    statement: &str,
    path: &Path,
    truncate_first: bool,
) -> AppResult<u64> {
    let mut file = File::open(path).await?;
    let mut tx = conn.begin().await.map_err(classify)?;

    if truncate_first {
        sqlx::query(&format!("TRUNCATE TABLE {quoted_table}"))
            .execute(&mut *tx)
            .await
            .map_err(classify)?;
    }

    let mut copy = tx.copy_in_raw(statement).await.map_err(classify)?;
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = match file.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                if let Err(abort) = copy.abort(format!("reading {} failed", path.display())).await {
                    tracing::debug!(error = %abort, "中止 COPY 失败");
                }
                return Err(e.into());
            }
        };
        copy.send(&buf[..n]).await.map_err(classify)?;
    }
    let rows = copy.finish().await.map_err(classify)?;

    tx.commit().await.map_err(classify)?;
    Ok(rows)
}

/// Loads several files in order and returns the total rows copied.
///
/// Each file is loaded in its own transaction. `truncate_first` applies to
/// the first file only, so later files append.
///
/// # Errors
/// `AppError::Validation` if `paths` is empty; otherwise the first error from
/// [`load_from_file`]. Files loaded before the failure stay loaded.
pub async fn load_from_files<P: AsRef<Path>>(
    params: &ConnectionParams,
    table_name: &str,
    paths: &[P],
    options: &CsvOptions,
) -> AppResult<u64> {
    if paths.is_empty() {
        return Err(AppError::Validation("no files to load".into()));
    }
    let mut total = 0;
    let mut options = options.clone();
    for path in paths {
        total += load_from_file(params, table_name, path, &options).await?;
        options.truncate_first = false;
    }
    Ok(total)
}

/// Loads every file matching `pattern`, in sorted path order.
///
/// Same semantics as [`load_from_files`] over the matched paths.
///
/// # Errors
/// `AppError::Validation` if the pattern is malformed or matches no file;
/// otherwise as for [`load_from_files`].
pub async fn load_from_glob(
    params: &ConnectionParams,
    table_name: &str,
    pattern: &str,
    options: &CsvOptions,
) -> AppResult<u64> {
    let paths = matching_files(pattern)?;
    tracing::debug!(pattern, files = paths.len(), "按模式匹配到待装载文件");
    load_from_files(params, table_name, &paths, options).await
}

fn matching_files(pattern: &str) -> AppResult<Vec<PathBuf>> {
    let mut paths = glob::glob(pattern)
        .map_err(|e| AppError::Validation(format!("invalid glob pattern `{pattern}`: {e}")))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Io(e.into()))?;
    paths.retain(|p| p.is_file());
    paths.sort();
    if paths.is_empty() {
        return Err(AppError::Validation(format!("no files match `{pattern}`")));
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_matches_sorted_files_only() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.tsv", "a.tsv", "skip.csv"] {
            std::fs::write(dir.path().join(name), "id\n1\n").unwrap();
        }
        std::fs::create_dir(dir.path().join("c.tsv")).unwrap();
        let pattern = dir.path().join("*.tsv");

        let paths = matching_files(pattern.to_str().unwrap()).unwrap();
        assert_eq!(paths, vec![dir.path().join("a.tsv"), dir.path().join("b.tsv")]);
    }

    #[test]
    fn test_glob_without_matches_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = dir.path().join("*.tsv");
        let err = matching_files(pattern.to_str().unwrap()).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(matching_files("[").unwrap_err().code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_default_with_clause() {
        assert_eq!(
            CsvOptions::default().with_clause().unwrap(),
            "(FORMAT CSV, HEADER TRUE, NULL '', DELIMITER '\t', ENCODING 'UTF8')"
        );
    }

    #[test]
    fn test_with_clause_escapes_quotes() {
        let options = CsvOptions {
            null: "it's null".into(),
            header: false,
            ..CsvOptions::comma()
        };
        assert_eq!(
            options.with_clause().unwrap(),
            "(FORMAT CSV, HEADER FALSE, NULL 'it''s null', DELIMITER ',', ENCODING 'UTF8')"
        );
    }

    #[test]
    fn test_bad_encoding_and_delimiter() {
        let options = CsvOptions {
            encoding: "UTF8'; DROP".into(),
            ..Default::default()
        };
        assert!(options.with_clause().is_err());
        let options = CsvOptions {
            delimiter: '\n',
            ..Default::default()
        };
        assert!(options.with_clause().is_err());
    }

    #[test]
    fn test_table_statement_with_columns() {
        let options = CsvOptions::comma().with_columns(["id", "name"]);
        let statement = CopySource::Table("public.users")
            .copy_out_statement(&options)
            .unwrap();
        assert_eq!(
            statement,
            "COPY \"public\".\"users\" (\"id\", \"name\") TO STDOUT WITH \
             (FORMAT CSV, HEADER TRUE, NULL '', DELIMITER ',', ENCODING 'UTF8')"
        );
    }

    #[test]
    fn test_query_statement_strips_semicolon() {
        let statement = CopySource::Query("SELECT 1;")
            .copy_out_statement(&CsvOptions::comma())
            .unwrap();
        assert!(statement.starts_with("COPY (SELECT 1) TO STDOUT"));
    }

    #[test]
    fn test_empty_column_list_is_rejected() {
        let options = CsvOptions::default().with_columns(Vec::<String>::new());
        assert!(options.column_list().is_err());
    }

    #[tokio::test]
    async fn test_missing_file_is_validation_error() {
        let params = ConnectionParams::new("127.0.0.1", "db", "u").with_port(1);
        let err = load_from_file(&params, "users", "/no/such/file.csv", &CsvOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_no_paths_is_validation_error() {
        let params = ConnectionParams::new("127.0.0.1", "db", "u").with_port(1);
        let paths: [&str; 0] = [];
        let err = load_from_files(&params, "users", &paths, &CsvOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
}
