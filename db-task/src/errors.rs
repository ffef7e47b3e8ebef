//! sqlx 错误到工具箱错误的映射
//!
//! 数据库返回的错误按 SQLSTATE 分类。

use common::errors::AppError;

/// Maps a sqlx error onto the toolkit taxonomy.
pub(crate) fn classify(err: sqlx::Error) -> AppError {
    match err {
        sqlx::Error::Database(db) => {
            let message = db.message().to_string();
            match db.code() {
                Some(code) => classify_sqlstate(&code, message),
                None => AppError::Query(message),
            }
        }
        sqlx::Error::Io(e) => AppError::Connection(e.to_string()),
        sqlx::Error::Tls(e) => AppError::Connection(format!("tls: {e}")),
        sqlx::Error::Protocol(msg) => AppError::Connection(format!("protocol: {msg}")),
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed => {
            AppError::Connection(err.to_string())
        }
        sqlx::Error::Configuration(e) => AppError::Validation(e.to_string()),
        other => AppError::Query(other.to_string()),
    }
}

/// Maps a SQLSTATE code onto the toolkit taxonomy.
pub(crate) fn classify_sqlstate(code: &str, message: String) -> AppError {
    let message = format!("{message} (SQLSTATE {code})");
    match code {
        // undefined_table, undefined_column
        "42P01" | "42703" => AppError::Schema(message),
        // datatype_mismatch
        "42804" => AppError::Data(message),
        // invalid_catalog_name: the database does not exist
        "3D000" => AppError::Connection(message),
        c if c.starts_with("22") || c.starts_with("23") => AppError::Data(message),
        c if c.starts_with("28") => AppError::Authentication(message),
        c if c.starts_with("08") || c.starts_with("57P") => AppError::Connection(message),
        _ => AppError::Query(message),
    }
}

/// Maps a failure of a generated INSERT onto the toolkit taxonomy.
///
/// Every placeholder is cast to its column type, so a cast the server cannot
/// perform means the value does not fit the column.
pub(crate) fn classify_insert(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        if let Some(code) = db.code() {
            return classify_insert_sqlstate(&code, db.message().to_string());
        }
    }
    classify(err)
}

pub(crate) fn classify_insert_sqlstate(code: &str, message: String) -> AppError {
    match code {
        // cannot_coerce, undefined_function (no cast between the two types)
        "42846" | "42883" => AppError::Data(format!("{message} (SQLSTATE {code})")),
        _ => classify_sqlstate(code, message),
    }
}

/// Extraction only reports connection, authentication and query failures.
pub(crate) fn as_query_error(err: AppError) -> AppError {
    match err {
        AppError::Schema(msg) | AppError::Data(msg) => AppError::Query(msg),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_of(sqlstate: &str) -> &'static str {
        classify_sqlstate(sqlstate, "boom".into()).code()
    }

    #[test]
    fn test_sqlstate_classes() {
        assert_eq!(code_of("42P01"), "SCHEMA_ERROR");
        assert_eq!(code_of("42703"), "SCHEMA_ERROR");
        assert_eq!(code_of("22P02"), "DATA_ERROR");
        assert_eq!(code_of("22003"), "DATA_ERROR");
        assert_eq!(code_of("23502"), "DATA_ERROR");
        assert_eq!(code_of("23505"), "DATA_ERROR");
        assert_eq!(code_of("42804"), "DATA_ERROR");
        assert_eq!(code_of("28P01"), "AUTHENTICATION_ERROR");
        assert_eq!(code_of("3D000"), "CONNECTION_ERROR");
        assert_eq!(code_of("57P01"), "CONNECTION_ERROR");
        assert_eq!(code_of("42601"), "QUERY_ERROR");
        assert_eq!(code_of("42501"), "QUERY_ERROR");
    }

    #[test]
    fn test_insert_cast_failures_are_data_errors() {
        let err = classify_insert_sqlstate(
            "42846",
            "cannot cast type double precision to interval".into(),
        );
        assert_eq!(err.code(), "DATA_ERROR");
        assert!(err.to_string().contains("SQLSTATE 42846"));
        assert_eq!(classify_insert_sqlstate("42883", "boom".into()).code(), "DATA_ERROR");
        assert_eq!(classify_insert_sqlstate("23505", "boom".into()).code(), "DATA_ERROR");
        assert_eq!(classify_insert_sqlstate("42P01", "boom".into()).code(), "SCHEMA_ERROR");
        // outside INSERTs a missing function stays a query error
        assert_eq!(code_of("42883"), "QUERY_ERROR");
    }

    #[test]
    fn test_message_keeps_sqlstate() {
        let err = classify_sqlstate("42601", "syntax error at or near \"SELEC\"".into());
        assert!(err.to_string().contains("SQLSTATE 42601"));
    }

    #[test]
    fn test_io_error_is_connection() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert_eq!(classify(sqlx::Error::Io(io)).code(), "CONNECTION_ERROR");
    }

    #[test]
    fn test_extract_folds_schema_into_query() {
        let err = as_query_error(AppError::Schema("no table".into()));
        assert_eq!(err.code(), "QUERY_ERROR");
        let err = as_query_error(AppError::Connection("down".into()));
        assert_eq!(err.code(), "CONNECTION_ERROR");
    }
}
