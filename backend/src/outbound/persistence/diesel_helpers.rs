//! Shared helpers for Diesel repository implementations.
//!
//! - Error mapping from Diesel and pool errors to `StoreError`
//! - Integer casts between database columns and domain counters
//! - The per-operation deadline

use std::future::Future;

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::{debug, warn};

use crate::domain::ports::StoreError;

use super::pool::{DbPool, PoolError};

/// Postgres message when `statement_timeout` cancels a query.
const STATEMENT_TIMEOUT_MESSAGE: &str = "statement timeout";
/// Postgres message when the client cancels a running query.
const USER_CANCEL_MESSAGE: &str = "canceling statement due to user request";

/// Map pool errors to store connection errors.
pub fn map_pool_error(error: PoolError) -> StoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            StoreError::connection(message)
        }
    }
}

/// Map Diesel errors to the store taxonomy.
///
/// `NotFound` carries a generic entity name; repositories that know the
/// entity map `DieselError::NotFound` themselves before calling this.
pub fn map_diesel_error(error: DieselError) -> StoreError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => StoreError::not_found("record"),
        DieselError::DatabaseError(kind, info) => {
            let constraint = info.constraint_name().unwrap_or("unknown").to_owned();
            match kind {
                DatabaseErrorKind::UniqueViolation => StoreError::conflict(constraint),
                DatabaseErrorKind::ForeignKeyViolation => StoreError::invalid_reference(format!(
                    "referenced row does not exist ({constraint})"
                )),
                DatabaseErrorKind::CheckViolation | DatabaseErrorKind::NotNullViolation => {
                    StoreError::invalid_data(format!("constraint {constraint} rejected the row"))
                }
                DatabaseErrorKind::ClosedConnection => {
                    StoreError::connection("database connection error")
                }
                _ => map_by_message(info.message()),
            }
        }
        DieselError::QueryBuilderError(_) => StoreError::query("database query error"),
        _ => StoreError::query("database error"),
    }
}

fn map_by_message(message: &str) -> StoreError {
    if message.contains(STATEMENT_TIMEOUT_MESSAGE) {
        StoreError::timeout("statement")
    } else if message.contains(USER_CANCEL_MESSAGE) {
        StoreError::canceled("statement")
    } else {
        StoreError::query("database error")
    }
}

/// Run `operation` under the pool's query deadline.
pub async fn with_deadline<T, F>(
    pool: &DbPool,
    operation: &'static str,
    future: F,
) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(pool.query_timeout(), future).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, timeout = ?pool.query_timeout(), "store operation timed out");
            Err(StoreError::timeout(operation))
        }
    }
}

/// Cast a database version (i32) to the domain counter.
pub fn cast_version(version: i32) -> Result<u32, StoreError> {
    u32::try_from(version)
        .map_err(|_| StoreError::invalid_data(format!("negative version {version}")))
}

/// Cast a domain version to its column type.
pub fn cast_version_for_db(version: u32) -> Result<i32, StoreError> {
    i32::try_from(version)
        .map_err(|_| StoreError::invalid_data(format!("version {version} out of range")))
}

/// Cast a SQL `COUNT(*)` to the domain counter.
pub fn cast_count(count: i64) -> Result<u64, StoreError> {
    u64::try_from(count).map_err(|_| StoreError::invalid_data(format!("negative count {count}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ERROR: canceling statement due to statement timeout", StoreError::timeout("statement"))]
    #[case("ERROR: canceling statement due to user request", StoreError::canceled("statement"))]
    #[case("ERROR: division by zero", StoreError::query("database error"))]
    fn classifies_unknown_database_errors_by_message(
        #[case] message: &str,
        #[case] expected: StoreError,
    ) {
        assert_eq!(map_by_message(message), expected);
    }

    #[rstest]
    fn pool_errors_are_connection_errors() {
        let mapped = map_pool_error(PoolError::checkout("timed out"));
        assert_eq!(mapped, StoreError::connection("timed out"));
    }

    #[rstest]
    fn missing_rows_map_to_not_found() {
        assert_eq!(
            map_diesel_error(DieselError::NotFound),
            StoreError::not_found("record")
        );
    }

    #[rstest]
    #[case(0, Ok(0))]
    #[case(7, Ok(7))]
    fn casts_versions(#[case] raw: i32, #[case] expected: Result<u32, StoreError>) {
        assert_eq!(cast_version(raw), expected);
    }

    #[rstest]
    fn rejects_negative_versions() {
        assert!(matches!(
            cast_version(-1),
            Err(StoreError::InvalidData { .. })
        ));
    }
}
