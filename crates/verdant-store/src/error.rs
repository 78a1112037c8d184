//! Mapping of database failures onto domain errors.

use std::str::FromStr;

use sqlx::Row;
use sqlx::postgres::PgRow;
use verdant_core::error::DomainError;

/// Converts a sqlx error. Unique-constraint violations become
/// `DomainError::Conflict`; everything else is infrastructure.
pub(crate) fn db_error(e: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return DomainError::Conflict(db.message().to_owned());
        }
    }
    DomainError::Infrastructure(e.to_string())
}

/// Reads a text column holding an enum's database representation.
pub(crate) fn parse_column<T>(row: &PgRow, column: &str) -> Result<T, DomainError>
where
    T: FromStr<Err = DomainError>,
{
    row.try_get::<String, _>(column).map_err(db_error)?.parse()
}

/// Reads an optional text enum column.
pub(crate) fn parse_optional<T>(row: &PgRow, column: &str) -> Result<Option<T>, DomainError>
where
    T: FromStr<Err = DomainError>,
{
    row.try_get::<Option<String>, _>(column)
        .map_err(db_error)?
        .map(|s| s.parse())
        .transpose()
}

/// Converts a row count returned by `COUNT(*)`.
pub(crate) fn count(row: &PgRow) -> Result<i64, DomainError> {
    row.try_get::<i64, _>(0).map_err(db_error)
}
