//! Diesel and pool error mapping shared by every repository.
//!
//! Every port error enum exposes `connection` and `query` constructors, so
//! each repository only names its own error type through
//! `basic_error_mapping!`.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Map pool errors into a repository-specific connection error.
pub fn map_basic_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    connection(error.into_message())
}

/// Map Diesel failures into query or connection errors.
///
/// A closed connection is a connection error; everything else, including
/// `NotFound` from `.first()`, is a query error.
pub fn map_basic_diesel_error<E, Q, C>(error: DieselError, query: Q, connection: C) -> E
where
    Q: Fn(&'static str) -> E,
    C: Fn(&'static str) -> E,
{
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(%error, "diesel operation failed"),
    }

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        _ => query("database error"),
    }
}

/// True when the failure is a unique constraint violation.
pub fn is_unique_violation(error: &DieselError) -> bool {
    matches!(
        error,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    )
}

/// True when the database rejected the write under `constraint`.
///
/// Exclusion violations have no dedicated Diesel kind, so the constraint
/// name is the only reliable signal.
pub fn violates_constraint(error: &DieselError, constraint: &str) -> bool {
    match error {
        DieselError::DatabaseError(_, info) => info.constraint_name() == Some(constraint),
        _ => false,
    }
}

/// Generate `map_pool_error` and `map_diesel_error` for one port error type,
/// and let `?` turn a `CorruptRow` into a query error.
macro_rules! basic_error_mapping {
    ($error:ty) => {
        impl From<$crate::outbound::persistence::models::CorruptRow> for $error {
            fn from(error: $crate::outbound::persistence::models::CorruptRow) -> Self {
                ::tracing::warn!(%error, "stored row failed domain validation");
                <$error>::query(error.to_string())
            }
        }

        fn map_pool_error(
            error: $crate::outbound::persistence::pool::PoolError,
        ) -> $error {
            $crate::outbound::persistence::diesel_basic_error_mapping::map_basic_pool_error(
                error,
                <$error>::connection,
            )
        }

        fn map_diesel_error(error: ::diesel::result::Error) -> $error {
            $crate::outbound::persistence::diesel_basic_error_mapping::map_basic_diesel_error(
                error,
                <$error>::query,
                <$error>::connection,
            )
        }
    };
}

pub(crate) use basic_error_mapping;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::BookingRepositoryError;
    use rstest::rstest;

    struct Info(&'static str, Option<&'static str>);

    impl diesel::result::DatabaseErrorInformation for Info {
        fn message(&self) -> &str {
            self.0
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            None
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            self.1
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn database_error(kind: DatabaseErrorKind) -> DieselError {
        DieselError::DatabaseError(kind, Box::new(Info("boom", None)))
    }

    fn map(error: DieselError) -> BookingRepositoryError {
        map_basic_diesel_error(
            error,
            BookingRepositoryError::query,
            BookingRepositoryError::connection,
        )
    }

    #[rstest]
    fn closed_connection_is_a_connection_error() {
        let mapped = map(database_error(DatabaseErrorKind::ClosedConnection));
        assert!(matches!(mapped, BookingRepositoryError::Connection { .. }));
    }

    #[rstest]
    #[case(DieselError::NotFound)]
    #[case(database_error(DatabaseErrorKind::ForeignKeyViolation))]
    #[case(database_error(DatabaseErrorKind::UniqueViolation))]
    fn other_failures_are_query_errors(#[case] error: DieselError) {
        assert!(matches!(map(error), BookingRepositoryError::Query { .. }));
    }

    #[rstest]
    fn pool_errors_keep_their_message() {
        let mapped = map_basic_pool_error(
            PoolError::checkout("timed out"),
            BookingRepositoryError::connection,
        );
        assert_eq!(mapped, BookingRepositoryError::connection("timed out"));
    }

    #[rstest]
    fn detects_unique_violations() {
        assert!(is_unique_violation(&database_error(
            DatabaseErrorKind::UniqueViolation
        )));
        assert!(!is_unique_violation(&DieselError::NotFound));
    }

    #[rstest]
    #[case(Some("bookings_no_overlap"), true)]
    #[case(Some("bookings_pkey"), false)]
    #[case(None, false)]
    fn matches_violations_by_constraint_name(
        #[case] constraint: Option<&'static str>,
        #[case] expected: bool,
    ) {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::Unknown,
            Box::new(Info("conflicting key value violates exclusion constraint", constraint)),
        );
        assert_eq!(violates_constraint(&error, "bookings_no_overlap"), expected);
        assert!(!violates_constraint(&DieselError::NotFound, "bookings_no_overlap"));
    }
}
