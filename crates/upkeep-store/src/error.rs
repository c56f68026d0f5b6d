//! Connection errors.

use std::time::Duration;

use thiserror::Error;

/// Errors that prevent a run from obtaining its store session.
///
/// Any of these aborts the run before a single task executes.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The URI could not be parsed by the backend.
    #[error("Invalid store URI: {0}")]
    InvalidUri(String),

    /// No session was established within the timeout.
    #[error("Timed out after {0:?} connecting to store")]
    Timeout(Duration),

    /// The store is not reachable over the network.
    #[error("Store unreachable: {0}")]
    Unreachable(String),

    /// The store refused the session (authentication, authorization).
    #[error("Store rejected connection: {0}")]
    Rejected(String),

    /// An operator interrupt arrived while connecting.
    #[error("Interrupted while connecting to store")]
    Interrupted,

    /// Any other database error.
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for ConnectionError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(e) => Self::InvalidUri(e.to_string()),
            sqlx::Error::Io(e) => Self::Unreachable(e.to_string()),
            sqlx::Error::Tls(e) => Self::Unreachable(e.to_string()),
            sqlx::Error::Database(e) => Self::Rejected(e.to_string()),
            other => Self::Database(other),
        }
    }
}
