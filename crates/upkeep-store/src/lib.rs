//! Store connection lifecycle for Upkeep.
//!
//! A run holds exactly one store session. [`ConnectionManager::connect`]
//! opens it under a timeout and [`ConnectionManager::close`] releases it.
//! Closing is idempotent, so callers can close unconditionally on every
//! exit path.
//!
//! Backends implement [`StoreBackend`]. [`PgBackend`] talks to PostgreSQL
//! through `sqlx`.

mod backend;
mod error;
mod manager;
mod postgres;

pub use backend::StoreBackend;
pub use error::ConnectionError;
pub use manager::{redact_uri, ConnectionHandle, ConnectionManager};
pub use postgres::PgBackend;
