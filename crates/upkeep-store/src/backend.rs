//! Store backend trait.

use async_trait::async_trait;

use crate::ConnectionError;

/// A persistent store that can open and release a session.
///
/// Implementations do not need to be idempotent: the
/// [`ConnectionManager`](crate::ConnectionManager) guarantees `release` is
/// called at most once per opened session.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Live session type.
    type Session: Send + Sync;

    /// Open a session to the store at `uri`.
    async fn open(&self, uri: &str) -> Result<Self::Session, ConnectionError>;

    /// Release a previously opened session.
    async fn release(&self, session: Self::Session);
}
