//! Chat message persistence.
//!
//! The server only needs two operations from its storage: append a
//! message and replay them all in order. The [`Store`] trait keeps that
//! seam open so a database-backed implementation can replace
//! [`MemoryStore`] without touching the chat service.

use tokio::sync::Mutex;

use thiserror::Error;

/// One stored chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRecord {
    pub name: String,
    pub message: String,
}

/// Errors from the storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Appends and replays chat messages.
pub trait Store: Send + Sync + 'static {
    /// Persists one message at the end of the history.
    fn append(
        &self,
        record: ChatRecord,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Returns every stored message, oldest first.
    fn history(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<ChatRecord>, StoreError>> + Send;
}

/// In-process store. History lives for the lifetime of the server.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<ChatRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    async fn append(&self, record: ChatRecord) -> Result<(), StoreError> {
        self.records.lock().await.push(record);
        Ok(())
    }

    async fn history(&self) -> Result<Vec<ChatRecord>, StoreError> {
        Ok(self.records.lock().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, message: &str) -> ChatRecord {
        ChatRecord { name: name.into(), message: message.into() }
    }

    #[tokio::test]
    async fn test_memory_store_replays_in_insertion_order() {
        let store = MemoryStore::new();
        store.append(record("ada", "first")).await.unwrap();
        store.append(record("bob", "second")).await.unwrap();

        let history = store.history().await.unwrap();
        assert_eq!(
            history,
            vec![record("ada", "first"), record("bob", "second")],
        );
    }

    #[tokio::test]
    async fn test_memory_store_starts_empty() {
        let store = MemoryStore::new();
        assert!(store.history().await.unwrap().is_empty());
    }
}
