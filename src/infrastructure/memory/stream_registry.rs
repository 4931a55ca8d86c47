//! In-Memory Stream Registry Implementation

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{ActiveStream, StreamError, StreamRegistryPort};

struct StreamEntry {
    stream: ActiveStream,
    cancel: CancellationToken,
}

/// 内存活动流注册表
pub struct InMemoryStreamRegistry {
    streams: DashMap<String, StreamEntry>,
}

impl InMemoryStreamRegistry {
    pub fn new() -> Self {
        Self {
            streams: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Default for InMemoryStreamRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamRegistryPort for InMemoryStreamRegistry {
    fn register(&self, stream: ActiveStream) -> Result<CancellationToken, StreamError> {
        match self.streams.entry(stream.id.clone()) {
            Entry::Occupied(_) => Err(StreamError::AlreadyExists(stream.id)),
            Entry::Vacant(slot) => {
                let cancel = CancellationToken::new();
                tracing::info!(stream_id = %stream.id, "Stream registered");
                slot.insert(StreamEntry {
                    stream,
                    cancel: cancel.clone(),
                });
                Ok(cancel)
            }
        }
    }

    fn cancel(&self, id: &str) -> Result<(), StreamError> {
        let entry = self
            .streams
            .get(id)
            .ok_or_else(|| StreamError::NotFound(id.to_string()))?;
        entry.cancel.cancel();
        tracing::info!(stream_id = %id, "Stream cancel requested");
        Ok(())
    }

    fn unregister(&self, id: &str) {
        if self.streams.remove(id).is_some() {
            tracing::debug!(stream_id = %id, "Stream unregistered");
        }
    }

    fn list(&self) -> Vec<ActiveStream> {
        self.streams.iter().map(|e| e.stream.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_lifecycle() {
        let registry = InMemoryStreamRegistry::new();

        // Register
        let token = registry.register(ActiveStream::new("s1", "你好")).unwrap();
        assert!(!token.is_cancelled());
        assert_eq!(registry.list().len(), 1);

        // Duplicate
        let result = registry.register(ActiveStream::new("s1", "again"));
        assert!(matches!(result, Err(StreamError::AlreadyExists(_))));

        // Cancel
        registry.cancel("s1").unwrap();
        assert!(token.is_cancelled());

        // Unregister
        registry.unregister("s1");
        assert!(registry.list().is_empty());
        assert!(matches!(registry.cancel("s1"), Err(StreamError::NotFound(_))));
    }
}
