//! Stream Query Handlers

use std::sync::Arc;

use crate::application::ports::{ActiveStream, StreamRegistryPort};
use crate::application::queries::ListActiveStreams;

// ============================================================================
// Response DTOs
// ============================================================================

/// 活动流响应
#[derive(Debug, Clone)]
pub struct ActiveStreamResponse {
    pub stream_id: String,
    pub message_preview: String,
    pub started_at: String,
}

impl From<ActiveStream> for ActiveStreamResponse {
    fn from(stream: ActiveStream) -> Self {
        Self {
            stream_id: stream.id,
            message_preview: stream.message_preview,
            started_at: stream.started_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// ListActiveStreams Handler
pub struct ListActiveStreamsHandler {
    stream_registry: Arc<dyn StreamRegistryPort>,
}

impl ListActiveStreamsHandler {
    pub fn new(stream_registry: Arc<dyn StreamRegistryPort>) -> Self {
        Self { stream_registry }
    }

    /// 按开始时间排序，时间相同时按 ID
    pub fn handle(&self, _query: ListActiveStreams) -> Vec<ActiveStreamResponse> {
        let mut streams = self.stream_registry.list();
        streams.sort_by(|a, b| a.started_at.cmp(&b.started_at).then_with(|| a.id.cmp(&b.id)));
        streams.into_iter().map(ActiveStreamResponse::from).collect()
    }
}
