//! Stream Registry Port - 活动流管理抽象
//!
//! 记录正在进行的流，并提供取消能力

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// 流管理错误
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Stream not found: {0}")]
    NotFound(String),

    #[error("Stream already exists: {0}")]
    AlreadyExists(String),
}

/// 活动流信息
#[derive(Debug, Clone)]
pub struct ActiveStream {
    pub id: String,
    /// 用户消息（截断后用于展示）
    pub message_preview: String,
    pub started_at: DateTime<Utc>,
}

/// 消息预览的最大字符数
const PREVIEW_CHARS: usize = 32;

impl ActiveStream {
    pub fn new(id: impl Into<String>, message: &str) -> Self {
        Self {
            id: id.into(),
            message_preview: message.chars().take(PREVIEW_CHARS).collect(),
            started_at: Utc::now(),
        }
    }
}

/// Stream Registry Port
pub trait StreamRegistryPort: Send + Sync {
    /// 注册新流，返回该流的取消令牌
    fn register(&self, stream: ActiveStream) -> Result<CancellationToken, StreamError>;

    /// 请求取消流（流会在下一个片段到达前停止并输出剩余内容）
    fn cancel(&self, id: &str) -> Result<(), StreamError>;

    /// 移除流（流结束或失败后调用）
    fn unregister(&self, id: &str);

    /// 列出所有活动流
    fn list(&self) -> Vec<ActiveStream>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncated_by_chars() {
        let message = "很".repeat(100);
        let stream = ActiveStream::new("s1", &message);
        assert_eq!(stream.message_preview.chars().count(), 32);
    }
}
