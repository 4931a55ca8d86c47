//! Speech Sink Port - 语音合成下游抽象
//!
//! 分割后的段落按顺序提交给下游，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

/// 语音下游错误
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Speech queue closed")]
    QueueClosed,
}

/// Speech Sink Port
///
/// 调用方逐个 await `submit`，保证段落按生成顺序到达下游
#[async_trait]
pub trait SpeechSinkPort: Send + Sync {
    /// 提交一个待合成的段落
    async fn submit(&self, segment: String) -> Result<(), SpeechError>;
}
