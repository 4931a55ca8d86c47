//! LLM Stream Port - 流式文本生成抽象
//!
//! 定义上游 LLM 流式输出的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use thiserror::Error;

/// LLM 错误
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// 流在结束标记之前中断
    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),
}

/// 对话消息角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
        }
    }
}

/// 对话消息
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// 流式对话请求
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// 系统提示词 + 单条用户消息
    pub fn with_system(system_prompt: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            messages: vec![
                ChatMessage {
                    role: ChatRole::System,
                    content: system_prompt.into(),
                },
                ChatMessage {
                    role: ChatRole::User,
                    content: message.into(),
                },
            ],
        }
    }
}

/// 文本片段流：按生成顺序产出，遇到错误后不再产出
pub type FragmentStream = BoxStream<'static, Result<String, LlmError>>;

/// LLM Stream Port
///
/// 上游生成服务的抽象接口
#[async_trait]
pub trait LlmStreamPort: Send + Sync {
    /// 发起流式对话，返回文本片段流
    async fn stream_chat(&self, request: ChatRequest) -> Result<FragmentStream, LlmError>;

    /// 检查 LLM 服务是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
