//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（LlmStream、SpeechSink、StreamRegistry）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    handlers::{CancelStreamHandler, RespondHandler, RespondSettings},
    CancelStreamCommand, RespondCommand, RespondResponse,
};

pub use error::ApplicationError;

pub use ports::{
    // LLM stream
    ChatMessage,
    ChatRequest,
    ChatRole,
    FragmentStream,
    LlmError,
    LlmStreamPort,
    // Speech sink
    SpeechError,
    SpeechSinkPort,
    // Stream registry
    ActiveStream,
    StreamError,
    StreamRegistryPort,
};

pub use queries::{
    handlers::{ActiveStreamResponse, ListActiveStreamsHandler},
    ListActiveStreams,
};
