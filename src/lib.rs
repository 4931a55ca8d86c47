//! SpeakStream - LLM 流式输出分段转语音
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Segmenter: 把 LLM 的流式片段切分为适合朗读的段落
//!
//! 应用层 (application/):
//! - Ports: 端口定义（LlmStream, SpeechSink, StreamRegistry）
//! - Commands: 发起回复、取消流
//! - Queries: 列出进行中的流
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API
//! - Memory: StreamRegistry 内存实现
//! - Adapters: OpenAI 兼容流式客户端, 语音下游

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
