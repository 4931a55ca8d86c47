//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod llm_stream;
mod speech_sink;
mod stream_registry;

pub use llm_stream::{
    ChatMessage, ChatRequest, ChatRole, FragmentStream, LlmError, LlmStreamPort,
};
pub use speech_sink::{SpeechError, SpeechSinkPort};
pub use stream_registry::{ActiveStream, StreamError, StreamRegistryPort};
