//! LLM Adapter - 流式对话客户端实现

mod fake_llm_client;
mod openai_chat_client;
pub mod sse;

pub use fake_llm_client::{FakeLlmClient, FakeLlmClientConfig};
pub use openai_chat_client::*;

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::application::ports::LlmStreamPort;

/// 在后台检查上游是否可用，不可用时记录警告
///
/// 启动路径不等待结果，避免拖慢首个请求
pub fn spawn_health_check(llm: Arc<dyn LlmStreamPort>) -> JoinHandle<bool> {
    tokio::spawn(async move {
        let healthy = llm.health_check().await;
        if !healthy {
            tracing::warn!("LLM service is not reachable, requests may fail");
        }
        healthy
    })
}
