//! Fake LLM Client - 用于测试的 LLM 客户端
//!
//! 按配置的片段顺序输出，不实际调用 LLM 服务

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use std::time::Duration;

use crate::application::ports::{ChatRequest, FragmentStream, LlmError, LlmStreamPort};

/// Fake LLM Client 配置
#[derive(Debug, Clone, Default)]
pub struct FakeLlmClientConfig {
    /// 依次输出的片段
    pub fragments: Vec<String>,
    /// 每个片段之前的模拟延迟（毫秒）
    pub delay_ms: u64,
    /// 输出这么多片段后以 StreamInterrupted 结束
    pub fail_after: Option<usize>,
}

/// Fake LLM Client
pub struct FakeLlmClient {
    config: FakeLlmClientConfig,
}

impl FakeLlmClient {
    pub fn new(config: FakeLlmClientConfig) -> Self {
        Self { config }
    }

    /// 直接使用片段列表创建
    pub fn with_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(FakeLlmClientConfig {
            fragments: fragments.into_iter().map(Into::into).collect(),
            ..Default::default()
        })
    }
}

#[async_trait]
impl LlmStreamPort for FakeLlmClient {
    async fn stream_chat(&self, request: ChatRequest) -> Result<FragmentStream, LlmError> {
        tracing::debug!(
            messages = request.messages.len(),
            fragments = self.config.fragments.len(),
            "FakeLlmClient: replaying fixed fragments"
        );

        let mut items: Vec<Result<String, LlmError>> = match self.config.fail_after {
            Some(n) => self.config.fragments.iter().take(n).cloned().map(Ok).collect(),
            None => self.config.fragments.iter().cloned().map(Ok).collect(),
        };
        if self.config.fail_after.is_some() {
            items.push(Err(LlmError::StreamInterrupted(
                "fake stream interrupted".to_string(),
            )));
        }

        let delay = Duration::from_millis(self.config.delay_ms);
        Ok(stream::iter(items)
            .then(move |item| async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                item
            })
            .boxed())
    }
}
