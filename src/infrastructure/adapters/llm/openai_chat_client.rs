//! OpenAI 兼容流式对话客户端
//!
//! 实现 LlmStreamPort trait，适用于 OpenAI、DeepSeek、Ollama 等兼容接口
//!
//! POST {base_url}/chat/completions
//! Request: {"model": "...", "messages": [...], "stream": true}  (JSON)
//! Response: text/event-stream，见 [`super::sse`]

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::sse::fragment_stream;
use crate::application::ports::{ChatRequest, FragmentStream, LlmError, LlmStreamPort};
use crate::config::{LlmConfig, DEFAULT_API_KEY};

/// 对话请求体 (JSON)
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<HttpChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct HttpChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// 客户端配置
#[derive(Debug, Clone)]
pub struct OpenAiChatClientConfig {
    /// 接口基础 URL（不含 /chat/completions）
    pub base_url: String,
    /// 访问密钥，为空时不发送 Authorization 头
    pub api_key: String,
    /// 模型名称
    pub model: String,
    /// 请求超时时间（秒），覆盖整个流式响应
    pub timeout_secs: u64,
}

impl Default for OpenAiChatClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            model: "qwen2.5:7b".to_string(),
            timeout_secs: 120,
        }
    }
}

impl OpenAiChatClientConfig {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// 从 LLM 配置中取当前提供方
    pub fn from_llm_config(config: &LlmConfig) -> Option<Self> {
        let provider = config.active_provider()?;
        Some(
            Self::new(&provider.base_url, &provider.model)
                .with_api_key(provider.api_key_or_default())
                .with_timeout(config.timeout_secs),
        )
    }
}

/// OpenAI 兼容流式对话客户端
pub struct OpenAiChatClient {
    client: Client,
    config: OpenAiChatClientConfig,
}

impl OpenAiChatClient {
    /// 创建新的客户端
    pub fn new(config: OpenAiChatClientConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 获取对话 URL
    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// 获取模型列表 URL（用于健康检查）
    fn models_url(&self) -> String {
        format!("{}/models", self.config.base_url.trim_end_matches('/'))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.config.api_key.is_empty() {
            request
        } else {
            request.bearer_auth(&self.config.api_key)
        }
    }
}

#[async_trait]
impl LlmStreamPort for OpenAiChatClient {
    async fn stream_chat(&self, request: ChatRequest) -> Result<FragmentStream, LlmError> {
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: request
                .messages
                .iter()
                .map(|m| HttpChatMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            stream: true,
        };

        tracing::debug!(
            url = %self.completions_url(),
            model = %self.config.model,
            messages = body.messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .authorize(self.client.post(self.completions_url()))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else if e.is_connect() {
                    LlmError::NetworkError(format!("Cannot connect to LLM service: {}", e))
                } else {
                    LlmError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        Ok(fragment_stream(response.bytes_stream()))
    }

    async fn health_check(&self) -> bool {
        match self
            .authorize(self.client.get(self.models_url()))
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
