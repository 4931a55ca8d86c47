//! HTTP Speech Sink - 把段落提交给外部语音合成服务
//!
//! 实现 SpeechSinkPort trait
//!
//! 外部语音 API:
//! POST {url}{submit_path}
//! Request: {"text": "..."}  (JSON)
//! Response: 2xx 表示已接收，响应体忽略

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::{SpeechError, SpeechSinkPort};
use crate::config::SpeechConfig;

/// 提交请求体 (JSON)
#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    text: &'a str,
}

/// HTTP Speech Sink 配置
#[derive(Debug, Clone)]
pub struct HttpSpeechSinkConfig {
    /// 语音服务基础 URL
    pub base_url: String,
    /// 提交路径
    pub submit_path: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpSpeechSinkConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8010".to_string(),
            submit_path: "/api/speech/submit".to_string(),
            timeout_secs: 30,
        }
    }
}

impl From<&SpeechConfig> for HttpSpeechSinkConfig {
    fn from(config: &SpeechConfig) -> Self {
        Self {
            base_url: config.url.clone(),
            submit_path: config.submit_path.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

/// HTTP Speech Sink
pub struct HttpSpeechSink {
    client: Client,
    config: HttpSpeechSinkConfig,
}

impl HttpSpeechSink {
    pub fn new(config: HttpSpeechSinkConfig) -> Result<Self, SpeechError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SpeechError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 获取提交 URL
    fn submit_url(&self) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.submit_path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl SpeechSinkPort for HttpSpeechSink {
    async fn submit(&self, segment: String) -> Result<(), SpeechError> {
        tracing::debug!(
            url = %self.submit_url(),
            text_len = segment.chars().count(),
            "Submitting segment to speech service"
        );

        let response = self
            .client
            .post(self.submit_url())
            .json(&SubmitRequest { text: &segment })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SpeechError::Timeout
                } else if e.is_connect() {
                    SpeechError::NetworkError(format!("Cannot connect to speech service: {}", e))
                } else {
                    SpeechError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SpeechError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        Ok(())
    }
}
