//! Respond Command Handlers
//!
//! 驱动一次完整的流：LLM 片段 -> Segmenter -> 语音下游

use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::application::commands::respond_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    ActiveStream, ChatRequest, LlmStreamPort, SpeechSinkPort, StreamError, StreamRegistryPort,
};
use crate::config::DEFAULT_SYSTEM_PROMPT;
use crate::domain::{SegmentConfig, Segmenter};

/// 回复处理设置
#[derive(Debug, Clone)]
pub struct RespondSettings {
    pub system_prompt: String,
    pub segment_config: SegmentConfig,
}

impl Default for RespondSettings {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            segment_config: SegmentConfig::default(),
        }
    }
}

/// Respond Handler - 发起流式回复
///
/// 段落逐个 await 提交，下游失败时立即中止，缓冲中的内容丢弃。
pub struct RespondHandler {
    llm: Arc<dyn LlmStreamPort>,
    speech_sink: Arc<dyn SpeechSinkPort>,
    stream_registry: Arc<dyn StreamRegistryPort>,
    settings: RespondSettings,
}

impl RespondHandler {
    pub fn new(
        llm: Arc<dyn LlmStreamPort>,
        speech_sink: Arc<dyn SpeechSinkPort>,
        stream_registry: Arc<dyn StreamRegistryPort>,
        settings: RespondSettings,
    ) -> Self {
        Self {
            llm,
            speech_sink,
            stream_registry,
            settings,
        }
    }

    pub async fn handle(&self, cmd: RespondCommand) -> Result<RespondResponse, ApplicationError> {
        let message = cmd.message.trim();
        if message.is_empty() {
            return Err(ApplicationError::validation("Message cannot be empty"));
        }

        let stream_id = cmd
            .stream_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let cancel = self
            .stream_registry
            .register(ActiveStream::new(&stream_id, message))
            .map_err(|e| match e {
                StreamError::AlreadyExists(id) => {
                    ApplicationError::validation(format!("Stream already exists: {}", id))
                }
                other => ApplicationError::internal(other.to_string()),
            })?;
        // 请求被中途丢弃（客户端断开、任务 abort）时也要注销
        let _registration = Registration {
            registry: self.stream_registry.clone(),
            stream_id: stream_id.clone(),
        };

        let result = self.run(&stream_id, message, cancel).await;

        if let Err(e) = &result {
            tracing::error!(stream_id = %stream_id, error = %e, "Stream aborted");
        }

        result
    }

    async fn run(
        &self,
        stream_id: &str,
        message: &str,
        cancel: CancellationToken,
    ) -> Result<RespondResponse, ApplicationError> {
        let started_at = Instant::now();
        let mut segmenter = Segmenter::started_at(self.settings.segment_config.clone(), started_at);

        tracing::info!(
            stream_id = %stream_id,
            message_len = message.chars().count(),
            "Starting LLM stream"
        );

        let request = ChatRequest::with_system(self.settings.system_prompt.as_str(), message);
        let mut fragments = self.llm.stream_chat(request).await?;

        let mut first_fragment = true;
        let mut cancelled = false;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                next = fragments.next() => next,
            };

            let Some(fragment) = next else {
                break;
            };
            let fragment = fragment?;

            if first_fragment {
                first_fragment = false;
                tracing::info!(
                    stream_id = %stream_id,
                    "llm time to first chunk: {:.3}s",
                    started_at.elapsed().as_secs_f64()
                );
            }

            for segment in segmenter.process(&fragment) {
                self.speech_sink.submit(segment).await?;
            }
        }

        if cancelled {
            tracing::info!(stream_id = %stream_id, "Stream cancelled, flushing remainder");
        }

        if let Some(segment) = segmenter.finish() {
            self.speech_sink.submit(segment).await?;
        }

        let report = segmenter.report();
        Ok(RespondResponse {
            stream_id: stream_id.to_string(),
            segment_count: report.segments,
            first_segment_ms: report.first_segment.map(|d| d.as_millis() as u64),
            total_ms: started_at.elapsed().as_millis() as u64,
            cancelled,
        })
    }
}

/// 已注册的流，drop 时从注册表移除
struct Registration {
    registry: Arc<dyn StreamRegistryPort>,
    stream_id: String,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.unregister(&self.stream_id);
    }
}

/// CancelStream Handler - 取消进行中的流
pub struct CancelStreamHandler {
    stream_registry: Arc<dyn StreamRegistryPort>,
}

impl CancelStreamHandler {
    pub fn new(stream_registry: Arc<dyn StreamRegistryPort>) -> Self {
        Self { stream_registry }
    }

    pub fn handle(&self, cmd: CancelStreamCommand) -> Result<(), ApplicationError> {
        self.stream_registry
            .cancel(&cmd.stream_id)
            .map_err(|_| ApplicationError::not_found("Stream", cmd.stream_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{LlmError, SpeechError};
    use crate::infrastructure::adapters::{ChannelSpeechSink, FakeLlmClient, FakeLlmClientConfig};
    use crate::infrastructure::memory::InMemoryStreamRegistry;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    fn handler_with(
        llm: FakeLlmClient,
        sink: Arc<dyn SpeechSinkPort>,
    ) -> (RespondHandler, Arc<InMemoryStreamRegistry>) {
        let registry = Arc::new(InMemoryStreamRegistry::new());
        let handler = RespondHandler::new(
            Arc::new(llm),
            sink,
            registry.clone(),
            RespondSettings::default(),
        );
        (handler, registry)
    }

    fn fake_llm(fragments: &[&str]) -> FakeLlmClient {
        FakeLlmClient::new(FakeLlmClientConfig {
            fragments: fragments.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        })
    }

    fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(segment) = rx.try_recv() {
            out.push(segment);
        }
        out
    }

    fn command(message: &str) -> RespondCommand {
        RespondCommand {
            message: message.to_string(),
            stream_id: None,
        }
    }

    /// 第 N 次提交时失败的下游
    struct FailingSink {
        fail_at: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SpeechSinkPort for FailingSink {
        async fn submit(&self, _segment: String) -> Result<(), SpeechError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == self.fail_at {
                Err(SpeechError::ServiceError("HTTP 503".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_segments_forwarded_in_order() {
        let (sink, mut rx) = ChannelSpeechSink::channel(16);
        let llm = fake_llm(&["今天天气", "真好呢，我们", "出去走走吧。", "好不好呀"]);
        let (handler, registry) = handler_with(llm, Arc::new(sink));

        let response = handler.handle(command("出去玩吗")).await.unwrap();

        let segments = drain(&mut rx);
        assert_eq!(
            segments,
            vec![
                "今天天气真好呢，".to_string(),
                "我们出去走走吧。".to_string(),
                "好不好呀".to_string(),
            ]
        );
        assert_eq!(response.segment_count, 3);
        assert!(response.first_segment_ms.is_some());
        assert!(!response.cancelled);
        assert!(registry.list().is_empty());
    }

    #[tokio::test]
    async fn test_markup_cleaned_before_forwarding() {
        let (sink, mut rx) = ChannelSpeechSink::channel(16);
        let llm = fake_llm(&["**重点**", "来了"]);
        let (handler, _) = handler_with(llm, Arc::new(sink));

        handler.handle(command("hi")).await.unwrap();
        assert_eq!(drain(&mut rx), vec!["重点来了".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let (sink, _rx) = ChannelSpeechSink::channel(4);
        let (handler, _) = handler_with(fake_llm(&[]), Arc::new(sink));

        let result = handler.handle(command("   ")).await;
        assert!(matches!(result, Err(ApplicationError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates() {
        let (sink, mut rx) = ChannelSpeechSink::channel(16);
        let llm = FakeLlmClient::new(FakeLlmClientConfig {
            fragments: vec!["今天天气真好呢，".to_string(), "我们".to_string()],
            fail_after: Some(2),
            ..Default::default()
        });
        let (handler, registry) = handler_with(llm, Arc::new(sink));

        let result = handler.handle(command("hi")).await;
        assert!(matches!(
            result,
            Err(ApplicationError::Upstream(LlmError::StreamInterrupted(_)))
        ));
        // 中断前已输出的段落保留，缓冲中的 "我们" 不再输出
        assert_eq!(drain(&mut rx), vec!["今天天气真好呢，".to_string()]);
        assert!(registry.list().is_empty());
    }

    #[tokio::test]
    async fn test_consumer_failure_stops_stream() {
        let sink = Arc::new(FailingSink {
            fail_at: 0,
            calls: AtomicUsize::new(0),
        });
        let llm = fake_llm(&["今天天气真好呢，", "我们出去走走吧。", "好不好"]);
        let (handler, _) = handler_with(llm, sink.clone());

        let result = handler.handle(command("hi")).await;
        assert!(matches!(result, Err(ApplicationError::Consumer(_))));
        assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_duplicate_stream_id_rejected() {
        let (sink, _rx) = ChannelSpeechSink::channel(4);
        let (handler, registry) = handler_with(fake_llm(&["好"]), Arc::new(sink));
        registry
            .register(ActiveStream::new("dup", "hello"))
            .unwrap();

        let result = handler
            .handle(RespondCommand {
                message: "hi".to_string(),
                stream_id: Some("dup".to_string()),
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::ValidationError(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_flushes_buffer_and_stops() {
        let (sink, mut rx) = ChannelSpeechSink::channel(16);
        let llm = FakeLlmClient::new(FakeLlmClientConfig {
            fragments: vec!["今天天气".to_string(), "真好呢".to_string(), "，以后".to_string()],
            delay_ms: 100,
            ..Default::default()
        });
        let (handler, registry) = handler_with(llm, Arc::new(sink));
        let handler = Arc::new(handler);

        let task = {
            let handler = handler.clone();
            tokio::spawn(async move {
                handler
                    .handle(RespondCommand {
                        message: "hi".to_string(),
                        stream_id: Some("s-cancel".to_string()),
                    })
                    .await
            })
        };

        // 等第一个片段到达后取消
        tokio::time::sleep(std::time::Duration::from_millis(150)).await;
        let cancel = CancelStreamHandler::new(registry.clone());
        cancel
            .handle(CancelStreamCommand {
                stream_id: "s-cancel".to_string(),
            })
            .unwrap();

        let response = task.await.unwrap().unwrap();
        assert!(response.cancelled);
        assert_eq!(drain(&mut rx), vec!["今天天气".to_string()]);
        assert!(registry.list().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_request_unregisters_stream() {
        let (sink, _rx) = ChannelSpeechSink::channel(16);
        let llm = FakeLlmClient::new(FakeLlmClientConfig {
            fragments: vec!["今天天气".to_string(), "真好呢，".to_string()],
            delay_ms: 200,
            ..Default::default()
        });
        let (handler, registry) = handler_with(llm, Arc::new(sink));
        let handler = Arc::new(handler);

        let task = {
            let handler = handler.clone();
            tokio::spawn(async move {
                handler
                    .handle(RespondCommand {
                        message: "hi".to_string(),
                        stream_id: Some("s1".to_string()),
                    })
                    .await
            })
        };

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(registry.list().len(), 1);

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
        assert!(registry.list().is_empty());

        // 同一个 ID 可以再次使用
        let token = registry.register(ActiveStream::new("s1", "again")).unwrap();
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_unknown_stream_is_not_found() {
        let registry = Arc::new(InMemoryStreamRegistry::new());
        let handler = CancelStreamHandler::new(registry);
        let result = handler.handle(CancelStreamCommand {
            stream_id: "nope".to_string(),
        });
        assert!(matches!(result, Err(ApplicationError::NotFound { .. })));
    }
}
