//! Channel Speech Sink - 段落放入 tokio 队列，由消费方异步处理

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::application::ports::{SpeechError, SpeechSinkPort};

/// 队列下游
///
/// 队列满时 `submit` 等待，接收端关闭后返回 `QueueClosed`
pub struct ChannelSpeechSink {
    tx: mpsc::Sender<String>,
}

impl ChannelSpeechSink {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }

    /// 创建队列及其接收端
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl SpeechSinkPort for ChannelSpeechSink {
    async fn submit(&self, segment: String) -> Result<(), SpeechError> {
        self.tx
            .send(segment)
            .await
            .map_err(|_| SpeechError::QueueClosed)
    }
}
