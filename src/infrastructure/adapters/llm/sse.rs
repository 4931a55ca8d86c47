//! Server-Sent Events 解码
//!
//! OpenAI 兼容接口的流式响应格式：
//!
//! ```text
//! data: {"choices":[{"delta":{"content":"你好"}}]}
//!
//! data: [DONE]
//! ```
//!
//! 网络分块与行边界无关，可能在一行中间甚至 UTF-8 字符中间切开，
//! 因此按字节缓冲，只解析完整的行。

use futures_util::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use std::collections::VecDeque;
use std::fmt::Display;

use crate::application::ports::{FragmentStream, LlmError};

/// SSE 事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// `data:` 行的内容
    Data(String),
    /// `data: [DONE]`
    Done,
}

/// 按行解码 SSE 字节流
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加字节，返回其中完整行解析出的事件
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<SseEvent>, LlmError> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = parse_line(&line)? {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// 流结束时处理最后一个没有换行的行
    pub fn finish(&mut self) -> Result<Vec<SseEvent>, LlmError> {
        let line = std::mem::take(&mut self.buffer);
        Ok(parse_line(&line)?.into_iter().collect())
    }
}

fn parse_line(line: &[u8]) -> Result<Option<SseEvent>, LlmError> {
    let line = std::str::from_utf8(line)
        .map_err(|e| LlmError::InvalidResponse(format!("Invalid UTF-8 in stream: {}", e)))?;
    let line = line.trim_end_matches(&['\r', '\n'][..]);

    // 注释、event:、id: 以及空行都忽略
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let data = data.strip_prefix(' ').unwrap_or(data);

    if data == "[DONE]" {
        Ok(Some(SseEvent::Done))
    } else {
        Ok(Some(SseEvent::Data(data.to_string())))
    }
}

/// 流式响应中的一个 chunk
#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// 提取 chunk 中的文本增量；没有 choices 或没有内容的 chunk 返回 None
pub fn parse_chunk(data: &str) -> Result<Option<String>, LlmError> {
    let chunk: ChatCompletionChunk = serde_json::from_str(data)
        .map_err(|e| LlmError::InvalidResponse(format!("Invalid chunk JSON: {}", e)))?;

    if let Some(error) = chunk.error {
        return Err(LlmError::ServiceError(error.to_string()));
    }

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta)
        .and_then(|delta| delta.content)
        .filter(|content| !content.is_empty()))
}

struct SseState<S> {
    bytes: std::pin::Pin<Box<S>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<String, LlmError>>,
    done: bool,
}

impl<S> SseState<S> {
    fn absorb(&mut self, events: Result<Vec<SseEvent>, LlmError>) {
        let events = match events {
            Ok(events) => events,
            Err(e) => {
                self.fail(e);
                return;
            }
        };

        for event in events {
            if self.done {
                break;
            }
            match event {
                SseEvent::Done => self.done = true,
                SseEvent::Data(data) => match parse_chunk(&data) {
                    Ok(Some(content)) => self.pending.push_back(Ok(content)),
                    Ok(None) => {}
                    Err(e) => self.fail(e),
                },
            }
        }
    }

    fn fail(&mut self, error: LlmError) {
        self.done = true;
        self.pending.push_back(Err(error));
    }
}

/// 把响应字节流转换为文本片段流
///
/// 出错后产出一个 `Err` 并结束；收到 `[DONE]` 后忽略剩余数据。
pub fn fragment_stream<S, B, E>(bytes: S) -> FragmentStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = SseState {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.done {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.feed(chunk.as_ref());
                    state.absorb(events);
                }
                Some(Err(e)) => state.fail(LlmError::StreamInterrupted(e.to_string())),
                None => {
                    let events = state.decoder.finish();
                    state.absorb(events);
                    state.done = true;
                }
            }
        }
    })
    .boxed()
}
