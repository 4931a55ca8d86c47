//! Speech Adapter - 语音下游实现

mod channel_speech_sink;
mod http_speech_sink;

pub use channel_speech_sink::ChannelSpeechSink;
pub use http_speech_sink::*;
