//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    CancelStreamHandler, RespondHandler, RespondSettings,
    // Query handlers
    ListActiveStreamsHandler,
    // Ports
    LlmStreamPort, SpeechSinkPort, StreamRegistryPort,
};

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    /// 健康检查与关闭时取消活动流
    pub stream_registry: Arc<dyn StreamRegistryPort>,

    // ========== Command Handlers ==========
    pub respond_handler: RespondHandler,
    pub cancel_stream_handler: CancelStreamHandler,

    // ========== Query Handlers ==========
    pub list_active_streams_handler: ListActiveStreamsHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        llm: Arc<dyn LlmStreamPort>,
        speech_sink: Arc<dyn SpeechSinkPort>,
        stream_registry: Arc<dyn StreamRegistryPort>,
        settings: RespondSettings,
    ) -> Self {
        Self {
            // Ports
            stream_registry: stream_registry.clone(),

            // Command handlers
            respond_handler: RespondHandler::new(
                llm,
                speech_sink,
                stream_registry.clone(),
                settings,
            ),
            cancel_stream_handler: CancelStreamHandler::new(stream_registry.clone()),

            // Query handlers
            list_active_streams_handler: ListActiveStreamsHandler::new(stream_registry),
        }
    }
}
