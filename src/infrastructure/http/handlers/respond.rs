//! Respond Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{CancelStreamCommand, ListActiveStreams, RespondCommand};
use crate::infrastructure::http::dto::{
    ActiveStreamDto, ActiveStreamsResponseDto, ApiResponse, CancelStreamRequest, Empty,
    RespondRequest, RespondResponseDto,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// Respond
// ============================================================================

/// 发起流式回复，段落实时提交给语音服务，流结束后返回统计
pub async fn respond(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RespondRequest>,
) -> Result<Json<ApiResponse<RespondResponseDto>>, ApiError> {
    let cmd = RespondCommand {
        message: req.message,
        stream_id: req.stream_id,
    };

    let result = state.respond_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::success(RespondResponseDto {
        stream_id: result.stream_id,
        segments: result.segment_count,
        first_segment_ms: result.first_segment_ms,
        total_ms: result.total_ms,
        cancelled: result.cancelled,
    })))
}

// ============================================================================
// Cancel
// ============================================================================

pub async fn cancel_stream(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CancelStreamRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state.cancel_stream_handler.handle(CancelStreamCommand {
        stream_id: req.stream_id,
    })?;

    Ok(Json(ApiResponse::ok()))
}

// ============================================================================
// Active Streams
// ============================================================================

pub async fn list_active_streams(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<ActiveStreamsResponseDto>> {
    let streams = state
        .list_active_streams_handler
        .handle(ListActiveStreams)
        .into_iter()
        .map(|s| ActiveStreamDto {
            stream_id: s.stream_id,
            message_preview: s.message_preview,
            started_at: s.started_at,
        })
        .collect();

    Json(ApiResponse::success(ActiveStreamsResponseDto { streams }))
}
