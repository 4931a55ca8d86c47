//! Data Transfer Objects

use serde::{Deserialize, Serialize};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 空数据响应
#[derive(Debug, Serialize)]
pub struct Empty {}

impl ApiResponse<Empty> {
    /// 成功但无数据
    pub fn ok() -> Self {
        Self::success(Empty {})
    }
}

// ============================================================================
// Respond DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub message: String,
    /// 调用方指定的流 ID，便于在流进行中取消
    #[serde(default)]
    pub stream_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RespondResponseDto {
    pub stream_id: String,
    pub segments: usize,
    pub first_segment_ms: Option<u64>,
    pub total_ms: u64,
    pub cancelled: bool,
}

#[derive(Debug, Deserialize)]
pub struct CancelStreamRequest {
    pub stream_id: String,
}

#[derive(Debug, Serialize)]
pub struct ActiveStreamDto {
    pub stream_id: String,
    pub message_preview: String,
    pub started_at: String,
}

#[derive(Debug, Serialize)]
pub struct ActiveStreamsResponseDto {
    pub streams: Vec<ActiveStreamDto>,
}
