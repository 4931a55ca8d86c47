//! Respond Commands - 流式回复相关命令

/// 发起一次流式回复：把用户消息交给 LLM，分段转发给语音下游
#[derive(Debug, Clone)]
pub struct RespondCommand {
    pub message: String,
    /// 可选的流 ID，未提供时自动生成
    pub stream_id: Option<String>,
}

/// 流式回复结果
#[derive(Debug, Clone)]
pub struct RespondResponse {
    pub stream_id: String,
    /// 已提交给下游的段落数
    pub segment_count: usize,
    /// 首个段落耗时（毫秒）
    pub first_segment_ms: Option<u64>,
    /// 总耗时（毫秒）
    pub total_ms: u64,
    /// 是否被取消
    pub cancelled: bool,
}

/// 取消流命令
#[derive(Debug, Clone)]
pub struct CancelStreamCommand {
    pub stream_id: String,
}
