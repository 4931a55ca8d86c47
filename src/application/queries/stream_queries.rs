//! Stream Queries

/// 列出活动流查询
#[derive(Debug, Clone)]
pub struct ListActiveStreams;
