//! 应用层 - 查询（读操作）
//!
//! CQRS 查询侧：活动流查询

mod stream_queries;

pub mod handlers;

pub use stream_queries::*;
