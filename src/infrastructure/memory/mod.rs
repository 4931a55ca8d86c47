//! Memory Layer - In-Memory State Management
//!
//! 实现 StreamRegistry，管理进行中的流及其取消令牌

mod stream_registry;

pub use stream_registry::InMemoryStreamRegistry;
