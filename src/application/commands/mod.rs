//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：发起回复、取消流

mod respond_commands;

pub mod handlers;

pub use respond_commands::*;
