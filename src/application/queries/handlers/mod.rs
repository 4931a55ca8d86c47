//! Query Handlers 实现

mod stream_handlers;

pub use stream_handlers::*;
