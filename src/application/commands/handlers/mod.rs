//! Command Handlers

mod respond_handlers;

pub use respond_handlers::{CancelStreamHandler, RespondHandler, RespondSettings};
