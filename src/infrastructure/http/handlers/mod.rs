//! HTTP Handlers

mod ping;
mod respond;

pub use ping::*;
pub use respond::*;
