//! Command Handlers 实现
//!
//! 所有 CommandHandler 的具体实现

mod transcription_handlers;
mod upload_handlers;

pub use transcription_handlers::*;
pub use upload_handlers::*;
