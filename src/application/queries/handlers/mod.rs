//! Query Handlers 实现
//!
//! 所有 QueryHandler 的具体实现

mod transcription_handlers;

pub use transcription_handlers::*;
