//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：处理所有写操作

mod transcription_commands;
mod upload_commands;

pub mod handlers;

pub use transcription_commands::*;
pub use upload_commands::*;
