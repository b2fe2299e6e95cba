//! HTTP Handlers

mod download;
mod ping;
mod storage;
mod transcribe;
mod upload;

pub use download::*;
pub use ping::*;
pub use storage::*;
pub use transcribe::*;
pub use upload::*;
