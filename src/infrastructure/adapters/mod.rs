//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod runpod;
pub mod storage;

pub use runpod::*;
pub use storage::*;
