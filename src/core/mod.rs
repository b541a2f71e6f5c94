//! 核心类型与常量

pub mod constants;
pub mod types;

pub use constants::*;
pub use types::*;
