//! 通用工具模块

pub mod math;
pub mod time;

pub use math::*;
pub use time::*;

/// 初始化日志系统 (默认 info 级别，可通过 RUST_LOG 覆盖)
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// 测试环境下初始化日志
#[cfg(test)]
pub(crate) fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
