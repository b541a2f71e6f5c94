//! 时间工具

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

/// 时钟 (秒级UTC时间戳)
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// 系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        current_timestamp()
    }
}

/// 手动推进的时钟，用于模拟和测试
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    pub fn set(&self, timestamp: u64) {
        self.now.store(timestamp, Ordering::SeqCst);
    }

    /// 前进指定秒数，返回新的时间
    pub fn advance(&self, seconds: u64) -> u64 {
        self.now.fetch_add(seconds, Ordering::SeqCst) + seconds
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// 获取当前UTC时间戳（秒）
pub fn current_timestamp() -> u64 {
    Utc::now().timestamp() as u64
}
