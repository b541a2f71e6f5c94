//! 重入保护
//!
//! 每个池一把写锁：其他线程的写操作排队等待，同一线程在持锁期间再次进入
//! (例如闪电兑换回调里调用 mint) 直接返回 `PoolError::Reentrancy`。
//! 回调执行期间任何线程的写操作都直接返回 `Reentrancy`，不排队

use std::sync::{Condvar, Mutex};
use std::thread::{self, ThreadId};

use crate::core::{PoolError, Result};

#[derive(Debug, Default)]
struct GuardState {
    owner: Option<ThreadId>,
    in_callback: bool,
}

#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    state: Mutex<GuardState>,
    released: Condvar,
}

/// 持锁凭证，离开作用域时释放 (包括出错返回)
#[derive(Debug)]
pub struct GuardLock<'a> {
    guard: &'a ReentrancyGuard,
}

/// 回调标记，离开作用域时清除
#[derive(Debug)]
pub struct CallbackScope<'a> {
    guard: &'a ReentrancyGuard,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self) -> Result<GuardLock<'_>> {
        let current = thread::current().id();
        let mut state = self.state.lock().map_err(|_| PoolError::StatePoisoned)?;

        loop {
            if state.in_callback {
                return Err(PoolError::Reentrancy);
            }
            match state.owner {
                None => {
                    state.owner = Some(current);
                    return Ok(GuardLock { guard: self });
                }
                Some(holder) if holder == current => return Err(PoolError::Reentrancy),
                Some(_) => {
                    state = self
                        .released
                        .wait(state)
                        .map_err(|_| PoolError::StatePoisoned)?;
                }
            }
        }
    }

    /// 标记外部回调正在执行，期间所有线程的写操作都被拒绝。
    /// 只有当前持锁线程可以开启
    pub fn callback(&self) -> Result<CallbackScope<'_>> {
        let mut state = self.state.lock().map_err(|_| PoolError::StatePoisoned)?;
        if state.owner != Some(thread::current().id()) {
            return Err(PoolError::Reentrancy);
        }
        state.in_callback = true;
        // 正在排队的线程醒来后直接返回 Reentrancy
        self.released.notify_all();
        Ok(CallbackScope { guard: self })
    }

    pub fn is_locked(&self) -> bool {
        self.state
            .lock()
            .map(|state| state.owner.is_some())
            .unwrap_or(true)
    }
}

impl Drop for CallbackScope<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.guard.state.lock() {
            state.in_callback = false;
        }
    }
}

impl Drop for GuardLock<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.guard.state.lock() {
            state.owner = None;
        }
        self.guard.released.notify_one();
    }
}
