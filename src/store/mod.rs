//! 池状态持久化

pub mod file;

pub use file::FileStore;

use ethers::types::Address;

use crate::core::Result;
use crate::pool::PoolSnapshot;

/// 池快照存储，每次写操作提交前调用 `save`，失败则整个操作回滚
#[cfg_attr(test, mockall::automock)]
pub trait PoolStore: Send + Sync {
    fn save(&self, snapshot: &PoolSnapshot) -> Result<()>;

    fn load(&self, pool: Address) -> Result<Option<PoolSnapshot>>;
}
