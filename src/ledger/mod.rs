//! 账本模块
//!
//! `TokenLedger` 是池所依赖的外部代币账本接口；`MemoryLedger` 是它的内存实现，
//! `ShareLedger` 记录池自身发行的流动性份额

pub mod memory;
pub mod shares;

pub use memory::MemoryLedger;
pub use shares::ShareLedger;

use ethers::types::{Address, U256};

use crate::core::Result;

/// 可替换代币账本 (精确数量、无通缩、无转账手续费)
///
/// 池的每个写操作都先调用 `checkpoint`，成功时 `commit`，失败时 `rollback`，
/// 保证失败的操作不会留下任何转账
pub trait TokenLedger {
    fn balance_of(&self, token: Address, owner: Address) -> U256;

    fn decimals(&self, token: Address) -> Result<u8>;

    fn transfer(&mut self, token: Address, from: Address, to: Address, amount: U256) -> Result<()>;

    /// 记录当前状态，返回检查点编号
    fn checkpoint(&mut self) -> usize;

    /// 恢复到检查点并丢弃它之后的所有检查点
    fn rollback(&mut self, checkpoint: usize);

    /// 保留检查点之后的修改
    fn commit(&mut self, checkpoint: usize);
}
