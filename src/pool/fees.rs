//! 基于指数的手续费分配
//!
//! 每次实现手续费时全局指数增加 lp_fee * 1e18 / total_supply。
//! 持有人余额变化前结算: claimable += balance * (index - checkpoint) / 1e18

use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::{FeeCheckpoint, Result, Side};
use crate::utils::math::{checked_add, checked_sub, mul_div, wad};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeAccrual {
    index_a: U256,
    index_b: U256,
    checkpoints: BTreeMap<Address, FeeCheckpoint>,
}

impl FeeAccrual {
    pub fn index(&self) -> (U256, U256) {
        (self.index_a, self.index_b)
    }

    pub fn checkpoint(&self, holder: Address) -> FeeCheckpoint {
        self.checkpoints.get(&holder).copied().unwrap_or_default()
    }

    /// 在持有人余额变化前调用，balance 为变化前的余额
    pub fn update_for(&mut self, holder: Address, balance: U256) -> Result<()> {
        let (index_a, index_b) = self.index();
        let checkpoint = self.checkpoints.entry(holder).or_default();

        if !balance.is_zero() {
            let delta_a = checked_sub(index_a, checkpoint.supply_index_a)?;
            let delta_b = checked_sub(index_b, checkpoint.supply_index_b)?;
            if !delta_a.is_zero() {
                checkpoint.claimable_a =
                    checked_add(checkpoint.claimable_a, mul_div(balance, delta_a, wad())?)?;
            }
            if !delta_b.is_zero() {
                checkpoint.claimable_b =
                    checked_add(checkpoint.claimable_b, mul_div(balance, delta_b, wad())?)?;
            }
        }

        checkpoint.supply_index_a = index_a;
        checkpoint.supply_index_b = index_b;
        Ok(())
    }

    /// 把LP部分的手续费计入全局指数，返回指数增量
    ///
    /// 总份额为零或增量向下取整为零时不计入
    pub fn distribute(&mut self, side: Side, amount: U256, total_supply: U256) -> Result<U256> {
        if amount.is_zero() || total_supply.is_zero() {
            return Ok(U256::zero());
        }

        let ratio = mul_div(amount, wad(), total_supply)?;
        if !ratio.is_zero() {
            match side {
                Side::A => self.index_a = checked_add(self.index_a, ratio)?,
                Side::B => self.index_b = checked_add(self.index_b, ratio)?,
            }
        }
        Ok(ratio)
    }

    /// 取出并清零已结算的手续费，调用前须先 `update_for`
    pub fn take_claimable(&mut self, holder: Address) -> (U256, U256) {
        match self.checkpoints.get_mut(&holder) {
            Some(checkpoint) => {
                let claimed = (checkpoint.claimable_a, checkpoint.claimable_b);
                checkpoint.claimable_a = U256::zero();
                checkpoint.claimable_b = U256::zero();
                claimed
            }
            None => (U256::zero(), U256::zero()),
        }
    }

    /// 可领取数量 (含尚未结算的部分)，不修改状态
    pub fn pending(&self, holder: Address, balance: U256) -> Result<(U256, U256)> {
        let mut preview = self.clone_checkpoint_only(holder);
        preview.update_for(holder, balance)?;
        let checkpoint = preview.checkpoint(holder);
        Ok((checkpoint.claimable_a, checkpoint.claimable_b))
    }

    fn clone_checkpoint_only(&self, holder: Address) -> Self {
        let mut checkpoints = BTreeMap::new();
        if let Some(checkpoint) = self.checkpoints.get(&holder) {
            checkpoints.insert(holder, *checkpoint);
        }
        Self {
            index_a: self.index_a,
            index_b: self.index_b,
            checkpoints,
        }
    }
}
