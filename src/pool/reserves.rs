use ethers::types::U256;
use serde::{Deserialize, Serialize};

use crate::core::{PoolError, Reserves, Result};
use crate::utils::math::{checked_add, checked_mul};

/// 储备量账本
///
/// 累计值是储备量对时间的积分，只在储备非零时增长
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveLedger {
    reserve_a: U256,
    reserve_b: U256,
    last_update: u64,
    cumulative_a: U256,
    cumulative_b: U256,
}

impl ReserveLedger {
    pub fn new(now: u64) -> Self {
        Self {
            last_update: now,
            ..Default::default()
        }
    }

    pub fn reserves(&self) -> Reserves {
        Reserves {
            reserve_a: self.reserve_a,
            reserve_b: self.reserve_b,
            last_update: self.last_update,
        }
    }

    pub fn cumulatives(&self) -> (U256, U256) {
        (self.cumulative_a, self.cumulative_b)
    }

    /// 按旧储备累计时间积分，然后用新余额覆盖储备
    pub fn update(&mut self, balance_a: U256, balance_b: U256, now: u64) -> Result<()> {
        let elapsed = now
            .checked_sub(self.last_update)
            .ok_or(PoolError::Underflow)?;

        if elapsed > 0 && !self.reserve_a.is_zero() && !self.reserve_b.is_zero() {
            let elapsed = U256::from(elapsed);
            self.cumulative_a = checked_add(self.cumulative_a, checked_mul(self.reserve_a, elapsed)?)?;
            self.cumulative_b = checked_add(self.cumulative_b, checked_mul(self.reserve_b, elapsed)?)?;
        }

        self.reserve_a = balance_a;
        self.reserve_b = balance_b;
        self.last_update = now;
        Ok(())
    }

    /// 把累计值外推到 now，不修改状态
    pub fn current_cumulative(&self, now: u64) -> Result<(U256, U256)> {
        let mut cumulative_a = self.cumulative_a;
        let mut cumulative_b = self.cumulative_b;

        if self.last_update != now {
            let elapsed = now
                .checked_sub(self.last_update)
                .ok_or(PoolError::Underflow)?;
            let elapsed = U256::from(elapsed);
            cumulative_a = checked_add(cumulative_a, checked_mul(self.reserve_a, elapsed)?)?;
            cumulative_b = checked_add(cumulative_b, checked_mul(self.reserve_b, elapsed)?)?;
        }

        Ok((cumulative_a, cumulative_b))
    }
}
