//! 手续费托管
//!
//! 池在收取手续费时把整笔手续费转入托管账户，其中协议部分记在
//! `protocol_fees_*` 上，其余部分是LP可领取的手续费，两者只在账目上区分

use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::{PoolError, Result};
use crate::ledger::TokenLedger;
use crate::utils::math::{checked_add, checked_sub};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEscrow {
    /// 托管账户
    address: Address,
    /// 所属的池
    pool: Address,
    asset_a: Address,
    asset_b: Address,
    protocol_fees_a: U256,
    protocol_fees_b: U256,
}

impl FeeEscrow {
    pub fn new(address: Address, pool: Address, asset_a: Address, asset_b: Address) -> Self {
        Self {
            address,
            pool,
            asset_a,
            asset_b,
            protocol_fees_a: U256::zero(),
            protocol_fees_b: U256::zero(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn protocol_fees(&self) -> (U256, U256) {
        (self.protocol_fees_a, self.protocol_fees_b)
    }

    fn only_pool(&self, caller: Address) -> Result<()> {
        if caller != self.pool {
            return Err(PoolError::Forbidden);
        }
        Ok(())
    }

    /// 记录协议手续费，仅限所属池调用
    pub fn notify_protocol_fee(&mut self, caller: Address, amount_a: U256, amount_b: U256) -> Result<()> {
        self.only_pool(caller)?;
        self.protocol_fees_a = checked_add(self.protocol_fees_a, amount_a)?;
        self.protocol_fees_b = checked_add(self.protocol_fees_b, amount_b)?;
        Ok(())
    }

    /// 向LP支付已领取的手续费，仅限所属池调用
    pub fn claim_fees_for(
        &self,
        ledger: &mut dyn TokenLedger,
        caller: Address,
        recipient: Address,
        amount_a: U256,
        amount_b: U256,
    ) -> Result<()> {
        self.only_pool(caller)?;
        self.pay(ledger, recipient, amount_a, amount_b)?;
        debug!("托管 {:?} 支付LP手续费 {}/{} -> {:?}", self.address, amount_a, amount_b, recipient);
        Ok(())
    }

    /// 提取协议手续费，仅限工厂指定的手续费处理人调用
    pub fn withdraw_protocol_fees(
        &mut self,
        ledger: &mut dyn TokenLedger,
        caller: Address,
        fee_handler: Address,
        recipient: Address,
        amount_a: U256,
        amount_b: U256,
    ) -> Result<()> {
        if caller != fee_handler {
            return Err(PoolError::Forbidden);
        }

        self.protocol_fees_a = checked_sub(self.protocol_fees_a, amount_a)?;
        self.protocol_fees_b = checked_sub(self.protocol_fees_b, amount_b)?;
        self.pay(ledger, recipient, amount_a, amount_b)?;

        info!(
            "提取协议手续费 {}/{} -> {:?}, 剩余 {}/{}",
            amount_a, amount_b, recipient, self.protocol_fees_a, self.protocol_fees_b
        );
        Ok(())
    }

    fn pay(
        &self,
        ledger: &mut dyn TokenLedger,
        recipient: Address,
        amount_a: U256,
        amount_b: U256,
    ) -> Result<()> {
        if !amount_a.is_zero() {
            ledger.transfer(self.asset_a, self.address, recipient, amount_a)?;
        }
        if !amount_b.is_zero() {
            ledger.transfer(self.asset_b, self.address, recipient, amount_b)?;
        }
        Ok(())
    }
}
