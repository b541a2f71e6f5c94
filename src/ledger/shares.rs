use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::{PoolError, Result};

/// 流动性份额账本
///
/// 只负责余额和授权，手续费检查点由池在余额变化前更新
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLedger {
    /// 份额代币地址 (即池地址)
    token: Address,
    total_supply: U256,
    balances: BTreeMap<Address, U256>,
    /// owner -> spender -> amount
    allowances: BTreeMap<Address, BTreeMap<Address, U256>>,
}

impl ShareLedger {
    pub fn new(token: Address) -> Self {
        Self {
            token,
            ..Default::default()
        }
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    pub fn balance_of(&self, holder: Address) -> U256 {
        self.balances.get(&holder).copied().unwrap_or_default()
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&owner)
            .and_then(|spenders| spenders.get(&spender))
            .copied()
            .unwrap_or_default()
    }

    pub fn holders(&self) -> impl Iterator<Item = (&Address, &U256)> {
        self.balances.iter()
    }

    pub fn mint(&mut self, to: Address, amount: U256) -> Result<()> {
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(PoolError::Overflow)?;
        let balance = self.balance_of(to);
        self.set_balance(to, balance.checked_add(amount).ok_or(PoolError::Overflow)?);
        Ok(())
    }

    pub fn burn(&mut self, from: Address, amount: U256) -> Result<()> {
        let balance = self.debit_amount(from, amount)?;
        self.set_balance(from, balance);
        self.total_supply = self
            .total_supply
            .checked_sub(amount)
            .ok_or(PoolError::Underflow)?;
        Ok(())
    }

    pub fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<()> {
        let remaining = self.debit_amount(from, amount)?;
        self.set_balance(from, remaining);
        let balance = self.balance_of(to);
        self.set_balance(to, balance.checked_add(amount).ok_or(PoolError::Overflow)?);
        Ok(())
    }

    pub fn approve(&mut self, owner: Address, spender: Address, amount: U256) {
        let spenders = self.allowances.entry(owner).or_default();
        if amount.is_zero() {
            spenders.remove(&spender);
        } else {
            spenders.insert(spender, amount);
        }
        if spenders.is_empty() {
            self.allowances.remove(&owner);
        }
    }

    /// 扣减授权，U256::MAX 视为无限授权
    pub fn spend_allowance(&mut self, owner: Address, spender: Address, amount: U256) -> Result<()> {
        let available = self.allowance(owner, spender);
        if available == U256::MAX {
            return Ok(());
        }
        if available < amount {
            return Err(PoolError::InsufficientAllowance {
                required: amount,
                available,
            });
        }
        self.approve(owner, spender, available - amount);
        Ok(())
    }

    fn debit_amount(&self, from: Address, amount: U256) -> Result<U256> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(PoolError::InsufficientBalance {
                token: self.token,
                owner: from,
                required: amount,
                available,
            });
        }
        Ok(available - amount)
    }

    fn set_balance(&mut self, holder: Address, balance: U256) {
        if balance.is_zero() {
            self.balances.remove(&holder);
        } else {
            self.balances.insert(holder, balance);
        }
    }
}
