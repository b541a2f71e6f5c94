use ethers::types::{Address, U256};
use std::collections::HashMap;
use tracing::debug;

use super::TokenLedger;
use crate::core::{PoolError, Result};

type Balances = HashMap<(Address, Address), U256>;

/// 内存代币账本
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    decimals: HashMap<Address, u8>,
    /// (token, owner) -> balance
    balances: Balances,
    snapshots: Vec<Balances>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册代币
    pub fn register_token(&mut self, token: Address, decimals: u8) {
        self.decimals.insert(token, decimals);
    }

    pub fn with_token(mut self, token: Address, decimals: u8) -> Self {
        self.register_token(token, decimals);
        self
    }

    /// 凭空发行代币 (用于注资)
    pub fn mint(&mut self, token: Address, to: Address, amount: U256) -> Result<()> {
        if !self.decimals.contains_key(&token) {
            return Err(PoolError::UnknownAsset(token));
        }
        let balance = self.balances.entry((token, to)).or_default();
        *balance = balance.checked_add(amount).ok_or(PoolError::Overflow)?;
        Ok(())
    }

    pub fn snapshot_depth(&self) -> usize {
        self.snapshots.len()
    }
}

impl TokenLedger for MemoryLedger {
    fn balance_of(&self, token: Address, owner: Address) -> U256 {
        self.balances.get(&(token, owner)).copied().unwrap_or_default()
    }

    fn decimals(&self, token: Address) -> Result<u8> {
        self.decimals
            .get(&token)
            .copied()
            .ok_or(PoolError::UnknownAsset(token))
    }

    fn transfer(&mut self, token: Address, from: Address, to: Address, amount: U256) -> Result<()> {
        if !self.decimals.contains_key(&token) {
            return Err(PoolError::UnknownAsset(token));
        }

        let available = self.balance_of(token, from);
        if available < amount {
            return Err(PoolError::InsufficientBalance {
                token,
                owner: from,
                required: amount,
                available,
            });
        }
        if from == to || amount.is_zero() {
            return Ok(());
        }

        self.balances.insert((token, from), available - amount);
        let received = self.balance_of(token, to);
        self.balances.insert(
            (token, to),
            received.checked_add(amount).ok_or(PoolError::Overflow)?,
        );

        debug!("转账 {:?}: {:?} -> {:?} 数量 {}", token, from, to, amount);
        Ok(())
    }

    fn checkpoint(&mut self) -> usize {
        self.snapshots.push(self.balances.clone());
        self.snapshots.len() - 1
    }

    fn rollback(&mut self, checkpoint: usize) {
        if checkpoint >= self.snapshots.len() {
            return;
        }
        self.snapshots.truncate(checkpoint + 1);
        if let Some(saved) = self.snapshots.pop() {
            self.balances = saved;
        }
    }

    fn commit(&mut self, checkpoint: usize) {
        self.snapshots.truncate(checkpoint);
    }
}
