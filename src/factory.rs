//! 工厂协作方接口
//!
//! 池在收取手续费时查询协议分成比例，提取协议手续费时查询手续费处理人

use ethers::types::Address;
use std::collections::HashMap;

/// 工厂提供的手续费参数，池按查询时的值使用
#[cfg_attr(test, mockall::automock)]
pub trait FeeAuthority: Send + Sync {
    /// 协议从每笔手续费中抽取的比例 (基点)
    fn protocol_fee_bps(&self, pool: Address) -> u16;

    /// 有权提取协议手续费的账户
    fn protocol_fee_handler(&self) -> Address;
}

/// 固定参数的工厂，支持按池覆盖协议分成
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFeeAuthority {
    protocol_fee_bps: u16,
    fee_handler: Address,
    overrides: HashMap<Address, u16>,
}

impl StaticFeeAuthority {
    pub fn new(protocol_fee_bps: u16, fee_handler: Address) -> Self {
        Self {
            protocol_fee_bps,
            fee_handler,
            overrides: HashMap::new(),
        }
    }

    pub fn with_override(mut self, pool: Address, protocol_fee_bps: u16) -> Self {
        self.overrides.insert(pool, protocol_fee_bps);
        self
    }
}

impl FeeAuthority for StaticFeeAuthority {
    fn protocol_fee_bps(&self, pool: Address) -> u16 {
        self.overrides
            .get(&pool)
            .copied()
            .unwrap_or(self.protocol_fee_bps)
    }

    fn protocol_fee_handler(&self) -> Address {
        self.fee_handler
    }
}
