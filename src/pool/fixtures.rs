//! 测试夹具

use ethers::types::{Address, U256};
use std::sync::Arc;

use super::Pool;
use crate::core::{CurveKind, PoolSpec, Side};
use crate::factory::StaticFeeAuthority;
use crate::ledger::{MemoryLedger, TokenLedger};
use crate::store::PoolStore;
use crate::utils::time::ManualClock;

pub(crate) const START: u64 = 1_000;

pub(crate) fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

pub(crate) fn token_a() -> Address {
    addr(0xa)
}

pub(crate) fn token_b() -> Address {
    addr(0xb)
}

pub(crate) fn pool_address() -> Address {
    addr(0x9001)
}

pub(crate) fn escrow_address() -> Address {
    addr(0xe5)
}

pub(crate) fn lp() -> Address {
    addr(0x100)
}

pub(crate) fn trader() -> Address {
    addr(0x200)
}

pub(crate) fn handler() -> Address {
    addr(0x4a4d)
}

pub(crate) fn e18(n: u64) -> U256 {
    U256::from(n) * U256::exp10(18)
}

pub(crate) struct TestEnv {
    pub pool: Pool,
    pub ledger: MemoryLedger,
    pub clock: Arc<ManualClock>,
    pub authority: Arc<StaticFeeAuthority>,
}

pub(crate) fn ledger(decimals_a: u8, decimals_b: u8) -> MemoryLedger {
    let mut ledger = MemoryLedger::new()
        .with_token(token_a(), decimals_a)
        .with_token(token_b(), decimals_b);
    for holder in [lp(), trader()] {
        ledger.mint(token_a(), holder, e18(1_000_000_000)).unwrap();
        ledger.mint(token_b(), holder, e18(1_000_000_000)).unwrap();
    }
    ledger
}

/// 协议分成 10%
pub(crate) fn build(curve: CurveKind, fee_tier_bps: u16) -> TestEnv {
    crate::utils::init_test_logger();

    let ledger = ledger(18, 18);
    let clock = Arc::new(ManualClock::new(START));
    let authority = Arc::new(StaticFeeAuthority::new(1_000, handler()));
    let spec = PoolSpec::new(
        pool_address(),
        escrow_address(),
        token_a(),
        token_b(),
        curve,
        fee_tier_bps,
    );
    let pool = Pool::new(spec, &ledger, authority.clone(), clock.clone()).unwrap();

    TestEnv {
        pool,
        ledger,
        clock,
        authority,
    }
}

pub(crate) fn volatile() -> TestEnv {
    build(CurveKind::Volatile, 30)
}

pub(crate) fn stable() -> TestEnv {
    build(CurveKind::Stable, 5)
}

impl TestEnv {
    pub fn with_store(mut self, store: Arc<dyn PoolStore>) -> Self {
        self.pool = self.pool.with_store(store).unwrap();
        self
    }

    pub fn balance(&self, token: Address, owner: Address) -> U256 {
        self.ledger.balance_of(token, owner)
    }

    /// 直接向池转入资产 (不经过池的任何操作)
    pub fn deposit(&mut self, from: Address, amount_a: U256, amount_b: U256) {
        if !amount_a.is_zero() {
            self.ledger
                .transfer(token_a(), from, pool_address(), amount_a)
                .unwrap();
        }
        if !amount_b.is_zero() {
            self.ledger
                .transfer(token_b(), from, pool_address(), amount_b)
                .unwrap();
        }
    }

    /// lp 注入流动性，返回铸造的份额
    pub fn seed(&mut self, amount_a: U256, amount_b: U256) -> U256 {
        self.deposit(lp(), amount_a, amount_b);
        self.pool.mint(&mut self.ledger, lp()).unwrap()
    }

    /// trader 按报价兑换，返回输出数量
    pub fn swap_in(&mut self, side: Side, amount_in: U256) -> U256 {
        let token_in = match side {
            Side::A => token_a(),
            Side::B => token_b(),
        };
        let amount_out = self.pool.get_amount_out(amount_in, token_in).unwrap();
        self.ledger
            .transfer(token_in, trader(), pool_address(), amount_in)
            .unwrap();

        let (a_out, b_out) = match side {
            Side::A => (U256::zero(), amount_out),
            Side::B => (amount_out, U256::zero()),
        };
        self.pool
            .swap(&mut self.ledger, trader(), a_out, b_out, trader(), None)
            .unwrap();
        amount_out
    }

    /// 储备量与实际余额一致
    pub fn assert_reserves_match(&self) {
        let reserves = self.pool.reserves().unwrap();
        assert_eq!(reserves.reserve_a, self.balance(token_a(), pool_address()));
        assert_eq!(reserves.reserve_b, self.balance(token_b(), pool_address()));
    }
}
