//! 双资产流动性池
//!
//! `Pool` 编排储备量账本、价格预言机、手续费分配和手续费托管，对外提供
//! mint / burn / swap / skim / sync / claim 以及份额转账。
//!
//! 每个写操作:
//! 1. 进入重入保护 (同一线程嵌套调用，或闪电兑换回调期间任何线程的调用，返回 `Reentrancy`)
//! 2. 复制已提交的状态并在代币账本上建立检查点
//! 3. 在副本上执行操作，成功后持久化并发布副本、提交账本检查点
//! 4. 任何一步失败都回滚账本，已发布的状态保持不变
//!
//! 读操作只读取已发布的状态，不会看到执行中的副本

pub mod escrow;
pub mod fees;
pub mod guard;
pub mod oracle;
pub mod reserves;

#[cfg(test)]
pub(crate) mod fixtures;

pub use escrow::FeeEscrow;
pub use fees::FeeAccrual;
pub use guard::{CallbackScope, GuardLock, ReentrancyGuard};
pub use oracle::PriceOracle;
pub use reserves::ReserveLedger;

use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard};
use tracing::{debug, info, warn};

use crate::amm::InvariantSolver;
use crate::core::{
    Observation, PoolError, PoolMetadata, PoolParams, PoolSpec, Reserves, Result, Side,
    DEAD_ADDRESS, FEE_DENOMINATOR, MINIMUM_K, MINIMUM_LIQUIDITY,
};
use crate::factory::FeeAuthority;
use crate::ledger::{ShareLedger, TokenLedger};
use crate::store::PoolStore;
use crate::utils::math::{bps_of, checked_add, checked_div, checked_mul, checked_sub, mul_div, sqrt};
use crate::utils::time::Clock;

/// 池的可变状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    pub reserves: ReserveLedger,
    pub oracle: PriceOracle,
    pub fees: FeeAccrual,
    pub escrow: FeeEscrow,
    pub shares: ShareLedger,
}

impl PoolState {
    fn mint_shares(&mut self, to: Address, amount: U256) -> Result<()> {
        self.fees.update_for(to, self.shares.balance_of(to))?;
        self.shares.mint(to, amount)
    }

    fn burn_shares(&mut self, from: Address, amount: U256) -> Result<()> {
        self.fees.update_for(from, self.shares.balance_of(from))?;
        self.shares.burn(from, amount)
    }

    fn move_shares(&mut self, from: Address, to: Address, amount: U256) -> Result<()> {
        self.fees.update_for(from, self.shares.balance_of(from))?;
        self.fees.update_for(to, self.shares.balance_of(to))?;
        self.shares.transfer(from, to, amount)
    }

    /// 用新余额覆盖储备，累计时间积分，到期时追加观测点
    fn update_reserves(&mut self, balance_a: U256, balance_b: U256, now: u64) -> Result<()> {
        self.reserves.update(balance_a, balance_b, now)?;

        let (cumulative_a, cumulative_b) = self.reserves.cumulatives();
        if self.oracle.record(now, cumulative_a, cumulative_b) {
            debug!(timestamp = now, observations = self.oracle.len(), "observation recorded");
        }
        Ok(())
    }
}

/// 持久化快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub params: PoolParams,
    pub state: PoolState,
}

/// 闪电兑换回调
///
/// 在输出转出之后、重新读取余额之前调用，回调内可以读取池状态，
/// 但任何写操作都会被重入保护拒绝
pub trait SwapCallee {
    fn hook(
        &self,
        pool: &Pool,
        ledger: &mut dyn TokenLedger,
        initiator: Address,
        amount_a_out: U256,
        amount_b_out: U256,
        data: &[u8],
    ) -> Result<()>;
}

/// data 为空时不调用回调
#[derive(Clone, Copy)]
pub struct FlashCallback<'a> {
    pub callee: &'a dyn SwapCallee,
    pub data: &'a [u8],
}

pub struct Pool {
    params: PoolParams,
    solver: InvariantSolver,
    state: RwLock<PoolState>,
    guard: ReentrancyGuard,
    authority: Arc<dyn FeeAuthority>,
    clock: Arc<dyn Clock>,
    store: Option<Arc<dyn PoolStore>>,
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("params", &self.params)
            .field("state", &self.state)
            .field("persistent", &self.store.is_some())
            .finish()
    }
}

fn unit_scale(decimals: u8) -> Result<U256> {
    U256::from(10u64)
        .checked_pow(U256::from(decimals))
        .ok_or(PoolError::Overflow)
}

fn net_input(balance: U256, remaining: U256) -> U256 {
    if balance > remaining {
        balance - remaining
    } else {
        U256::zero()
    }
}

impl Pool {
    /// 创建新池，资产按地址从小到大排列
    pub fn new(
        spec: PoolSpec,
        ledger: &dyn TokenLedger,
        authority: Arc<dyn FeeAuthority>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        if spec.asset_a == spec.asset_b {
            return Err(PoolError::InvalidParameter("两种资产不能相同".to_string()));
        }
        if spec.asset_a.is_zero() || spec.asset_b.is_zero() {
            return Err(PoolError::InvalidParameter("资产地址不能为零".to_string()));
        }
        if spec.address == spec.escrow {
            return Err(PoolError::InvalidParameter("托管账户不能是池自身".to_string()));
        }
        if u64::from(spec.fee_tier_bps) >= FEE_DENOMINATOR {
            return Err(PoolError::InvalidParameter(format!(
                "手续费档位必须小于 {} bps: {}",
                FEE_DENOMINATOR, spec.fee_tier_bps
            )));
        }
        if spec.period_size == 0 {
            return Err(PoolError::InvalidParameter("观测间隔不能为0".to_string()));
        }

        let (asset_a, asset_b) = if spec.asset_a < spec.asset_b {
            (spec.asset_a, spec.asset_b)
        } else {
            (spec.asset_b, spec.asset_a)
        };
        let decimals_a = ledger.decimals(asset_a)?;
        let decimals_b = ledger.decimals(asset_b)?;

        let params = PoolParams {
            address: spec.address,
            escrow: spec.escrow,
            asset_a,
            asset_b,
            curve: spec.curve,
            fee_tier_bps: spec.fee_tier_bps,
            decimals_a,
            decimals_b,
            scale_a: unit_scale(decimals_a)?,
            scale_b: unit_scale(decimals_b)?,
        };

        let now = clock.now();
        let state = PoolState {
            reserves: ReserveLedger::new(now),
            oracle: PriceOracle::new(now, spec.period_size),
            fees: FeeAccrual::default(),
            escrow: FeeEscrow::new(spec.escrow, spec.address, asset_a, asset_b),
            shares: ShareLedger::new(spec.address),
        };

        info!(
            "创建池 {:?}: {:?}/{:?} {} 手续费 {} bps",
            params.address, asset_a, asset_b, params.curve, params.fee_tier_bps
        );
        Ok(Self::assemble(params, state, authority, clock, None))
    }

    fn assemble(
        params: PoolParams,
        state: PoolState,
        authority: Arc<dyn FeeAuthority>,
        clock: Arc<dyn Clock>,
        store: Option<Arc<dyn PoolStore>>,
    ) -> Self {
        Self {
            solver: InvariantSolver::from_params(&params),
            params,
            state: RwLock::new(state),
            guard: ReentrancyGuard::new(),
            authority,
            clock,
            store,
        }
    }

    /// 挂载存储并立即写入当前快照
    pub fn with_store(mut self, store: Arc<dyn PoolStore>) -> Result<Self> {
        store.save(&self.snapshot()?)?;
        self.store = Some(store);
        Ok(self)
    }

    /// 从快照重建池 (不挂载存储)
    pub fn from_snapshot(
        snapshot: PoolSnapshot,
        authority: Arc<dyn FeeAuthority>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::assemble(snapshot.params, snapshot.state, authority, clock, None)
    }

    /// 从存储恢复池，之后的写操作继续写入该存储
    pub fn restore(
        store: Arc<dyn PoolStore>,
        address: Address,
        authority: Arc<dyn FeeAuthority>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let snapshot = store
            .load(address)?
            .ok_or_else(|| PoolError::Storage(format!("未找到池快照: {:?}", address)))?;

        info!(
            "恢复池 {:?}: 储备 {}/{}, 份额 {}, 观测点 {}",
            address,
            snapshot.state.reserves.reserves().reserve_a,
            snapshot.state.reserves.reserves().reserve_b,
            snapshot.state.shares.total_supply(),
            snapshot.state.oracle.len()
        );
        Ok(Self::assemble(
            snapshot.params,
            snapshot.state,
            authority,
            clock,
            Some(store),
        ))
    }

    pub fn params(&self) -> &PoolParams {
        &self.params
    }

    pub fn address(&self) -> Address {
        self.params.address
    }

    pub fn snapshot(&self) -> Result<PoolSnapshot> {
        Ok(PoolSnapshot {
            params: self.params.clone(),
            state: self.read_state()?.clone(),
        })
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, PoolState>> {
        self.state.read().map_err(|_| PoolError::StatePoisoned)
    }

    fn balances(&self, ledger: &dyn TokenLedger) -> (U256, U256) {
        (
            ledger.balance_of(self.params.asset_a, self.params.address),
            ledger.balance_of(self.params.asset_b, self.params.address),
        )
    }

    /// 在状态副本上执行写操作，成功后持久化并发布
    fn transact<T>(&self, op: &'static str, f: impl FnOnce(&mut PoolState) -> Result<T>) -> Result<T> {
        let _lock = self.guard.enter()?;

        let mut snapshot = PoolSnapshot {
            params: self.params.clone(),
            state: self.read_state()?.clone(),
        };
        let result = f(&mut snapshot.state).and_then(|value| {
            if let Some(store) = &self.store {
                store.save(&snapshot)?;
            }
            Ok(value)
        });

        match result {
            Ok(value) => {
                let mut state = self.state.write().map_err(|_| PoolError::StatePoisoned)?;
                *state = snapshot.state;
                debug!(pool = ?self.params.address, op, "committed");
                Ok(value)
            }
            Err(e) => {
                warn!("池 {:?} {} 失败, 已回滚: {}", self.params.address, op, e);
                Err(e)
            }
        }
    }

    /// 涉及代币转账的写操作，失败时回滚账本
    fn execute<T>(
        &self,
        ledger: &mut dyn TokenLedger,
        op: &'static str,
        f: impl FnOnce(&mut PoolState, &mut dyn TokenLedger) -> Result<T>,
    ) -> Result<T> {
        let checkpoint = ledger.checkpoint();
        let result = self.transact(op, |state| f(state, &mut *ledger));
        if result.is_ok() {
            ledger.commit(checkpoint);
        } else {
            ledger.rollback(checkpoint);
        }
        result
    }

    /// 以池余额超出储备的部分铸造流动性份额
    pub fn mint(&self, ledger: &mut dyn TokenLedger, to: Address) -> Result<U256> {
        self.execute(ledger, "mint", |state, ledger| {
            let now = self.clock.now();
            let Reserves {
                reserve_a,
                reserve_b,
                ..
            } = state.reserves.reserves();
            let (balance_a, balance_b) = self.balances(ledger);
            let amount_a = checked_sub(balance_a, reserve_a)?;
            let amount_b = checked_sub(balance_b, reserve_b)?;
            let total_supply = state.shares.total_supply();

            let liquidity = if total_supply.is_zero() {
                let root = sqrt(checked_mul(amount_a, amount_b)?);
                let minimum = U256::from(MINIMUM_LIQUIDITY);
                if root <= minimum {
                    return Err(PoolError::InsufficientLiquidityMinted);
                }
                if self.params.curve.is_stable()
                    && self.solver.k(amount_a, amount_b)? < U256::from(MINIMUM_K)
                {
                    return Err(PoolError::InsufficientK);
                }
                state.mint_shares(DEAD_ADDRESS, minimum)?;
                root - minimum
            } else {
                let by_a = mul_div(amount_a, total_supply, reserve_a)?;
                let by_b = mul_div(amount_b, total_supply, reserve_b)?;
                by_a.min(by_b)
            };

            if liquidity.is_zero() {
                return Err(PoolError::InsufficientLiquidityMinted);
            }
            state.mint_shares(to, liquidity)?;
            state.update_reserves(balance_a, balance_b, now)?;

            debug!("mint {:?}: 投入 {}/{}, 份额 {}", to, amount_a, amount_b, liquidity);
            Ok(liquidity)
        })
    }

    /// 销毁池持有的份额，按池的实际余额比例赎回
    pub fn burn(&self, ledger: &mut dyn TokenLedger, to: Address) -> Result<(U256, U256)> {
        self.execute(ledger, "burn", |state, ledger| {
            let now = self.clock.now();
            let pool = self.params.address;
            let (balance_a, balance_b) = self.balances(ledger);
            let liquidity = state.shares.balance_of(pool);
            let total_supply = state.shares.total_supply();
            if liquidity.is_zero() || total_supply.is_zero() {
                return Err(PoolError::InsufficientLiquidityBurned);
            }

            let amount_a = mul_div(liquidity, balance_a, total_supply)?;
            let amount_b = mul_div(liquidity, balance_b, total_supply)?;
            if amount_a.is_zero() || amount_b.is_zero() {
                return Err(PoolError::InsufficientLiquidityBurned);
            }

            state.burn_shares(pool, liquidity)?;
            ledger.transfer(self.params.asset_a, pool, to, amount_a)?;
            ledger.transfer(self.params.asset_b, pool, to, amount_b)?;

            let (balance_a, balance_b) = self.balances(ledger);
            state.update_reserves(balance_a, balance_b, now)?;

            debug!("burn {:?}: 份额 {}, 赎回 {}/{}", to, liquidity, amount_a, amount_b);
            Ok((amount_a, amount_b))
        })
    }

    /// 兑换，返回两侧的净输入
    ///
    /// 先转出请求的输出，再调用闪电兑换回调，最后根据余额计算输入并收取手续费。
    /// 扣除手续费后的余额计算的不变量不得低于交易前
    pub fn swap(
        &self,
        ledger: &mut dyn TokenLedger,
        sender: Address,
        amount_a_out: U256,
        amount_b_out: U256,
        to: Address,
        callback: Option<FlashCallback<'_>>,
    ) -> Result<(U256, U256)> {
        self.execute(ledger, "swap", |state, ledger| {
            if amount_a_out.is_zero() && amount_b_out.is_zero() {
                return Err(PoolError::InsufficientOutputAmount);
            }
            let Reserves {
                reserve_a,
                reserve_b,
                ..
            } = state.reserves.reserves();
            if amount_a_out >= reserve_a || amount_b_out >= reserve_b {
                return Err(PoolError::InsufficientLiquidity);
            }
            if to == self.params.asset_a || to == self.params.asset_b {
                return Err(PoolError::InvalidTo(to));
            }

            let now = self.clock.now();
            let pool = self.params.address;
            if !amount_a_out.is_zero() {
                ledger.transfer(self.params.asset_a, pool, to, amount_a_out)?;
            }
            if !amount_b_out.is_zero() {
                ledger.transfer(self.params.asset_b, pool, to, amount_b_out)?;
            }
            if let Some(callback) = callback {
                if !callback.data.is_empty() {
                    let _scope = self.guard.callback()?;
                    callback.callee.hook(
                        self,
                        ledger,
                        sender,
                        amount_a_out,
                        amount_b_out,
                        callback.data,
                    )?;
                }
            }

            let (balance_a, balance_b) = self.balances(ledger);
            let amount_a_in = net_input(balance_a, checked_sub(reserve_a, amount_a_out)?);
            let amount_b_in = net_input(balance_b, checked_sub(reserve_b, amount_b_out)?);
            if amount_a_in.is_zero() && amount_b_in.is_zero() {
                return Err(PoolError::InsufficientInputAmount);
            }

            let fee_bps = u64::from(self.params.fee_tier_bps);
            if !amount_a_in.is_zero() {
                self.collect_fee(state, ledger, Side::A, bps_of(amount_a_in, fee_bps)?)?;
            }
            if !amount_b_in.is_zero() {
                self.collect_fee(state, ledger, Side::B, bps_of(amount_b_in, fee_bps)?)?;
            }

            let (balance_a, balance_b) = self.balances(ledger);
            if self.solver.k(balance_a, balance_b)? < self.solver.k(reserve_a, reserve_b)? {
                return Err(PoolError::K);
            }
            state.update_reserves(balance_a, balance_b, now)?;

            debug!(
                "swap {:?} -> {:?}: 输入 {}/{}, 输出 {}/{}",
                sender, to, amount_a_in, amount_b_in, amount_a_out, amount_b_out
            );
            Ok((amount_a_in, amount_b_in))
        })
    }

    /// 整笔手续费转入托管，协议部分记账，其余计入LP手续费指数
    fn collect_fee(
        &self,
        state: &mut PoolState,
        ledger: &mut dyn TokenLedger,
        side: Side,
        fee: U256,
    ) -> Result<()> {
        if fee.is_zero() {
            return Ok(());
        }

        let pool = self.params.address;
        let protocol_bps = u64::from(self.authority.protocol_fee_bps(pool));
        let protocol_fee = bps_of(fee, protocol_bps)?;
        let lp_fee = checked_sub(fee, protocol_fee)?;

        ledger.transfer(self.params.asset(side), pool, state.escrow.address(), fee)?;
        match side {
            Side::A => state.escrow.notify_protocol_fee(pool, protocol_fee, U256::zero())?,
            Side::B => state.escrow.notify_protocol_fee(pool, U256::zero(), protocol_fee)?,
        }
        let ratio = state.fees.distribute(side, lp_fee, state.shares.total_supply())?;

        debug!(?side, %fee, %protocol_fee, %ratio, "fee collected");
        Ok(())
    }

    /// 把余额超出储备的部分转给 to
    pub fn skim(&self, ledger: &mut dyn TokenLedger, to: Address) -> Result<(U256, U256)> {
        self.execute(ledger, "skim", |state, ledger| {
            let pool = self.params.address;
            let reserves = state.reserves.reserves();
            let (balance_a, balance_b) = self.balances(ledger);
            let excess_a = checked_sub(balance_a, reserves.reserve_a)?;
            let excess_b = checked_sub(balance_b, reserves.reserve_b)?;

            if !excess_a.is_zero() {
                ledger.transfer(self.params.asset_a, pool, to, excess_a)?;
            }
            if !excess_b.is_zero() {
                ledger.transfer(self.params.asset_b, pool, to, excess_b)?;
            }

            debug!("skim {:?}: {}/{}", to, excess_a, excess_b);
            Ok((excess_a, excess_b))
        })
    }

    /// 把储备同步为实际余额
    pub fn sync(&self, ledger: &mut dyn TokenLedger) -> Result<()> {
        self.execute(ledger, "sync", |state, ledger| {
            let (balance_a, balance_b) = self.balances(ledger);
            state.update_reserves(balance_a, balance_b, self.clock.now())
        })
    }

    /// 领取持有人累计的LP手续费
    pub fn claim(&self, ledger: &mut dyn TokenLedger, holder: Address) -> Result<(U256, U256)> {
        self.execute(ledger, "claim", |state, ledger| {
            state.fees.update_for(holder, state.shares.balance_of(holder))?;
            let (claimed_a, claimed_b) = state.fees.take_claimable(holder);

            if !claimed_a.is_zero() || !claimed_b.is_zero() {
                state
                    .escrow
                    .claim_fees_for(ledger, self.params.address, holder, claimed_a, claimed_b)?;
            }
            Ok((claimed_a, claimed_b))
        })
    }

    /// 由工厂指定的手续费处理人提取协议手续费
    pub fn withdraw_protocol_fees(
        &self,
        ledger: &mut dyn TokenLedger,
        caller: Address,
        recipient: Address,
        amount_a: U256,
        amount_b: U256,
    ) -> Result<()> {
        let fee_handler = self.authority.protocol_fee_handler();
        self.execute(ledger, "withdraw_protocol_fees", |state, ledger| {
            state
                .escrow
                .withdraw_protocol_fees(ledger, caller, fee_handler, recipient, amount_a, amount_b)
        })
    }

    pub fn transfer_shares(&self, from: Address, to: Address, amount: U256) -> Result<()> {
        self.transact("transfer_shares", |state| state.move_shares(from, to, amount))
    }

    pub fn approve(&self, owner: Address, spender: Address, amount: U256) -> Result<()> {
        self.transact("approve", |state| {
            state.shares.approve(owner, spender, amount);
            Ok(())
        })
    }

    pub fn transfer_shares_from(
        &self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<()> {
        self.transact("transfer_shares_from", |state| {
            state.shares.spend_allowance(from, spender, amount)?;
            state.move_shares(from, to, amount)
        })
    }

    pub fn reserves(&self) -> Result<Reserves> {
        Ok(self.read_state()?.reserves.reserves())
    }

    pub fn metadata(&self) -> Result<PoolMetadata> {
        let reserves = self.reserves()?;
        Ok(PoolMetadata {
            scale_a: self.params.scale_a,
            scale_b: self.params.scale_b,
            reserve_a: reserves.reserve_a,
            reserve_b: reserves.reserve_b,
            curve: self.params.curve,
            asset_a: self.params.asset_a,
            asset_b: self.params.asset_b,
        })
    }

    pub fn fee_tier(&self) -> u16 {
        self.params.fee_tier_bps
    }

    /// LP手续费指数
    pub fn index(&self) -> Result<(U256, U256)> {
        Ok(self.read_state()?.fees.index())
    }

    pub fn total_supply(&self) -> Result<U256> {
        Ok(self.read_state()?.shares.total_supply())
    }

    pub fn share_balance(&self, holder: Address) -> Result<U256> {
        Ok(self.read_state()?.shares.balance_of(holder))
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        Ok(self.read_state()?.shares.allowance(owner, spender))
    }

    /// 可领取的LP手续费，包括尚未结算的部分
    pub fn claimable(&self, holder: Address) -> Result<(U256, U256)> {
        let state = self.read_state()?;
        state.fees.pending(holder, state.shares.balance_of(holder))
    }

    pub fn protocol_fees(&self) -> Result<(U256, U256)> {
        Ok(self.read_state()?.escrow.protocol_fees())
    }

    /// 当前储备的不变量
    pub fn k(&self) -> Result<U256> {
        let reserves = self.reserves()?;
        self.solver.k(reserves.reserve_a, reserves.reserve_b)
    }

    /// 按当前储备报价 (扣除手续费)
    pub fn get_amount_out(&self, amount_in: U256, token_in: Address) -> Result<U256> {
        let side = self.params.side_of(token_in)?;
        let reserves = self.reserves()?;
        let fee = bps_of(amount_in, u64::from(self.params.fee_tier_bps))?;
        self.solver.amount_out(
            checked_sub(amount_in, fee)?,
            side,
            reserves.reserve_a,
            reserves.reserve_b,
        )
    }

    /// 外推到当前时刻的累计值，返回 (cumulative_a, cumulative_b, now)
    pub fn current_cumulative_prices(&self) -> Result<(U256, U256, u64)> {
        let now = self.clock.now();
        let (cumulative_a, cumulative_b) = self.read_state()?.reserves.current_cumulative(now)?;
        Ok((cumulative_a, cumulative_b, now))
    }

    /// 从最近的观测点到当前时刻的时间加权报价
    pub fn current(&self, token_in: Address, amount_in: U256) -> Result<U256> {
        let side = self.params.side_of(token_in)?;
        let now = self.clock.now();
        let state = self.read_state()?;
        let (cumulative_a, cumulative_b) = state.reserves.current_cumulative(now)?;
        let (reserve_a, reserve_b) = state.oracle.current_reserves(now, cumulative_a, cumulative_b)?;
        self.solver.amount_out(amount_in, side, reserve_a, reserve_b)
    }

    /// 最近 granularity 个观测区间报价的平均值
    pub fn quote(&self, token_in: Address, amount_in: U256, granularity: usize) -> Result<U256> {
        if granularity == 0 {
            return Err(PoolError::InvalidParameter("granularity 不能为0".to_string()));
        }

        let prices = self.sample(token_in, amount_in, granularity, 1)?;
        let mut total = U256::zero();
        for price in prices {
            total = checked_add(total, price)?;
        }
        checked_div(total, U256::from(granularity))
    }

    pub fn prices(&self, token_in: Address, amount_in: U256, points: usize) -> Result<Vec<U256>> {
        self.sample(token_in, amount_in, points, 1)
    }

    /// 最近 points 个窗口的报价，每个窗口跨越 window 个观测间隔
    pub fn sample(
        &self,
        token_in: Address,
        amount_in: U256,
        points: usize,
        window: usize,
    ) -> Result<Vec<U256>> {
        let side = self.params.side_of(token_in)?;
        let windows = self.read_state()?.oracle.window_reserves(points, window)?;
        windows
            .into_iter()
            .map(|(reserve_a, reserve_b)| self.solver.amount_out(amount_in, side, reserve_a, reserve_b))
            .collect()
    }

    pub fn observation_length(&self) -> Result<usize> {
        Ok(self.read_state()?.oracle.len())
    }

    pub fn last_observation(&self) -> Result<Observation> {
        let state = self.read_state()?;
        state
            .oracle
            .last()
            .ok_or(PoolError::InsufficientObservations {
                required: 1,
                available: 0,
            })
    }

    pub fn observation(&self, index: usize) -> Result<Option<Observation>> {
        Ok(self.read_state()?.oracle.get(index))
    }
}
