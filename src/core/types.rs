use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::constants::PERIOD_SIZE;

/// 不变量曲线类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurveKind {
    /// 恒定乘积 x*y
    Volatile,
    /// 稳定币曲线 x^3*y + x*y^3
    Stable,
}

impl CurveKind {
    pub fn is_stable(&self) -> bool {
        matches!(self, CurveKind::Stable)
    }
}

impl fmt::Display for CurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurveKind::Volatile => write!(f, "Volatile"),
            CurveKind::Stable => write!(f, "Stable"),
        }
    }
}

/// 池内资产的一侧
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// 创建池所需的参数 (由外部工厂决定)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSpec {
    /// 池自身在账本中的账户
    pub address: Address,
    /// 手续费托管账户
    pub escrow: Address,
    pub asset_a: Address,
    pub asset_b: Address,
    pub curve: CurveKind,
    /// 手续费档位 (基点，如30表示0.3%)
    pub fee_tier_bps: u16,
    /// 观测点最小间隔 (秒)
    pub period_size: u64,
}

impl PoolSpec {
    pub fn new(
        address: Address,
        escrow: Address,
        asset_a: Address,
        asset_b: Address,
        curve: CurveKind,
        fee_tier_bps: u16,
    ) -> Self {
        Self {
            address,
            escrow,
            asset_a,
            asset_b,
            curve,
            fee_tier_bps,
            period_size: PERIOD_SIZE,
        }
    }

    /// 设置观测点间隔
    pub fn with_period_size(mut self, period_size: u64) -> Self {
        self.period_size = period_size;
        self
    }
}

/// 池创建后不可变的参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolParams {
    pub address: Address,
    pub escrow: Address,
    /// 地址较小的资产
    pub asset_a: Address,
    /// 地址较大的资产
    pub asset_b: Address,
    pub curve: CurveKind,
    pub fee_tier_bps: u16,
    pub decimals_a: u8,
    pub decimals_b: u8,
    /// 10^decimals_a
    pub scale_a: U256,
    /// 10^decimals_b
    pub scale_b: U256,
}

impl PoolParams {
    pub fn asset(&self, side: Side) -> Address {
        match side {
            Side::A => self.asset_a,
            Side::B => self.asset_b,
        }
    }

    /// 根据资产地址确定所在的一侧
    pub fn side_of(&self, token: Address) -> Result<Side> {
        if token == self.asset_a {
            Ok(Side::A)
        } else if token == self.asset_b {
            Ok(Side::B)
        } else {
            Err(PoolError::UnknownAsset(token))
        }
    }
}

/// 储备量快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reserves {
    pub reserve_a: U256,
    pub reserve_b: U256,
    pub last_update: u64,
}

/// 预言机观测点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: u64,
    pub cumulative_a: U256,
    pub cumulative_b: U256,
}

/// 持有人的手续费检查点
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeCheckpoint {
    /// 上次结算时的全局指数
    pub supply_index_a: U256,
    pub supply_index_b: U256,
    /// 已结算未领取的手续费
    pub claimable_a: U256,
    pub claimable_b: U256,
}

/// 池元数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolMetadata {
    pub scale_a: U256,
    pub scale_b: U256,
    pub reserve_a: U256,
    pub reserve_b: U256,
    pub curve: CurveKind,
    pub asset_a: Address,
    pub asset_b: Address,
}

/// 池操作错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("流动性不足: 输出不能达到储备量")]
    InsufficientLiquidity,

    #[error("铸造的流动性份额为零")]
    InsufficientLiquidityMinted,

    #[error("销毁得到的资产数量为零")]
    InsufficientLiquidityBurned,

    #[error("没有净输入")]
    InsufficientInputAmount,

    #[error("没有请求输出")]
    InsufficientOutputAmount,

    #[error("稳定池初始不变量过小")]
    InsufficientK,

    #[error("无效的接收地址: {0:?}")]
    InvalidTo(Address),

    #[error("交易后不变量下降")]
    K,

    #[error("无权限调用")]
    Forbidden,

    #[error("池正在执行其他操作, 拒绝重入")]
    Reentrancy,

    #[error("计算溢出")]
    Overflow,

    #[error("计算下溢")]
    Underflow,

    #[error("除零错误")]
    DivisionByZero,

    #[error("未知资产: {0:?}")]
    UnknownAsset(Address),

    #[error("余额不足: 代币 {token:?} 账户 {owner:?} 需要 {required}, 可用 {available}")]
    InsufficientBalance {
        token: Address,
        owner: Address,
        required: U256,
        available: U256,
    },

    #[error("授权额度不足: 需要 {required}, 可用 {available}")]
    InsufficientAllowance { required: U256, available: U256 },

    #[error("观测点不足: 需要 {required}, 现有 {available}")]
    InsufficientObservations { required: usize, available: usize },

    #[error("参数无效: {0}")]
    InvalidParameter(String),

    #[error("持久化失败: {0}")]
    Storage(String),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("池状态锁已损坏")]
    StatePoisoned,
}

impl From<std::io::Error> for PoolError {
    fn from(err: std::io::Error) -> Self {
        PoolError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for PoolError {
    fn from(err: serde_json::Error) -> Self {
        PoolError::Storage(err.to_string())
    }
}

impl From<config::ConfigError> for PoolError {
    fn from(err: config::ConfigError) -> Self {
        PoolError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PoolError>;
