//! 协议常量

use ethers::types::{Address, H160};

/// 首次注入流动性时永久锁定的份额
pub const MINIMUM_LIQUIDITY: u64 = 1_000;

/// 稳定池首次注入时的最小不变量 (归一化到1e18精度)
pub const MINIMUM_K: u64 = 10_000_000_000;

/// 预言机观测点的最小间隔 (秒)
pub const PERIOD_SIZE: u64 = 1_800;

/// 基点分母
pub const FEE_DENOMINATOR: u64 = 10_000;

/// 牛顿迭代的最大次数
pub const MAX_NEWTON_ITERATIONS: u32 = 255;

/// 1e18 定点精度
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// 锁定 MINIMUM_LIQUIDITY 的黑洞地址
pub const DEAD_ADDRESS: Address = H160([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1,
]);
