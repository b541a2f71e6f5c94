//! 双资产AMM池引擎
//!
//! 支持恒定乘积和稳定币两种曲线，带时间加权价格预言机和按份额分配的交易手续费

pub mod amm;
pub mod config;
pub mod core;
pub mod factory;
pub mod ledger;
pub mod pool;
pub mod store;
pub mod utils;

pub use crate::amm::{InvariantSolver, NewtonSolution};
pub use crate::config::{ConfigManager, EngineConfig};
pub use crate::core::{CurveKind, PoolError, PoolParams, PoolSpec, Result, Side};
pub use crate::factory::{FeeAuthority, StaticFeeAuthority};
pub use crate::ledger::{MemoryLedger, ShareLedger, TokenLedger};
pub use crate::pool::{FlashCallback, Pool, PoolSnapshot, PoolState, SwapCallee};
pub use crate::store::{FileStore, PoolStore};
pub use crate::utils::time::{Clock, ManualClock, SystemClock};
