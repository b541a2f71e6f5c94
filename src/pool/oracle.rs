//! 时间加权价格预言机
//!
//! 观测点只追加不修改。距上一个观测点超过 `period_size` 秒时才追加新点，
//! 因此采样间隔至少为 `period_size`，没有上限 (取决于交易活跃度)。
//! 两个观测点之间累计值之差除以时间差即为该区间的平均储备量

use ethers::types::U256;
use serde::{Deserialize, Serialize};

use crate::core::{Observation, PoolError, Result};
use crate::utils::math::{checked_div, checked_sub};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceOracle {
    period_size: u64,
    observations: Vec<Observation>,
}

impl PriceOracle {
    /// 以零累计值创建第一个观测点
    pub fn new(now: u64, period_size: u64) -> Self {
        Self {
            period_size,
            observations: vec![Observation {
                timestamp: now,
                cumulative_a: U256::zero(),
                cumulative_b: U256::zero(),
            }],
        }
    }

    pub fn period_size(&self) -> u64 {
        self.period_size
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Observation> {
        self.observations.get(index).copied()
    }

    pub fn last(&self) -> Option<Observation> {
        self.observations.last().copied()
    }

    /// 如果到期则追加观测点，返回是否追加
    pub fn record(&mut self, now: u64, cumulative_a: U256, cumulative_b: U256) -> bool {
        let due = self
            .observations
            .last()
            .map_or(true, |last| now.saturating_sub(last.timestamp) > self.period_size);

        if due {
            self.observations.push(Observation {
                timestamp: now,
                cumulative_a,
                cumulative_b,
            });
        }
        due
    }

    /// 从最近的观测点到 now 的平均储备量
    ///
    /// 最近的观测点恰好记录于 now 时退回到前一个观测点
    pub fn current_reserves(
        &self,
        now: u64,
        cumulative_a: U256,
        cumulative_b: U256,
    ) -> Result<(U256, U256)> {
        let len = self.observations.len();
        let mut observation = self.last().ok_or(PoolError::InsufficientObservations {
            required: 1,
            available: 0,
        })?;

        if observation.timestamp == now {
            observation = len
                .checked_sub(2)
                .and_then(|index| self.get(index))
                .ok_or(PoolError::InsufficientObservations {
                    required: 2,
                    available: len,
                })?;
        }

        let end = Observation {
            timestamp: now,
            cumulative_a,
            cumulative_b,
        };
        average_reserves(&observation, &end)
    }

    /// 最近 points 个窗口的平均储备量，每个窗口跨越 window 个观测间隔，按时间先后排列
    pub fn window_reserves(&self, points: usize, window: usize) -> Result<Vec<(U256, U256)>> {
        if window == 0 {
            return Err(PoolError::InvalidParameter("window 不能为0".to_string()));
        }

        let len = self.observations.len();
        let span = points.checked_mul(window).ok_or(PoolError::Overflow)?;
        let length = len.saturating_sub(1);
        if span > length {
            return Err(PoolError::InsufficientObservations {
                required: span + 1,
                available: len,
            });
        }

        let mut reserves = Vec::with_capacity(points);
        let mut index = length - span;
        while index < length {
            let next = index + window;
            reserves.push(average_reserves(
                &self.observations[index],
                &self.observations[next],
            )?);
            index = next;
        }
        Ok(reserves)
    }
}

fn average_reserves(start: &Observation, end: &Observation) -> Result<(U256, U256)> {
    let elapsed = end
        .timestamp
        .checked_sub(start.timestamp)
        .ok_or(PoolError::Underflow)?;
    let elapsed = U256::from(elapsed);

    let reserve_a = checked_div(checked_sub(end.cumulative_a, start.cumulative_a)?, elapsed)?;
    let reserve_b = checked_div(checked_sub(end.cumulative_b, start.cumulative_b)?, elapsed)?;
    Ok((reserve_a, reserve_b))
}
