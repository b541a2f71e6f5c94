//! 不变量曲线计算
//!
//! 恒定乘积曲线: K = x * y
//! 稳定曲线: K = x*y*(x^2 + y^2)，储备先归一化到1e18精度，反解 y 使用牛顿迭代

use ethers::types::U256;
use tracing::warn;

use crate::core::{CurveKind, PoolParams, Result, Side, MAX_NEWTON_ITERATIONS};
use crate::utils::math::{checked_add, checked_mul, checked_sub, mul_div, wad};

/// 牛顿迭代结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewtonSolution {
    pub y: U256,
    /// 实际迭代次数
    pub iterations: u32,
    /// 达到迭代上限时为 false，此时 y 是最后一次的估计值
    pub converged: bool,
}

/// 不变量求解器，无状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvariantSolver {
    curve: CurveKind,
    scale_a: U256,
    scale_b: U256,
}

impl InvariantSolver {
    pub fn new(curve: CurveKind, scale_a: U256, scale_b: U256) -> Self {
        Self {
            curve,
            scale_a,
            scale_b,
        }
    }

    pub fn from_params(params: &PoolParams) -> Self {
        Self::new(params.curve, params.scale_a, params.scale_b)
    }

    pub fn curve(&self) -> CurveKind {
        self.curve
    }

    fn scale(&self, side: Side) -> U256 {
        match side {
            Side::A => self.scale_a,
            Side::B => self.scale_b,
        }
    }

    fn normalize(&self, amount: U256, side: Side) -> Result<U256> {
        mul_div(amount, wad(), self.scale(side))
    }

    fn denormalize(&self, amount: U256, side: Side) -> Result<U256> {
        mul_div(amount, self.scale(side), wad())
    }

    /// 计算不变量 K(x, y)，x 为 A 侧数量，y 为 B 侧数量
    pub fn k(&self, x: U256, y: U256) -> Result<U256> {
        match self.curve {
            CurveKind::Volatile => checked_mul(x, y),
            CurveKind::Stable => {
                let x = self.normalize(x, Side::A)?;
                let y = self.normalize(y, Side::B)?;
                f(x, y)
            }
        }
    }

    /// 计算输入 amount_in 后可得到的输出数量 (不含手续费)
    pub fn amount_out(
        &self,
        amount_in: U256,
        side_in: Side,
        reserve_a: U256,
        reserve_b: U256,
    ) -> Result<U256> {
        let (reserve_in, reserve_out) = match side_in {
            Side::A => (reserve_a, reserve_b),
            Side::B => (reserve_b, reserve_a),
        };
        let side_out = side_in.other();

        match self.curve {
            CurveKind::Volatile => {
                mul_div(amount_in, reserve_out, checked_add(reserve_in, amount_in)?)
            }
            CurveKind::Stable => {
                let xy = self.k(reserve_a, reserve_b)?;
                let reserve_in = self.normalize(reserve_in, side_in)?;
                let reserve_out = self.normalize(reserve_out, side_out)?;
                let amount_in = self.normalize(amount_in, side_in)?;

                let x0 = checked_add(amount_in, reserve_in)?;
                let solution = Self::solve_y(x0, xy, reserve_out)?;
                if !solution.converged {
                    warn!(
                        "牛顿迭代未收敛: x0={} k={} y={} 迭代 {} 次",
                        x0, xy, solution.y, solution.iterations
                    );
                }

                let y = checked_sub(reserve_out, solution.y)?;
                self.denormalize(y, side_out)
            }
        }
    }

    /// 给定 x0 求解满足 f(x0, y) >= xy 的最小 y，从 y 的当前值开始迭代
    pub fn solve_y(x0: U256, xy: U256, y: U256) -> Result<NewtonSolution> {
        solve_y_within(x0, xy, y, MAX_NEWTON_ITERATIONS)
    }
}

/// 最多迭代 `max_iterations` 次，到达上限时返回当前估计值并标记未收敛
fn solve_y_within(x0: U256, xy: U256, y: U256, max_iterations: u32) -> Result<NewtonSolution> {
    let mut y = y;

    for i in 0..max_iterations {
        let k = f(x0, y)?;
        let slope = d(x0, y)?;
        if slope.is_zero() {
            return Ok(NewtonSolution {
                y,
                iterations: i,
                converged: false,
            });
        }

        if k < xy {
            let mut dy = mul_div(xy - k, wad(), slope)?;
            if dy.is_zero() {
                let next = checked_add(y, U256::one())?;
                if f(x0, next)? > xy {
                    return Ok(NewtonSolution {
                        y: next,
                        iterations: i + 1,
                        converged: true,
                    });
                }
                dy = U256::one();
            }
            y = checked_add(y, dy)?;
        } else {
            let mut dy = mul_div(k - xy, wad(), slope)?;
            if dy.is_zero() {
                if k == xy || f(x0, y.saturating_sub(U256::one()))? < xy {
                    return Ok(NewtonSolution {
                        y,
                        iterations: i + 1,
                        converged: true,
                    });
                }
                dy = U256::one();
            }
            y = y.saturating_sub(dy);
        }
    }

    Ok(NewtonSolution {
        y,
        iterations: max_iterations,
        converged: false,
    })
}

/// f(x0, y) = x0*y*(x0^2 + y^2)，1e18 定点
fn f(x0: U256, y: U256) -> Result<U256> {
    let a = mul_div(x0, y, wad())?;
    let b = checked_add(mul_div(x0, x0, wad())?, mul_div(y, y, wad())?)?;
    mul_div(a, b, wad())
}

/// f 对 y 的偏导: 3*x0*y^2 + x0^3
fn d(x0: U256, y: U256) -> Result<U256> {
    let y2 = mul_div(y, y, wad())?;
    let left = mul_div(checked_mul(U256::from(3u64), x0)?, y2, wad())?;
    let x2 = mul_div(x0, x0, wad())?;
    let right = mul_div(x2, x0, wad())?;
    checked_add(left, right)
}
