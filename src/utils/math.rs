//! 数值计算工具
//!
//! 所有运算都是整数向下取整，溢出和下溢一律返回错误而不是回绕

use ethers::types::U256;

use crate::core::{PoolError, Result, FEE_DENOMINATOR, WAD};

/// 1e18
pub fn wad() -> U256 {
    U256::from(WAD)
}

pub fn checked_add(a: U256, b: U256) -> Result<U256> {
    a.checked_add(b).ok_or(PoolError::Overflow)
}

pub fn checked_sub(a: U256, b: U256) -> Result<U256> {
    a.checked_sub(b).ok_or(PoolError::Underflow)
}

pub fn checked_mul(a: U256, b: U256) -> Result<U256> {
    a.checked_mul(b).ok_or(PoolError::Overflow)
}

pub fn checked_div(a: U256, b: U256) -> Result<U256> {
    if b.is_zero() {
        return Err(PoolError::DivisionByZero);
    }
    Ok(a / b)
}

/// a * b / denominator
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256> {
    checked_div(checked_mul(a, b)?, denominator)
}

/// 按基点计算份额: amount * bps / 10000
pub fn bps_of(amount: U256, bps: u64) -> Result<U256> {
    mul_div(amount, U256::from(bps), U256::from(FEE_DENOMINATOR))
}

/// 整数平方根 (巴比伦迭代法，向下取整)
pub fn sqrt(y: U256) -> U256 {
    if y.is_zero() {
        return U256::zero();
    }
    if y <= U256::from(3u64) {
        return U256::one();
    }

    let mut z = y;
    let mut x = y / U256::from(2u64) + U256::one();

    while x < z {
        z = x;
        x = (y / x + x) / U256::from(2u64);
    }

    z
}
