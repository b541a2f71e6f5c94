//! AMM计算模块
//!
//! 提供两种不变量曲线的计算和稳定曲线的牛顿迭代求解

pub mod solver;

pub use solver::*;
