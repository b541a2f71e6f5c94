use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::{CurveKind, PoolError, PoolSpec, Result, FEE_DENOMINATOR, PERIOD_SIZE};
use crate::factory::StaticFeeAuthority;
use crate::store::FileStore;

/// 环境变量前缀，如 `AMM__PROTOCOL__FEE_BPS=500`
pub const ENV_PREFIX: &str = "AMM";

/// 协议手续费配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// 协议从每笔手续费中抽取的比例 (基点)
    pub fee_bps: u16,
    /// 有权提取协议手续费的账户 (必填)
    pub fee_handler: Address,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            fee_bps: 0,
            fee_handler: Address::zero(),
        }
    }
}

/// 各曲线的默认手续费档位 (基点)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeConfig {
    pub volatile_bps: u16,
    pub stable_bps: u16,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            volatile_bps: 30, // 0.3%
            stable_bps: 5,    // 0.05%
        }
    }
}

/// 引擎配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 池快照目录
    pub data_dir: PathBuf,
    /// 观测点最小间隔 (秒)
    pub period_size: u64,
    pub protocol: ProtocolConfig,
    pub fees: FeeConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/pools"),
            period_size: PERIOD_SIZE,
            protocol: ProtocolConfig::default(),
            fees: FeeConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn fee_tier(&self, curve: CurveKind) -> u16 {
        match curve {
            CurveKind::Volatile => self.fees.volatile_bps,
            CurveKind::Stable => self.fees.stable_bps,
        }
    }

    /// 按配置的手续费档位和观测间隔生成建池参数
    pub fn pool_spec(
        &self,
        address: Address,
        escrow: Address,
        asset_a: Address,
        asset_b: Address,
        curve: CurveKind,
    ) -> PoolSpec {
        PoolSpec::new(address, escrow, asset_a, asset_b, curve, self.fee_tier(curve))
            .with_period_size(self.period_size)
    }

    pub fn fee_authority(&self) -> StaticFeeAuthority {
        StaticFeeAuthority::new(self.protocol.fee_bps, self.protocol.fee_handler)
    }

    pub fn file_store(&self) -> Result<FileStore> {
        FileStore::new(&self.data_dir)
    }
}

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 加载配置: `.env` -> TOML 文件 (可选) -> `AMM__*` 环境变量，后者覆盖前者
    pub fn load(path: Option<&Path>) -> Result<EngineConfig> {
        dotenv::dotenv().ok(); // 加载.env文件，如果存在的话

        let environment = ::config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true);
        let builder = Self::file_builder(path).add_source(environment);

        let config: EngineConfig = builder.build()?.try_deserialize()?;
        Self::validate_config(&config)?;
        Ok(config)
    }

    /// 从 TOML 文件加载并应用显式覆盖项 (键如 `protocol.fee_bps`)，不读取环境变量
    pub fn load_from(path: Option<&Path>, overrides: &[(&str, &str)]) -> Result<EngineConfig> {
        let mut builder = Self::file_builder(path);
        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let config: EngineConfig = builder.build()?.try_deserialize()?;
        Self::validate_config(&config)?;
        Ok(config)
    }

    fn file_builder(
        path: Option<&Path>,
    ) -> ::config::ConfigBuilder<::config::builder::DefaultState> {
        let builder = ::config::Config::builder();
        match path {
            Some(path) => builder.add_source(::config::File::new(
                &path.to_string_lossy(),
                ::config::FileFormat::Toml,
            )),
            None => builder,
        }
    }

    /// 验证配置的有效性
    pub fn validate_config(config: &EngineConfig) -> Result<()> {
        if config.period_size == 0 {
            return Err(PoolError::Config("period_size 不能为0".to_string()));
        }

        if u64::from(config.protocol.fee_bps) > FEE_DENOMINATOR {
            return Err(PoolError::Config(format!(
                "protocol.fee_bps 不能超过 {}",
                FEE_DENOMINATOR
            )));
        }

        if config.protocol.fee_handler.is_zero() {
            return Err(PoolError::Config(
                "protocol.fee_handler 是必填项".to_string(),
            ));
        }

        for (name, bps) in [
            ("fees.volatile_bps", config.fees.volatile_bps),
            ("fees.stable_bps", config.fees.stable_bps),
        ] {
            if u64::from(bps) >= FEE_DENOMINATOR {
                return Err(PoolError::Config(format!(
                    "{} 必须小于 {}",
                    name, FEE_DENOMINATOR
                )));
            }
        }

        if config.data_dir.as_os_str().is_empty() {
            return Err(PoolError::Config("data_dir 不能为空".to_string()));
        }

        Ok(())
    }

    /// 打印配置摘要
    pub fn print_config_summary(config: &EngineConfig) {
        log::info!("=== 配置摘要 ===");
        log::info!("数据目录: {}", config.data_dir.display());
        log::info!("观测间隔: {} 秒", config.period_size);
        log::info!(
            "手续费: Volatile {}%, Stable {}%",
            config.fees.volatile_bps as f64 / 100.0,
            config.fees.stable_bps as f64 / 100.0
        );
        log::info!("协议分成: {}%", config.protocol.fee_bps as f64 / 100.0);
        log::info!("协议手续费处理人: {:?}", config.protocol.fee_handler);
        log::info!("==================");
    }
}
