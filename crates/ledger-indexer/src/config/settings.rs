use crate::error::{LedgerError, Result};
use crate::events::tier_key;
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, str::FromStr, time::Duration};
use tracing::info;
use utils::{EnvLoader, StoreBackend};

/// 默认监听的销售合约（Polygon 主网）
pub const DEFAULT_SALE_CONTRACTS: [&str; 5] = [
    "0x8501A9018A5625b720355A5A05c5dA3D5E8bB003",
    "0x0bF818f3A69485c8B05Cf6292D9A04C6f58ADF08",
    "0x4259D89087b6EBBC8bE38A30393a2F99F798FE2f",
    "0x167360A54746b82e38f700dF0ef812c269c4e565",
    "0x3d25Cb3139811c6AeE9D5ae8a01B2e5824b5dB91",
];

/// 低于该区块高度的事件不刷新卡包缓存（回放历史时减少合约读取）
pub const DEFAULT_PACK_START_HEIGHT: i64 = 66_977_005;

/// Ledger-Indexer配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerIndexerConfig {
    /// 链配置
    pub chain: ChainConfig,
    /// 存储配置
    pub database: DatabaseConfig,
    /// 索引器配置
    pub indexer: IndexerConfig,
}

/// 链上读取配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// RPC URL
    pub rpc_url: String,
    /// 销售合约地址列表（已转小写）
    pub sale_contracts: Vec<String>,
    /// 卡包缓存刷新的起始区块高度
    pub pack_start_height: i64,
    /// 单次合约读取超时（秒）
    pub read_timeout_secs: u64,
}

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// MongoDB连接字符串
    pub uri: String,
    /// 数据库名称
    pub database_name: String,
    /// 存储后端
    pub backend: StoreBackend,
}

/// 索引器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// 事件流结束后是否对全部档位做一次完整刷新
    pub final_refresh: bool,
    /// 卡包核对时每批读取的卡包数
    pub check_batch_size: usize,
}

impl LedgerIndexerConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        info!("🔧 从环境变量加载Ledger-Indexer配置...");

        if let Err(e) = EnvLoader::load_env_file() {
            info!("⚠️  加载环境配置文件失败: {}", e);
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载配置，缺省值与生产环境一致
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let chain = ChainConfig {
            rpc_url: get("RPC_URL", "https://polygon-rpc.com"),
            sale_contracts: Self::parse_sale_contracts(lookup("SALE_CONTRACTS"))?,
            pack_start_height: get("PACK_START_HEIGHT", &DEFAULT_PACK_START_HEIGHT.to_string())
                .parse()
                .map_err(|e| LedgerError::Config(format!("PACK_START_HEIGHT 解析失败: {}", e)))?,
            read_timeout_secs: get("CONTRACT_READ_TIMEOUT_SECS", "30").parse().unwrap_or(30),
        };

        let database = DatabaseConfig {
            uri: get("MONGO_URI", "mongodb://localhost:27017"),
            database_name: get("MONGO_DB", "ledger_development"),
            backend: StoreBackend::from(get("STORE_BACKEND", "mongo").as_str()),
        };

        let indexer = IndexerConfig {
            final_refresh: get("FINAL_REFRESH", "true").parse().unwrap_or(true),
            check_batch_size: get("CHECK_SHOP_BATCH_SIZE", "100").parse().unwrap_or(100),
        };

        let config = Self {
            chain,
            database,
            indexer,
        };
        config.validate()?;

        info!(
            "✅ 配置加载完成: {} 个销售合约, 卡包刷新起始高度 {}, 存储后端 {:?}",
            config.chain.sale_contracts.len(),
            config.chain.pack_start_height,
            config.database.backend
        );
        Ok(config)
    }

    /// 解析销售合约列表（逗号分隔）
    fn parse_sale_contracts(raw: Option<String>) -> Result<Vec<String>> {
        let Some(raw) = raw else {
            return Ok(DEFAULT_SALE_CONTRACTS.iter().map(|a| tier_key(a)).collect());
        };

        let mut contracts = Vec::new();
        for address in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            Address::from_str(address)
                .map_err(|e| LedgerError::Config(format!("销售合约地址无效 {}: {}", address, e)))?;
            contracts.push(tier_key(address));
        }

        info!("📋 解析到{}个销售合约: {:?}", contracts.len(), contracts);
        Ok(contracts)
    }

    /// 验证配置
    pub fn validate(&self) -> Result<()> {
        if !self.chain.rpc_url.starts_with("http") && !self.chain.rpc_url.starts_with("ws") {
            return Err(LedgerError::Config("RPC URL必须以http(s)或ws(s)开头".to_string()));
        }

        if self.chain.sale_contracts.is_empty() {
            return Err(LedgerError::Config("至少需要配置一个销售合约".to_string()));
        }

        let mut unique = HashSet::new();
        for address in &self.chain.sale_contracts {
            if !unique.insert(address) {
                return Err(LedgerError::Config(format!("销售合约重复: {}", address)));
            }
        }

        if self.chain.pack_start_height < 0 {
            return Err(LedgerError::Config("卡包刷新起始高度不能为负".to_string()));
        }

        if self.indexer.check_batch_size == 0 {
            return Err(LedgerError::Config("核对批量大小必须大于0".to_string()));
        }

        if self.database.backend == StoreBackend::Mongo && !self.database.uri.starts_with("mongodb") {
            return Err(LedgerError::Config("MongoDB URI必须以mongodb开头".to_string()));
        }

        Ok(())
    }

    pub fn get_read_timeout(&self) -> Duration {
        Duration::from_secs(self.chain.read_timeout_secs)
    }

    /// 测试配置：内存存储，默认合约列表
    pub fn new_for_test() -> Self {
        Self {
            chain: ChainConfig {
                rpc_url: "http://localhost:8545".to_string(),
                sale_contracts: DEFAULT_SALE_CONTRACTS.iter().map(|a| tier_key(a)).collect(),
                pack_start_height: DEFAULT_PACK_START_HEIGHT,
                read_timeout_secs: 5,
            },
            database: DatabaseConfig {
                uri: "mongodb://localhost:27017".to_string(),
                database_name: "ledger_test".to_string(),
                backend: StoreBackend::Memory,
            },
            indexer: IndexerConfig {
                final_refresh: true,
                check_batch_size: 10,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LedgerIndexerConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.chain.pack_start_height, 66_977_005);
        assert_eq!(config.chain.sale_contracts.len(), 5);
        assert_eq!(config.chain.sale_contracts[0], "0x8501a9018a5625b720355a5a05c5da3d5e8bb003");
        assert_eq!(config.database.backend, StoreBackend::Mongo);
        assert!(config.indexer.final_refresh);
    }

    #[test]
    fn test_overrides() {
        let config = LedgerIndexerConfig::from_lookup(lookup_from(&[
            ("SALE_CONTRACTS", "0x8501A9018A5625b720355A5A05c5dA3D5E8bB003, 0x0bF818f3A69485c8B05Cf6292D9A04C6f58ADF08"),
            ("PACK_START_HEIGHT", "0"),
            ("STORE_BACKEND", "memory"),
            ("FINAL_REFRESH", "false"),
        ]))
        .unwrap();

        assert_eq!(config.chain.sale_contracts.len(), 2);
        assert_eq!(config.chain.pack_start_height, 0);
        assert_eq!(config.database.backend, StoreBackend::Memory);
        assert!(!config.indexer.final_refresh);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(LedgerIndexerConfig::from_lookup(lookup_from(&[("SALE_CONTRACTS", "not-an-address")])).is_err());
        assert!(LedgerIndexerConfig::from_lookup(lookup_from(&[("PACK_START_HEIGHT", "abc")])).is_err());
        assert!(LedgerIndexerConfig::from_lookup(lookup_from(&[(
            "SALE_CONTRACTS",
            "0x8501A9018A5625b720355A5A05c5dA3D5E8bB003,0x8501a9018a5625b720355a5a05c5da3d5e8bb003"
        )]))
        .is_err());
        assert!(LedgerIndexerConfig::from_lookup(lookup_from(&[("SALE_CONTRACTS", " , ")])).is_err());
    }
}
