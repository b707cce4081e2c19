use crate::{
    error::{LedgerError, Result},
    events::{tier_key, LedgerEvent},
};
use ethers::types::Address;
use std::{collections::HashSet, str::FromStr};
use tracing::{info, warn};

/// 每个销售合约需要订阅的事件，均携带发出事件的档位地址
///
/// `ReferralBonusGiven` 不带档位地址，无法按合约过滤，作为全局事件投递。
pub const TIER_EVENTS: [&str; 8] = [
    "SeedUpdated",
    "PricingUpdated",
    "ClubAdded",
    "ClubRemoved",
    "ClubSalePaused",
    "Paused",
    "Unpaused",
    "PacksBought",
];

/// 单个档位的订阅
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierSubscription {
    /// 合约地址（小写）
    pub address: String,
    pub events: Vec<&'static str>,
}

/// 监听注册表：启动时按配置一次性注册全部档位合约
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    subscriptions: Vec<TierSubscription>,
    registered: bool,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册档位合约，重复调用不会改变已有注册
    pub fn register(&mut self, addresses: &[String]) -> Result<&[TierSubscription]> {
        if self.registered {
            warn!("⚠️ 监听器已注册，忽略重复注册");
            return Ok(&self.subscriptions);
        }

        let mut seen = HashSet::new();
        let mut subscriptions = Vec::with_capacity(addresses.len());
        for raw in addresses {
            Address::from_str(raw.trim())
                .map_err(|e| LedgerError::Config(format!("销售合约地址无效 {}: {}", raw, e)))?;

            let address = tier_key(raw);
            if !seen.insert(address.clone()) {
                warn!("⚠️ 销售合约重复，已忽略: {}", address);
                continue;
            }
            subscriptions.push(TierSubscription {
                address,
                events: TIER_EVENTS.to_vec(),
            });
        }

        self.subscriptions = subscriptions;
        self.registered = true;
        info!("📡 已注册 {} 个销售合约的事件监听", self.subscriptions.len());
        Ok(&self.subscriptions)
    }

    pub fn subscriptions(&self) -> &[TierSubscription] {
        &self.subscriptions
    }

    pub fn tier_addresses(&self) -> Vec<String> {
        self.subscriptions.iter().map(|s| s.address.clone()).collect()
    }

    /// 档位事件只接受已注册合约发出的；其它事件一律接受
    pub fn accepts(&self, event: &LedgerEvent) -> bool {
        match event.tier_address() {
            Some(tier) => self.subscriptions.iter().any(|s| s.address == tier),
            None => true,
        }
    }
}
