pub mod checker;
pub mod config;
pub mod contract;
pub mod error;
pub mod events;
pub mod handlers;
pub mod subscriber;

#[cfg(test)]
pub mod tests;

pub use error::{LedgerError, Result};
pub use handlers::EventProcessor;

use crate::{
    checker::{ShopCheckReport, ShopChecker},
    config::LedgerIndexerConfig,
    contract::SaleContract,
    subscriber::{EventSource, ListenerRegistry},
};
use database::LedgerStore;
use std::sync::Arc;
use tracing::{info, warn};

/// 一次运行的统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// 成功处理的事件数
    pub processed: u64,
    /// 来自未注册合约而被忽略的事件数
    pub skipped: u64,
    /// 最终全量刷新覆盖的档位数
    pub refreshed_tiers: usize,
}

/// Ledger-Indexer 主服务
///
/// 负责协调:
/// - 销售合约的监听注册
/// - 事件按顺序交给聚合引擎
/// - 回填结束后的全量卡包刷新
/// - 卡包缓存核对
pub struct LedgerIndexerService<S, C> {
    config: Arc<LedgerIndexerConfig>,
    registry: ListenerRegistry,
    processor: EventProcessor<S, C>,
}

impl<S: LedgerStore, C: SaleContract> LedgerIndexerService<S, C> {
    pub fn new(config: LedgerIndexerConfig, store: S, contract: C) -> Result<Self> {
        let config = Arc::new(config);

        info!("🚀 初始化Ledger-Indexer服务...");

        let mut registry = ListenerRegistry::new();
        registry.register(&config.chain.sale_contracts)?;

        let processor = EventProcessor::new(store, contract, config.chain.pack_start_height);

        info!("✅ Ledger-Indexer服务初始化完成");
        Ok(Self {
            config,
            registry,
            processor,
        })
    }

    pub fn config(&self) -> &LedgerIndexerConfig {
        &self.config
    }

    pub fn registry(&self) -> &ListenerRegistry {
        &self.registry
    }

    pub fn processor(&self) -> &EventProcessor<S, C> {
        &self.processor
    }

    /// 处理事件源中的全部事件，之后按配置做一次全量卡包刷新
    ///
    /// 任一事件失败即停止，已处理的事件不会回滚
    pub async fn run<E: EventSource>(&mut self, source: &mut E) -> Result<RunSummary> {
        info!("🎯 开始处理事件...");
        let mut summary = RunSummary::default();

        while let Some(event) = source.next_event().await? {
            if !self.registry.accepts(&event) {
                warn!("⚠️ 忽略未注册合约的事件 {} ({})", event.event_type(), event.unique_id());
                summary.skipped += 1;
                continue;
            }
            self.processor.process(event).await?;
            summary.processed += 1;

            if summary.processed % 1000 == 0 {
                info!("📊 已处理 {} 个事件", summary.processed);
            }
        }

        if self.config.indexer.final_refresh {
            summary.refreshed_tiers = self.processor.refresh_all_tiers(&self.registry.tier_addresses()).await?;
        } else {
            info!("⏭️ 已禁用最终全量刷新");
        }

        info!(
            "✅ 事件处理完成: 处理 {} 个, 忽略 {} 个, 刷新 {} 个档位",
            summary.processed, summary.skipped, summary.refreshed_tiers
        );
        Ok(summary)
    }

    /// 核对全部已注册档位的卡包缓存
    pub async fn check_shop(&self) -> Result<ShopCheckReport> {
        ShopChecker::new(
            self.processor.store(),
            self.processor.contract(),
            self.config.indexer.check_batch_size,
        )
        .check(&self.registry.tier_addresses())
        .await
    }
}
