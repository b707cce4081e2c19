//! 事件处理
//!
//! 所有事件都经由 `EventProcessor::process` 串行处理：一个事件的全部写入完成后才会处理下一个，
//! 快照序号分配和"先解除再关联"都依赖这一点。

pub mod pack_cache;
pub mod referral;
pub mod sale_tiers;
pub mod snapshot;

use crate::{
    contract::SaleContract,
    error::{LedgerError, Result},
    events::LedgerEvent,
};
use database::{Entity, LedgerStore};
use tracing::{debug, error};

pub use snapshot::append_snapshot;

/// 聚合引擎
pub struct EventProcessor<S, C> {
    store: S,
    contract: C,
    /// 低于该高度的事件不刷新卡包缓存
    pack_start_height: i64,
    processed: u64,
}

impl<S: LedgerStore, C: SaleContract> EventProcessor<S, C> {
    pub fn new(store: S, contract: C, pack_start_height: i64) -> Self {
        Self {
            store,
            contract,
            pack_start_height,
            processed: 0,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn contract(&self) -> &C {
        &self.contract
    }

    pub fn pack_start_height(&self) -> i64 {
        self.pack_start_height
    }

    /// 已成功处理的事件数
    pub fn processed_count(&self) -> u64 {
        self.processed
    }

    /// 处理单个事件
    ///
    /// 返回错误时该事件视为未处理，由上游整体重投
    pub async fn process(&mut self, event: LedgerEvent) -> Result<()> {
        event.validate()?;
        debug!("📥 处理事件 {} ({})", event.event_type(), event.unique_id());

        let outcome = match &event {
            LedgerEvent::ReferrerUpdated(e) => self.on_referrer_updated(e).await,
            LedgerEvent::ReferralBonusGiven(e) => self.on_referral_bonus_given(e).await,
            LedgerEvent::SharesMinted(e) => self.on_shares_minted(e).await,
            LedgerEvent::ClubAdded(e) => self.on_club_added(e).await,
            LedgerEvent::ClubRemoved(e) => self.on_club_removed(e).await,
            LedgerEvent::ClubSalePaused(e) => self.on_club_sale_paused(e).await,
            LedgerEvent::SalePaused(e) => self.on_sale_paused(e).await,
            LedgerEvent::SaleUnpaused(e) => self.on_sale_unpaused(e).await,
            LedgerEvent::PricingUpdated(e) => self.on_pricing_updated(e).await,
            LedgerEvent::SeedUpdated(e) => self.on_seed_updated(e).await,
            LedgerEvent::PacksBought(e) => self.on_packs_bought(e).await,
        };

        if let Err(e) = &outcome {
            error!(
                "❌ 事件 {} ({}) 处理失败{}: {}",
                event.event_type(),
                event.unique_id(),
                if e.is_transient() { "（可重试）" } else { "" },
                e
            );
        } else {
            self.processed += 1;
        }
        outcome
    }

    /// 按主键加载，不存在视为不变量被破坏
    pub(crate) async fn require<E: Entity>(&self, id: &str) -> Result<E> {
        self.store
            .load::<E>(id)
            .await?
            .ok_or_else(|| LedgerError::missing(format!("{} {}", E::COLLECTION, id)))
    }
}
