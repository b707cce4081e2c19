use super::EventProcessor;
use crate::{
    contract::SaleContract,
    error::Result,
    events::{
        tier_key, tx_position_key, ClubSalePausedEvent, ClubTierEvent, PacksBoughtEvent, PricingUpdatedEvent,
        SeedUpdatedEvent, SharesMintedEvent, TierEvent,
    },
};
use database::{
    sale::{club_entity_id, Pack, PackShareContent, PacksBought, PricingStep, SaleClub, SaleTier},
    LedgerStore,
};
use std::collections::BTreeSet;
use tracing::{debug, info};

impl<S: LedgerStore, C: SaleContract> EventProcessor<S, C> {
    /// 份额铸造：同步铸造数，并刷新所有包含该俱乐部的卡包
    pub(crate) async fn on_shares_minted(&self, event: &SharesMintedEvent) -> Result<()> {
        let id = club_entity_id(event.club_id);
        let mut club = self
            .store
            .load::<SaleClub>(&id)
            .await?
            .unwrap_or_else(|| SaleClub::new(event.club_id));
        club.minted = event.total_minted;
        self.store.save(&club).await?;

        let contents: Vec<PackShareContent> = self.store.find_by(PackShareContent::CLUB_FIELD, &id).await?;
        let packs: BTreeSet<String> = contents.into_iter().map(|c| c.pack).collect();

        for pack_id in packs {
            let pack = self.require::<Pack>(&pack_id).await?;
            let primary = self.require::<SaleClub>(&pack.primary_club).await?;
            self.refresh_clubs_pack(primary.club_id).await?;
        }

        debug!("🪙 俱乐部 {} 已铸造 {}", event.club_id, event.total_minted);
        Ok(())
    }

    /// 俱乐部加入档位
    pub(crate) async fn on_club_added(&self, event: &ClubTierEvent) -> Result<()> {
        let tier = tier_key(&event.tier_address);
        let mut club = self
            .store
            .load::<SaleClub>(&club_entity_id(event.club_id))
            .await?
            .unwrap_or_else(|| SaleClub::new(event.club_id));
        club.activate(&tier);
        self.store.save(&club).await?;

        info!("➕ 俱乐部 {} 加入档位 {}", event.club_id, tier);
        self.refresh_tier_packs_at(&tier, event.block_height).await
    }

    /// 俱乐部移出档位
    ///
    /// 因暂停而移出时，紧随其后的 ClubSalePaused 事件会设置 paused_in_tier
    pub(crate) async fn on_club_removed(&self, event: &ClubTierEvent) -> Result<()> {
        let tier = tier_key(&event.tier_address);
        let mut club = self.require::<SaleClub>(&club_entity_id(event.club_id)).await?;

        self.remove_clubs_pack(event.club_id).await?;
        club.remove();
        self.store.save(&club).await?;

        info!("➖ 俱乐部 {} 移出档位 {}", event.club_id, tier);
        self.refresh_tier_packs_at(&tier, event.block_height).await
    }

    /// 单个俱乐部暂停销售
    pub(crate) async fn on_club_sale_paused(&self, event: &ClubSalePausedEvent) -> Result<()> {
        let tier = tier_key(&event.tier_address);
        let mut club = self.require::<SaleClub>(&club_entity_id(event.club_id)).await?;
        club.pause_in(&tier);
        self.store.save(&club).await?;

        info!("⏸️ 俱乐部 {} 在档位 {} 暂停销售", event.club_id, tier);
        Ok(())
    }

    pub(crate) async fn on_sale_paused(&self, event: &TierEvent) -> Result<()> {
        self.set_tier_active(&tier_key(&event.tier_address), false).await
    }

    pub(crate) async fn on_sale_unpaused(&self, event: &TierEvent) -> Result<()> {
        self.set_tier_active(&tier_key(&event.tier_address), true).await
    }

    /// 档位尚未初始化时忽略
    async fn set_tier_active(&self, tier: &str, active: bool) -> Result<()> {
        let Some(mut sale_tier) = self.store.load::<SaleTier>(tier).await? else {
            debug!("⚠️ 档位 {} 尚未初始化，忽略暂停状态变更", tier);
            return Ok(());
        };
        sale_tier.active = active;
        self.store.save(&sale_tier).await?;

        info!("{} 档位 {} ({})", if active { "▶️ 恢复" } else { "⏸️ 暂停" }, sale_tier.name, tier);
        Ok(())
    }

    /// 定价表整体替换
    pub(crate) async fn on_pricing_updated(&self, event: &PricingUpdatedEvent) -> Result<()> {
        let tier = tier_key(&event.tier_address);
        self.require::<SaleTier>(&tier).await?;

        let steps = build_pricing_steps(&tier, event);

        let old: Vec<PricingStep> = self.store.find_by(PricingStep::TIER_FIELD, &tier).await?;
        for step in &old {
            self.store.delete::<PricingStep>(&step.id).await?;
        }
        for step in &steps {
            self.store.save(step).await?;
        }

        info!("💲 档位 {} 定价更新: {} 档（替换 {} 档）", tier, steps.len(), old.len());
        self.refresh_tier_packs_at(&tier, event.block_height).await
    }

    /// 随机种子更新，同时是档位的首个事件
    pub(crate) async fn on_seed_updated(&self, event: &SeedUpdatedEvent) -> Result<()> {
        let tier = tier_key(&event.tier_address);
        self.ensure_tier(&tier).await?;
        self.refresh_tier_packs_at(&tier, event.block_height).await
    }

    /// 档位只有在合约部署后才能读取名称，因此在首次见到时才创建
    pub async fn ensure_tier(&self, tier: &str) -> Result<SaleTier> {
        if let Some(existing) = self.store.load::<SaleTier>(tier).await? {
            return Ok(existing);
        }

        let name = self.contract.tier_name(tier).await?;
        let paused = self.contract.is_paused(tier).await?;
        let sale_tier = SaleTier {
            id: tier.to_string(),
            name,
            active: !paused,
        };
        self.store.save(&sale_tier).await?;

        info!("🆕 档位初始化: {} ({}), active={}", sale_tier.name, tier, sale_tier.active);
        Ok(sale_tier)
    }

    pub(crate) async fn on_packs_bought(&self, event: &PacksBoughtEvent) -> Result<()> {
        let record = PacksBought {
            id: tx_position_key(&event.tx_hash, event.log_index),
            timestamp: event.timestamp,
            buyer: event.buyer.clone(),
            receiver: event.receiver.clone(),
            primary_club: club_entity_id(event.primary_club_id),
            tier: tier_key(&event.tier_address),
            num_packs: event.num_packs,
            usd_spent: event.cost,
        };
        self.store.save(&record).await?;

        info!(
            "🛒 {} 购买 {} 个俱乐部 {} 的卡包 (${})",
            event.buyer, event.num_packs, event.primary_club_id, event.cost
        );
        Ok(())
    }
}

/// 按前缀和计算每档的累计份额闭区间
fn build_pricing_steps(tier: &str, event: &PricingUpdatedEvent) -> Vec<PricingStep> {
    let mut total: i64 = 0;
    event
        .steps
        .iter()
        .enumerate()
        .map(|(i, input)| {
            let index = i as i32;
            let from_total = total;
            total += i64::from(input.num_shares);
            PricingStep {
                id: PricingStep::key_for(tier, index),
                tier: tier.to_string(),
                index,
                num_shares: input.num_shares,
                price: input.price,
                from_total,
                to_total: total - 1,
            }
        })
        .collect()
}
