use super::EventProcessor;
use crate::{contract::SaleContract, error::Result};
use database::{
    sale::{club_entity_id, Pack, PackShareContent, SaleClub, SaleTier},
    LedgerStore,
};
use tracing::{debug, info, warn};

impl<S: LedgerStore, C: SaleContract> EventProcessor<S, C> {
    /// 删除主俱乐部的卡包及其内容，返回是否存在过
    pub(crate) async fn remove_clubs_pack(&self, club_id: i32) -> Result<bool> {
        let pack_id = club_entity_id(club_id);
        let contents: Vec<PackShareContent> = self.store.find_by(PackShareContent::PACK_FIELD, &pack_id).await?;
        for content in &contents {
            self.store.delete::<PackShareContent>(&content.id).await?;
        }
        Ok(self.store.delete::<Pack>(&pack_id).await?)
    }

    /// 重新计算主俱乐部的卡包
    ///
    /// 合约读取全部成功后才替换旧缓存；俱乐部不在任何档位或已无可购买数量时缓存保持缺失。
    pub async fn refresh_clubs_pack(&self, club_id: i32) -> Result<()> {
        let pack_id = club_entity_id(club_id);
        let Some(club) = self.store.load::<SaleClub>(&pack_id).await? else {
            self.remove_clubs_pack(club_id).await?;
            return Ok(());
        };

        let rebuilt = match &club.tier {
            None => None,
            Some(tier) => {
                let max_packs = self.contract.max_packs(tier, club_id).await?;
                if max_packs <= 0 {
                    None
                } else {
                    let preview = self.contract.preview(tier, club_id, 1).await?;
                    Some((max_packs, preview))
                }
            }
        };

        self.remove_clubs_pack(club_id).await?;

        let Some((max_packs, preview)) = rebuilt else {
            debug!("📦 俱乐部 {} 当前不可购买", club_id);
            return Ok(());
        };

        let pack = Pack {
            id: pack_id.clone(),
            primary_club: pack_id.clone(),
            max_packs,
            cost: preview.cost,
        };
        self.store.save(&pack).await?;
        for share in &preview.shares {
            self.store
                .save(&PackShareContent::new(&pack_id, share.club_id, share.num_shares))
                .await?;
        }

        debug!(
            "📦 俱乐部 {} 卡包已刷新: max={}, cost={}, {} 个成分",
            club_id,
            max_packs,
            pack.cost,
            preview.shares.len()
        );
        Ok(())
    }

    /// 刷新档位内全部俱乐部的卡包
    ///
    /// 档位必须已初始化
    pub async fn refresh_tier_packs(&self, tier: &str) -> Result<usize> {
        let sale_tier = self.require::<SaleTier>(tier).await?;
        let clubs: Vec<SaleClub> = self.store.find_by(SaleClub::TIER_FIELD, tier).await?;

        // 回放期间 info 日志量很大，用 warn 保证这两行可见
        warn!("🔄 开始刷新档位 {} 的全部卡包 ({} 个俱乐部)", sale_tier.name, clubs.len());
        for club in &clubs {
            self.refresh_clubs_pack(club.club_id).await?;
        }
        warn!("✅ 档位 {} 卡包刷新完成", sale_tier.name);

        Ok(clubs.len())
    }

    /// 达到起始高度后才刷新
    pub(crate) async fn refresh_tier_packs_at(&self, tier: &str, block_height: i64) -> Result<()> {
        if block_height < self.pack_start_height {
            debug!("⏭️ 高度 {} 低于卡包刷新起始高度 {}，跳过", block_height, self.pack_start_height);
            return Ok(());
        }
        self.refresh_tier_packs(tier).await.map(|_| ())
    }

    /// 回填完成后的全量刷新，跳过尚未初始化的档位
    pub async fn refresh_all_tiers(&self, tiers: &[String]) -> Result<usize> {
        let mut refreshed = 0;
        for tier in tiers {
            if self.store.load::<SaleTier>(tier).await?.is_none() {
                debug!("⏭️ 档位 {} 尚未初始化，跳过全量刷新", tier);
                continue;
            }
            self.refresh_tier_packs(tier).await?;
            refreshed += 1;
        }

        info!("✅ 全量卡包刷新完成: {}/{} 个档位", refreshed, tiers.len());
        Ok(refreshed)
    }
}
