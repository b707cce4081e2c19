use super::{append_snapshot, EventProcessor};
use crate::{
    contract::SaleContract,
    error::{LedgerError, Result},
    events::{tx_position_key, ReferralBonusGivenEvent, ReferrerUpdatedEvent},
};
use database::{
    referral::{Referral, Referrer, ReferrerBonus, ReferrerTotal, TotalsDelta},
    LedgerStore,
};
use tracing::{debug, info};

impl<S: LedgerStore, C: SaleContract> EventProcessor<S, C> {
    /// 推荐人变更：先解除旧关系，再建立新关系
    pub(crate) async fn on_referrer_updated(&self, event: &ReferrerUpdatedEvent) -> Result<()> {
        let subject = event.subject_account.as_str();

        if let Some(existing) = self.store.load::<Referral>(subject).await? {
            append_snapshot::<_, Referrer, ReferrerTotal>(
                &self.store,
                &existing.referrer,
                event.timestamp,
                &TotalsDelta::referrals(-1),
            )
            .await?;
            self.store.delete::<Referral>(subject).await?;
            debug!("🔗 {} 与推荐人 {} 解除关联", subject, existing.referrer);
        }

        if event.new_referrer.is_empty() {
            info!("🔗 {} 已清除推荐人", subject);
            return Ok(());
        }

        let referrer = event.new_referrer.as_str();
        if self.store.load::<Referrer>(referrer).await?.is_some() {
            append_snapshot::<_, Referrer, ReferrerTotal>(
                &self.store,
                referrer,
                event.timestamp,
                &TotalsDelta::referrals(1),
            )
            .await?;
        } else {
            // 第一次推荐直接写入 referrals=1 的初始快照
            let initial = ReferrerTotal::initial(referrer, event.timestamp, 1);
            self.store.save(&initial).await?;
            self.store.save(&Referrer::new(referrer, initial.id.clone())).await?;
            info!("🆕 新推荐人: {}", referrer);
        }

        self.store
            .save(&Referral::new(subject, referrer, event.timestamp))
            .await?;
        info!("🔗 {} 的推荐人设置为 {}", subject, referrer);
        Ok(())
    }

    /// 推荐奖励：记录奖励并累加到推荐人总计
    pub(crate) async fn on_referral_bonus_given(&self, event: &ReferralBonusGivenEvent) -> Result<()> {
        // 奖励不可能早于推荐关系
        self.require::<Referrer>(&event.referrer).await?;

        let id = tx_position_key(&event.tx_hash, event.log_index);
        if self.store.load::<ReferrerBonus>(&id).await?.is_some() {
            return Err(LedgerError::InvariantViolation(format!("推荐奖励 {} 重复投递", id)));
        }

        append_snapshot::<_, Referrer, ReferrerTotal>(
            &self.store,
            &event.referrer,
            event.timestamp,
            &TotalsDelta::bonus(event.num_shares, event.cost),
        )
        .await?;

        // 奖励记录最后写入，作为该事件已完整处理的标记
        let bonus = ReferrerBonus {
            id,
            referrer: event.referrer.clone(),
            referral: event.buyer.clone(),
            timestamp: event.timestamp,
            club_id: event.club_id,
            packs_bought: event.num_packs_bought,
            usd_spent: event.cost,
            bonus_shares: event.num_shares,
        };
        self.store.save(&bonus).await?;

        info!(
            "🎁 推荐人 {} 获得 {} 份奖励（{} 购买 {} 个卡包, ${}）",
            event.referrer, event.num_shares, event.buyer, event.num_packs_bought, event.cost
        );
        Ok(())
    }

    /// 推荐人当前的累计值
    pub async fn current_totals(&self, referrer: &str) -> Result<Option<ReferrerTotal>> {
        let Some(owner) = self.store.load::<Referrer>(referrer).await? else {
            return Ok(None);
        };
        self.require::<ReferrerTotal>(&owner.current_total).await.map(Some)
    }

    /// 某一时刻的累计值：时间戳不晚于 `timestamp` 的最后一个快照
    pub async fn totals_at(&self, referrer: &str, timestamp: i64) -> Result<Option<ReferrerTotal>> {
        let snapshots = self.snapshots_of(referrer).await?;
        Ok(snapshots
            .into_iter()
            .filter(|s| s.timestamp <= timestamp)
            .max_by_key(|s| (s.timestamp, s.index)))
    }

    /// 推荐人的完整快照链，按序号升序
    pub async fn snapshots_of(&self, referrer: &str) -> Result<Vec<ReferrerTotal>> {
        let mut snapshots: Vec<ReferrerTotal> = self
            .store
            .find_by(ReferrerTotal::REFERRER_FIELD, referrer)
            .await?;
        snapshots.sort_by_key(|s| s.index);
        Ok(snapshots)
    }

    /// 当前指向该推荐人的推荐关系
    pub async fn referrals_of(&self, referrer: &str) -> Result<Vec<Referral>> {
        Ok(self.store.find_by(Referral::REFERRER_FIELD, referrer).await?)
    }

    /// 推荐人获得过的全部奖励
    pub async fn bonuses_of(&self, referrer: &str) -> Result<Vec<ReferrerBonus>> {
        Ok(self.store.find_by(ReferrerBonus::REFERRER_FIELD, referrer).await?)
    }
}
