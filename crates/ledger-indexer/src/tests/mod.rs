//! 引擎级测试：事件序列 -> 内存存储中的派生数据


use crate::{
    contract::mock::MockSaleContract,
    events::{
        ClubSalePausedEvent, ClubTierEvent, LedgerEvent, PricingStepInput, PricingUpdatedEvent, ReferralBonusGivenEvent,
        ReferrerUpdatedEvent, SeedUpdatedEvent, SharesMintedEvent, TierEvent,
    },
    EventProcessor,
};
use database::{referral::ReferrerTotal, MemoryStore};
use rust_decimal::Decimal;
use std::sync::Arc;

pub const TIER: &str = "0x8501a9018a5625b720355a5a05c5da3d5e8bb003";
pub const OTHER_TIER: &str = "0x0bf818f3a69485c8b05cf6292d9a04c6f58adf08";

/// 高于卡包刷新起始高度
pub const LIVE_HEIGHT: i64 = 100;
pub const START_HEIGHT: i64 = 50;

pub type TestProcessor = EventProcessor<MemoryStore, Arc<MockSaleContract>>;

pub fn processor_with(contract: Arc<MockSaleContract>) -> TestProcessor {
    EventProcessor::new(MemoryStore::new(), contract, START_HEIGHT)
}

pub fn processor() -> TestProcessor {
    processor_with(Arc::new(MockSaleContract::new()))
}

pub fn totals(t: &ReferrerTotal) -> (i64, i64, i64) {
    (t.referrals, t.bonus_shares, t.usd_spent)
}

pub fn referrer_updated(subject: &str, referrer: &str, timestamp: i64) -> LedgerEvent {
    LedgerEvent::ReferrerUpdated(ReferrerUpdatedEvent {
        subject_account: subject.to_string(),
        new_referrer: referrer.to_string(),
        timestamp,
    })
}

/// 推荐人由测试直接给出；日志序号使用时间戳，保证唯一
pub fn bonus_given(
    buyer: &str,
    referrer: &str,
    club_id: i32,
    shares: i64,
    packs: i32,
    usd: i64,
    timestamp: i64,
) -> LedgerEvent {
    LedgerEvent::ReferralBonusGiven(ReferralBonusGivenEvent {
        buyer: buyer.to_string(),
        referrer: referrer.to_string(),
        club_id,
        num_shares: shares,
        num_packs_bought: packs,
        cost: usd,
        tx_hash: "0xfeed".to_string(),
        log_index: timestamp as i32,
        timestamp,
    })
}

pub fn seed_updated(tier: &str, block_height: i64) -> LedgerEvent {
    LedgerEvent::SeedUpdated(SeedUpdatedEvent {
        tier_address: tier.to_string(),
        block_height,
    })
}

pub fn club_added(club_id: i32, tier: &str, block_height: i64) -> LedgerEvent {
    LedgerEvent::ClubAdded(ClubTierEvent {
        club_id,
        tier_address: tier.to_string(),
        block_height,
    })
}

pub fn club_removed(club_id: i32, tier: &str, block_height: i64) -> LedgerEvent {
    LedgerEvent::ClubRemoved(ClubTierEvent {
        club_id,
        tier_address: tier.to_string(),
        block_height,
    })
}

pub fn club_sale_paused(club_id: i32, tier: &str) -> LedgerEvent {
    LedgerEvent::ClubSalePaused(ClubSalePausedEvent {
        club_id,
        tier_address: tier.to_string(),
    })
}

pub fn sale_paused(tier: &str) -> LedgerEvent {
    LedgerEvent::SalePaused(TierEvent {
        tier_address: tier.to_string(),
    })
}

pub fn sale_unpaused(tier: &str) -> LedgerEvent {
    LedgerEvent::SaleUnpaused(TierEvent {
        tier_address: tier.to_string(),
    })
}

pub fn pricing_updated(tier: &str, steps: &[(i32, i64)], block_height: i64) -> LedgerEvent {
    LedgerEvent::PricingUpdated(PricingUpdatedEvent {
        tier_address: tier.to_string(),
        steps: steps
            .iter()
            .map(|&(num_shares, price)| PricingStepInput {
                num_shares,
                price: Decimal::from(price),
            })
            .collect(),
        block_height,
    })
}

pub fn shares_minted(club_id: i32, total_minted: i32) -> LedgerEvent {
    LedgerEvent::SharesMinted(SharesMintedEvent { club_id, total_minted })
}
