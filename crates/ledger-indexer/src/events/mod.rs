//! 已解码的链上事件
//!
//! 上游平台按链上顺序（区块高度，再按区块内位置）逐个投递这些事件；
//! 事件以 `event` 字段做标签，可直接从 JSON 行重放。

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// 合约地址统一为小写，作为 SaleTier 等实体的主键
pub fn tier_key(address: &str) -> String {
    address.trim().to_lowercase()
}

/// 交易哈希 + 日志序号，对同一交易中的多条事件也唯一
pub fn tx_position_key(tx_hash: &str, log_index: i32) -> String {
    format!("{}-{}", tx_hash.trim().to_lowercase(), log_index)
}

/// 推荐人变更（推荐人为空字符串表示解除推荐关系）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ReferrerUpdatedEvent {
    #[validate(length(min = 1))]
    pub subject_account: String,
    pub new_referrer: String,
    pub timestamp: i64,
}

/// 推荐奖励发放
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ReferralBonusGivenEvent {
    #[validate(length(min = 1))]
    pub buyer: String,
    #[validate(length(min = 1))]
    pub referrer: String,
    pub club_id: i32,
    #[validate(range(min = 0))]
    pub num_shares: i64,
    #[validate(range(min = 0))]
    pub num_packs_bought: i32,
    #[validate(range(min = 0))]
    pub cost: i64,
    #[validate(length(min = 1))]
    pub tx_hash: String,
    pub log_index: i32,
    pub timestamp: i64,
}

/// 份额铸造（携带铸造后的总量）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SharesMintedEvent {
    pub club_id: i32,
    #[validate(range(min = 0))]
    pub total_minted: i32,
}

/// 俱乐部加入 / 移出档位
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ClubTierEvent {
    pub club_id: i32,
    #[validate(length(min = 1))]
    pub tier_address: String,
    pub block_height: i64,
}

/// 单个俱乐部暂停销售
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ClubSalePausedEvent {
    pub club_id: i32,
    #[validate(length(min = 1))]
    pub tier_address: String,
}

/// 整个档位的暂停 / 恢复
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TierEvent {
    #[validate(length(min = 1))]
    pub tier_address: String,
}

/// 定价阶梯中的一档
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingStepInput {
    pub num_shares: i32,
    pub price: Decimal,
}

fn validate_steps(steps: &[PricingStepInput]) -> std::result::Result<(), ValidationError> {
    if steps.iter().any(|s| s.num_shares < 0 || s.price.is_sign_negative()) {
        return Err(ValidationError::new("negative_pricing_step"));
    }
    Ok(())
}

/// 定价表更新（合约每次都广播完整的定价表）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PricingUpdatedEvent {
    #[validate(length(min = 1))]
    pub tier_address: String,
    #[validate(custom = "validate_steps")]
    pub steps: Vec<PricingStepInput>,
    pub block_height: i64,
}

/// 随机种子更新；合约部署后第一条事件就是它
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SeedUpdatedEvent {
    #[validate(length(min = 1))]
    pub tier_address: String,
    pub block_height: i64,
}

/// 卡包购买
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PacksBoughtEvent {
    #[validate(length(min = 1))]
    pub tx_hash: String,
    pub log_index: i32,
    pub buyer: String,
    pub receiver: String,
    pub primary_club_id: i32,
    #[validate(length(min = 1))]
    pub tier_address: String,
    #[validate(range(min = 0))]
    pub num_packs: i32,
    #[validate(range(min = 0))]
    pub cost: i64,
    pub timestamp: i64,
}

/// 投递给聚合引擎的事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    ReferrerUpdated(ReferrerUpdatedEvent),
    ReferralBonusGiven(ReferralBonusGivenEvent),
    SharesMinted(SharesMintedEvent),
    ClubAdded(ClubTierEvent),
    ClubRemoved(ClubTierEvent),
    ClubSalePaused(ClubSalePausedEvent),
    SalePaused(TierEvent),
    SaleUnpaused(TierEvent),
    PricingUpdated(PricingUpdatedEvent),
    SeedUpdated(SeedUpdatedEvent),
    PacksBought(PacksBoughtEvent),
}

impl LedgerEvent {
    /// 获取事件类型字符串
    pub fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::ReferrerUpdated(_) => "referrer_updated",
            LedgerEvent::ReferralBonusGiven(_) => "referral_bonus_given",
            LedgerEvent::SharesMinted(_) => "shares_minted",
            LedgerEvent::ClubAdded(_) => "club_added",
            LedgerEvent::ClubRemoved(_) => "club_removed",
            LedgerEvent::ClubSalePaused(_) => "club_sale_paused",
            LedgerEvent::SalePaused(_) => "sale_paused",
            LedgerEvent::SaleUnpaused(_) => "sale_unpaused",
            LedgerEvent::PricingUpdated(_) => "pricing_updated",
            LedgerEvent::SeedUpdated(_) => "seed_updated",
            LedgerEvent::PacksBought(_) => "packs_bought",
        }
    }

    /// 事件的可读标识（用于日志）
    pub fn unique_id(&self) -> String {
        match self {
            LedgerEvent::ReferrerUpdated(e) => format!("{}@{}", e.subject_account, e.timestamp),
            LedgerEvent::ReferralBonusGiven(e) => tx_position_key(&e.tx_hash, e.log_index),
            LedgerEvent::SharesMinted(e) => format!("club-{}:{}", e.club_id, e.total_minted),
            LedgerEvent::ClubAdded(e) | LedgerEvent::ClubRemoved(e) => {
                format!("{}:club-{}@{}", tier_key(&e.tier_address), e.club_id, e.block_height)
            }
            LedgerEvent::ClubSalePaused(e) => format!("{}:club-{}", tier_key(&e.tier_address), e.club_id),
            LedgerEvent::SalePaused(e) | LedgerEvent::SaleUnpaused(e) => tier_key(&e.tier_address),
            LedgerEvent::PricingUpdated(e) => format!("{}@{}", tier_key(&e.tier_address), e.block_height),
            LedgerEvent::SeedUpdated(e) => format!("{}@{}", tier_key(&e.tier_address), e.block_height),
            LedgerEvent::PacksBought(e) => tx_position_key(&e.tx_hash, e.log_index),
        }
    }

    /// 发出事件的销售合约（档位）地址，非档位事件返回 None
    pub fn tier_address(&self) -> Option<String> {
        match self {
            LedgerEvent::ClubAdded(e) | LedgerEvent::ClubRemoved(e) => Some(tier_key(&e.tier_address)),
            LedgerEvent::ClubSalePaused(e) => Some(tier_key(&e.tier_address)),
            LedgerEvent::SalePaused(e) | LedgerEvent::SaleUnpaused(e) => Some(tier_key(&e.tier_address)),
            LedgerEvent::PricingUpdated(e) => Some(tier_key(&e.tier_address)),
            LedgerEvent::SeedUpdated(e) => Some(tier_key(&e.tier_address)),
            LedgerEvent::PacksBought(e) => Some(tier_key(&e.tier_address)),
            LedgerEvent::ReferrerUpdated(_) | LedgerEvent::ReferralBonusGiven(_) | LedgerEvent::SharesMinted(_) => None,
        }
    }

    /// 校验事件字段
    pub fn validate(&self) -> std::result::Result<(), validator::ValidationErrors> {
        match self {
            LedgerEvent::ReferrerUpdated(e) => e.validate(),
            LedgerEvent::ReferralBonusGiven(e) => e.validate(),
            LedgerEvent::SharesMinted(e) => e.validate(),
            LedgerEvent::ClubAdded(e) | LedgerEvent::ClubRemoved(e) => e.validate(),
            LedgerEvent::ClubSalePaused(e) => e.validate(),
            LedgerEvent::SalePaused(e) | LedgerEvent::SaleUnpaused(e) => e.validate(),
            LedgerEvent::PricingUpdated(e) => e.validate(),
            LedgerEvent::SeedUpdated(e) => e.validate(),
            LedgerEvent::PacksBought(e) => e.validate(),
        }
    }
}
