use crate::entity::Entity;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 俱乐部ID（i32）转换为 SaleClub 主键
pub fn club_entity_id(club_id: i32) -> String {
    club_id.to_string()
}

/// 俱乐部在销售档位中的状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClubMembership {
    /// 不属于任何档位
    Unassigned,
    /// 在档位中可购买
    Active(String),
    /// 仍属于档位，但已暂停销售
    Paused(String),
}

/// 参与销售的俱乐部
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleClub {
    #[serde(rename = "_id")]
    pub id: String,
    pub club_id: i32,
    /// 已铸造份额（镜像链上数据）
    pub minted: i32,
    /// 当前所在档位（被移除或暂停时为空）
    pub tier: Option<String>,
    /// 因暂停而被移出时所在的档位
    pub paused_in_tier: Option<String>,
}

impl SaleClub {
    pub const TIER_FIELD: &'static str = "tier";

    pub fn new(club_id: i32) -> Self {
        Self {
            id: club_entity_id(club_id),
            club_id,
            minted: 0,
            tier: None,
            paused_in_tier: None,
        }
    }

    pub fn membership(&self) -> ClubMembership {
        match (&self.tier, &self.paused_in_tier) {
            (Some(tier), _) => ClubMembership::Active(tier.clone()),
            (None, Some(tier)) => ClubMembership::Paused(tier.clone()),
            (None, None) => ClubMembership::Unassigned,
        }
    }

    /// 加入档位（同时清除暂停标记）
    pub fn activate(&mut self, tier: &str) {
        self.tier = Some(tier.to_string());
        self.paused_in_tier = None;
    }

    /// 从档位移除；如果原因是暂停，随后的暂停事件会重新设置 paused_in_tier
    pub fn remove(&mut self) {
        self.tier = None;
        self.paused_in_tier = None;
    }

    pub fn pause_in(&mut self, tier: &str) {
        self.tier = None;
        self.paused_in_tier = Some(tier.to_string());
    }
}

impl Entity for SaleClub {
    const COLLECTION: &'static str = "SaleClub";

    fn id(&self) -> &str {
        &self.id
    }
}

/// 销售档位（一个销售合约实例）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleTier {
    /// 主键，即合约地址
    #[serde(rename = "_id")]
    pub id: String,
    /// 展示名称（首次见到时从合约读取）
    pub name: String,
    pub active: bool,
}

impl Entity for SaleTier {
    const COLLECTION: &'static str = "SaleTier";

    fn id(&self) -> &str {
        &self.id
    }
}

/// 定价阶梯
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingStep {
    /// 主键：档位 + 序号
    #[serde(rename = "_id")]
    pub id: String,
    pub tier: String,
    pub index: i32,
    pub num_shares: i32,
    pub price: Decimal,
    /// 适用的累计份额区间（闭区间）
    pub from_total: i64,
    pub to_total: i64,
}

impl PricingStep {
    pub const TIER_FIELD: &'static str = "tier";

    pub fn key_for(tier: &str, index: i32) -> String {
        format!("{}:{:04}", tier, index)
    }
}

impl Entity for PricingStep {
    const COLLECTION: &'static str = "PricingStep";

    fn id(&self) -> &str {
        &self.id
    }
}

/// 主俱乐部的卡包预览缓存
///
/// 非权威数据，随时可以由档位成员、定价和链上状态重新计算
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pack {
    /// 主键，与主俱乐部的 SaleClub 主键相同
    #[serde(rename = "_id")]
    pub id: String,
    pub primary_club: String,
    pub max_packs: i32,
    /// 购买一个卡包的总价
    pub cost: Decimal,
}

impl Entity for Pack {
    const COLLECTION: &'static str = "Pack";

    fn id(&self) -> &str {
        &self.id
    }
}

/// 卡包内某个俱乐部的份额数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackShareContent {
    /// 主键：卡包 + 成分俱乐部
    #[serde(rename = "_id")]
    pub id: String,
    pub pack: String,
    pub club: String,
    pub num: i32,
}

impl PackShareContent {
    pub const PACK_FIELD: &'static str = "pack";
    pub const CLUB_FIELD: &'static str = "club";

    pub fn new(pack: &str, club_id: i32, num: i32) -> Self {
        let club = club_entity_id(club_id);
        Self {
            id: format!("{}:{}", pack, club),
            pack: pack.to_string(),
            club,
            num,
        }
    }
}

impl Entity for PackShareContent {
    const COLLECTION: &'static str = "PackShareContent";

    fn id(&self) -> &str {
        &self.id
    }
}

/// 卡包购买记录（只增不改）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PacksBought {
    /// 主键：交易哈希 + 日志序号
    #[serde(rename = "_id")]
    pub id: String,
    pub timestamp: i64,
    pub buyer: String,
    pub receiver: String,
    pub primary_club: String,
    pub tier: String,
    pub num_packs: i32,
    pub usd_spent: i64,
}

impl Entity for PacksBought {
    const COLLECTION: &'static str = "PacksBought";

    fn id(&self) -> &str {
        &self.id
    }
}
