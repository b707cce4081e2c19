use crate::entity::{Entity, Snapshot, SnapshotOwner};
use serde::{Deserialize, Serialize};

/// 推荐人
///
/// 第一次被指定为推荐人时创建，之后永不删除（推荐数归零也保留记录）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Referrer {
    /// 主键，即推荐人账户
    #[serde(rename = "_id")]
    pub id: String,
    /// 推荐人账户
    pub account: String,
    /// 当前累计快照的主键
    pub current_total: String,
}

impl Referrer {
    pub fn new(account: &str, current_total: String) -> Self {
        Self {
            id: account.to_string(),
            account: account.to_string(),
            current_total,
        }
    }
}

impl Entity for Referrer {
    const COLLECTION: &'static str = "Referrer";

    fn id(&self) -> &str {
        &self.id
    }
}

impl SnapshotOwner for Referrer {
    fn current_snapshot(&self) -> &str {
        &self.current_total
    }

    fn repoint(&mut self, snapshot_id: String) {
        self.current_total = snapshot_id;
    }
}

/// 推荐人累计值快照（不可变）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferrerTotal {
    #[serde(rename = "_id")]
    pub id: String,
    /// 所属推荐人主键
    pub referrer: String,
    /// 链上序号
    pub index: i64,
    /// 产生该快照的事件时间戳
    pub timestamp: i64,
    /// 当前有效的推荐数
    pub referrals: i64,
    /// 累计奖励份额
    pub bonus_shares: i64,
    /// 被推荐人累计消费（USD）
    pub usd_spent: i64,
}

impl ReferrerTotal {
    pub const REFERRER_FIELD: &'static str = "referrer";

    /// 推荐人的第 0 个快照
    ///
    /// 推荐人只会在第一次被推荐时创建，因此初始推荐数直接写入，不会先写一个全零快照
    pub fn initial(referrer: &str, timestamp: i64, referrals: i64) -> Self {
        Self {
            id: Self::key_for(referrer, 0),
            referrer: referrer.to_string(),
            index: 0,
            timestamp,
            referrals,
            bonus_shares: 0,
            usd_spent: 0,
        }
    }
}

/// 推荐人累计值的增量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TotalsDelta {
    pub referrals: i64,
    pub bonus_shares: i64,
    pub usd_spent: i64,
}

impl TotalsDelta {
    pub fn referrals(delta: i64) -> Self {
        Self {
            referrals: delta,
            ..Default::default()
        }
    }

    pub fn bonus(bonus_shares: i64, usd_spent: i64) -> Self {
        Self {
            referrals: 0,
            bonus_shares,
            usd_spent,
        }
    }
}

impl Entity for ReferrerTotal {
    const COLLECTION: &'static str = "ReferrerTotal";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Snapshot for ReferrerTotal {
    type Delta = TotalsDelta;

    fn owner(&self) -> &str {
        &self.referrer
    }

    fn index(&self) -> i64 {
        self.index
    }

    fn successor(&self, timestamp: i64, delta: &TotalsDelta) -> Self {
        let index = self.index + 1;
        Self {
            id: Self::key_for(&self.referrer, index),
            referrer: self.referrer.clone(),
            index,
            timestamp,
            referrals: self.referrals + delta.referrals,
            bonus_shares: self.bonus_shares + delta.bonus_shares,
            usd_spent: self.usd_spent + delta.usd_spent,
        }
    }
}

/// 推荐关系：每个被推荐账户同时最多一条
///
/// 更换推荐人时先删除再重建，不做原地修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Referral {
    /// 主键，即被推荐账户
    #[serde(rename = "_id")]
    pub id: String,
    pub account: String,
    /// 推荐人主键
    pub referrer: String,
    /// 建立（或重新建立）关系的时间戳
    pub timestamp: i64,
}

impl Referral {
    pub const REFERRER_FIELD: &'static str = "referrer";

    pub fn new(account: &str, referrer: &str, timestamp: i64) -> Self {
        Self {
            id: account.to_string(),
            account: account.to_string(),
            referrer: referrer.to_string(),
            timestamp,
        }
    }
}

impl Entity for Referral {
    const COLLECTION: &'static str = "Referral";

    fn id(&self) -> &str {
        &self.id
    }
}

/// 推荐奖励发放记录（只增不改）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferrerBonus {
    /// 主键：交易哈希 + 日志序号
    #[serde(rename = "_id")]
    pub id: String,
    pub referrer: String,
    /// 触发奖励的被推荐账户
    pub referral: String,
    pub timestamp: i64,
    pub club_id: i32,
    pub packs_bought: i32,
    pub usd_spent: i64,
    pub bonus_shares: i64,
}

impl ReferrerBonus {
    pub const REFERRER_FIELD: &'static str = "referrer";
}

impl Entity for ReferrerBonus {
    const COLLECTION: &'static str = "ReferrerBonus";

    fn id(&self) -> &str {
        &self.id
    }
}
