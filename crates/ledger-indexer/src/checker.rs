//! 卡包缓存核对
//!
//! 把缓存的卡包与合约实时返回的数据逐个比较，用于确认回放结果与链上一致。

use crate::{
    contract::{SaleContract, ShareAmount},
    error::{LedgerError, Result},
};
use chrono::{DateTime, Utc};
use database::{
    sale::{club_entity_id, Pack, PackShareContent, SaleClub, SaleTier},
    LedgerStore,
};
use futures::{stream, StreamExt, TryStreamExt};
use rust_decimal::Decimal;
use std::fmt;
use tracing::{info, warn};

/// 单个俱乐部的不一致
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShopMismatch {
    /// 合约可购买，但缓存中没有卡包
    MissingPack { live_max_packs: i32 },
    /// 合约不可购买，但缓存中仍有卡包
    StalePack,
    MaxPacks { cached: i32, live: i32 },
    Cost { cached: Decimal, live: Decimal },
    Shares { cached: Vec<ShareAmount>, live: Vec<ShareAmount> },
}

impl fmt::Display for ShopMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShopMismatch::MissingPack { live_max_packs } => write!(f, "缺少卡包（合约可购买 {}）", live_max_packs),
            ShopMismatch::StalePack => write!(f, "卡包已不可购买"),
            ShopMismatch::MaxPacks { cached, live } => write!(f, "maxPacks {} != {}", cached, live),
            ShopMismatch::Cost { cached, live } => write!(f, "cost {} != {}", cached, live),
            ShopMismatch::Shares { cached, live } => write!(f, "shares {:?} != {:?}", cached, live),
        }
    }
}

/// 单个主俱乐部的核对结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClubCheck {
    pub tier: String,
    pub club_id: i32,
    pub mismatches: Vec<ShopMismatch>,
}

/// 核对报告
#[derive(Debug, Clone)]
pub struct ShopCheckReport {
    pub checked_at: DateTime<Utc>,
    pub tiers_checked: usize,
    pub clubs_checked: usize,
    pub problems: Vec<ClubCheck>,
}

impl ShopCheckReport {
    pub fn is_consistent(&self) -> bool {
        self.problems.is_empty()
    }
}

pub struct ShopChecker<'a, S, C> {
    store: &'a S,
    contract: &'a C,
    batch_size: usize,
}

impl<'a, S: LedgerStore, C: SaleContract> ShopChecker<'a, S, C> {
    pub fn new(store: &'a S, contract: &'a C, batch_size: usize) -> Self {
        Self {
            store,
            contract,
            batch_size: batch_size.max(1),
        }
    }

    /// 核对给定档位中所有俱乐部；未初始化的档位跳过
    pub async fn check(&self, tiers: &[String]) -> Result<ShopCheckReport> {
        let mut tiers_checked = 0;
        let mut clubs_checked = 0;
        let mut problems = Vec::new();

        for tier in tiers {
            let Some(sale_tier) = self.store.load::<SaleTier>(tier).await? else {
                continue;
            };
            tiers_checked += 1;

            let clubs: Vec<SaleClub> = self.store.find_by(SaleClub::TIER_FIELD, tier).await?;
            clubs_checked += clubs.len();
            info!("🔍 核对档位 {}: {} 个俱乐部", sale_tier.name, clubs.len());

            // 合约读取按批并发
            let results: Vec<ClubCheck> = stream::iter(clubs.iter().map(|club| self.check_club(tier, club.club_id)))
                .buffered(self.batch_size)
                .try_collect()
                .await?;
            problems.extend(results.into_iter().filter(|c| !c.mismatches.is_empty()));
        }

        // 不在任何档位却仍有缓存的卡包
        let packs: Vec<Pack> = self.store.find_all().await?;
        for pack in packs {
            let club = self.store.load::<SaleClub>(&pack.primary_club).await?;
            if let Some(club) = club.filter(|c| c.tier.is_none()) {
                problems.push(ClubCheck {
                    tier: club.paused_in_tier.clone().unwrap_or_default(),
                    club_id: club.club_id,
                    mismatches: vec![ShopMismatch::StalePack],
                });
            }
        }

        for problem in &problems {
            for mismatch in &problem.mismatches {
                warn!("❌ 档位 {} 俱乐部 {}: {}", problem.tier, problem.club_id, mismatch);
            }
        }
        info!(
            "✅ 核对完成: {} 个档位, {} 个俱乐部, {} 个不一致",
            tiers_checked,
            clubs_checked,
            problems.len()
        );

        Ok(ShopCheckReport {
            checked_at: Utc::now(),
            tiers_checked,
            clubs_checked,
            problems,
        })
    }

    async fn check_club(&self, tier: &str, club_id: i32) -> Result<ClubCheck> {
        let pack_id = club_entity_id(club_id);
        let cached = self.store.load::<Pack>(&pack_id).await?;
        let live_max = self.contract.max_packs(tier, club_id).await?;

        let mut mismatches = Vec::new();
        match cached {
            None if live_max > 0 => mismatches.push(ShopMismatch::MissingPack {
                live_max_packs: live_max,
            }),
            None => {}
            Some(_) if live_max <= 0 => mismatches.push(ShopMismatch::StalePack),
            Some(pack) => {
                if pack.max_packs != live_max {
                    mismatches.push(ShopMismatch::MaxPacks {
                        cached: pack.max_packs,
                        live: live_max,
                    });
                }

                let preview = self.contract.preview(tier, club_id, 1).await?;
                if pack.cost != preview.cost {
                    mismatches.push(ShopMismatch::Cost {
                        cached: pack.cost,
                        live: preview.cost,
                    });
                }

                let contents: Vec<PackShareContent> =
                    self.store.find_by(PackShareContent::PACK_FIELD, &pack_id).await?;
                let mut cached_shares = contents
                    .iter()
                    .map(|c| {
                        Ok(ShareAmount {
                            club_id: c.club.parse().map_err(|_| {
                                LedgerError::InvariantViolation(format!("俱乐部主键无效: {}", c.club))
                            })?,
                            num_shares: c.num,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                let mut live_shares = preview.shares.clone();
                cached_shares.sort_by_key(|s| s.club_id);
                live_shares.sort_by_key(|s| s.club_id);
                if cached_shares != live_shares {
                    mismatches.push(ShopMismatch::Shares {
                        cached: cached_shares,
                        live: live_shares,
                    });
                }
            }
        }

        Ok(ClubCheck {
            tier: tier.to_string(),
            club_id,
            mismatches,
        })
    }
}
