use super::{PackPreview, SaleContract, ShareAmount};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
};

/// 测试用销售合约：按 (档位, 俱乐部) 预置返回值
#[derive(Default)]
pub struct MockSaleContract {
    names: Mutex<HashMap<String, String>>,
    paused: Mutex<HashMap<String, bool>>,
    packs: Mutex<HashMap<(String, i32), (i32, PackPreview)>>,
    failing: AtomicBool,
    preview_calls: AtomicUsize,
}

impl MockSaleContract {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tier(self, tier: &str, name: &str, paused: bool) -> Self {
        self.names.lock().unwrap().insert(tier.to_string(), name.to_string());
        self.paused.lock().unwrap().insert(tier.to_string(), paused);
        self
    }

    /// 设置某主俱乐部的可购买数量与卡包内容
    pub fn set_pack(&self, tier: &str, club_id: i32, max_packs: i32, cost: i64, shares: &[(i32, i32)]) {
        let preview = PackPreview {
            cost: Decimal::from(cost),
            shares: shares
                .iter()
                .map(|&(club_id, num_shares)| ShareAmount { club_id, num_shares })
                .collect(),
        };
        self.packs
            .lock()
            .unwrap()
            .insert((tier.to_string(), club_id), (max_packs, preview));
    }

    /// 之后的所有读取都失败
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn preview_calls(&self) -> usize {
        self.preview_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LedgerError::ExternalRead("rpc unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SaleContract for MockSaleContract {
    async fn tier_name(&self, tier: &str) -> Result<String> {
        self.check()?;
        Ok(self
            .names
            .lock()
            .unwrap()
            .get(tier)
            .cloned()
            .unwrap_or_else(|| format!("tier {}", tier)))
    }

    async fn is_paused(&self, tier: &str) -> Result<bool> {
        self.check()?;
        Ok(self.paused.lock().unwrap().get(tier).copied().unwrap_or(false))
    }

    async fn max_packs(&self, tier: &str, club_id: i32) -> Result<i32> {
        self.check()?;
        Ok(self
            .packs
            .lock()
            .unwrap()
            .get(&(tier.to_string(), club_id))
            .map(|(max, _)| *max)
            .unwrap_or(0))
    }

    async fn preview(&self, tier: &str, club_id: i32, _quantity: i32) -> Result<PackPreview> {
        self.check()?;
        self.preview_calls.fetch_add(1, Ordering::SeqCst);
        self.packs
            .lock()
            .unwrap()
            .get(&(tier.to_string(), club_id))
            .map(|(_, preview)| preview.clone())
            .ok_or_else(|| LedgerError::ExternalRead(format!("no preview for club {}", club_id)))
    }
}
