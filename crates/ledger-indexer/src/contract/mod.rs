//! 销售合约的只读查询
//!
//! 卡包缓存是整个引擎里唯一依赖链上实时状态的部分，其余逻辑都只由已存储的事件决定。

pub mod evm;
#[cfg(test)]
pub mod mock;

use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

pub use evm::EvmSaleContract;

/// 卡包中单个俱乐部的份额
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareAmount {
    pub club_id: i32,
    pub num_shares: i32,
}

/// 购买一个卡包的预览
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackPreview {
    /// 总价
    pub cost: Decimal,
    /// 卡包内容
    pub shares: Vec<ShareAmount>,
}

/// 销售合约查询接口
///
/// 读取失败一律返回 `LedgerError::ExternalRead`，由调用方中止当前事件
#[async_trait]
pub trait SaleContract: Send + Sync {
    /// 档位展示名称
    async fn tier_name(&self, tier: &str) -> Result<String>;

    /// 档位是否处于暂停状态
    async fn is_paused(&self, tier: &str) -> Result<bool>;

    /// 该主俱乐部当前最多还能购买的卡包数
    async fn max_packs(&self, tier: &str, club_id: i32) -> Result<i32>;

    /// 购买 `quantity` 个卡包的价格与内容
    async fn preview(&self, tier: &str, club_id: i32, quantity: i32) -> Result<PackPreview>;
}

#[async_trait]
impl<C: SaleContract + ?Sized> SaleContract for std::sync::Arc<C> {
    async fn tier_name(&self, tier: &str) -> Result<String> {
        (**self).tier_name(tier).await
    }

    async fn is_paused(&self, tier: &str) -> Result<bool> {
        (**self).is_paused(tier).await
    }

    async fn max_packs(&self, tier: &str, club_id: i32) -> Result<i32> {
        (**self).max_packs(tier, club_id).await
    }

    async fn preview(&self, tier: &str, club_id: i32, quantity: i32) -> Result<PackPreview> {
        (**self).preview(tier, club_id, quantity).await
    }
}
