//! 键值式持久化接口
//!
//! 聚合引擎只通过这里的原语读写派生数据：按主键加载/保存/删除，以及按关联字段做一对多反查。
//! 内存实现用于测试和演练，MongoDB 实现用于生产。

pub mod memory;
pub mod mongo;

use crate::entity::Entity;
use async_trait::async_trait;
use std::sync::Arc;
use utils::{AppError, AppResult};

pub use memory::MemoryStore;

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// 按主键加载，不存在时返回 None
    async fn load<E: Entity>(&self, id: &str) -> AppResult<Option<E>>;

    /// 按主键整体写入（存在则覆盖）
    async fn save<E: Entity>(&self, entity: &E) -> AppResult<()>;

    /// 按主键删除，返回是否真的删除了记录
    async fn delete<E: Entity>(&self, id: &str) -> AppResult<bool>;

    /// 一对多反查：返回 `field == value` 的全部记录，按主键升序
    async fn find_by<E: Entity>(&self, field: &str, value: &str) -> AppResult<Vec<E>>;

    /// 返回集合中的全部记录，按主键升序
    async fn find_all<E: Entity>(&self) -> AppResult<Vec<E>>;

    /// 按主键加载，不存在视为错误
    async fn require<E: Entity>(&self, id: &str) -> AppResult<E> {
        self.load::<E>(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {} 不存在", E::COLLECTION, id)))
    }
}

#[async_trait]
impl<S: LedgerStore> LedgerStore for Arc<S> {
    async fn load<E: Entity>(&self, id: &str) -> AppResult<Option<E>> {
        (**self).load::<E>(id).await
    }

    async fn save<E: Entity>(&self, entity: &E) -> AppResult<()> {
        (**self).save(entity).await
    }

    async fn delete<E: Entity>(&self, id: &str) -> AppResult<bool> {
        (**self).delete::<E>(id).await
    }

    async fn find_by<E: Entity>(&self, field: &str, value: &str) -> AppResult<Vec<E>> {
        (**self).find_by::<E>(field, value).await
    }

    async fn find_all<E: Entity>(&self) -> AppResult<Vec<E>> {
        (**self).find_all::<E>().await
    }
}
