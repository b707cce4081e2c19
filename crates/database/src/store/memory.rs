use super::LedgerStore;
use crate::entity::Entity;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use utils::AppResult;

type Collection = BTreeMap<String, Value>;

/// 进程内存存储
///
/// 记录以 JSON 形式按集合保存，BTreeMap 保证反查结果按主键有序
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<&'static str, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 某个集合当前的记录数
    pub async fn count<E: Entity>(&self) -> usize {
        self.collections
            .read()
            .await
            .get(E::COLLECTION)
            .map(|c| c.len())
            .unwrap_or(0)
    }

    /// 清空全部数据
    pub async fn clear(&self) {
        self.collections.write().await.clear();
    }
}

fn decode_all<E: Entity>(values: impl Iterator<Item = Value>) -> AppResult<Vec<E>> {
    values
        .map(|v| serde_json::from_value::<E>(v).map_err(Into::into))
        .collect()
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn load<E: Entity>(&self, id: &str) -> AppResult<Option<E>> {
        let guard = self.collections.read().await;
        match guard.get(E::COLLECTION).and_then(|c| c.get(id)) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    async fn save<E: Entity>(&self, entity: &E) -> AppResult<()> {
        let value = serde_json::to_value(entity)?;
        self.collections
            .write()
            .await
            .entry(E::COLLECTION)
            .or_default()
            .insert(entity.id().to_string(), value);
        Ok(())
    }

    async fn delete<E: Entity>(&self, id: &str) -> AppResult<bool> {
        let mut guard = self.collections.write().await;
        Ok(guard
            .get_mut(E::COLLECTION)
            .map(|c| c.remove(id).is_some())
            .unwrap_or(false))
    }

    async fn find_by<E: Entity>(&self, field: &str, value: &str) -> AppResult<Vec<E>> {
        let guard = self.collections.read().await;
        let Some(collection) = guard.get(E::COLLECTION) else {
            return Ok(Vec::new());
        };
        let matches = collection
            .values()
            .filter(|doc| doc.get(field).and_then(Value::as_str) == Some(value))
            .cloned()
            .collect::<Vec<_>>();
        decode_all(matches.into_iter())
    }

    async fn find_all<E: Entity>(&self) -> AppResult<Vec<E>> {
        let guard = self.collections.read().await;
        let all = guard
            .get(E::COLLECTION)
            .map(|c| c.values().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        decode_all(all.into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::referral::{Referral, ReferrerTotal};

    #[tokio::test]
    async fn test_load_save_delete() {
        let store = MemoryStore::new();
        assert!(store.load::<Referral>("domob").await.unwrap().is_none());

        store.save(&Referral::new("domob", "referrer", 10)).await.unwrap();
        let loaded = store.require::<Referral>("domob").await.unwrap();
        assert_eq!(loaded.referrer, "referrer");

        assert!(store.delete::<Referral>("domob").await.unwrap());
        assert!(!store.delete::<Referral>("domob").await.unwrap());
        assert!(store.require::<Referral>("domob").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_find_by_is_scoped_and_ordered() {
        let store = MemoryStore::new();
        store.save(&Referral::new("b", "r1", 1)).await.unwrap();
        store.save(&Referral::new("a", "r1", 2)).await.unwrap();
        store.save(&Referral::new("c", "r2", 3)).await.unwrap();
        store.save(&ReferrerTotal::initial("r1", 1, 1)).await.unwrap();

        let r1: Vec<Referral> = store.find_by(Referral::REFERRER_FIELD, "r1").await.unwrap();
        let ids: Vec<&str> = r1.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert_eq!(store.count::<Referral>().await, 3);
        assert_eq!(store.count::<ReferrerTotal>().await, 1);
        assert_eq!(store.find_all::<Referral>().await.unwrap().len(), 3);
    }
}
