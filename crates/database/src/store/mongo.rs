use super::LedgerStore;
use crate::{entity::Entity, Database};
use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::{FindOptions, ReplaceOptions},
    Collection,
};
use tracing::debug;
use utils::AppResult;

impl Database {
    fn typed_collection<E: Entity>(&self) -> Collection<E> {
        self.db.collection::<E>(E::COLLECTION)
    }

    fn sorted_by_id() -> FindOptions {
        FindOptions::builder().sort(doc! { "_id": 1 }).build()
    }
}

#[async_trait]
impl LedgerStore for Database {
    async fn load<E: Entity>(&self, id: &str) -> AppResult<Option<E>> {
        let found = self.typed_collection::<E>().find_one(doc! { "_id": id }, None).await?;
        Ok(found)
    }

    async fn save<E: Entity>(&self, entity: &E) -> AppResult<()> {
        let options = ReplaceOptions::builder().upsert(true).build();
        self.typed_collection::<E>()
            .replace_one(doc! { "_id": entity.id() }, entity, options)
            .await?;
        debug!("💾 {} {} 已写入", E::COLLECTION, entity.id());
        Ok(())
    }

    async fn delete<E: Entity>(&self, id: &str) -> AppResult<bool> {
        let result = self.typed_collection::<E>().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn find_by<E: Entity>(&self, field: &str, value: &str) -> AppResult<Vec<E>> {
        let mut filter = Document::new();
        filter.insert(field, value);
        let cursor = self.typed_collection::<E>().find(filter, Self::sorted_by_id()).await?;
        let records: Vec<E> = cursor.try_collect().await?;
        Ok(records)
    }

    async fn find_all<E: Entity>(&self) -> AppResult<Vec<E>> {
        let cursor = self.typed_collection::<E>().find(None, Self::sorted_by_id()).await?;
        let records: Vec<E> = cursor.try_collect().await?;
        Ok(records)
    }
}
