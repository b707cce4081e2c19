////////////////////////////////////////////////////////////////////////
//
// 1. 每个Domain(Entity)单独一个文件夹，只定义 model
// 2. 所有实体共用 store 中的键值原语（load / save / delete / find_by）
//    - MemoryStore: 测试与演练
//    - Database:    MongoDB，一个实体一个集合
//
//////////////////////////////////////////////////////////////////////

use mongodb::{options::IndexOptions, Client, IndexModel};
use tracing::info;
use utils::AppResult;

pub mod entity;
pub mod referral;
pub mod sale;
pub mod store;

pub use entity::{Entity, Snapshot, SnapshotOwner};
pub use store::{LedgerStore, MemoryStore};

#[derive(Clone, Debug)]
pub struct Database {
    pub(crate) db: mongodb::Database,
}

impl Database {
    pub async fn connect(uri: &str, database_name: &str) -> AppResult<Self> {
        let client = Client::with_uri_str(uri).await?;
        let db = client.database(database_name);

        info!("🧱 database({:#}) connected.", database_name);

        Ok(Database { db })
    }

    /// 初始化一对多反查所需的索引
    pub async fn init_repository_indexes(&self) -> AppResult<()> {
        let relations: [(&str, &str); 7] = [
            (referral::ReferrerTotal::COLLECTION, referral::ReferrerTotal::REFERRER_FIELD),
            (referral::Referral::COLLECTION, referral::Referral::REFERRER_FIELD),
            (referral::ReferrerBonus::COLLECTION, referral::ReferrerBonus::REFERRER_FIELD),
            (sale::SaleClub::COLLECTION, sale::SaleClub::TIER_FIELD),
            (sale::PricingStep::COLLECTION, sale::PricingStep::TIER_FIELD),
            (sale::PackShareContent::COLLECTION, sale::PackShareContent::PACK_FIELD),
            (sale::PackShareContent::COLLECTION, sale::PackShareContent::CLUB_FIELD),
        ];

        for (collection, field) in relations {
            let mut keys = mongodb::bson::Document::new();
            keys.insert(field, 1);
            let index = IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().name(format!("{}_1", field)).build())
                .build();
            self.db
                .collection::<mongodb::bson::Document>(collection)
                .create_index(index, None)
                .await?;
        }

        info!("✅ 派生数据索引初始化完成");
        Ok(())
    }
}
