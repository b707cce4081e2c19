use crate::error::{LedgerError, Result};
use database::{LedgerStore, Snapshot, SnapshotOwner};
use tracing::debug;

/// 在所有者的快照链尾追加一个快照
///
/// 先写新快照，再把所有者指向它；所有者或其当前快照不存在时不做任何写入。
/// 链由所有者的指针定义：中断后残留的、未被指向的后继快照会被覆盖。
pub async fn append_snapshot<S, O, T>(store: &S, owner_id: &str, timestamp: i64, delta: &T::Delta) -> Result<T>
where
    S: LedgerStore,
    O: SnapshotOwner,
    T: Snapshot,
{
    let mut owner = store
        .load::<O>(owner_id)
        .await?
        .ok_or_else(|| LedgerError::missing(format!("{} {}", O::COLLECTION, owner_id)))?;

    let current = store
        .load::<T>(owner.current_snapshot())
        .await?
        .ok_or_else(|| LedgerError::missing(format!("{} {}", T::COLLECTION, owner.current_snapshot())))?;

    let next = current.successor(timestamp, delta);
    store.save(&next).await?;
    owner.repoint(next.id().to_string());
    store.save(&owner).await?;

    debug!("🧾 {} {} -> 快照 #{}", O::COLLECTION, owner_id, next.index());
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::{
        referral::{Referrer, ReferrerTotal, TotalsDelta},
        MemoryStore,
    };

    async fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        let initial = ReferrerTotal::initial("referrer", 10, 1);
        store.save(&initial).await.unwrap();
        store.save(&Referrer::new("referrer", initial.id.clone())).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_append_repoints_owner_and_keeps_history() {
        let store = seeded_store().await;

        let next = append_snapshot::<_, Referrer, ReferrerTotal>(&store, "referrer", 20, &TotalsDelta::bonus(5, 100))
            .await
            .unwrap();
        assert_eq!(next.index, 1);
        assert_eq!((next.referrals, next.bonus_shares, next.usd_spent), (1, 5, 100));

        let owner: Referrer = store.load("referrer").await.unwrap().unwrap();
        assert_eq!(owner.current_total, next.id);

        let first: ReferrerTotal = store.load(&ReferrerTotal::key_for("referrer", 0)).await.unwrap().unwrap();
        assert_eq!((first.referrals, first.bonus_shares, first.usd_spent), (1, 0, 0));
    }

    #[tokio::test]
    async fn test_unreferenced_successor_is_overwritten() {
        let store = seeded_store().await;
        let initial: ReferrerTotal = store.load(&ReferrerTotal::key_for("referrer", 0)).await.unwrap().unwrap();

        // 写入后继后中断，所有者仍指向旧快照
        store.save(&initial.successor(15, &TotalsDelta::referrals(1))).await.unwrap();

        let next = append_snapshot::<_, Referrer, ReferrerTotal>(&store, "referrer", 20, &TotalsDelta::bonus(5, 100))
            .await
            .unwrap();
        assert_eq!(next.index, 1);
        assert_eq!((next.timestamp, next.referrals, next.bonus_shares), (20, 1, 5));

        let stored: ReferrerTotal = store.load(&next.id).await.unwrap().unwrap();
        assert_eq!(stored, next);
        let owner: Referrer = store.load("referrer").await.unwrap().unwrap();
        assert_eq!(owner.current_total, next.id);
    }

    #[tokio::test]
    async fn test_missing_owner_is_invariant_violation() {
        let store = MemoryStore::new();
        let err = append_snapshot::<_, Referrer, ReferrerTotal>(&store, "nobody", 1, &TotalsDelta::referrals(1))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvariantViolation(_)));
        assert_eq!(store.count::<ReferrerTotal>().await, 0);
    }

    #[tokio::test]
    async fn test_dangling_pointer_writes_nothing() {
        let store = MemoryStore::new();
        store
            .save(&Referrer::new("referrer", ReferrerTotal::key_for("referrer", 3)))
            .await
            .unwrap();

        let err = append_snapshot::<_, Referrer, ReferrerTotal>(&store, "referrer", 1, &TotalsDelta::referrals(1))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvariantViolation(_)));
        assert_eq!(store.count::<ReferrerTotal>().await, 0);
    }
}
