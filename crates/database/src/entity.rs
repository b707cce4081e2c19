use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

/// 可按主键持久化的实体
///
/// 每种实体对应一个集合，主键统一序列化为 `_id` 字段
pub trait Entity: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + Unpin + 'static {
    /// 集合名称
    const COLLECTION: &'static str;

    /// 主键
    fn id(&self) -> &str;
}

/// 追加式快照记录
///
/// 快照一旦写入就不再修改；新的状态总是以 `index + 1` 追加在链尾
pub trait Snapshot: Entity {
    /// 相对上一个快照的增量
    type Delta: Send + Sync;

    /// 所属实体主键
    fn owner(&self) -> &str;

    /// 链上序号（0, 1, 2, ...）
    fn index(&self) -> i64;

    /// 基于当前快照构造下一个快照：序号加一，未被增量覆盖的字段原样复制
    fn successor(&self, timestamp: i64, delta: &Self::Delta) -> Self;

    /// 快照主键：owner + 定宽序号，保证唯一且按字典序即按序号排序
    fn key_for(owner: &str, index: i64) -> String {
        format!("{}:{:010}", owner, index)
    }
}

/// 持有"当前快照"指针的实体
pub trait SnapshotOwner: Entity {
    fn current_snapshot(&self) -> &str;

    fn repoint(&mut self, snapshot_id: String);
}
