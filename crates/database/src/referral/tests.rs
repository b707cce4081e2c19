use super::model::*;
use crate::entity::{Snapshot, SnapshotOwner};

#[test]
fn test_initial_snapshot_carries_first_referral() {
    let total = ReferrerTotal::initial("referrer", 10, 1);

    assert_eq!(total.index, 0);
    assert_eq!(total.id, "referrer:0000000000");
    assert_eq!(total.referrals, 1);
    assert_eq!(total.bonus_shares, 0);
    assert_eq!(total.usd_spent, 0);
}

#[test]
fn test_successor_applies_delta_and_copies_the_rest() {
    let first = ReferrerTotal::initial("referrer", 10, 2);
    let second = first.successor(30, &TotalsDelta::bonus(20, 500));
    let third = second.successor(40, &TotalsDelta::referrals(-1));

    assert_eq!(second.index, 1);
    assert_eq!(second.timestamp, 30);
    assert_eq!((second.referrals, second.bonus_shares, second.usd_spent), (2, 20, 500));

    assert_eq!(third.index, 2);
    assert_eq!(third.owner(), "referrer");
    assert_eq!((third.referrals, third.bonus_shares, third.usd_spent), (1, 20, 500));

    // 原快照不受影响
    assert_eq!(first.referrals, 2);
}

#[test]
fn test_snapshot_keys_sort_by_index() {
    let mut keys: Vec<String> = [10, 2, 1, 0].iter().map(|i| ReferrerTotal::key_for("r", *i)).collect();
    keys.sort();
    assert_eq!(keys, vec![
        "r:0000000000".to_string(),
        "r:0000000001".to_string(),
        "r:0000000002".to_string(),
        "r:0000000010".to_string(),
    ]);
}

#[test]
fn test_referrer_repoint() {
    let mut referrer = Referrer::new("referrer", ReferrerTotal::key_for("referrer", 0));
    referrer.repoint(ReferrerTotal::key_for("referrer", 1));
    assert_eq!(referrer.current_snapshot(), "referrer:0000000001");
}

#[test]
fn test_referral_serializes_with_mongo_id() {
    let referral = Referral::new("domob", "referrer", 10);
    let json = serde_json::to_value(&referral).unwrap();

    assert_eq!(json["_id"], "domob");
    assert_eq!(json["referrer"], "referrer");
    assert_eq!(json["timestamp"], 10);
}
