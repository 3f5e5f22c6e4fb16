//! End-to-end scenarios over a shared registry root.

use modelreg_core::{
    AdvisoryLock, CoreError, FieldValue, ModelId, Registry, RegistryConfig, UpsertOutcome,
};
use modelreg_testkit::prelude::*;
use proptest::prelude::*;
use std::fs;
use std::time::{Duration, Instant};

#[test]
fn register_alpha_in_empty_registry() {
    let registry = TestRegistry::new();

    let mut model = registry.create().unwrap();
    assert_eq!(model.id().as_str(), "240615_0930_0");
    model.set_field("name", "alpha").unwrap();
    model.commit().unwrap();

    let row = registry
        .retrieve(&ModelId::from("240615_0930_0"))
        .unwrap()
        .unwrap();
    assert_eq!(row.id().as_str(), "240615_0930_0");
    let fields: Vec<_> = row.fields().collect();
    assert_eq!(fields, vec![("name", &FieldValue::from("alpha"))]);

    assert_eq!(
        fs::read_to_string(registry.root().join("modelsinfo.csv")).unwrap(),
        "id,name\n240615_0930_0,alpha\n"
    );
    assert_eq!(
        fs::read_to_string(registry.root().join("usedidlist.csv")).unwrap(),
        "id\n240615_0930_0\n"
    );
}

#[test]
fn same_minute_allocation_gets_suffix() {
    let registry = TestRegistry::at(
        chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap(),
    );
    fs::write(registry.root().join("usedidlist.csv"), "id\n240101_1200_0\n").unwrap();

    assert_eq!(registry.create().unwrap().id().as_str(), "240101_1200_1");
}

#[test]
fn peers_see_each_others_columns() {
    let registry = TestRegistry::new();
    let peer = registry.open_peer();

    let mut a = registry.create().unwrap();
    a.set_field("name", "alpha").unwrap();
    a.commit().unwrap();

    let mut b = peer.create().unwrap();
    b.set_field("name", "bravo").unwrap();
    b.set_field("accuracy", 0.75).unwrap();
    b.commit().unwrap();

    // `a` was written before `accuracy` existed; it reads as null.
    let a_row = registry.retrieve(a.id()).unwrap().unwrap();
    assert_eq!(a_row.get("accuracy"), None);

    // Re-committing the stale handle keeps the widened column set.
    assert_eq!(a.commit().unwrap().outcome, UpsertOutcome::Replaced);
    let table = registry.store().snapshot().unwrap();
    assert_eq!(table.columns(), &["name".to_string(), "accuracy".to_string()]);
    assert_eq!(
        table.get(b.id()).unwrap().get("accuracy"),
        Some(&FieldValue::Float(0.75))
    );
}

#[test]
fn later_writer_wins_whole_row() {
    let registry = TestRegistry::new();
    let peer = registry.open_peer();

    let mut first = registry.open_model("shared").unwrap();
    let mut second = peer.open_model("shared").unwrap();
    first.set_field("owner", "first").unwrap();
    first.set_field("only_first", 1).unwrap();
    second.set_field("owner", "second").unwrap();

    first.commit().unwrap();
    second.commit().unwrap();

    let row = registry.retrieve(&ModelId::from("shared")).unwrap().unwrap();
    assert_eq!(row.get("owner"), Some(&FieldValue::from("second")));
    assert_eq!(row.get("only_first"), None);
}

#[test]
fn leaked_lock_times_out_instead_of_hanging() {
    let registry = TestRegistry::new();
    // A crashed holder leaves its marker behind.
    fs::write(registry.root().join(".infolock"), b"").unwrap();

    let mut model = registry.open_model("m").unwrap();
    model.set_field("name", "x").unwrap();

    let start = Instant::now();
    let err = model.commit().unwrap_err();
    assert!(matches!(err, CoreError::LockTimeout { .. }));
    assert!(err.is_lock_contention());
    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(registry.retrieve(model.id()).unwrap().is_none());

    // Clearing the marker, as `modelreg unlock` does, lets the retry through.
    assert!(AdvisoryLock::new(registry.root(), ".infolock").release().unwrap());
    model.commit().unwrap();
}

#[test]
fn prune_drops_deleted_models_but_keeps_ledger() {
    let (registry, ids) = scenarios::populated_registry(3);
    fs::remove_dir_all(registry.model_dir(&ids[1]).unwrap()).unwrap();

    let removed = registry.store().prune_orphans().unwrap();
    assert_eq!(removed, vec![ids[1].clone()]);

    let remaining = registry.store().ids().unwrap();
    assert_eq!(remaining, vec![ids[0].clone(), ids[2].clone()]);
    assert_eq!(registry.allocator().ledger().unwrap().len(), 3);

    // The pruned id is never handed out again.
    let fresh = registry.create().unwrap();
    assert!(!ids.contains(fresh.id()));
}

#[test]
fn reopening_keeps_everything() {
    let (registry, ids) = scenarios::populated_registry(4);
    let root = registry.root().to_path_buf();

    let reopened = Registry::open(&root, RegistryConfig::default()).unwrap();
    for (i, id) in ids.iter().enumerate() {
        let model = reopened.open_model(id.clone()).unwrap();
        assert_eq!(model.get_field("index"), Some(&FieldValue::Int(i as i64)));
        assert_eq!(
            model.get_field("name"),
            Some(&FieldValue::from(format!("model_{i}")))
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn committed_records_read_back(records in prop::collection::vec(record_strategy(5), 1..10)) {
        let registry = TestRegistry::new();

        let mut expected = std::collections::HashMap::new();
        for record in &records {
            registry.store().upsert(record).unwrap();
            expected.insert(record.id().clone(), record.without_nulls());
        }

        let table = registry.store().snapshot().unwrap();
        prop_assert_eq!(table.len(), expected.len());
        for (id, record) in &expected {
            let stored = registry.retrieve(id).unwrap();
            prop_assert_eq!(stored.as_ref(), Some(record));
        }
    }
}
