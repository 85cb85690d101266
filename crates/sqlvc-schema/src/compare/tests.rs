//! Tests for snapshot reconciliation

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashSet;

use super::*;
use crate::error::{ReconcileError, SnapshotSide};
use crate::object::{ObjectKey, ObjectKind, SchemaObject};

fn table(name: &str, definition: &str) -> SchemaObject {
    SchemaObject::new("dbo", name, ObjectKind::Table, definition)
}

fn view(name: &str, definition: &str) -> SchemaObject {
    SchemaObject::new("dbo", name, ObjectKind::View, definition)
}

#[test]
fn test_new_object_is_added() {
    let orders = table("Orders", "CREATE TABLE ...");

    let result = reconcile(&[orders.clone()], &[]).unwrap();

    assert_eq!(result.added, vec![orders]);
    assert!(result.modified.is_empty());
    assert!(result.deleted.is_empty());
    assert!(result.unchanged.is_empty());
}

#[test]
fn test_identical_definition_is_unchanged() {
    let orders = table("Orders", "CREATE TABLE ...");

    let result = reconcile(&[orders.clone()], &[orders.clone()]).unwrap();

    assert_eq!(result.unchanged, vec![orders]);
    assert!(result.is_clean());
}

#[test]
fn test_differing_definition_is_modified_with_both_versions() {
    let current = table("Orders", "CREATE TABLE [dbo].[Orders] (\n  [Id] bigint NOT NULL\n);");
    let saved = table("Orders", "CREATE TABLE [dbo].[Orders] (\n  [Id] int NOT NULL\n);");

    let result = reconcile(&[current.clone()], &[saved.clone()]).unwrap();

    assert_eq!(result.modified, vec![ModifiedObject { current, saved }]);
    assert!(result.added.is_empty());
    assert!(result.unchanged.is_empty());
}

#[test]
fn test_saved_only_object_is_deleted() {
    let orders = table("Orders", "CREATE TABLE ...");

    let result = reconcile(&[], &[orders.clone()]).unwrap();

    assert_eq!(result.deleted, vec![orders]);
    assert_eq!(result.change_count(), 1);
}

#[test]
fn test_trailing_whitespace_counts_as_modified() {
    let current = view("vOrders", "CREATE VIEW v AS SELECT 1 ");
    let saved = view("vOrders", "CREATE VIEW v AS SELECT 1");

    let result = reconcile(&[current], &[saved]).unwrap();

    assert_eq!(result.modified.len(), 1);
    assert!(result.unchanged.is_empty());
}

#[test]
fn test_case_difference_counts_as_modified() {
    let result = reconcile(
        &[view("v", "create view v as select 1")],
        &[view("v", "CREATE VIEW v AS SELECT 1")],
    )
    .unwrap();

    assert_eq!(result.summary().modified, 1);
}

#[test]
fn test_same_name_different_kind_are_distinct() {
    let result = reconcile(&[table("Orders", "t")], &[view("Orders", "t")]).unwrap();

    assert_eq!(result.added.len(), 1);
    assert_eq!(result.deleted.len(), 1);
    assert_eq!(result.added[0].kind, ObjectKind::Table);
    assert_eq!(result.deleted[0].kind, ObjectKind::View);
}

#[test]
fn test_duplicate_key_in_current_is_rejected() {
    let err = reconcile(&[table("Orders", "a"), table("Orders", "b")], &[]).unwrap_err();

    let ReconcileError::DuplicateKey { key, side } = err;
    assert_eq!(key, ObjectKey::new("dbo", "Orders", ObjectKind::Table));
    assert_eq!(side, SnapshotSide::Current);
}

#[test]
fn test_duplicate_key_in_saved_is_rejected() {
    let err = reconcile(&[], &[view("v", "a"), view("v", "a")]).unwrap_err();

    assert_eq!(
        err.to_string(),
        "duplicate object 'dbo.v.views' in saved snapshot"
    );
}

#[test]
fn test_output_follows_input_order() {
    let current = vec![table("C", "1"), table("A", "1"), table("B", "1")];

    let result = reconcile(&current, &[]).unwrap();

    let names: Vec<&str> = result.added.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["C", "A", "B"]);
}

#[test]
fn test_summary_and_changes() {
    let current = vec![table("New", "n"), table("Changed", "v2"), table("Same", "s")];
    let saved = vec![table("Changed", "v1"), table("Same", "s"), table("Gone", "g")];

    let result = reconcile(&current, &saved).unwrap();

    assert_eq!(
        result.summary().to_string(),
        "1 added, 1 modified, 1 deleted, 1 unchanged"
    );
    assert_eq!(
        result
            .changes()
            .into_iter()
            .map(|(kind, key)| format!("{kind} {key}"))
            .collect::<Vec<_>>(),
        vec![
            "added dbo.New.tables",
            "modified dbo.Changed.tables",
            "deleted dbo.Gone.tables",
        ]
    );

    let changed = ObjectKey::new("dbo", "Changed", ObjectKind::Table);
    assert_eq!(result.classify(&changed), Some(ChangeKind::Modified));
    assert_eq!(result.find_modified(&changed).unwrap().saved.definition, "v1");
    assert_eq!(result.current_objects().count(), 3);
    assert_eq!(result.total(), 4);
}

#[test]
fn test_snapshot_keeps_insertion_order() {
    let snapshot = Snapshot::from_objects(
        vec![view("b", "1"), table("a", "1")],
        SnapshotSide::Saved,
    )
    .unwrap();

    let keys: Vec<String> = snapshot.keys().map(|k| k.to_string()).collect();
    assert_eq!(keys, vec!["dbo.b.views", "dbo.a.tables"]);
    assert_eq!(snapshot.side(), SnapshotSide::Saved);
}

fn arb_object() -> impl Strategy<Value = SchemaObject> {
    (
        prop::sample::select(vec!["dbo", "sales"]),
        prop::sample::select(vec!["A", "B", "C", "D"]),
        prop::sample::select(ObjectKind::ALL.to_vec()),
        prop::sample::select(vec!["x", "y", "x "]),
    )
        .prop_map(|(schema, name, kind, def)| SchemaObject::new(schema, name, kind, def))
}

fn arb_snapshot() -> impl Strategy<Value = Vec<SchemaObject>> {
    prop::collection::vec(arb_object(), 0..20).prop_map(|objects| {
        let mut seen = HashSet::new();
        objects
            .into_iter()
            .filter(|o| seen.insert(o.key()))
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_partition_is_complete_and_disjoint(
        current in arb_snapshot(),
        saved in arb_snapshot(),
    ) {
        let result = reconcile(&current, &saved).unwrap();

        let mut classified: Vec<ObjectKey> = result.added.iter().map(|o| o.key()).collect();
        classified.extend(result.modified.iter().map(|m| m.key()));
        classified.extend(result.deleted.iter().map(|o| o.key()));
        classified.extend(result.unchanged.iter().map(|o| o.key()));

        let unique: HashSet<ObjectKey> = classified.iter().cloned().collect();
        prop_assert_eq!(unique.len(), classified.len());

        let expected: HashSet<ObjectKey> =
            current.iter().chain(saved.iter()).map(|o| o.key()).collect();
        prop_assert_eq!(unique, expected);
    }

    #[test]
    fn prop_self_reconciliation_is_clean(objects in arb_snapshot()) {
        let result = reconcile(&objects, &objects).unwrap();
        prop_assert!(result.is_clean());
        prop_assert_eq!(result.unchanged.len(), objects.len());
    }
}
