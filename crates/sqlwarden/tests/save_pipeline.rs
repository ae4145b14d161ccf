//! End-to-end save pipeline: access filtering, declarative rules, and the
//! direct saver, all through the facade prelude.

mod fixtures;

use std::sync::Arc;

use fixtures::{MemoryConnection, hero_registry};
use sqlwarden::policy::{NowOnSave, TodayDefault, Uppercase};
use sqlwarden::prelude::*;

const T1: i64 = 1_000_000_000_000_000;
const T2: i64 = 1_000_000_500_000_000;

fn clock_t1() -> i64 {
    T1
}

fn clock_t2() -> i64 {
    T2
}

fn saver(registry: &Arc<ModelRegistry>) -> DirectSaver {
    DirectSaver::new(
        Arc::clone(registry),
        Arc::new(sqlwarden::dialect::knowledge::sqlserver()),
    )
}

fn interceptor() -> SaveInterceptor {
    let rules = RuleRegistry::new()
        .default_value("Hero", "Created", Arc::new(TodayDefault))
        .auto_update("Hero", "Touched", Arc::new(NowOnSave))
        .string_format("Hero", "Name", Arc::new(Uppercase));
    SaveInterceptor::new(AccessPolicy::new(), rules)
}

#[test]
fn denied_insert_executes_no_sql() {
    // Relic carries no access annotation, so the read-only session default
    // applies and the insert silently vanishes.
    let registry = Arc::new(hero_registry());
    let mut changes = ChangeSet::new();
    changes.push(ChangeEntry::added(Record::new("Relic").with("Name", "orb")));

    let mut conn = MemoryConnection::open_on("sqlserver");
    let mut delegate = saver(&registry);
    let affected = interceptor()
        .save(
            &registry,
            &SessionContext::new(),
            &mut changes,
            &mut delegate,
            &mut conn,
        )
        .unwrap();

    assert_eq!(affected, 0);
    assert!(conn.executed.is_empty());
    assert_eq!(changes.entries()[0].state(), EntryState::Detached);
}

#[test]
fn strict_mode_raises_before_any_sql() {
    let registry = Arc::new(hero_registry());
    let mut changes = ChangeSet::new();
    changes.push(ChangeEntry::added(Record::new("Relic").with("Name", "orb")));

    let mut conn = MemoryConnection::open_on("sqlserver");
    let mut delegate = saver(&registry);
    let err = interceptor()
        .save(
            &registry,
            &SessionContext::new().with_strict(),
            &mut changes,
            &mut delegate,
            &mut conn,
        )
        .unwrap_err();

    assert!(matches!(
        err,
        Error::PermissionDenied {
            operation: SaveOperation::Insert,
            ..
        }
    ));
    assert!(conn.executed.is_empty());
}

#[test]
fn instance_access_overrides_type_default() {
    let registry = Arc::new(hero_registry());
    let mut changes = ChangeSet::new();
    changes.push(ChangeEntry::added(
        Record::new("Relic").with_access(AccessLevel::INSERT).with("Name", "orb"),
    ));

    let mut conn = MemoryConnection::open_on("sqlserver");
    let mut delegate = saver(&registry);
    let affected = interceptor()
        .save(
            &registry,
            &SessionContext::new(),
            &mut changes,
            &mut delegate,
            &mut conn,
        )
        .unwrap();

    assert_eq!(affected, 1);
    assert!(conn.statements()[0].starts_with("INSERT INTO [relics]"));
}

#[test]
fn seed_mode_grants_insert_everywhere() {
    let registry = Arc::new(hero_registry());
    let mut changes = ChangeSet::new();
    changes.push(ChangeEntry::added(Record::new("Relic").with("Name", "orb")));

    let mut conn = MemoryConnection::open_on("sqlserver");
    let mut delegate = saver(&registry);
    let affected = interceptor()
        .save(
            &registry,
            &SessionContext::new().with_seed_mode(),
            &mut changes,
            &mut delegate,
            &mut conn,
        )
        .unwrap();

    assert_eq!(affected, 1);
}

#[test]
fn annotated_levels_or_combine_but_still_deny_delete() {
    // Hero is annotated Insert and Update; Delete stays denied and the
    // marked entry reverts to store values.
    let registry = Arc::new(hero_registry());
    let mut changes = ChangeSet::new();
    let mut entry = ChangeEntry::from_store(
        Record::new("Hero")
            .with("Id", 1i64)
            .with("Name", "ALICE")
            .with("Version", 1i64),
    );
    entry.mark_deleted();
    changes.push(entry);

    let mut conn = MemoryConnection::open_on("sqlserver");
    let mut delegate = saver(&registry);
    let affected = interceptor()
        .save(
            &registry,
            &SessionContext::new(),
            &mut changes,
            &mut delegate,
            &mut conn,
        )
        .unwrap();

    assert_eq!(affected, 0);
    assert!(conn.executed.is_empty());
    assert_eq!(changes.entries()[0].state(), EntryState::Unchanged);
}

#[test]
fn auto_update_stamps_insert_and_formats_last() {
    let registry = Arc::new(hero_registry());
    let mut changes = ChangeSet::new();
    changes.push(ChangeEntry::added(Record::new("Hero").with("Name", "alice")));

    let mut conn = MemoryConnection::open_on("sqlserver");
    let mut delegate = saver(&registry);
    interceptor()
        .save(
            &registry,
            &SessionContext::new().with_clock(clock_t1),
            &mut changes,
            &mut delegate,
            &mut conn,
        )
        .unwrap();

    let entry = &changes.entries()[0];
    assert_eq!(entry.current("Touched"), Value::Timestamp(T1));
    assert_eq!(entry.current("Name"), Value::Text("ALICE".to_string()));
}

#[test]
fn successive_saves_produce_increasing_timestamps() {
    let registry = Arc::new(hero_registry());
    let mut delegate = saver(&registry);
    let interceptor = interceptor();

    // First save: insert at T1.
    let mut conn = MemoryConnection::open_on("sqlserver");
    let mut changes = ChangeSet::new();
    changes.push(ChangeEntry::added(Record::new("Hero").with("Name", "alice")));
    interceptor
        .save(
            &registry,
            &SessionContext::new().with_clock(clock_t1),
            &mut changes,
            &mut delegate,
            &mut conn,
        )
        .unwrap();
    let first = changes.entries()[0].current("Touched");

    // Second save: modify the persisted row at T2.
    let mut changes = ChangeSet::new();
    let mut entry = ChangeEntry::from_store(
        Record::new("Hero")
            .with("Id", 1i64)
            .with("Name", "ALICE")
            .with("Touched", first.clone())
            .with("Version", 1i64),
    );
    entry.set_current("Name", Value::Text("alicia".to_string()));
    changes.push(entry);
    interceptor
        .save(
            &registry,
            &SessionContext::new().with_clock(clock_t2),
            &mut changes,
            &mut delegate,
            &mut conn,
        )
        .unwrap();
    let second = changes.entries()[0].current("Touched");

    assert_eq!(first, Value::Timestamp(T1));
    assert_eq!(second, Value::Timestamp(T2));
    assert!(second.as_i64() > first.as_i64());
}

#[test]
fn closed_connection_is_opened_once_per_insert() {
    let registry = Arc::new(hero_registry());
    let mut changes = ChangeSet::new();
    changes.push(ChangeEntry::added(
        Record::new("Relic").with_access(AccessLevel::INSERT).with("Name", "orb"),
    ));

    let mut conn = MemoryConnection::closed_on("sqlserver");
    let mut delegate = saver(&registry);
    interceptor()
        .save(
            &registry,
            &SessionContext::new(),
            &mut changes,
            &mut delegate,
            &mut conn,
        )
        .unwrap();

    // One open/close pair covers the INSERT and the session-scoped id
    // fetch; the connection ends up closed again.
    assert_eq!(conn.opened, 1);
    assert_eq!(conn.closed, 1);
    assert_eq!(conn.statements().len(), 2);
    assert_eq!(conn.state(), ConnectionState::Closed);
}
