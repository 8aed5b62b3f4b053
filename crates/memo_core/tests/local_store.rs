mod common;

use chrono::Duration;
use common::{at, memo_at, memory_store};
use memo_core::db::open_db_in_memory;
use memo_core::model::memo::now_timestamp;
use memo_core::{Memo, MemoStore, MemoValidationError, RepoError, SqliteMemoStore};
use std::collections::BTreeSet;

#[test]
fn save_assigns_sequential_ids_and_roundtrips() {
    let mut store = memory_store();

    let first = store.save(&memo_at("Groceries", "milk, eggs", 0)).unwrap();
    let second = store.save(&memo_at("", "untitled", 10)).unwrap();
    assert_eq!(first.id, Some(1));
    assert_eq!(second.id, Some(2));

    let loaded = store.get(1).unwrap();
    assert_eq!(loaded, first);
    assert_eq!(loaded.date, at(0));
}

#[test]
fn saved_memo_matches_the_stored_row_for_sub_millisecond_dates() {
    let mut store = memory_store();
    let mut memo = memo_at("t", "c", 0);
    memo.date = at(0) + Duration::nanoseconds(149_666_586);

    let saved = store.save(&memo).unwrap();

    assert_eq!(saved.date, at(0) + Duration::milliseconds(149));
    assert_eq!(store.get(saved.id.unwrap()).unwrap(), saved);
}

#[test]
fn save_with_existing_id_updates_in_place() {
    let mut store = memory_store();
    let created = store.save(&memo_at("t", "v1", 0)).unwrap();

    let mut edited = created.clone();
    edited.content = "v2".to_string();
    edited.date = at(60);
    let updated = store.save(&edited).unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(store.list_all().unwrap(), vec![updated]);
}

#[test]
fn save_with_unknown_id_inserts_that_id() {
    let mut store = memory_store();
    let mut memo = memo_at("t", "restored", 0);
    memo.id = Some(42);

    let saved = store.save(&memo).unwrap();
    assert_eq!(saved.id, Some(42));
    assert_eq!(store.get(42).unwrap().content, "restored");
}

#[test]
fn save_rejects_empty_content_without_writing() {
    let mut store = memory_store();
    let err = store.save(&memo_at("title only", "", 0)).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(MemoValidationError::EmptyContent)
    ));
    assert!(store.list_all().unwrap().is_empty());
}

#[test]
fn get_missing_id_returns_not_found() {
    let store = memory_store();
    let err = store.get(99).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(99)));
}

#[test]
fn delete_is_idempotent() {
    let mut store = memory_store();
    let saved = store.save(&memo_at("t", "c", 0)).unwrap();
    let id = saved.id.unwrap();

    store.delete(id).unwrap();
    store.delete(id).unwrap();
    assert!(matches!(store.get(id), Err(RepoError::NotFound(_))));
}

#[test]
fn delete_many_with_empty_set_is_noop() {
    let mut store = memory_store();
    store.save(&memo_at("t", "c", 0)).unwrap();

    store.delete_many(&BTreeSet::new()).unwrap();
    assert_eq!(store.list_all().unwrap().len(), 1);
}

#[test]
fn delete_many_removes_only_present_requested_ids() {
    let mut store = memory_store();
    let a = store.save(&memo_at("a", "a", 0)).unwrap().id.unwrap();
    let b = store.save(&memo_at("b", "b", 1)).unwrap().id.unwrap();
    let c = store.save(&memo_at("c", "c", 2)).unwrap().id.unwrap();
    store.delete(b).unwrap();
    let d = store.save(&memo_at("d", "d", 3)).unwrap().id.unwrap();

    store.delete_many(&BTreeSet::from([a, b, c])).unwrap();

    let remaining: Vec<_> = store
        .list_all()
        .unwrap()
        .into_iter()
        .filter_map(|memo| memo.id)
        .collect();
    assert_eq!(remaining, vec![d]);
}

#[test]
fn delete_many_handles_sets_larger_than_one_statement() {
    let mut store = memory_store();
    let mut ids = BTreeSet::new();
    for idx in 0..1_200 {
        let saved = store.save(&memo_at("bulk", &format!("memo {idx}"), idx)).unwrap();
        ids.insert(saved.id.unwrap());
    }
    let keep = store.save(&memo_at("keep", "keep", 5_000)).unwrap();

    store.delete_many(&ids).unwrap();
    assert_eq!(store.list_all().unwrap(), vec![keep]);
}

#[test]
fn delete_all_removes_every_row() {
    let mut store = memory_store();
    store.save(&memo_at("a", "a", 0)).unwrap();
    store.save(&memo_at("b", "b", 1)).unwrap();

    store.delete_all().unwrap();
    assert!(store.list_all().unwrap().is_empty());
}

#[test]
fn unparseable_date_is_replaced_with_current_time() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO memos (id, title, content, date) VALUES
            (1, 'bad', 'broken date', 'Tue Mar 05 2019'),
            (2, 'good', 'fine date', '2024-01-02 03:04:05.678');",
        [],
    )
    .unwrap();
    let store = SqliteMemoStore::try_new(conn).unwrap();

    let before = now_timestamp();
    let memos = store.list_all().unwrap();
    assert_eq!(memos.len(), 2);
    let broken = memos.iter().find(|memo| memo.id == Some(1)).unwrap();
    assert!(broken.date >= before);
    assert_eq!(broken.content, "broken date");

    let fine = store.get(2).unwrap();
    assert_eq!(fine.date.to_string(), "2024-01-02 03:04:05.678 UTC");
}

#[test]
fn ids_are_not_reused_after_delete() {
    let mut store = memory_store();
    let first = store.save(&Memo::new("t", "one")).unwrap().id.unwrap();
    store.delete(first).unwrap();
    let second = store.save(&Memo::new("t", "two")).unwrap().id.unwrap();
    assert!(second > first);
}
