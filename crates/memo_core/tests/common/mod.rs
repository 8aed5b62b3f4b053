#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use memo_core::db::{open_db_in_memory, DbError};
use memo_core::{
    Memo, MemoEditView, MemoId, MemoListView, MemoRepository, MemoStore, RepoError, RepoResult,
    SqliteMemoStore,
};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Everything a presenter asked the view to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    ShowList(Vec<MemoId>),
    Message(String),
    SelectMode(bool),
    EditMode(bool),
    Title(String),
    Content(String),
    DetailPage(MemoId),
    AddPage,
    MemoList,
    ScrollToTop,
}

#[derive(Debug, Default)]
pub struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
}

impl RecordingView {
    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ViewEvent::Message(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn last_list(&self) -> Option<Vec<MemoId>> {
        self.events().into_iter().rev().find_map(|event| match event {
            ViewEvent::ShowList(ids) => Some(ids),
            _ => None,
        })
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn push(&self, event: ViewEvent) {
        self.events.lock().push(event);
    }
}

impl MemoListView for RecordingView {
    fn show_list(&self, memos: &[Memo]) {
        self.push(ViewEvent::ShowList(
            memos.iter().filter_map(|memo| memo.id).collect(),
        ));
    }

    fn show_message(&self, text: &str) {
        self.push(ViewEvent::Message(text.to_string()));
    }

    fn toggle_select_mode(&self, enabled: bool) {
        self.push(ViewEvent::SelectMode(enabled));
    }

    fn show_memo_detail_page(&self, id: MemoId) {
        self.push(ViewEvent::DetailPage(id));
    }

    fn show_add_memo_page(&self) {
        self.push(ViewEvent::AddPage);
    }

    fn scroll_to_top(&self) {
        self.push(ViewEvent::ScrollToTop);
    }
}

impl MemoEditView for RecordingView {
    fn show_message(&self, text: &str) {
        self.push(ViewEvent::Message(text.to_string()));
    }

    fn toggle_edit_mode(&self, editable: bool) {
        self.push(ViewEvent::EditMode(editable));
    }

    fn set_title(&self, title: &str) {
        self.push(ViewEvent::Title(title.to_string()));
    }

    fn set_content(&self, content: &str) {
        self.push(ViewEvent::Content(content.to_string()));
    }

    fn show_memo_list(&self) {
        self.push(ViewEvent::MemoList);
    }
}

pub fn memory_store() -> SqliteMemoStore {
    SqliteMemoStore::try_new(open_db_in_memory().unwrap()).unwrap()
}

pub fn memory_repo() -> MemoRepository<SqliteMemoStore> {
    MemoRepository::new(memory_store())
}

/// Fixed timestamp `offset_secs` after a common base.
pub fn at(offset_secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + offset_secs, 0).unwrap()
}

/// Unsaved memo with a fixed date.
pub fn memo_at(title: &str, content: &str, offset_secs: i64) -> Memo {
    Memo {
        id: None,
        title: title.to_string(),
        content: content.to_string(),
        date: at(offset_secs),
    }
}

/// Saves memos through the repository and returns their assigned ids in order.
pub async fn seed<S: MemoStore + Send + 'static>(
    repo: &MemoRepository<S>,
    memos: Vec<Memo>,
) -> Vec<MemoId> {
    let mut ids = Vec::new();
    for memo in memos {
        ids.push(repo.save_memo(memo).await.unwrap().id.unwrap());
    }
    ids
}

/// In-memory store whose every call fails with a disk I/O error while the
/// shared switch is on.
pub struct FlakyStore {
    inner: SqliteMemoStore,
    failing: Arc<AtomicBool>,
}

/// Handle that turns storage failures of a [`FlakyStore`] on and off.
#[derive(Clone)]
pub struct StorageSwitch(Arc<AtomicBool>);

impl StorageSwitch {
    pub fn fail(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn recover(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Repository over a healthy [`FlakyStore`] plus the switch that breaks it.
pub fn flaky_repo() -> (MemoRepository<FlakyStore>, StorageSwitch) {
    let failing = Arc::new(AtomicBool::new(false));
    let store = FlakyStore {
        inner: memory_store(),
        failing: Arc::clone(&failing),
    };
    (MemoRepository::new(store), StorageSwitch(failing))
}

/// Repository whose storage fails from the first call.
pub fn broken_repo() -> MemoRepository<FlakyStore> {
    let (repo, switch) = flaky_repo();
    switch.fail();
    repo
}

impl FlakyStore {
    fn check(&self) -> RepoResult<()> {
        if !self.failing.load(Ordering::SeqCst) {
            return Ok(());
        }
        Err(RepoError::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_IOERR),
            Some("disk I/O error".to_string()),
        ))))
    }
}

impl MemoStore for FlakyStore {
    fn list_all(&self) -> RepoResult<Vec<Memo>> {
        self.check()?;
        self.inner.list_all()
    }

    fn get(&self, id: MemoId) -> RepoResult<Memo> {
        self.check()?;
        self.inner.get(id)
    }

    fn save(&mut self, memo: &Memo) -> RepoResult<Memo> {
        self.check()?;
        self.inner.save(memo)
    }

    fn delete(&mut self, id: MemoId) -> RepoResult<()> {
        self.check()?;
        self.inner.delete(id)
    }

    fn delete_all(&mut self) -> RepoResult<()> {
        self.check()?;
        self.inner.delete_all()
    }

    fn delete_many(&mut self, ids: &BTreeSet<MemoId>) -> RepoResult<()> {
        self.check()?;
        self.inner.delete_many(ids)
    }
}
