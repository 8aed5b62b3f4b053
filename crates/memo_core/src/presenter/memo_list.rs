//! Memo list presenter.
//!
//! # Responsibility
//! - Drive the sorted, filterable list screen from repository results.
//! - Own the multi-selection used for bulk delete.
//!
//! # Invariants
//! - Every successful list load resets the selection to empty.
//! - `filter` never touches the selection.
//! - After a failure the phase is settled (never left at `Loading`).
//! - Completions arriving after `unsubscribe` are discarded.

use crate::model::memo::{filter_memos, sort_by_date_desc, Memo, MemoId};
use crate::presenter::scope::{Pending, TaskScope};
use crate::presenter::view::MemoListView;
use crate::repo::local_store::{MemoStore, RepoResult};
use crate::repo::memo_repo::MemoRepository;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;

pub const MSG_LOAD_FAILED: &str = "failed to load memo list";
pub const MSG_NO_SELECTION: &str = "no memo selected";
pub const MSG_DELETE_FAILED: &str = "failed to delete memos";
pub const MSG_SEARCH_FAILED: &str = "failed to search memos";
pub const MSG_SELECT_FAILED: &str = "failed to select memos";

/// Formats the bulk-delete success message.
pub fn deleted_message(count: usize) -> String {
    format!("{count} selected memos deleted")
}

/// Lifecycle phase of the list screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListPhase {
    Idle,
    Loading,
    Loaded,
    SelectMode,
    Filtering { query: String },
}

struct ListState {
    phase: ListPhase,
    /// What the view currently shows, newest first.
    memos: Vec<Memo>,
    selection: BTreeSet<MemoId>,
    first_load: bool,
}

/// Presenter behind the memo list screen.
pub struct MemoListController<S, V> {
    repo: MemoRepository<S>,
    view: Arc<V>,
    state: Arc<Mutex<ListState>>,
    scope: TaskScope,
}

impl<S, V> MemoListController<S, V>
where
    S: MemoStore + Send + 'static,
    V: MemoListView,
{
    pub fn new(repo: MemoRepository<S>, view: Arc<V>) -> Self {
        Self {
            repo,
            view,
            state: Arc::new(Mutex::new(ListState {
                phase: ListPhase::Idle,
                memos: Vec::new(),
                selection: BTreeSet::new(),
                first_load: true,
            })),
            scope: TaskScope::new(),
        }
    }

    /// Activates the screen; the first activation forces a reload.
    pub fn subscribe(&self) -> Pending {
        let force_reload = {
            let mut state = self.state.lock();
            std::mem::replace(&mut state.first_load, false)
        };
        self.load_data(force_reload)
    }

    /// Deactivates the screen and drops every in-flight completion.
    ///
    /// The repository keeps whatever its own storage calls already applied.
    pub fn unsubscribe(&self) {
        let mut state = self.state.lock();
        self.scope.cancel_all();
        if state.phase == ListPhase::Loading {
            state.phase = ListPhase::Idle;
        }
        debug!("event=list_unsubscribe module=presenter status=ok");
    }

    /// Loads the full list, newest first, and resets the selection.
    ///
    /// `force_reload` marks the repository cache cold first and scrolls the
    /// view back to the top once the list is shown.
    pub fn load_data(&self, force_reload: bool) -> Pending {
        let was_selecting = {
            let mut state = self.state.lock();
            let was_selecting = state.phase == ListPhase::SelectMode;
            state.phase = ListPhase::Loading;
            was_selecting
        };

        let repo = self.repo.clone();
        let view = Arc::clone(&self.view);
        let shared = Arc::clone(&self.state);
        self.scope.spawn(move |token| async move {
            let result: RepoResult<Vec<Memo>> = async {
                if force_reload {
                    repo.refresh_memos().await?;
                }
                repo.get_memo_list().await
            }
            .await;

            let mut state = shared.lock();
            if token.is_cancelled() {
                return;
            }
            if was_selecting {
                view.toggle_select_mode(false);
            }
            match result {
                Ok(mut memos) => {
                    sort_by_date_desc(&mut memos);
                    state.memos = memos;
                    state.selection.clear();
                    state.phase = ListPhase::Loaded;
                    view.show_list(&state.memos);
                    if force_reload {
                        view.scroll_to_top();
                    }
                    info!(
                        "event=list_load module=presenter status=ok count={} forced={force_reload}",
                        state.memos.len()
                    );
                }
                Err(err) => {
                    state.phase = ListPhase::Idle;
                    warn!("event=list_load module=presenter status=error error={err}");
                    view.show_message(MSG_LOAD_FAILED);
                }
            }
        })
    }

    pub fn on_click_add_button(&self) {
        self.view.show_add_memo_page();
    }

    pub fn on_click_memo(&self, memo: &Memo) {
        match memo.id {
            Some(id) => self.view.show_memo_detail_page(id),
            None => debug!("event=list_click module=presenter status=skipped reason=unsaved"),
        }
    }

    /// Enters select mode from a displayed list.
    pub fn on_long_press_memo(&self, _memo: &Memo) {
        let mut state = self.state.lock();
        if !matches!(state.phase, ListPhase::Loaded | ListPhase::Filtering { .. }) {
            debug!(
                "event=list_long_press module=presenter status=skipped phase={:?}",
                state.phase
            );
            return;
        }
        state.phase = ListPhase::SelectMode;
        self.view.toggle_select_mode(true);
    }

    /// Toggles one memo in the selection. Returns whether it is now selected.
    ///
    /// Ignored outside select mode.
    pub fn select_one(&self, memo: &Memo) -> bool {
        let mut state = self.state.lock();
        let Some(id) = memo.id else {
            return false;
        };
        if state.phase != ListPhase::SelectMode {
            debug!(
                "event=list_select module=presenter status=skipped phase={:?}",
                state.phase
            );
            return false;
        }

        if state.selection.remove(&id) {
            false
        } else {
            state.selection.insert(id)
        }
    }

    /// Adds every memo matching `query` to the selection (additive).
    pub fn select_all(&self, query: impl Into<String>) -> Pending {
        let query = query.into();
        let repo = self.repo.clone();
        let view = Arc::clone(&self.view);
        let shared = Arc::clone(&self.state);
        self.scope.spawn(move |token| async move {
            let result = repo.get_memo_list().await;

            let mut state = shared.lock();
            if token.is_cancelled() {
                return;
            }
            match result {
                Ok(memos) => {
                    let before = state.selection.len();
                    state.selection.extend(
                        memos
                            .iter()
                            .filter(|memo| memo.matches(&query))
                            .filter_map(|memo| memo.id),
                    );
                    debug!(
                        "event=list_select_all module=presenter status=ok added={}",
                        state.selection.len() - before
                    );
                }
                Err(err) => {
                    warn!("event=list_select_all module=presenter status=error error={err}");
                    view.show_message(MSG_SELECT_FAILED);
                }
            }
        })
    }

    /// Clears the selection and leaves select mode.
    pub fn cancel_selection(&self) {
        let mut state = self.state.lock();
        state.selection.clear();
        if state.phase == ListPhase::SelectMode {
            state.phase = ListPhase::Loaded;
        }
        self.view.toggle_select_mode(false);
    }

    /// Deletes the selected memos, then reloads the list.
    pub fn delete_selected(&self) -> Pending {
        let ids = self.state.lock().selection.clone();
        if ids.is_empty() {
            self.view.show_message(MSG_NO_SELECTION);
            return Pending::ready();
        }

        let count = ids.len();
        let repo = self.repo.clone();
        let view = Arc::clone(&self.view);
        let shared = Arc::clone(&self.state);
        self.scope.spawn(move |token| async move {
            let result: RepoResult<Vec<Memo>> = async {
                repo.delete_memos(ids).await?;
                repo.get_memo_list().await
            }
            .await;

            let mut state = shared.lock();
            if token.is_cancelled() {
                return;
            }
            match result {
                Ok(mut memos) => {
                    sort_by_date_desc(&mut memos);
                    state.memos = memos;
                    state.selection.clear();
                    if state.phase == ListPhase::SelectMode {
                        view.toggle_select_mode(false);
                    }
                    state.phase = ListPhase::Loaded;
                    view.show_list(&state.memos);
                    view.show_message(&deleted_message(count));
                    info!("event=list_delete_selected module=presenter status=ok count={count}");
                }
                Err(err) => {
                    warn!("event=list_delete_selected module=presenter status=error error={err}");
                    view.show_message(MSG_DELETE_FAILED);
                }
            }
        })
    }

    /// Shows memos whose title or content contains `query`, newest first.
    ///
    /// An empty query shows the full list and clears the filtering phase.
    pub fn filter(&self, query: impl Into<String>) -> Pending {
        let query = query.into();
        let repo = self.repo.clone();
        let view = Arc::clone(&self.view);
        let shared = Arc::clone(&self.state);
        self.scope.spawn(move |token| async move {
            let result = repo.get_memo_list().await;

            let mut state = shared.lock();
            if token.is_cancelled() {
                return;
            }
            match result {
                Ok(memos) => {
                    state.memos = filter_memos(memos, &query);
                    if state.phase != ListPhase::SelectMode {
                        state.phase = if query.is_empty() {
                            ListPhase::Loaded
                        } else {
                            ListPhase::Filtering { query }
                        };
                    }
                    view.show_list(&state.memos);
                }
                Err(err) => {
                    warn!("event=list_filter module=presenter status=error error={err}");
                    view.show_message(MSG_SEARCH_FAILED);
                }
            }
        })
    }

    pub fn phase(&self) -> ListPhase {
        self.state.lock().phase.clone()
    }

    pub fn selection(&self) -> BTreeSet<MemoId> {
        self.state.lock().selection.clone()
    }

    /// Memos currently shown by the view.
    pub fn displayed_memos(&self) -> Vec<Memo> {
        self.state.lock().memos.clone()
    }
}
