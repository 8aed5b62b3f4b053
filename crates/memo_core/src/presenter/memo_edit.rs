//! Create/edit memo presenter.
//!
//! # Responsibility
//! - Load an existing memo into the form, or start a blank one.
//! - Validate and save form content, tracking New → Existing identity.
//!
//! # Invariants
//! - An id, once adopted from a successful save, is reused by later saves.
//! - Saves run one at a time in issue order; a save waits for the previous
//!   one, so two quick saves of a new memo create one row, then update it.
//! - Empty content never reaches the repository.

use crate::model::memo::{Memo, MemoId};
use crate::presenter::scope::{Pending, TaskScope};
use crate::presenter::view::MemoEditView;
use crate::repo::local_store::MemoStore;
use crate::repo::memo_repo::MemoRepository;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::oneshot;

pub const MSG_CONTENT_REQUIRED: &str = "content is required";
pub const MSG_CREATED: &str = "new memo saved";
pub const MSG_UPDATED: &str = "memo updated";
pub const MSG_SAVE_FAILED: &str = "failed to save memo";
pub const MSG_LOAD_FAILED: &str = "failed to load memo";
pub const MSG_DELETE_FAILED: &str = "failed to delete memo";

/// Whether the form fields are read-only or editable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    View,
    Edit,
}

struct EditState {
    id: Option<MemoId>,
    mode: EditMode,
    /// Resolves (or closes) when the most recently issued save settles.
    last_save: Option<oneshot::Receiver<()>>,
}

/// Presenter behind the create/edit screen.
pub struct MemoEditController<S, V> {
    repo: MemoRepository<S>,
    view: Arc<V>,
    state: Arc<Mutex<EditState>>,
    should_load: bool,
    scope: TaskScope,
}

impl<S, V> MemoEditController<S, V>
where
    S: MemoStore + Send + 'static,
    V: MemoEditView,
{
    /// `memo_id == None` opens a blank memo; `should_load` controls whether an
    /// existing memo is fetched on activation.
    pub fn new(
        repo: MemoRepository<S>,
        view: Arc<V>,
        memo_id: Option<MemoId>,
        should_load: bool,
    ) -> Self {
        Self {
            repo,
            view,
            state: Arc::new(Mutex::new(EditState {
                id: memo_id,
                mode: EditMode::View,
                last_save: None,
            })),
            should_load,
            scope: TaskScope::new(),
        }
    }

    /// Activates the screen.
    pub fn subscribe(&self) -> Pending {
        let id = self.state.lock().id;
        let Some(id) = id.filter(|_| self.should_load) else {
            self.enter_edit_mode();
            return Pending::ready();
        };

        let repo = self.repo.clone();
        let view = Arc::clone(&self.view);
        let shared = Arc::clone(&self.state);
        self.scope.spawn(move |token| async move {
            let result = repo.get_memo(id).await;

            let mut state = shared.lock();
            if token.is_cancelled() {
                return;
            }
            match result {
                Ok(memo) => {
                    view.set_title(&memo.title);
                    view.set_content(&memo.content);
                    state.mode = EditMode::View;
                    view.toggle_edit_mode(false);
                    debug!("event=edit_load module=presenter status=ok id={id}");
                }
                Err(err) => {
                    warn!("event=edit_load module=presenter status=error id={id} error={err}");
                    view.show_message(MSG_LOAD_FAILED);
                }
            }
        })
    }

    pub fn unsubscribe(&self) {
        let _state = self.state.lock();
        self.scope.cancel_all();
    }

    pub fn on_click_edit_mode(&self) {
        self.enter_edit_mode();
    }

    /// Validates and saves the form.
    ///
    /// Create vs update is decided when the save runs, after any earlier save
    /// from this screen has settled.
    pub fn save_memo(&self, title: impl Into<String>, content: impl Into<String>) -> Pending {
        let (title, content) = (title.into(), content.into());
        if Memo::new(title.as_str(), content.as_str()).validate().is_err() {
            debug!("event=edit_save module=presenter status=rejected reason=empty_content");
            self.view.show_message(MSG_CONTENT_REQUIRED);
            return Pending::ready();
        }

        let (settled_tx, settled_rx) = oneshot::channel();
        let previous = self.state.lock().last_save.replace(settled_rx);

        let repo = self.repo.clone();
        let view = Arc::clone(&self.view);
        let shared = Arc::clone(&self.state);
        self.scope.spawn(move |token| async move {
            // dropped with this task, so a cancelled save also releases the next one
            let _settled = settled_tx;
            if let Some(previous) = previous {
                let _ = previous.await;
            }

            let memo = match shared.lock().id {
                Some(id) => Memo::with_id(id, title, content),
                None => Memo::new(title, content),
            };
            let created = memo.is_new();
            let result = repo.save_memo(memo).await;

            let mut state = shared.lock();
            if token.is_cancelled() {
                return;
            }
            match result {
                Ok(saved) => {
                    state.id = saved.id;
                    state.mode = EditMode::View;
                    view.toggle_edit_mode(false);
                    view.show_message(if created { MSG_CREATED } else { MSG_UPDATED });
                    info!(
                        "event=edit_save module=presenter status=ok id={} created={created}",
                        saved.id.unwrap_or_default()
                    );
                }
                Err(err) => {
                    if state.mode != EditMode::Edit {
                        state.mode = EditMode::Edit;
                        view.toggle_edit_mode(true);
                    }
                    warn!("event=edit_save module=presenter status=error error={err}");
                    view.show_message(MSG_SAVE_FAILED);
                }
            }
        })
    }

    /// Deletes the memo and navigates back to the list.
    pub fn delete_memo(&self) -> Pending {
        let id = self.memo_id();
        let Some(id) = id else {
            self.view.show_memo_list();
            return Pending::ready();
        };

        let repo = self.repo.clone();
        let view = Arc::clone(&self.view);
        let shared = Arc::clone(&self.state);
        self.scope.spawn(move |token| async move {
            let result = repo.delete_memo(id).await;

            let _state = shared.lock();
            if token.is_cancelled() {
                return;
            }
            match result {
                Ok(()) => view.show_memo_list(),
                Err(err) => {
                    warn!("event=edit_delete module=presenter status=error id={id} error={err}");
                    view.show_message(MSG_DELETE_FAILED);
                }
            }
        })
    }

    pub fn memo_id(&self) -> Option<MemoId> {
        self.state.lock().id
    }

    pub fn is_new_memo(&self) -> bool {
        self.memo_id().is_none()
    }

    pub fn mode(&self) -> EditMode {
        self.state.lock().mode
    }

    fn enter_edit_mode(&self) {
        let mut state = self.state.lock();
        state.mode = EditMode::Edit;
        self.view.toggle_edit_mode(true);
    }
}
