//! Core logic for the memo app.
//! Storage, cached repository and screen presenters; the UI layer plugs in
//! through the view traits in [`presenter::view`].

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod presenter;
pub mod repo;

pub use config::{open_repository, CoreConfig, CoreInitError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::memo::{Memo, MemoId, MemoValidationError};
pub use presenter::memo_edit::{EditMode, MemoEditController};
pub use presenter::memo_list::{ListPhase, MemoListController};
pub use presenter::scope::{Pending, TaskScope};
pub use presenter::view::{MemoEditView, MemoListView};
pub use repo::local_store::{MemoStore, RepoError, RepoResult, SqliteMemoStore};
pub use repo::memo_repo::MemoRepository;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
