//! View capabilities consumed by presenters.
//!
//! Implemented by the UI layer. Presenters call these from their completion
//! context, one call at a time per presenter.

use crate::model::memo::{Memo, MemoId};

/// Memo list screen.
pub trait MemoListView: Send + Sync + 'static {
    /// Replaces the displayed list (already sorted).
    fn show_list(&self, memos: &[Memo]);
    fn show_message(&self, text: &str);
    fn toggle_select_mode(&self, enabled: bool);
    /// Navigates to the detail/edit screen for `id`.
    fn show_memo_detail_page(&self, id: MemoId);
    fn show_add_memo_page(&self);
    fn scroll_to_top(&self);
}

/// Create/edit screen for one memo.
pub trait MemoEditView: Send + Sync + 'static {
    fn show_message(&self, text: &str);
    /// `true` makes title/content editable.
    fn toggle_edit_mode(&self, editable: bool);
    fn set_title(&self, title: &str);
    fn set_content(&self, content: &str);
    /// Navigates back to the list screen.
    fn show_memo_list(&self);
}
