//! Presenters driving the memo screens.
//!
//! # Responsibility
//! - Turn view events into repository calls.
//! - Turn repository results (and every error) into view updates.
//!
//! # Invariants
//! - Presenter methods never block; repository work is spawned and a
//!   [`scope::Pending`] handle is returned.
//! - Completion handlers run under the presenter's state lock, one at a time.
//! - Presenter methods must be called from within a tokio runtime.

pub mod memo_edit;
pub mod memo_list;
pub mod scope;
pub mod view;
