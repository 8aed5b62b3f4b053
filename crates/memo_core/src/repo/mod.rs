//! Memo persistence and repository layers.
//!
//! # Responsibility
//! - `local_store`: raw SQLite CRUD over the `memos` table.
//! - `memo_repo`: cached async repository consumed by presenters.
//!
//! # Invariants
//! - Store errors reach presenters unchanged through the repository.
//! - Only the repository mutates its cache.

pub mod local_store;
pub mod memo_repo;
