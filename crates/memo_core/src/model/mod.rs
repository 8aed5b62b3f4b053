//! Memo domain model.
//!
//! # Responsibility
//! - Define the memo record shared by storage, repository and presenters.
//! - Own validation, display ordering and text matching rules.
//!
//! # Invariants
//! - A memo id is assigned once, by storage, and never changes afterwards.
//! - Timestamps carry millisecond precision so they survive the text codec.

pub mod memo;
