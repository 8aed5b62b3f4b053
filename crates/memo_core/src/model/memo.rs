//! Memo entity and helpers.
//!
//! # Responsibility
//! - Define the canonical memo record.
//! - Provide the date text codec used by the `memos.date` column.
//! - Provide display ordering and query matching used by list presenters.
//!
//! # Invariants
//! - `id == None` means the memo has never been persisted.
//! - `content` must be non-empty before any write.
//! - `date` is truncated to milliseconds.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned memo identifier (`memos.id`).
pub type MemoId = i64;

/// Fixed text representation of `memos.date`, always UTC.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Validation failures raised before a memo reaches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoValidationError {
    /// `content` is empty.
    EmptyContent,
}

impl Display for MemoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyContent => write!(f, "memo content must not be empty"),
        }
    }
}

impl Error for MemoValidationError {}

/// Canonical memo record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memo {
    /// Durable id, `None` until the first successful save.
    pub id: Option<MemoId>,
    /// Optional title; empty is allowed.
    pub title: String,
    /// Body text; required.
    pub content: String,
    /// Last save time.
    pub date: DateTime<Utc>,
}

impl Memo {
    /// Creates an unsaved memo stamped with the current time.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            content: content.into(),
            date: now_timestamp(),
        }
    }

    /// Creates a memo bound to an existing id, stamped with the current time.
    ///
    /// Used by edit flows where identity already exists in storage.
    pub fn with_id(id: MemoId, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            ..Self::new(title, content)
        }
    }

    /// Returns whether this memo has never been persisted.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Checks write-path invariants.
    ///
    /// # Errors
    /// - `EmptyContent` when `content` is empty. Title has no constraint.
    pub fn validate(&self) -> Result<(), MemoValidationError> {
        if self.content.is_empty() {
            return Err(MemoValidationError::EmptyContent);
        }
        Ok(())
    }

    /// Exact substring match on title or content. Empty query matches all.
    pub fn matches(&self, query: &str) -> bool {
        self.title.contains(query) || self.content.contains(query)
    }
}

/// Current time truncated to the precision of [`DATE_FORMAT`].
pub fn now_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Encodes a timestamp for the `memos.date` column.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Decodes a `memos.date` value written by [`format_date`].
pub fn parse_date(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value.trim(), DATE_FORMAT).map(|naive| naive.and_utc())
}

/// Sorts memos newest first; equal dates fall back to id descending.
pub fn sort_by_date_desc(memos: &mut [Memo]) {
    memos.sort_by(|left, right| match right.date.cmp(&left.date) {
        Ordering::Equal => right.id.cmp(&left.id),
        other => other,
    });
}

/// Keeps memos matching `query`, newest first.
pub fn filter_memos(memos: Vec<Memo>, query: &str) -> Vec<Memo> {
    let mut matched: Vec<Memo> = memos.into_iter().filter(|memo| memo.matches(query)).collect();
    sort_by_date_desc(&mut matched);
    matched
}

#[cfg(test)]
mod tests {
    use super::{
        filter_memos, format_date, now_timestamp, parse_date, sort_by_date_desc, Memo,
        MemoValidationError,
    };
    use chrono::{Duration, TimeZone, Utc};

    fn memo_at(id: i64, title: &str, content: &str, secs: i64) -> Memo {
        Memo {
            id: Some(id),
            title: title.to_string(),
            content: content.to_string(),
            date: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
        }
    }

    #[test]
    fn validate_rejects_empty_content_only() {
        assert_eq!(
            Memo::new("title", "").validate(),
            Err(MemoValidationError::EmptyContent)
        );
        assert!(Memo::new("", "body").validate().is_ok());
    }

    #[test]
    fn date_text_roundtrip_is_exact() {
        let now = now_timestamp();
        let parsed = parse_date(&format_date(&now)).unwrap();
        assert_eq!(parsed, now);
    }

    #[test]
    fn parse_date_rejects_foreign_format() {
        assert!(parse_date("Mon Jan 01 2024").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn sort_orders_newest_first_with_id_tiebreak() {
        let mut memos = vec![
            memo_at(1, "a", "x", 0),
            memo_at(2, "b", "x", 10),
            memo_at(3, "c", "x", 10),
        ];
        sort_by_date_desc(&mut memos);
        let ids: Vec<_> = memos.iter().map(|memo| memo.id.unwrap()).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn filter_matches_title_or_content_substring() {
        let memos = vec![
            memo_at(1, "abc", "x", 0),
            memo_at(2, "y", "abcd", 5),
            memo_at(3, "y", "z", 10),
        ];
        let filtered = filter_memos(memos, "abc");
        let ids: Vec<_> = filtered.iter().map(|memo| memo.id.unwrap()).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let memo = memo_at(1, "Groceries", "milk", 0);
        assert!(memo.matches("Groc"));
        assert!(!memo.matches("groc"));
        assert!(memo.matches(""));
    }

    #[test]
    fn with_id_keeps_identity_and_stamps_date() {
        let before = now_timestamp() - Duration::seconds(1);
        let memo = Memo::with_id(7, "t", "c");
        assert_eq!(memo.id, Some(7));
        assert!(!memo.is_new());
        assert!(memo.date >= before);
    }

    #[test]
    fn memo_serializes_with_stable_field_names() {
        let memo = memo_at(4, "t", "c", 0);
        let json = serde_json::to_value(&memo).unwrap();
        assert_eq!(json["id"], 4);
        assert_eq!(json["title"], "t");
        assert_eq!(json["content"], "c");
        assert!(json["date"].is_string());
    }
}
