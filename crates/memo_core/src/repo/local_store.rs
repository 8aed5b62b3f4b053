//! Local memo persistence contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide raw CRUD over the `memos` table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `Memo::validate()` before SQL mutations.
//! - `save` is an upsert applied inside one IMMEDIATE transaction, and the
//!   memo it returns equals what a later read of that row yields.
//! - A row whose date text cannot be parsed is still returned, stamped with
//!   the current time.
//! - Deleting ids that do not exist is a no-op, never an error.

use crate::db::migrations::ensure_memo_schema;
use crate::db::DbError;
use crate::model::memo::{
    format_date, now_timestamp, parse_date, Memo, MemoId, MemoValidationError,
};
use chrono::SubsecRound;
use log::{debug, warn};
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const MEMO_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    date
FROM memos";

/// Upper bound for ids bound into one `IN (...)` statement.
const DELETE_CHUNK_SIZE: usize = 500;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for memo persistence and repository operations.
#[derive(Debug)]
pub enum RepoError {
    /// Memo rejected before reaching storage.
    Validation(MemoValidationError),
    /// SQLite or bootstrap failure.
    Db(DbError),
    /// Requested id has no row.
    NotFound(MemoId),
    /// Blocking storage task panicked or was aborted.
    Worker(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "memo not found: {id}"),
            Self::Worker(message) => write!(f, "storage task failed: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::Worker(_) => None,
        }
    }
}

impl From<MemoValidationError> for RepoError {
    fn from(value: MemoValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence interface for memo rows keyed by id.
pub trait MemoStore {
    /// Returns every stored memo, unordered.
    fn list_all(&self) -> RepoResult<Vec<Memo>>;
    /// Returns one memo or `NotFound`.
    fn get(&self, id: MemoId) -> RepoResult<Memo>;
    /// Inserts or updates; the returned memo carries the durable id.
    fn save(&mut self, memo: &Memo) -> RepoResult<Memo>;
    /// Removes one row if present.
    fn delete(&mut self, id: MemoId) -> RepoResult<()>;
    /// Removes every row.
    fn delete_all(&mut self) -> RepoResult<()>;
    /// Removes exactly the rows whose id is in `ids`, as one batch.
    fn delete_many(&mut self, ids: &BTreeSet<MemoId>) -> RepoResult<()>;
}

/// SQLite-backed memo store owning its connection.
pub struct SqliteMemoStore {
    conn: Connection,
}

impl SqliteMemoStore {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `DbError::MissingSchema` when the `memos` table or one of its
    ///   columns is missing.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        ensure_memo_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl MemoStore for SqliteMemoStore {
    fn list_all(&self) -> RepoResult<Vec<Memo>> {
        let mut stmt = self.conn.prepare(&format!("{MEMO_SELECT_SQL};"))?;
        let mut rows = stmt.query([])?;
        let mut memos = Vec::new();
        while let Some(row) = rows.next()? {
            memos.push(parse_memo_row(row)?);
        }

        debug!(
            "event=memo_list module=store status=ok count={}",
            memos.len()
        );
        Ok(memos)
    }

    fn get(&self, id: MemoId) -> RepoResult<Memo> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEMO_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return parse_memo_row(row);
        }

        Err(RepoError::NotFound(id))
    }

    fn save(&mut self, memo: &Memo) -> RepoResult<Memo> {
        memo.validate()?;

        // The column keeps milliseconds only.
        let date = memo.date.trunc_subsecs(3);
        let date_text = format_date(&date);
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let (id, created) = match memo.id {
            None => {
                tx.execute(
                    "INSERT INTO memos (title, content, date) VALUES (?1, ?2, ?3);",
                    params![memo.title.as_str(), memo.content.as_str(), date_text],
                )?;
                (tx.last_insert_rowid(), true)
            }
            Some(id) => {
                let inserted = tx.execute(
                    "INSERT OR IGNORE INTO memos (id, title, content, date)
                     VALUES (?1, ?2, ?3, ?4);",
                    params![id, memo.title.as_str(), memo.content.as_str(), date_text],
                )?;
                if inserted == 0 {
                    tx.execute(
                        "UPDATE memos
                         SET
                            title = ?2,
                            content = ?3,
                            date = ?4
                         WHERE id = ?1;",
                        params![id, memo.title.as_str(), memo.content.as_str(), date_text],
                    )?;
                }
                (id, inserted > 0)
            }
        };
        tx.commit()?;

        debug!("event=memo_save module=store status=ok id={id} created={created}");
        Ok(Memo {
            id: Some(id),
            title: memo.title.clone(),
            content: memo.content.clone(),
            date,
        })
    }

    fn delete(&mut self, id: MemoId) -> RepoResult<()> {
        let removed = self
            .conn
            .execute("DELETE FROM memos WHERE id = ?1;", [id])?;
        debug!("event=memo_delete module=store status=ok id={id} removed={removed}");
        Ok(())
    }

    fn delete_all(&mut self) -> RepoResult<()> {
        let removed = self.conn.execute("DELETE FROM memos;", [])?;
        debug!("event=memo_delete_all module=store status=ok removed={removed}");
        Ok(())
    }

    fn delete_many(&mut self, ids: &BTreeSet<MemoId>) -> RepoResult<()> {
        if ids.is_empty() {
            debug!("event=memo_delete_many module=store status=skipped requested=0");
            return Ok(());
        }

        let ids: Vec<MemoId> = ids.iter().copied().collect();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut removed = 0;
        for chunk in ids.chunks(DELETE_CHUNK_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            removed += tx.execute(
                &format!("DELETE FROM memos WHERE id IN ({placeholders});"),
                params_from_iter(chunk.iter()),
            )?;
        }
        tx.commit()?;

        debug!(
            "event=memo_delete_many module=store status=ok requested={} removed={removed}",
            ids.len()
        );
        Ok(())
    }
}

fn parse_memo_row(row: &Row<'_>) -> RepoResult<Memo> {
    let id: MemoId = row.get("id")?;
    let date_text: String = row.get("date")?;
    let date = match parse_date(&date_text) {
        Ok(date) => date,
        Err(err) => {
            warn!(
                "event=memo_date_recovered module=store status=warn id={id} error={err}"
            );
            now_timestamp()
        }
    };

    Ok(Memo {
        id: Some(id),
        title: row.get("title")?,
        content: row.get("content")?,
        date,
    })
}
