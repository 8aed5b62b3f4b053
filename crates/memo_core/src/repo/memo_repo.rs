//! Cached, asynchronous memo repository.
//!
//! # Responsibility
//! - Be the single entry point presenters use to read and write memos.
//! - Keep an in-memory cache reconciled with the local store.
//! - Move blocking storage work off async threads.
//!
//! # Invariants
//! - Store and cache sit behind one lock; every storage call and its cache
//!   update are applied as one unit, so the cache never reflects a write
//!   the store has not committed, and an acknowledged write is already in
//!   the cache when the caller sees the result.
//! - Overlapping writes are serialized; a concurrent read observes either
//!   the pre- or post-write state.
//! - The cache is only mutated in response to storage calls issued here.

use crate::model::memo::{Memo, MemoId};
use crate::repo::local_store::{MemoStore, RepoError, RepoResult};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tokio::task;

struct RepoState<S> {
    store: S,
    cache: HashMap<MemoId, Memo>,
    /// Set by `refresh_memos`; cached values are not trusted until the next list read.
    cache_is_dirty: bool,
}

/// Memo repository shared by presenters.
///
/// Cloning is cheap and every clone talks to the same store and cache.
/// Async methods must be called from within a tokio runtime.
pub struct MemoRepository<S> {
    shared: Arc<Mutex<RepoState<S>>>,
}

impl<S> Clone for MemoRepository<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: MemoStore + Send + 'static> MemoRepository<S> {
    /// Creates a repository with a cold cache over `store`.
    pub fn new(store: S) -> Self {
        Self {
            shared: Arc::new(Mutex::new(RepoState {
                store,
                cache: HashMap::new(),
                cache_is_dirty: true,
            })),
        }
    }

    /// Lists every memo and replaces the cache with exactly that set.
    pub async fn get_memo_list(&self) -> RepoResult<Vec<Memo>> {
        self.run("memo_list", |state| {
            let memos = state.store.list_all()?;
            state.cache = memos
                .iter()
                .filter_map(|memo| memo.id.map(|id| (id, memo.clone())))
                .collect();
            state.cache_is_dirty = false;
            Ok(memos)
        })
        .await
    }

    /// Gets one memo.
    ///
    /// A cached value newer than the stored row wins, so a read never rewinds
    /// past a write this repository already acknowledged.
    pub async fn get_memo(&self, id: MemoId) -> RepoResult<Memo> {
        self.run("memo_get", move |state| match state.store.get(id) {
            Ok(stored) => {
                let fresh = match state.cache.get(&id) {
                    Some(cached) if !state.cache_is_dirty && cached.date > stored.date => {
                        cached.clone()
                    }
                    _ => stored,
                };
                state.cache.insert(id, fresh.clone());
                Ok(fresh)
            }
            Err(RepoError::NotFound(missing)) => {
                state.cache.remove(&missing);
                Err(RepoError::NotFound(missing))
            }
            Err(err) => Err(err),
        })
        .await
    }

    /// Saves a memo; a memo without id is created and receives one here.
    pub async fn save_memo(&self, memo: Memo) -> RepoResult<Memo> {
        let created = memo.is_new();
        let saved = self
            .run("memo_save", move |state| {
                let saved = state.store.save(&memo)?;
                if let Some(id) = saved.id {
                    state.cache.insert(id, saved.clone());
                }
                Ok(saved)
            })
            .await?;

        info!(
            "event=memo_save module=repo status=ok id={} created={created}",
            saved.id.unwrap_or_default()
        );
        Ok(saved)
    }

    /// Deletes one memo; a missing id is not an error.
    pub async fn delete_memo(&self, id: MemoId) -> RepoResult<()> {
        self.run("memo_delete", move |state| {
            state.store.delete(id)?;
            state.cache.remove(&id);
            Ok(())
        })
        .await?;

        info!("event=memo_delete module=repo status=ok id={id}");
        Ok(())
    }

    /// Deletes every memo whose id is in `ids` as one batch.
    pub async fn delete_memos(&self, ids: BTreeSet<MemoId>) -> RepoResult<()> {
        let requested = ids.len();
        self.run("memo_delete_many", move |state| {
            state.store.delete_many(&ids)?;
            for id in &ids {
                state.cache.remove(id);
            }
            Ok(())
        })
        .await?;

        info!("event=memo_delete_many module=repo status=ok requested={requested}");
        Ok(())
    }

    /// Deletes every memo and empties the cache.
    pub async fn delete_all_memos(&self) -> RepoResult<()> {
        self.run("memo_delete_all", |state| {
            state.store.delete_all()?;
            state.cache.clear();
            Ok(())
        })
        .await?;

        info!("event=memo_delete_all module=repo status=ok");
        Ok(())
    }

    /// Marks the cache cold; the next list read rebuilds it from storage.
    pub async fn refresh_memos(&self) -> RepoResult<()> {
        self.run("memo_refresh", |state| {
            state.cache_is_dirty = true;
            Ok(())
        })
        .await
    }

    /// Returns the cached value for `id`, if any.
    ///
    /// May wait for an in-flight storage call to release the lock.
    pub fn cached_memo(&self, id: MemoId) -> Option<Memo> {
        self.shared.lock().cache.get(&id).cloned()
    }

    /// Number of cached memos.
    pub fn cached_len(&self) -> usize {
        self.shared.lock().cache.len()
    }

    async fn run<T, F>(&self, event: &'static str, op: F) -> RepoResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut RepoState<S>) -> RepoResult<T> + Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        let started_at = Instant::now();
        let outcome = task::spawn_blocking(move || {
            let mut state = shared.lock();
            op(&mut *state)
        })
        .await
        .map_err(|err| RepoError::Worker(err.to_string()))?;

        match &outcome {
            Ok(_) => debug!(
                "event={event} module=repo status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(RepoError::NotFound(id)) => debug!(
                "event={event} module=repo status=not_found id={id} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event={event} module=repo status=error duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            ),
        }
        outcome
    }
}
