//! Per-presenter cancellation scope for in-flight repository work.
//!
//! # Invariants
//! - `cancel_all` cancels every task spawned since the previous call.
//! - Tasks spawned after `cancel_all` run under a fresh token.
//! - Dropping the scope cancels whatever is still in flight.

use log::warn;
use parking_lot::Mutex;
use std::future::Future;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Handle to presenter work that completes later.
///
/// Dropping it does not cancel the work; cancellation belongs to the scope.
#[derive(Debug)]
pub struct Pending {
    handle: Option<JoinHandle<()>>,
}

impl Pending {
    /// Work that already finished synchronously (validation, navigation).
    pub(crate) fn ready() -> Self {
        Self { handle: None }
    }

    /// Returns whether the work has finished or was cancelled.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Waits until the work has completed or was cancelled.
    pub async fn wait(self) {
        let Some(handle) = self.handle else {
            return;
        };
        if let Err(err) = handle.await {
            warn!("event=presenter_task module=presenter status=error error={err}");
        }
    }
}

/// Cancellation scope owned by one presenter instance.
#[derive(Debug, Default)]
pub struct TaskScope {
    token: Mutex<CancellationToken>,
}

impl TaskScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `task` on the tokio runtime under the current token.
    ///
    /// The builder receives the token so completion handlers can re-check it
    /// after taking the presenter lock.
    pub fn spawn<B, F>(&self, build: B) -> Pending
    where
        B: FnOnce(CancellationToken) -> F,
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.token.lock().clone();
        let work = build(token.clone());
        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = work => {}
            }
        });
        Pending {
            handle: Some(handle),
        }
    }

    /// Cancels all outstanding work and re-arms the scope.
    pub fn cancel_all(&self) {
        let mut token = self.token.lock();
        token.cancel();
        *token = CancellationToken::new();
    }
}

impl Drop for TaskScope {
    fn drop(&mut self) {
        self.token.get_mut().cancel();
    }
}
