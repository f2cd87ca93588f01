//! Background task handles
//!
//! Every user-level action runs on its own tokio task. The caller gets a
//! handle carrying the task's cancellation token and its join handle;
//! nothing is pooled or queued.

use crate::error::{Error, Result};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Handle to a single-result background action
///
/// Cancelling drops the action's future at its next await point and the
/// handle resolves to [`Error::Cancelled`]. External processes that were
/// already started keep running.
#[derive(Debug)]
pub struct TaskHandle<T> {
    cancel: CancellationToken,
    join: tokio::task::JoinHandle<Result<T>>,
}

impl<T: Send + 'static> TaskHandle<T> {
    /// Spawn `future` on the runtime
    pub(crate) fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let join = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(Error::Cancelled),
                result = future => result,
            }
        });
        Self { cancel, join }
    }
}

impl<T> TaskHandle<T> {
    /// Request cancellation
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The token observed by the task
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Whether the task has finished
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the action's result
    pub async fn join(self) -> Result<T> {
        join_task(self.join).await?
    }
}

/// Await a spawned task, turning panics and aborts into [`Error::Task`]
pub(crate) async fn join_task<T>(join: tokio::task::JoinHandle<T>) -> Result<T> {
    join.await.map_err(|e| {
        if e.is_panic() {
            Error::Task(format!("task panicked: {e}"))
        } else {
            Error::Task(format!("task aborted: {e}"))
        }
    })
}
