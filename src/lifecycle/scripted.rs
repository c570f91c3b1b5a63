//! Scripted delays standing in for real asynchronous work.
//!
//! A [`ScriptedTask`] resolves to its output after a fixed delay unless its
//! token is cancelled first. Swapping one for real I/O keeps the same
//! cancellation contract.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

use crate::lifecycle::CancelToken;

/// The task was cancelled before its delay elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("task cancelled")]
pub struct Cancelled;

/// A boxed task future, storable across `select!` iterations.
pub type PendingTask<T> = Pin<Box<dyn Future<Output = Result<T, Cancelled>> + Send>>;

/// Fixed-delay task with a cancellation token.
#[derive(Debug)]
pub struct ScriptedTask<T> {
    delay: Duration,
    output: T,
    cancel: CancelToken,
}

impl<T: Send + 'static> ScriptedTask<T> {
    pub fn new(delay: Duration, output: T, cancel: CancelToken) -> Self {
        Self {
            delay,
            output,
            cancel,
        }
    }

    /// Wait for the delay, or for cancellation, whichever comes first.
    pub async fn run(mut self) -> Result<T, Cancelled> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Cancelled),
            _ = tokio::time::sleep(self.delay) => Ok(self.output),
        }
    }

    /// Box the task so it can be held in an `Option` by a state owner.
    pub fn boxed(self) -> PendingTask<T> {
        Box::pin(self.run())
    }
}

/// Await `task` if present; pend forever otherwise.
pub async fn poll_pending<T>(task: &mut Option<PendingTask<T>>) -> Result<T, Cancelled> {
    match task {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}
