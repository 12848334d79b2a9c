//! Single-flight lifecycle shared by every operator.
//!
//! `Uninitialized -> Initializing -> Ready`. While a start-up is in flight, later
//! callers wait on the same attempt through a watch channel instead of starting
//! their own. A failed attempt returns to `Uninitialized` and every waiter sees
//! the failure.

use crate::errors::{OperatorError, Result};
use parking_lot::Mutex;
use std::future::Future;
use tokio::sync::watch;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Ready,
}

/// Outcome broadcast to waiters. `None` until the leader finishes.
type Outcome = Option<std::result::Result<(), String>>;

enum Inner {
    Uninitialized,
    Initializing(watch::Receiver<Outcome>),
    Ready,
}

enum Role {
    Done,
    Wait(watch::Receiver<Outcome>),
    Lead(watch::Sender<Outcome>),
}

pub struct Lifecycle {
    inner: Mutex<Inner>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Resets the state if the leading future is dropped before it finishes.
struct LeaderGuard<'a> {
    lifecycle: &'a Lifecycle,
    armed: bool,
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("[lifecycle] initialization dropped before completion, resetting");
            *self.lifecycle.inner.lock() = Inner::Uninitialized;
        }
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::Uninitialized),
        }
    }

    pub fn state(&self) -> LifecycleState {
        match &*self.inner.lock() {
            Inner::Uninitialized => LifecycleState::Uninitialized,
            Inner::Initializing(_) => LifecycleState::Initializing,
            Inner::Ready => LifecycleState::Ready,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state() == LifecycleState::Ready
    }

    /// Run `init` unless the lifecycle is ready or another caller is already running it.
    ///
    /// `init` is only polled by the caller that becomes the leader; other callers
    /// drop it unpolled and wait for the leader's outcome.
    pub async fn ensure<F>(&self, init: F) -> Result<()>
    where
        F: Future<Output = Result<()>>,
    {
        let role = {
            let mut inner = self.inner.lock();
            match &*inner {
                Inner::Ready => Role::Done,
                Inner::Initializing(rx) => Role::Wait(rx.clone()),
                Inner::Uninitialized => {
                    let (tx, rx) = watch::channel(None);
                    *inner = Inner::Initializing(rx);
                    Role::Lead(tx)
                }
            }
        };

        match role {
            Role::Done => Ok(()),
            Role::Wait(mut rx) => {
                debug!("[lifecycle] waiting on in-flight initialization");
                let outcome = rx
                    .wait_for(|outcome| outcome.is_some())
                    .await
                    .map(|outcome| outcome.clone())
                    .map_err(|_| {
                        OperatorError::Initialization("initialization was abandoned".to_string())
                    })?;
                match outcome {
                    Some(Ok(())) => Ok(()),
                    Some(Err(message)) => Err(OperatorError::Initialization(message)),
                    None => Err(OperatorError::Initialization(
                        "initialization produced no outcome".to_string(),
                    )),
                }
            }
            Role::Lead(tx) => {
                let mut guard = LeaderGuard {
                    lifecycle: self,
                    armed: true,
                };
                let result = init.await;
                {
                    let mut inner = self.inner.lock();
                    *inner = if result.is_ok() {
                        Inner::Ready
                    } else {
                        Inner::Uninitialized
                    };
                }
                guard.armed = false;
                let shared = result.as_ref().map(|_| ()).map_err(|e| e.to_string());
                // No receivers left is fine: nobody was waiting.
                let _ = tx.send(Some(shared));
                result
            }
        }
    }

    /// Back to `Uninitialized`, e.g. after the backend was released.
    pub fn reset(&self) {
        *self.inner.lock() = Inner::Uninitialized;
    }
}
