//! # Pool handle: the submitter-facing surface.
//!
//! [`PoolHandle`] is a cheap clone-able handle over the pool actor's command
//! channel. All bookkeeping lives inside the actor; the handle only shuttles
//! commands and awaits their responses.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::error::{PoolError, TaskError};
use crate::pool::status::PoolStatus;
use crate::workers::Worker;

/// Commands accepted by the pool actor.
pub(crate) enum Command<W: Worker> {
    Submit {
        kind: Arc<str>,
        payload: W::Payload,
        priority: i32,
        respond: oneshot::Sender<Result<W::Output, TaskError>>,
    },
    Initialize {
        respond: oneshot::Sender<Result<(), PoolError>>,
    },
    Status {
        respond: oneshot::Sender<PoolStatus>,
    },
    Terminate {
        respond: oneshot::Sender<()>,
    },
}

/// Handle to a running [`Pool`](crate::Pool).
///
/// Clones share the same pool. The pool actor stays alive while at least one
/// handle exists (a terminated pool keeps answering [`status`](Self::status)
/// with zeroed gauges).
pub struct PoolHandle<W: Worker> {
    name: Arc<str>,
    cmd: mpsc::Sender<Command<W>>,
}

impl<W: Worker> Clone for PoolHandle<W> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            cmd: self.cmd.clone(),
        }
    }
}

impl<W: Worker> PoolHandle<W> {
    pub(crate) fn new(name: Arc<str>, cmd: mpsc::Sender<Command<W>>) -> Self {
        Self { name, cmd }
    }

    /// The pool's workload name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Submits a task and waits for its terminal outcome.
    ///
    /// The returned future is pending from admission until the task
    /// completes, fails, or times out; callers may await many submissions
    /// concurrently. Higher `priority` dispatches first; among equal
    /// priorities, submission order wins. Admission is never rejected for
    /// queue depth.
    pub async fn submit(
        &self,
        kind: impl Into<Arc<str>>,
        payload: W::Payload,
        priority: i32,
    ) -> Result<W::Output, TaskError> {
        let (respond, rx) = oneshot::channel();
        let cmd = Command::Submit {
            kind: kind.into(),
            payload,
            priority,
            respond,
        };
        self.cmd.send(cmd).await.map_err(|_| TaskError::Terminated)?;
        rx.await.map_err(|_| TaskError::Terminated)?
    }

    /// Spawns the initial worker batch (`ceil(max_units / 2)`) and waits for
    /// every handshake.
    ///
    /// Fails with the first spawn error; workers that did become ready stay
    /// in the pool. There is no implicit retry — the caller decides.
    pub async fn initialize(&self) -> Result<(), PoolError> {
        let (respond, rx) = oneshot::channel();
        self.cmd
            .send(Command::Initialize { respond })
            .await
            .map_err(|_| PoolError::Closed)?;
        rx.await.map_err(|_| PoolError::Closed)?
    }

    /// Returns a point-in-time status snapshot.
    pub async fn status(&self) -> Result<PoolStatus, PoolError> {
        let (respond, rx) = oneshot::channel();
        self.cmd
            .send(Command::Status { respond })
            .await
            .map_err(|_| PoolError::Closed)?;
        rx.await.map_err(|_| PoolError::Closed)
    }

    /// Destroys every worker and rejects all pending tasks with
    /// [`TaskError::Terminated`]. Workers are never replaced afterwards.
    ///
    /// Idempotent: terminating a terminated pool is a no-op.
    pub async fn terminate(&self) {
        let (respond, rx) = oneshot::channel();
        if self.cmd.send(Command::Terminate { respond }).await.is_ok() {
            let _ = rx.await;
        }
    }
}
