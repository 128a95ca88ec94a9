//! # Worker runtime: the loop driving one program inside one unit.
//!
//! Each unit is a spawned tokio task that owns its [`Worker`] instance and
//! talks to the pool exclusively through channels:
//!
//! ```text
//! pool ── Job ──► [inbox] ──► worker_loop ── Notice ──► [feed] ──► pool actor
//!
//! worker_loop:
//!   ├─► init()            → Notice::Reply(Ready)       (handshake)
//!   │       └─ Err/panic  → Notice::Down, exit
//!   └─► loop: recv job
//!         ├─► process(job) → Notice::Reply(Completed)
//!         │        ├─ Fail  → Notice::Reply(Failed)     (worker survives)
//!         │        └─ Fatal/panic → Notice::Down, exit
//!         └─► token cancelled / inbox closed → exit
//! ```
//!
//! ## Rules
//! - Jobs are processed **strictly sequentially**; the inbox preserves order.
//! - Panics are caught and converted into a fatal [`Notice::Down`] — a broken
//!   program never takes the runtime down with it.
//! - The loop exits silently once the pool side is gone (feed closed).

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::WorkerError;
use crate::workers::protocol::{Job, Reply, UnitId};
use crate::workers::worker::Worker;

/// Unit-to-pool notice: a protocol reply or a fatal exit.
///
/// `Down` is the Rust rendering of the host runtime's unit-error channel —
/// it is not part of the reply protocol and always ends the unit.
pub(crate) enum Notice<W: Worker> {
    /// A protocol reply from the given unit.
    Reply {
        unit: UnitId,
        reply: Reply<W::Output>,
    },
    /// The unit suffered a fatal error and has exited.
    Down { unit: UnitId, error: String },
}

/// Spawns the worker loop for one unit.
pub(crate) fn spawn_worker<W: Worker>(
    unit: UnitId,
    worker: W,
    inbox: mpsc::UnboundedReceiver<Job<W::Payload>>,
    feed: mpsc::Sender<Notice<W>>,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(worker_loop(unit, worker, inbox, feed, token))
}

async fn worker_loop<W: Worker>(
    unit: UnitId,
    mut worker: W,
    mut inbox: mpsc::UnboundedReceiver<Job<W::Payload>>,
    feed: mpsc::Sender<Notice<W>>,
    token: CancellationToken,
) {
    // Handshake: init must succeed before the unit is eligible for dispatch.
    match std::panic::AssertUnwindSafe(worker.init())
        .catch_unwind()
        .await
    {
        Ok(Ok(())) => {
            let ready = Notice::Reply {
                unit,
                reply: Reply::Ready,
            };
            if feed.send(ready).await.is_err() {
                return;
            }
        }
        Ok(Err(e)) => {
            let _ = feed
                .send(Notice::Down {
                    unit,
                    error: e.to_string(),
                })
                .await;
            return;
        }
        Err(panic) => {
            let _ = feed
                .send(Notice::Down {
                    unit,
                    error: panic_message(panic),
                })
                .await;
            return;
        }
    }

    loop {
        let job = tokio::select! {
            _ = token.cancelled() => break,
            job = inbox.recv() => match job {
                Some(job) => job,
                None => break,
            },
        };
        let id = job.id;

        let outcome = std::panic::AssertUnwindSafe(worker.process(job))
            .catch_unwind()
            .await;

        let notice = match outcome {
            Ok(Ok(output)) => Notice::Reply {
                unit,
                reply: Reply::Completed { id, output },
            },
            Ok(Err(WorkerError::Fail { error })) => Notice::Reply {
                unit,
                reply: Reply::Failed { id, error },
            },
            Ok(Err(e)) => Notice::Down {
                unit,
                error: e.to_string(),
            },
            Err(panic) => Notice::Down {
                unit,
                error: panic_message(panic),
            },
        };

        let fatal = matches!(notice, Notice::Down { .. });
        if feed.send(notice).await.is_err() || fatal {
            break;
        }
    }
}

/// Extracts a printable message from a caught panic payload.
fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    let any = &*panic;
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        format!("panicked: {msg}")
    } else if let Some(msg) = any.downcast_ref::<String>() {
        format!("panicked: {msg}")
    } else {
        "panicked: unknown panic".to_string()
    }
}
