//! # Message protocol between the pool and its workers.
//!
//! The only things that cross the worker boundary are values of these types;
//! no memory is shared with the scheduler. Every message is a variant of an
//! exhaustively matched sum type rather than a stringly-tagged object.
//!
//! ```text
//! pool ── Job { id, kind, payload } ──► worker
//! pool ◄── Reply::Ready ─────────────── worker   (handshake, once per worker)
//! pool ◄── Reply::Completed { id, … } ─ worker
//! pool ◄── Reply::Failed { id, … } ──── worker
//! ```
//!
//! Fatal worker conditions are not replies: they travel as a separate notice
//! on the pool's internal channel (see `workers::runtime`).
//!
//! ## Rules
//! - Task ids are allocated by the pool, strictly monotone, and never reused.
//! - A reply whose id is not currently tracked by the pool is dropped.

use std::sync::Arc;

/// Identifier of one submitted task. Monotone, never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub(crate) u64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Identifier of one worker slot. Monotone across the pool's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub(crate) u64);

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unit-{}", self.0)
    }
}

/// One dispatched unit of work, as seen by a worker.
///
/// `kind` discriminates job flavors for workers that handle more than one;
/// `priority` never reaches the worker — ordering is the scheduler's concern.
pub struct Job<P> {
    /// Pool-assigned task identifier; echoed back in the reply.
    pub id: TaskId,
    /// Job flavor, e.g. `"embed"`.
    pub kind: Arc<str>,
    /// Caller-supplied input.
    pub payload: P,
}

/// A worker's message back to the pool.
pub enum Reply<O> {
    /// Handshake: the worker finished `init` and is eligible for dispatch.
    ///
    /// Carries no id. The first `Ready` per worker resolves its creation;
    /// it is sent exactly once by the worker runtime.
    Ready,
    /// The job identified by `id` completed successfully.
    Completed {
        /// Id of the completed task.
        id: TaskId,
        /// Worker-produced result, forwarded verbatim to the submitter.
        output: O,
    },
    /// The job identified by `id` failed at the application level.
    ///
    /// The worker itself stays in the pool.
    Failed {
        /// Id of the failed task.
        id: TaskId,
        /// Worker-supplied error message.
        error: String,
    },
}
