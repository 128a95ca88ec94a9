//! # Runtime events emitted by pools and the subscriber plumbing.
//!
//! [`EventKind`] classifies events across three categories:
//! - **Task events**: queue/dispatch/terminal transitions of submitted tasks
//! - **Unit events**: worker lifecycle (spawn, handshake, death)
//! - **Subscriber events**: delivery-side incidents (overflow, panic)
//!
//! The [`Event`] struct carries optional metadata: pool name, task and unit
//! ids, priority, timeouts, elapsed time, and a human-readable reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore exact order when events are observed
//! out of order across receivers.
//!
//! ## Example
//! ```rust
//! use workpool::{Event, EventKind};
//!
//! let ev = Event::now(EventKind::TaskFailed)
//!     .with_pool("embedding")
//!     .with_reason("bad input");
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.pool.as_deref(), Some("embedding"));
//! assert_eq!(ev.reason.as_deref(), Some("bad input"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::workers::{TaskId, UnitId};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Task events ===
    /// Task accepted into the queue.
    ///
    /// Sets: `pool`, `task`, `priority`, `at`, `seq`.
    TaskQueued,

    /// Task handed to an idle worker.
    ///
    /// Sets: `pool`, `task`, `unit`, `at`, `seq`.
    TaskDispatched,

    /// Task completed successfully.
    ///
    /// Sets: `pool`, `task`, `unit`, `elapsed_ms`, `at`, `seq`.
    TaskCompleted,

    /// Task failed (application error, worker death, or termination).
    ///
    /// Sets: `pool`, `task`, `reason`, `at`, `seq`.
    TaskFailed,

    /// No reply within the task timeout; the submitter was given up on.
    ///
    /// Sets: `pool`, `task`, `unit`, `timeout_ms`, `at`, `seq`.
    TaskTimedOut,

    /// A reply arrived for an id no longer tracked and was dropped.
    ///
    /// Sets: `pool`, `task`, `unit`, `at`, `seq`.
    StaleReplyDropped,

    // === Unit events ===
    /// Worker spawned; handshake pending.
    ///
    /// Sets: `pool`, `unit`, `at`, `seq`.
    UnitStarting,

    /// Worker completed its ready handshake and joined the pool.
    ///
    /// Sets: `pool`, `unit`, `at`, `seq`.
    UnitReady,

    /// Worker never signaled ready in time; the attempt was discarded.
    ///
    /// Sets: `pool`, `unit`, `timeout_ms`, `at`, `seq`.
    UnitInitTimeout,

    /// Worker died (fatal error or panic) and was removed.
    ///
    /// Sets: `pool`, `unit`, `reason`, `at`, `seq`.
    UnitDown,

    // === Pool events ===
    /// Pool terminated; all workers destroyed, pending tasks rejected.
    ///
    /// Sets: `pool`, `at`, `seq`.
    PoolTerminated,

    // === Subscriber events ===
    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `reason`, `at`, `seq`.
    SubscriberOverflow,

    /// Subscriber panicked during event processing.
    ///
    /// Sets: `reason`, `at`, `seq`.
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotone global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the pool that emitted the event, if applicable.
    pub pool: Option<Arc<str>>,
    /// Task the event refers to, if applicable.
    pub task: Option<TaskId>,
    /// Worker unit the event refers to, if applicable.
    pub unit: Option<UnitId>,
    /// Submission priority (task events).
    pub priority: Option<i32>,
    /// Relevant timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Time between dispatch and completion in milliseconds (compact).
    pub elapsed_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            pool: None,
            task: None,
            unit: None,
            priority: None,
            timeout_ms: None,
            elapsed_ms: None,
            reason: None,
        }
    }

    /// Attaches the emitting pool's name.
    #[inline]
    pub fn with_pool(mut self, pool: impl Into<Arc<str>>) -> Self {
        self.pool = Some(pool.into());
        self
    }

    /// Attaches a task id.
    #[inline]
    pub fn with_task(mut self, task: TaskId) -> Self {
        self.task = Some(task);
        self
    }

    /// Attaches a unit id.
    #[inline]
    pub fn with_unit(mut self, unit: UnitId) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Attaches a submission priority.
    #[inline]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(compact_ms(d));
        self
    }

    /// Attaches an elapsed duration (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        self.elapsed_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::now(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::now(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}

/// Millisecond count clamped into `u32`.
fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotone() {
        let a = Event::now(EventKind::TaskQueued);
        let b = Event::now(EventKind::TaskQueued);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_timeout_is_compacted_to_millis() {
        let ev = Event::now(EventKind::TaskTimedOut).with_timeout(Duration::from_secs(30));
        assert_eq!(ev.timeout_ms, Some(30_000));
    }
}
