//! Point-in-time pool status snapshot.

/// Observable state of one pool, as returned by
/// [`PoolHandle::status`](crate::PoolHandle::status).
///
/// Gauges (`active_units`, `busy_units`, `queued_tasks`) reflect the instant
/// the snapshot was taken; the two counters only ever grow over the pool's
/// lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStatus {
    /// Configured worker ceiling.
    pub max_units: usize,
    /// Workers that completed their handshake and are in the pool.
    pub active_units: usize,
    /// Workers currently bound to a task.
    pub busy_units: usize,
    /// Tasks admitted but not yet dispatched.
    pub queued_tasks: usize,
    /// Tasks that resolved successfully.
    pub completed_tasks: u64,
    /// Tasks that resolved with any error (execution, timeout, worker death,
    /// termination).
    pub failed_tasks: u64,
}
