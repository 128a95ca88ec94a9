//! # LogWriter — simple event logger
//!
//! A minimal subscriber that forwards incoming [`Event`]s to the `log` crate.
//! Use it for tests or demos; production consumers usually plug their own
//! [`Subscribe`] implementation instead.
//!
//! ## Example output
//! ```text
//! [queued] pool="embedding" task=task-0 priority=5
//! [dispatched] pool="embedding" task=task-0 unit=unit-1
//! [completed] pool="embedding" task=task-0 elapsed=12ms
//! [timeout] pool="embedding" task=task-3 timeout=30000ms
//! [unit-down] pool="embedding" unit=unit-1 reason="panicked: oom"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let pool = e.pool.as_deref().unwrap_or("?");
        match e.kind {
            EventKind::TaskQueued => {
                log::debug!(
                    "[queued] pool={pool:?} task={:?} priority={:?}",
                    e.task,
                    e.priority
                );
            }
            EventKind::TaskDispatched => {
                log::debug!("[dispatched] pool={pool:?} task={:?} unit={:?}", e.task, e.unit);
            }
            EventKind::TaskCompleted => {
                log::debug!(
                    "[completed] pool={pool:?} task={:?} elapsed_ms={:?}",
                    e.task,
                    e.elapsed_ms
                );
            }
            EventKind::TaskFailed => {
                log::warn!(
                    "[failed] pool={pool:?} task={:?} reason={:?}",
                    e.task,
                    e.reason
                );
            }
            EventKind::TaskTimedOut => {
                log::warn!(
                    "[timeout] pool={pool:?} task={:?} timeout_ms={:?}",
                    e.task,
                    e.timeout_ms
                );
            }
            EventKind::StaleReplyDropped => {
                log::debug!("[stale-reply] pool={pool:?} task={:?} unit={:?}", e.task, e.unit);
            }
            EventKind::UnitStarting => {
                log::debug!("[unit-starting] pool={pool:?} unit={:?}", e.unit);
            }
            EventKind::UnitReady => {
                log::debug!("[unit-ready] pool={pool:?} unit={:?}", e.unit);
            }
            EventKind::UnitInitTimeout => {
                log::warn!(
                    "[unit-init-timeout] pool={pool:?} unit={:?} timeout_ms={:?}",
                    e.unit,
                    e.timeout_ms
                );
            }
            EventKind::UnitDown => {
                log::warn!("[unit-down] pool={pool:?} unit={:?} reason={:?}", e.unit, e.reason);
            }
            EventKind::PoolTerminated => {
                log::info!("[terminated] pool={pool:?}");
            }
            EventKind::SubscriberOverflow => {
                log::warn!("[subscriber-overflow] {:?}", e.reason);
            }
            EventKind::SubscriberPanicked => {
                log::error!("[subscriber-panicked] {:?}", e.reason);
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
