//! Error types used by the pool runtime and worker programs.
//!
//! This module defines three error enums:
//!
//! - [`TaskError`] — terminal outcomes surfaced to the submitter of a task.
//! - [`PoolError`] — errors raised by pool-level operations (initialize, status).
//! - [`WorkerError`] — errors returned by worker programs during `init`/`process`.
//!
//! All types provide helper methods (`as_label`, `as_message`) for logging/metrics.
//! There is no retry anywhere at the pool level: every error is propagated
//! directly to the original caller.

use std::time::Duration;
use thiserror::Error;

/// # Terminal task outcomes surfaced to the submitter.
///
/// Exactly one of these resolves a pending submission when the task does not
/// complete successfully. Worker-level failures are contained: they affect
/// only the task bound to the failing worker.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// No reply arrived within the configured task timeout.
    ///
    /// The worker is returned to the idle set but its in-flight computation
    /// is **not** stopped; a late reply for this task is dropped.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// The worker replied with an application-level error for this task.
    #[error("execution failed: {error}")]
    Execution {
        /// Error message supplied by the worker program.
        error: String,
    },

    /// The worker died (fatal error or panic) while holding this task.
    ///
    /// The worker is removed from the pool and exactly one replacement is
    /// spawned; other queued and in-flight tasks are unaffected.
    #[error("worker error: {error}")]
    WorkerDied {
        /// Human-readable description of the fatal worker error.
        error: String,
    },

    /// The pool was terminated while this task was still pending.
    #[error("pool terminated")]
    Terminated,
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use workpool::TaskError;
    ///
    /// let err = TaskError::Timeout { timeout: Duration::from_secs(30) };
    /// assert_eq!(err.as_label(), "task_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Execution { .. } => "task_execution",
            TaskError::WorkerDied { .. } => "task_worker_died",
            TaskError::Terminated => "task_terminated",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            TaskError::Execution { error } => format!("execution: {error}"),
            TaskError::WorkerDied { error } => format!("worker died: {error}"),
            TaskError::Terminated => "pool terminated".to_string(),
        }
    }
}

/// # Errors produced by pool-level operations.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// A worker never signaled ready within the initialization timeout.
    ///
    /// The creation attempt fails and no worker is added to the pool.
    #[error("worker failed to become ready within {timeout:?}")]
    InitializationTimeout {
        /// The configured initialization timeout.
        timeout: Duration,
    },

    /// A worker's `init` returned an error (or panicked) during the handshake.
    #[error("worker initialization failed: {error}")]
    WorkerInit {
        /// Error message from the failed initialization.
        error: String,
    },

    /// `initialize()` was called while a previous call is still in flight.
    #[error("initialization already in progress")]
    AlreadyInitializing,

    /// The pool has been terminated and no longer accepts this operation.
    #[error("pool is closed")]
    Closed,
}

impl PoolError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            PoolError::InitializationTimeout { .. } => "pool_init_timeout",
            PoolError::WorkerInit { .. } => "pool_worker_init",
            PoolError::AlreadyInitializing => "pool_already_initializing",
            PoolError::Closed => "pool_closed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            PoolError::InitializationTimeout { timeout } => {
                format!("worker not ready after {timeout:?}")
            }
            PoolError::WorkerInit { error } => format!("worker init failed: {error}"),
            PoolError::AlreadyInitializing => "initialization already in progress".to_string(),
            PoolError::Closed => "pool closed".to_string(),
        }
    }
}

/// # Errors returned by worker programs.
///
/// A worker distinguishes recoverable job failures from fatal conditions:
/// [`WorkerError::Fail`] becomes an error reply for the current task and the
/// worker keeps running; [`WorkerError::Fatal`] (and any panic) removes the
/// worker from the pool and triggers a replacement.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    /// Job-level failure: only the current task fails.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Fatal worker condition: the worker is removed and replaced.
    #[error("fatal error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },
}

impl WorkerError {
    /// Job-level failure from anything printable.
    pub fn fail(error: impl Into<String>) -> Self {
        WorkerError::Fail {
            error: error.into(),
        }
    }

    /// Fatal worker condition from anything printable.
    pub fn fatal(error: impl Into<String>) -> Self {
        WorkerError::Fatal {
            error: error.into(),
        }
    }

    /// Indicates whether this error kills the worker.
    ///
    /// # Example
    /// ```
    /// use workpool::WorkerError;
    ///
    /// assert!(!WorkerError::fail("bad input").is_fatal());
    /// assert!(WorkerError::fatal("model not loaded").is_fatal());
    /// ```
    pub fn is_fatal(&self) -> bool {
        matches!(self, WorkerError::Fatal { .. })
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkerError::Fail { .. } => "worker_fail",
            WorkerError::Fatal { .. } => "worker_fatal",
        }
    }
}
