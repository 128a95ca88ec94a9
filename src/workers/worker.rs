//! # Worker abstraction.
//!
//! This module defines the [`Worker`] trait — the program running inside one
//! execution unit — and [`WorkerFactory`], which the pool uses to build a
//! fresh program instance for every unit it spawns (including replacements).
//!
//! A worker is owned exclusively by its unit: `process` takes `&mut self`,
//! and no two units ever share a program instance. State that must survive
//! across jobs lives inside the worker; nothing is shared with the scheduler.

use async_trait::async_trait;

use crate::error::WorkerError;
use crate::workers::protocol::Job;

/// # Program executed inside one pool unit.
///
/// The pool drives each worker through a fixed lifecycle: [`init`](Worker::init)
/// once (the ready handshake is sent only after it succeeds), then
/// [`process`](Worker::process) once per dispatched job, strictly sequentially.
///
/// Returning [`WorkerError::Fail`] fails only the current job; returning
/// [`WorkerError::Fatal`] — or panicking — removes the worker from the pool
/// and triggers exactly one replacement.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use workpool::{Job, Worker, WorkerError};
///
/// struct Embedder {
///     calls: u64,
/// }
///
/// #[async_trait]
/// impl Worker for Embedder {
///     type Payload = String;
///     type Output = Vec<f32>;
///
///     async fn process(&mut self, job: Job<String>) -> Result<Vec<f32>, WorkerError> {
///         self.calls += 1;
///         if job.payload.is_empty() {
///             return Err(WorkerError::fail("empty input"));
///         }
///         Ok(vec![job.payload.len() as f32])
///     }
/// }
/// ```
#[async_trait]
pub trait Worker: Send + 'static {
    /// Input type carried by dispatched jobs.
    type Payload: Send + 'static;
    /// Result type forwarded to submitters on success.
    type Output: Send + 'static;

    /// One-time setup before the worker becomes eligible for dispatch.
    ///
    /// Runs under the pool's initialization timeout. An error (or panic) here
    /// fails the creation attempt; no unit is added to the pool.
    async fn init(&mut self) -> Result<(), WorkerError> {
        Ok(())
    }

    /// Executes one dispatched job.
    async fn process(&mut self, job: Job<Self::Payload>) -> Result<Self::Output, WorkerError>;
}

/// Builds a fresh [`Worker`] for every unit the pool spawns.
///
/// Any `Fn() -> W` closure is a factory:
///
/// ```
/// use workpool::{Job, WorkerError, WorkerFactory, WorkerFn};
///
/// let factory = || WorkerFn::new(|job: Job<u32>| async move {
///     Ok::<_, WorkerError>(job.payload * 2)
/// });
/// let _worker = factory.build();
/// ```
pub trait WorkerFactory: Send + Sync + 'static {
    /// The worker type this factory builds.
    type Worker: Worker;

    /// Builds one fresh worker instance.
    fn build(&self) -> Self::Worker;
}

impl<F, W> WorkerFactory for F
where
    F: Fn() -> W + Send + Sync + 'static,
    W: Worker,
{
    type Worker = W;

    fn build(&self) -> W {
        (self)()
    }
}
