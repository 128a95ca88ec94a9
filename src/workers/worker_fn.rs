//! # Function-backed worker (`WorkerFn`)
//!
//! [`WorkerFn`] wraps a closure `F: FnMut(Job<P>) -> Fut`, producing a fresh
//! future per job. Use it for stateless programs (pure computations) where a
//! full [`Worker`] impl would be ceremony; state that must persist across
//! jobs belongs in a hand-written [`Worker`] instead.
//!
//! ## Example
//! ```rust
//! use workpool::{Job, WorkerError, WorkerFn};
//!
//! let _w = WorkerFn::new(|job: Job<Vec<u8>>| async move {
//!     Ok::<_, WorkerError>(job.payload.len())
//! });
//! ```

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

use crate::error::WorkerError;
use crate::workers::protocol::Job;
use crate::workers::worker::Worker;

/// Function-backed worker implementation.
///
/// Wraps a closure that is called once per dispatched job. The `P`/`O` type
/// parameters record the closure's payload and output types so that the
/// [`Worker`] impl's associated types are constrained; both are inferred from
/// the closure at construction time via [`WorkerFn::new`].
pub struct WorkerFn<F, P, O> {
    f: F,
    _marker: PhantomData<fn(P) -> O>,
}

impl<F, Fut, P, O> WorkerFn<F, P, O>
where
    F: FnMut(Job<P>) -> Fut,
    Fut: Future<Output = Result<O, WorkerError>>,
{
    /// Creates a new function-backed worker.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut, P, O> Worker for WorkerFn<F, P, O>
where
    F: FnMut(Job<P>) -> Fut + Send + 'static,
    Fut: Future<Output = Result<O, WorkerError>> + Send + 'static,
    P: Send + 'static,
    O: Send + 'static,
{
    type Payload = P;
    type Output = O;

    async fn process(&mut self, job: Job<P>) -> Result<O, WorkerError> {
        (self.f)(job).await
    }
}
