//! # Workers: the execution-unit side of the pool.
//!
//! This module groups everything that crosses the worker boundary:
//! - [`Worker`] / [`WorkerFactory`] — the program seam and its builder
//! - [`WorkerFn`] — closure-backed stateless worker
//! - [`Job`], [`Reply`], [`TaskId`], [`UnitId`] — the message protocol
//! - `runtime` (crate-private) — the loop driving one program per unit

mod protocol;
pub(crate) mod runtime;
mod worker;
mod worker_fn;

pub use protocol::{Job, Reply, TaskId, UnitId};
pub use worker::{Worker, WorkerFactory};
pub use worker_fn::WorkerFn;
