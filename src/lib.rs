//! # workpool
//!
//! **workpool** is a bounded worker-pool scheduler for CPU-bound jobs.
//!
//! It distributes work (the motivating workload is text-embedding generation)
//! across a capped set of persistent, isolated workers, with priority-ordered
//! dispatch, per-task timeout enforcement, demand-driven scaling, and
//! automatic recovery from worker failure. The crate is an embedded library
//! component: no CLI, no persistence, single scheduling authority.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     caller ──► Registry::get_pool("embedding")      (lazy, memoized)
//!                      │
//!                      ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Pool actor (one per workload)                                    │
//! │  - TaskQueue (priority desc, submission order tie-break)          │
//! │  - worker table (≤ max_units; never shrinks)                      │
//! │  - in-flight map + deadline timers                                │
//! │  - completed/failed counters                                      │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────┐      ┌──────────┐      ┌──────────┐
//!     │ worker 1 │      │ worker 2 │      │ worker N │   (isolated tasks,
//!     └┬─────────┘      └┬─────────┘      └┬─────────┘    channels only)
//!      │ Ready /          │ Completed /     │ Failed / Down
//!      ▼                  ▼                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                     Bus (broadcast channel)                       │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                        Registry fan-out listener
//!                                   ▼
//!                       SubscriberSet (per-sub queues)
//! ```
//!
//! ### Task lifecycle
//! ```text
//! submit(kind, payload, priority)
//!   ├─► queued (unbounded, priority-ordered)
//!   ├─► dispatched to an idle worker
//!   │     └─ none idle && below max_units ─► spawn one worker
//!   └─► terminal:
//!         ├─ Completed           → Ok(output)
//!         ├─ Failed (app error)  → Err(TaskError::Execution)
//!         ├─ TimedOut            → Err(TaskError::Timeout)   (worker kept)
//!         ├─ worker died         → Err(TaskError::WorkerDied) (worker replaced)
//!         └─ pool terminated     → Err(TaskError::Terminated)
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                |
//! |-------------------|---------------------------------------------------------------|-----------------------------------|
//! | **Scheduling**    | Priority dispatch, timeouts, scaling, recovery.               | [`Pool`], [`PoolHandle`]          |
//! | **Workers**       | Program seam and message protocol.                            | [`Worker`], [`WorkerFn`], [`Job`] |
//! | **Directory**     | One pool per workload name, lazy construction.                | [`Registry`], [`Provision`]       |
//! | **Status**        | Per-pool gauges and monotone counters.                        | [`PoolStatus`]                    |
//! | **Events**        | Status-change notifications, fan-out to listeners.            | [`Event`], [`Bus`], [`Subscribe`] |
//! | **Errors**        | Typed outcomes for tasks, pools, and worker programs.         | [`TaskError`], [`PoolError`]      |
//! | **Sizing**        | Host-parallelism hints for pool consumers.                    | [`recommended_unit_count`]        |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use workpool::{Bus, Job, Pool, PoolConfig, WorkerError, WorkerFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = PoolConfig::default();
//!     cfg.max_units = 2;
//!
//!     let handle = Pool::spawn(
//!         "embedding",
//!         cfg,
//!         || {
//!             WorkerFn::new(|job: Job<String>| async move {
//!                 // stand-in for real embedding generation
//!                 Ok::<_, WorkerError>(vec![job.payload.len() as f32])
//!             })
//!         },
//!         Bus::default(),
//!     );
//!     handle.initialize().await?;
//!
//!     let embedding = handle.submit("embed", "hello pool".to_string(), 5).await?;
//!     assert_eq!(embedding, vec![10.0]);
//!
//!     handle.terminate().await;
//!     Ok(())
//! }
//! ```

mod advisor;
mod config;
mod error;
mod events;
mod pool;
mod registry;
mod subscribers;
mod workers;

// ---- Public re-exports ----

pub use advisor::{recommended_batch_size, recommended_unit_count};
pub use config::PoolConfig;
pub use error::{PoolError, TaskError, WorkerError};
pub use events::{Bus, Event, EventKind};
pub use pool::{Pool, PoolHandle, PoolStatus};
pub use registry::{Provision, Registry};
pub use subscribers::{Subscribe, SubscriberSet};
pub use workers::{Job, Reply, TaskId, UnitId, Worker, WorkerFactory, WorkerFn};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
