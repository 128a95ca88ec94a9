//! # Pool: the scheduler core.
//!
//! This module contains the worker-pool scheduler:
//! - [`core`]: the actor owning all scheduler state (admission, dispatch,
//!   deadlines, recovery, termination);
//! - [`handle`]: the submitter-facing [`PoolHandle`];
//! - [`queue`]: the priority queue of pending tasks;
//! - [`status`]: the [`PoolStatus`] snapshot type.
//!
//! The only public API from this module is [`Pool`], [`PoolHandle`], and
//! [`PoolStatus`]; everything else is wiring.

mod core;
mod handle;
mod queue;
mod status;

pub use self::core::Pool;
pub use handle::PoolHandle;
pub use status::PoolStatus;

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Semaphore;
    use tokio::time::sleep;

    use super::*;
    use crate::config::PoolConfig;
    use crate::error::{PoolError, TaskError, WorkerError};
    use crate::events::{Bus, EventKind};
    use crate::workers::{Job, Worker, WorkerFn};

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn pcfg(max_units: usize, init_ms: u64, task_ms: u64) -> PoolConfig {
        PoolConfig {
            max_units,
            init_timeout: ms(init_ms),
            task_timeout: ms(task_ms),
        }
    }

    /// Worker whose behavior is scripted by the job kind.
    struct KindWorker;

    #[async_trait]
    impl Worker for KindWorker {
        type Payload = u64;
        type Output = u64;

        async fn process(&mut self, job: Job<u64>) -> Result<u64, WorkerError> {
            match job.kind.as_ref() {
                "ok" => Ok(job.payload),
                "double" => {
                    sleep(ms(10)).await;
                    Ok(job.payload * 2)
                }
                "slow" => {
                    sleep(ms(70)).await;
                    Ok(job.payload)
                }
                "hang" => {
                    sleep(Duration::from_secs(3600)).await;
                    Ok(job.payload)
                }
                "fail" => Err(WorkerError::fail("bad input")),
                "boom" => Err(WorkerError::fatal("exploded")),
                "panic" => panic!("kaput"),
                other => Err(WorkerError::fail(format!("unknown kind {other}"))),
            }
        }
    }

    /// Worker that never finishes its handshake.
    struct StuckInit;

    #[async_trait]
    impl Worker for StuckInit {
        type Payload = u64;
        type Output = u64;

        async fn init(&mut self) -> Result<(), WorkerError> {
            sleep(Duration::from_secs(3600)).await;
            Ok(())
        }

        async fn process(&mut self, job: Job<u64>) -> Result<u64, WorkerError> {
            Ok(job.payload)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_initialize_spawns_half_then_scales_to_ceiling() {
        let bus = Bus::default();
        let mut rx = bus.subscribe();
        let handle = Pool::spawn("scale", pcfg(2, 10_000, 30_000), || KindWorker, bus.clone());

        handle.initialize().await.unwrap();
        assert_eq!(handle.status().await.unwrap().active_units, 1);

        let pending: Vec<_> = (0..5).map(|i| handle.submit("double", i, 0)).collect();
        let results = futures::future::join_all(pending).await;
        for (i, result) in results.into_iter().enumerate() {
            assert_eq!(result.unwrap(), i as u64 * 2);
        }

        let status = handle.status().await.unwrap();
        assert_eq!(status.active_units, 2);
        assert_eq!(status.busy_units, 0);
        assert_eq!(status.queued_tasks, 0);
        assert_eq!(status.completed_tasks, 5);

        // One initial worker plus exactly one demand-driven spawn.
        let mut starts = 0;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::UnitStarting {
                starts += 1;
            }
        }
        assert_eq!(starts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initialize_times_out_when_worker_never_ready() {
        let handle = Pool::spawn("stuck", pcfg(2, 100, 30_000), || StuckInit, Bus::default());

        let err = handle.initialize().await.unwrap_err();
        assert_eq!(err, PoolError::InitializationTimeout { timeout: ms(100) });
        assert_eq!(handle.status().await.unwrap().active_units, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_timeout_rejects_once_and_frees_worker() {
        let handle = Pool::spawn("deadline", pcfg(1, 10_000, 50), || KindWorker, Bus::default());
        handle.initialize().await.unwrap();

        let err = handle.submit("hang", 1, 0).await.unwrap_err();
        assert_eq!(err, TaskError::Timeout { timeout: ms(50) });

        let status = handle.status().await.unwrap();
        assert_eq!(status.failed_tasks, 1);
        assert_eq!(status.busy_units, 0);
        assert_eq!(status.active_units, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_priority_dispatch_order_with_single_worker() {
        let order = Arc::new(Mutex::new(Vec::<u64>::new()));
        let gate = Arc::new(Semaphore::new(0));

        let factory = {
            let order = Arc::clone(&order);
            let gate = Arc::clone(&gate);
            move || {
                let order = Arc::clone(&order);
                let gate = Arc::clone(&gate);
                WorkerFn::new(move |job: Job<u64>| {
                    let order = Arc::clone(&order);
                    let gate = Arc::clone(&gate);
                    async move {
                        if job.kind.as_ref() == "block" {
                            gate.acquire().await.expect("gate closed").forget();
                        }
                        order.lock().unwrap().push(job.payload);
                        Ok::<_, WorkerError>(job.payload)
                    }
                })
            }
        };
        let handle = Pool::spawn("prio", pcfg(1, 10_000, 30_000), factory, Bus::default());
        handle.initialize().await.unwrap();

        // Occupy the only worker, then queue tasks while it is busy.
        let blocker = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.submit("block", 0, 0).await })
        };
        sleep(ms(1)).await;

        let mut pending = Vec::new();
        for (payload, priority) in [(1u64, 1), (5, 5), (3, 3)] {
            let handle = handle.clone();
            pending.push(tokio::spawn(
                async move { handle.submit("job", payload, priority).await },
            ));
            sleep(ms(1)).await;
        }

        gate.add_permits(1);
        blocker.await.unwrap().unwrap();
        for task in pending {
            task.await.unwrap().unwrap();
        }

        // Strictly descending priority once the worker frees up.
        assert_eq!(*order.lock().unwrap(), vec![0, 5, 3, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_error_fails_only_its_task_and_replaces_worker() {
        let bus = Bus::default();
        let mut rx = bus.subscribe();
        let handle = Pool::spawn("recover", pcfg(1, 10_000, 30_000), || KindWorker, bus.clone());
        handle.initialize().await.unwrap();

        let err = handle.submit("boom", 1, 0).await.unwrap_err();
        match err {
            TaskError::WorkerDied { error } => assert!(error.contains("exploded")),
            other => panic!("unexpected error: {other:?}"),
        }

        // The replacement worker serves the next submission.
        assert_eq!(handle.submit("ok", 7, 0).await.unwrap(), 7);

        let status = handle.status().await.unwrap();
        assert_eq!(status.completed_tasks, 1);
        assert_eq!(status.failed_tasks, 1);
        assert_eq!(status.active_units, 1);

        let (mut starts, mut downs) = (0, 0);
        while let Ok(ev) = rx.try_recv() {
            match ev.kind {
                EventKind::UnitStarting => starts += 1,
                EventKind::UnitDown => downs += 1,
                _ => {}
            }
        }
        assert_eq!(downs, 1);
        assert_eq!(starts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_worker_is_contained_and_replaced() {
        let handle = Pool::spawn("contain", pcfg(1, 10_000, 30_000), || KindWorker, Bus::default());
        handle.initialize().await.unwrap();

        let err = handle.submit("panic", 1, 0).await.unwrap_err();
        match err {
            TaskError::WorkerDied { error } => assert!(error.contains("kaput")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(handle.submit("ok", 2, 0).await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_execution_error_keeps_worker_in_pool() {
        let bus = Bus::default();
        let mut rx = bus.subscribe();
        let handle = Pool::spawn("apperr", pcfg(1, 10_000, 30_000), || KindWorker, bus.clone());
        handle.initialize().await.unwrap();

        let err = handle.submit("fail", 1, 0).await.unwrap_err();
        assert_eq!(
            err,
            TaskError::Execution {
                error: "bad input".to_string()
            }
        );
        assert_eq!(handle.submit("ok", 3, 0).await.unwrap(), 3);

        // No replacement happened: the initial worker is the only one ever
        // started.
        let mut starts = 0;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::UnitStarting {
                starts += 1;
            }
        }
        assert_eq!(starts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_conservation_across_mixed_outcomes() {
        let handle = Pool::spawn("conserve", pcfg(2, 10_000, 50), || KindWorker, Bus::default());
        handle.initialize().await.unwrap();

        let kinds = ["ok", "ok", "fail", "fail", "hang", "hang"];
        let pending: Vec<_> = kinds
            .iter()
            .map(|kind| handle.submit(*kind, 1, 0))
            .collect();
        let results = futures::future::join_all(pending).await;

        let ok = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(ok, 2);

        let status = handle.status().await.unwrap();
        assert_eq!(status.completed_tasks, 2);
        assert_eq!(status.failed_tasks, 4);
        assert_eq!(
            status.completed_tasks + status.failed_tasks,
            kinds.len() as u64
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_reply_after_timeout_is_dropped() {
        let bus = Bus::default();
        let mut rx = bus.subscribe();
        let handle = Pool::spawn("stale", pcfg(1, 10_000, 50), || KindWorker, bus.clone());
        handle.initialize().await.unwrap();

        // The worker keeps computing past the 50ms deadline and eventually
        // replies for an id the pool no longer tracks.
        let err = handle.submit("slow", 1, 0).await.unwrap_err();
        assert_eq!(err, TaskError::Timeout { timeout: ms(50) });

        // The next task is queued into the same worker and still completes.
        assert_eq!(handle.submit("ok", 2, 0).await.unwrap(), 2);

        let status = handle.status().await.unwrap();
        assert_eq!(status.completed_tasks, 1);
        assert_eq!(status.failed_tasks, 1);

        let mut saw_stale = false;
        while let Ok(ev) = rx.try_recv() {
            saw_stale |= ev.kind == EventKind::StaleReplyDropped;
        }
        assert!(saw_stale, "late reply should be dropped as stale");
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminate_rejects_pending_and_zeroes_gauges() {
        let handle = Pool::spawn("stop", pcfg(1, 10_000, 1_000_000), || KindWorker, Bus::default());
        handle.initialize().await.unwrap();

        let in_flight = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.submit("hang", 1, 0).await })
        };
        sleep(ms(1)).await;
        let queued = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.submit("hang", 2, 0).await })
        };
        sleep(ms(1)).await;

        handle.terminate().await;

        assert_eq!(in_flight.await.unwrap().unwrap_err(), TaskError::Terminated);
        assert_eq!(queued.await.unwrap().unwrap_err(), TaskError::Terminated);

        let status = handle.status().await.unwrap();
        assert_eq!(status.active_units, 0);
        assert_eq!(status.busy_units, 0);
        assert_eq!(status.queued_tasks, 0);
        assert_eq!(status.failed_tasks, 2);

        // Terminated pools reject new work; terminate stays idempotent.
        assert_eq!(
            handle.submit("ok", 3, 0).await.unwrap_err(),
            TaskError::Terminated
        );
        handle.terminate().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_without_initialize_scales_from_zero() {
        let handle = Pool::spawn("lazy", pcfg(2, 10_000, 30_000), || KindWorker, Bus::default());

        assert_eq!(handle.submit("ok", 9, 0).await.unwrap(), 9);
        let status = handle.status().await.unwrap();
        assert_eq!(status.active_units, 1);
        assert_eq!(status.completed_tasks, 1);
    }
}
