//! # Registry: named-pool directory and notification fan-out.
//!
//! The [`Registry`] maps logical workload names (e.g. `"embedding"`) to pool
//! handles. A pool is constructed lazily on first access — configuration and
//! worker program both come from the caller's [`Provision`] implementation —
//! and memoized afterwards, so every consumer of a workload shares one pool.
//!
//! ## Architecture
//! ```text
//! get_pool("embedding") ──► pools: HashMap<name, PoolHandle>
//!                              │ miss: Provision::config + Provision::worker
//!                              │       Pool::spawn → initialize()
//!                              └─────► memoize on success
//!
//! every Pool ── publish(Event) ──► Bus ──► fan-out listener ──► SubscriberSet
//! ```
//!
//! ## Rules
//! - One pool per workload name; construction races are excluded by the map
//!   lock.
//! - A pool whose initialization fails is terminated and **not** memoized:
//!   the next `get_pool` retries from scratch (caller-driven retry).
//! - Events are forwarded to subscribers unfiltered.
//! - Terminated pools are removed from the map and recreated lazily on next
//!   access.
//!
//! There is no global registry: construct one explicitly at application
//! start and pass it by reference to consumers.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::events::Bus;
use crate::pool::{Pool, PoolHandle, PoolStatus};
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::workers::Worker;

/// Per-workload pool provisioning.
///
/// The registry asks this trait for everything it needs to construct the
/// pool behind a workload name: its configuration and a fresh worker program
/// per spawned unit.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use workpool::{Job, PoolConfig, Provision, Worker, WorkerError};
///
/// struct Embedder;
///
/// #[async_trait]
/// impl Worker for Embedder {
///     type Payload = String;
///     type Output = Vec<f32>;
///     async fn process(&mut self, job: Job<String>) -> Result<Vec<f32>, WorkerError> {
///         Ok(vec![job.payload.len() as f32])
///     }
/// }
///
/// struct AppPools;
///
/// impl Provision for AppPools {
///     type Worker = Embedder;
///
///     fn config(&self, workload: &str) -> PoolConfig {
///         let mut cfg = PoolConfig::default();
///         if workload == "embedding" {
///             cfg.max_units = 2;
///         }
///         cfg
///     }
///
///     fn worker(&self, _workload: &str) -> Embedder {
///         Embedder
///     }
/// }
/// ```
pub trait Provision: Send + Sync + 'static {
    /// Worker program family shared by every pool under this registry.
    ///
    /// Distinct job flavors within the family are expressed through the job
    /// `kind` (or a payload sum type), not through separate worker types.
    type Worker: Worker;

    /// Pool configuration for a workload. Called once, at construction.
    fn config(&self, workload: &str) -> PoolConfig {
        let _ = workload;
        PoolConfig::default()
    }

    /// Builds one fresh worker program for a unit of the given workload.
    fn worker(&self, workload: &str) -> Self::Worker;
}

/// Named-pool directory with lazy construction and event fan-out.
pub struct Registry<P: Provision> {
    provision: Arc<P>,
    pools: Mutex<HashMap<String, PoolHandle<P::Worker>>>,
    bus: Bus,
}

impl<P: Provision> Registry<P> {
    /// Creates a registry and wires the given subscribers to its bus.
    ///
    /// The subscriber list is fixed for the registry's lifetime. Additional
    /// ad-hoc consumers can still observe raw events via
    /// [`bus().subscribe()`](Registry::bus).
    pub fn new(provision: P, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let bus = Bus::default();
        let subs = Arc::new(SubscriberSet::new(subscribers, bus.clone()));
        Self::fanout_listener(&bus, subs);

        Self {
            provision: Arc::new(provision),
            pools: Mutex::new(HashMap::new()),
            bus,
        }
    }

    /// Forwards every bus event to the subscriber set (fire-and-forget).
    fn fanout_listener(bus: &Bus, subs: Arc<SubscriberSet>) {
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => subs.emit_arc(Arc::new(ev)),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    /// Returns the pool for `workload`, constructing and initializing it on
    /// first access.
    ///
    /// On initialization failure the half-built pool is terminated and the
    /// error is surfaced; nothing is memoized, so a later call retries.
    pub async fn get_pool(&self, workload: &str) -> Result<PoolHandle<P::Worker>, PoolError> {
        let mut pools = self.pools.lock().await;
        if let Some(handle) = pools.get(workload) {
            return Ok(handle.clone());
        }

        let cfg = self.provision.config(workload);
        let handle = Pool::spawn(workload, cfg, self.factory_for(workload), self.bus.clone());
        match handle.initialize().await {
            Ok(()) => {
                pools.insert(workload.to_string(), handle.clone());
                Ok(handle)
            }
            Err(e) => {
                handle.terminate().await;
                Err(e)
            }
        }
    }

    /// Closure capturing the provision and workload name; builds one worker
    /// per spawned unit (including replacements).
    fn factory_for(&self, workload: &str) -> impl Fn() -> P::Worker + Send + Sync + 'static {
        let provision = Arc::clone(&self.provision);
        let workload = workload.to_string();
        move || provision.worker(&workload)
    }

    /// Point-in-time status of every managed pool, keyed by workload name.
    pub async fn status(&self) -> HashMap<String, PoolStatus> {
        let pools = self.pools.lock().await;
        let mut out = HashMap::with_capacity(pools.len());
        for (name, handle) in pools.iter() {
            if let Ok(status) = handle.status().await {
                out.insert(name.clone(), status);
            }
        }
        out
    }

    /// Tears down one workload's pool, if present.
    ///
    /// Returns `true` if a pool existed. The next `get_pool` for this name
    /// constructs a fresh pool.
    pub async fn terminate_pool(&self, workload: &str) -> bool {
        let handle = self.pools.lock().await.remove(workload);
        match handle {
            Some(handle) => {
                handle.terminate().await;
                true
            }
            None => false,
        }
    }

    /// Tears down every managed pool and clears the directory.
    ///
    /// Subsequent `get_pool` calls recreate pools from scratch.
    pub async fn terminate(&self) {
        let handles: Vec<PoolHandle<P::Worker>> = {
            let mut pools = self.pools.lock().await;
            pools.drain().map(|(_, h)| h).collect()
        };
        for handle in handles {
            handle.terminate().await;
        }
    }

    /// The registry's event bus (shared by all its pools).
    pub fn bus(&self) -> &Bus {
        &self.bus
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::error::WorkerError;
    use crate::events::{Event, EventKind};
    use crate::workers::Job;

    struct EchoWorker;

    #[async_trait]
    impl Worker for EchoWorker {
        type Payload = String;
        type Output = String;

        async fn process(&mut self, job: Job<String>) -> Result<String, WorkerError> {
            Ok(format!("{}:{}", job.kind, job.payload))
        }
    }

    struct EchoProvision;

    impl Provision for EchoProvision {
        type Worker = EchoWorker;

        fn config(&self, workload: &str) -> PoolConfig {
            let mut cfg = PoolConfig::default();
            cfg.max_units = if workload == "wide" { 4 } else { 2 };
            cfg
        }

        fn worker(&self, _workload: &str) -> EchoWorker {
            EchoWorker
        }
    }

    struct CountingSubscriber(Arc<AtomicU64>);

    #[async_trait]
    impl Subscribe for CountingSubscriber {
        async fn on_event(&self, _event: &Event) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }

        fn name(&self) -> &'static str {
            "counter"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_pool_memoizes_per_name() {
        let registry = Registry::new(EchoProvision, Vec::new());

        let a = registry.get_pool("embedding").await.unwrap();
        let b = registry.get_pool("embedding").await.unwrap();

        let out = a.submit("embed", "hello".to_string(), 0).await.unwrap();
        assert_eq!(out, "embed:hello");
        let out = b.submit("embed", "again".to_string(), 0).await.unwrap();
        assert_eq!(out, "embed:again");

        let status = registry.status().await;
        assert_eq!(status.len(), 1);
        assert_eq!(status["embedding"].completed_tasks, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_config_comes_from_provision_per_workload() {
        let registry = Registry::new(EchoProvision, Vec::new());

        registry.get_pool("wide").await.unwrap();
        registry.get_pool("embedding").await.unwrap();

        let status = registry.status().await;
        assert_eq!(status["wide"].max_units, 4);
        assert_eq!(status["embedding"].max_units, 2);
        // initialize() spawns ceil(max/2) up front
        assert_eq!(status["wide"].active_units, 2);
        assert_eq!(status["embedding"].active_units, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminate_clears_and_recreates_lazily() {
        let registry = Registry::new(EchoProvision, Vec::new());

        let pool = registry.get_pool("embedding").await.unwrap();
        pool.submit("embed", "x".to_string(), 0).await.unwrap();

        registry.terminate().await;
        assert!(registry.status().await.is_empty());

        // Old handles are dead, fresh access recreates the pool.
        assert!(pool.submit("embed", "y".to_string(), 0).await.is_err());
        let pool = registry.get_pool("embedding").await.unwrap();
        let out = pool.submit("embed", "y".to_string(), 0).await.unwrap();
        assert_eq!(out, "embed:y");
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminate_pool_affects_only_named_pool() {
        let registry = Registry::new(EchoProvision, Vec::new());
        registry.get_pool("embedding").await.unwrap();
        registry.get_pool("wide").await.unwrap();

        assert!(registry.terminate_pool("embedding").await);
        assert!(!registry.terminate_pool("embedding").await);

        let status = registry.status().await;
        assert_eq!(status.len(), 1);
        assert!(status.contains_key("wide"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_fan_out_to_subscribers() {
        let seen = Arc::new(AtomicU64::new(0));
        let registry = Registry::new(
            EchoProvision,
            vec![Arc::new(CountingSubscriber(Arc::clone(&seen)))],
        );

        let pool = registry.get_pool("embedding").await.unwrap();
        pool.submit("embed", "x".to_string(), 0).await.unwrap();

        // Let the fan-out listener and subscriber worker drain.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(seen.load(Ordering::Relaxed) > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_raw_bus_receiver_observes_task_events() {
        let registry = Registry::new(EchoProvision, Vec::new());
        let mut rx = registry.bus().subscribe();

        let pool = registry.get_pool("embedding").await.unwrap();
        pool.submit("embed", "x".to_string(), 0).await.unwrap();

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        assert!(kinds.contains(&EventKind::TaskQueued));
        assert!(kinds.contains(&EventKind::TaskDispatched));
        assert!(kinds.contains(&EventKind::TaskCompleted));
    }
}
