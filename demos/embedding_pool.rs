//! # Example: embedding_pool
//!
//! A registry-managed pool serving a fake embedding workload.
//!
//! Demonstrates how to:
//! - Describe workloads with a [`Provision`] implementation.
//! - Let [`Registry::get_pool`] lazily construct and initialize the pool.
//! - Submit a batch of texts concurrently and read pool status.
//!
//! ## Flow
//! ```text
//! Registry::get_pool("embedding")
//!     ├─► Provision::config / Provision::worker
//!     ├─► Pool::spawn ─► initialize() (ceil(max/2) workers)
//!     └─► submit × N ─► dispatch ─► FakeEmbedder::process
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example embedding_pool
//! ```

use std::time::Duration;

use async_trait::async_trait;
use workpool::{
    recommended_unit_count, Job, PoolConfig, Provision, Registry, Worker, WorkerError,
};

/// Stand-in for a real embedding model.
struct FakeEmbedder;

#[async_trait]
impl Worker for FakeEmbedder {
    type Payload = String;
    type Output = Vec<f32>;

    async fn init(&mut self) -> Result<(), WorkerError> {
        // Model loading would happen here.
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(())
    }

    async fn process(&mut self, job: Job<String>) -> Result<Vec<f32>, WorkerError> {
        if job.payload.is_empty() {
            return Err(WorkerError::fail("cannot embed empty text"));
        }
        // A toy 4-dimensional "embedding".
        let bytes = job.payload.as_bytes();
        let mut v = [0f32; 4];
        for (i, b) in bytes.iter().enumerate() {
            v[i % 4] += f32::from(*b) / bytes.len() as f32;
        }
        Ok(v.to_vec())
    }
}

struct DemoPools;

impl Provision for DemoPools {
    type Worker = FakeEmbedder;

    fn config(&self, _workload: &str) -> PoolConfig {
        let mut cfg = PoolConfig::default();
        cfg.max_units = recommended_unit_count(2, 1).min(4);
        cfg.task_timeout = Duration::from_secs(5);
        cfg
    }

    fn worker(&self, _workload: &str) -> FakeEmbedder {
        FakeEmbedder
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let registry = Registry::new(DemoPools, Vec::new());
    let pool = registry.get_pool("embedding").await?;

    let texts = [
        "the quick brown fox",
        "jumps over",
        "the lazy dog",
        "",
        "note-taking apps need embeddings",
    ];
    let pending = texts
        .iter()
        .map(|text| pool.submit("embed", text.to_string(), 0));

    for (text, result) in texts.iter().zip(futures::future::join_all(pending).await) {
        match result {
            Ok(embedding) => println!("embedded {text:?} -> {embedding:?}"),
            Err(e) => println!("failed   {text:?} -> {e}"),
        }
    }

    for (name, status) in registry.status().await {
        println!(
            "[{name}] workers={}/{} completed={} failed={}",
            status.active_units, status.max_units, status.completed_tasks, status.failed_tasks
        );
    }

    registry.terminate().await;
    Ok(())
}
