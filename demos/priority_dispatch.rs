//! # Example: priority_dispatch
//!
//! A single-worker pool showing strict priority ordering: tasks queued while
//! the worker is busy are dispatched highest priority first, submission order
//! breaking ties.
//!
//! ## Run
//! ```bash
//! cargo run --example priority_dispatch
//! ```

use std::time::Duration;

use workpool::{Bus, Job, Pool, PoolConfig, WorkerError, WorkerFn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut cfg = PoolConfig::default();
    cfg.max_units = 1;

    let handle = Pool::spawn(
        "serial",
        cfg,
        || {
            WorkerFn::new(|job: Job<&'static str>| async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                println!("processed {:?} (priority marker in payload)", job.payload);
                Ok::<_, WorkerError>(())
            })
        },
        Bus::default(),
    );
    handle.initialize().await?;

    // The first submission occupies the worker; the rest pile up in the
    // queue and drain by priority: urgent, normal, background.
    let mut pending = Vec::new();
    for (payload, priority) in [
        ("warm-up", 0),
        ("background", -10),
        ("normal", 0),
        ("urgent", 10),
    ] {
        let handle = handle.clone();
        pending.push(tokio::spawn(async move {
            handle.submit("job", payload, priority).await
        }));
        // Keep submission order deterministic for the demo.
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    for task in pending {
        task.await??;
    }
    handle.terminate().await;
    Ok(())
}
