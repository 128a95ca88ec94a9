//! # Pool configuration.
//!
//! [`PoolConfig`] defines a pool's scaling bound and supervision timeouts.
//! All values are fixed at construction time; there is no runtime mutation.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use workpool::PoolConfig;
//!
//! let mut cfg = PoolConfig::default();
//! cfg.max_units = 4;
//! cfg.task_timeout = Duration::from_secs(10);
//!
//! assert_eq!(cfg.max_units, 4);
//! ```

use std::time::Duration;

/// Construction-time configuration for a [`Pool`](crate::Pool).
///
/// Controls the worker ceiling and the two supervision timeouts. The task
/// queue itself is unbounded; only concurrently active workers are capped.
#[derive(Clone, Copy, Debug)]
pub struct PoolConfig {
    /// Maximum number of workers the pool may hold at any instant.
    pub max_units: usize,
    /// Maximum time a freshly spawned worker may take to signal ready.
    pub init_timeout: Duration,
    /// Maximum time a dispatched task may run before it is given up on.
    pub task_timeout: Duration,
}

impl Default for PoolConfig {
    /// Provides a default configuration:
    /// - `max_units = available parallelism − 1` (minimum 1)
    /// - `init_timeout = 10s`
    /// - `task_timeout = 30s`
    fn default() -> Self {
        Self {
            max_units: default_max_units(),
            init_timeout: Duration::from_secs(10),
            task_timeout: Duration::from_secs(30),
        }
    }
}

impl PoolConfig {
    /// Number of workers spawned up front by `initialize()`: `ceil(max_units / 2)`.
    pub(crate) fn initial_units(&self) -> usize {
        self.max_units.div_ceil(2).max(1)
    }
}

/// One worker fewer than the host's parallelism, never below 1.
fn default_max_units() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_max_units_at_least_one() {
        let cfg = PoolConfig::default();
        assert!(cfg.max_units >= 1);
    }

    #[test]
    fn test_initial_units_is_half_rounded_up() {
        let mut cfg = PoolConfig::default();

        cfg.max_units = 1;
        assert_eq!(cfg.initial_units(), 1);
        cfg.max_units = 2;
        assert_eq!(cfg.initial_units(), 1);
        cfg.max_units = 3;
        assert_eq!(cfg.initial_units(), 2);
        cfg.max_units = 8;
        assert_eq!(cfg.initial_units(), 4);
    }
}
