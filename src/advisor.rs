//! # Resource advisor: sizing hints for pool consumers.
//!
//! The advisor recommends worker counts and batch sizes from the host's
//! parallelism. It is a collaborator of the pool, not a part of it: callers
//! MAY consult it to pick `max_units` or batch sizes before constructing a
//! pool, but the pool itself never polls resources.
//!
//! ## Example
//! ```
//! use workpool::{recommended_unit_count, PoolConfig};
//!
//! let mut cfg = PoolConfig::default();
//! cfg.max_units = recommended_unit_count(4, 1);
//! assert!(cfg.max_units >= 1);
//! ```

/// Recommends how many workers a pool should hold.
///
/// One less than the host's parallelism (keeping a core for the scheduler's
/// own thread of control), never below `min`; `default` is used when the
/// host's parallelism cannot be determined.
pub fn recommended_unit_count(default: usize, min: usize) -> usize {
    let recommended = match std::thread::available_parallelism() {
        Ok(n) => n.get().saturating_sub(1),
        Err(_) => default,
    };
    recommended.max(min)
}

/// Recommends how many items a caller should batch per submission.
///
/// Scales `default` down on hosts with little parallelism: the full default
/// from 8 threads up, half of it from 4, otherwise `min`.
pub fn recommended_batch_size(default: usize, min: usize) -> usize {
    let threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let recommended = if threads >= 8 {
        default
    } else if threads >= 4 {
        default / 2
    } else {
        min
    };
    recommended.max(min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_count_respects_min() {
        assert!(recommended_unit_count(4, 3) >= 3);
        assert!(recommended_unit_count(1, 1) >= 1);
    }

    #[test]
    fn test_batch_size_bounded_by_min_and_default() {
        let got = recommended_batch_size(32, 4);
        assert!(got >= 4);
        assert!(got <= 32);
    }
}
