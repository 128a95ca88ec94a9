//! # Priority queue of pending tasks.
//!
//! Tasks wait here between admission and dispatch. Ordering is strictly
//! `(priority desc, seq asc)`: higher priority first, and among equal
//! priorities the earlier submission wins. The tie-break uses an explicit
//! monotone sequence number stamped at admission — never sort stability —
//! so dispatch order is deterministic.
//!
//! ## Rules
//! - The queue is unbounded; admission is never rejected for depth.
//! - A popped task is owned by exactly one worker until it resolves.

use std::collections::BinaryHeap;
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::error::TaskError;
use crate::workers::{TaskId, Worker};

/// One admitted, not-yet-dispatched task.
pub(crate) struct QueuedTask<W: Worker> {
    pub id: TaskId,
    pub kind: Arc<str>,
    pub payload: W::Payload,
    pub priority: i32,
    /// Admission sequence; the deterministic FIFO tie-break.
    pub seq: u64,
    /// Resolves the submitter's pending future.
    pub respond: oneshot::Sender<Result<W::Output, TaskError>>,
}

impl<W: Worker> PartialEq for QueuedTask<W> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl<W: Worker> Eq for QueuedTask<W> {}

impl<W: Worker> Ord for QueuedTask<W> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Max-heap: higher priority first, then lower seq first.
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<W: Worker> PartialOrd for QueuedTask<W> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority-ordered collection of pending tasks.
pub(crate) struct TaskQueue<W: Worker> {
    heap: BinaryHeap<QueuedTask<W>>,
}

impl<W: Worker> TaskQueue<W> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    /// Inserts a task at its priority position.
    pub fn push(&mut self, task: QueuedTask<W>) {
        self.heap.push(task);
    }

    /// Removes and returns the highest-priority, earliest-submitted task.
    pub fn pop(&mut self) -> Option<QueuedTask<W>> {
        self.heap.pop()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Empties the queue, yielding tasks in no particular order.
    pub fn drain(&mut self) -> impl Iterator<Item = QueuedTask<W>> + '_ {
        self.heap.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkerError;
    use crate::workers::Job;
    use async_trait::async_trait;

    struct NullWorker;

    #[async_trait]
    impl Worker for NullWorker {
        type Payload = ();
        type Output = ();

        async fn process(&mut self, _job: Job<()>) -> Result<(), WorkerError> {
            Ok(())
        }
    }

    fn task(id: u64, priority: i32, seq: u64) -> QueuedTask<NullWorker> {
        let (respond, _rx) = oneshot::channel();
        QueuedTask {
            id: TaskId(id),
            kind: "test".into(),
            payload: (),
            priority,
            seq,
            respond,
        }
    }

    fn pop_ids(queue: &mut TaskQueue<NullWorker>) -> Vec<u64> {
        let mut out = Vec::new();
        while let Some(t) = queue.pop() {
            out.push(t.id.0);
        }
        out
    }

    #[test]
    fn test_higher_priority_pops_first() {
        let mut q = TaskQueue::new();
        q.push(task(0, 1, 0));
        q.push(task(1, 5, 1));
        q.push(task(2, 3, 2));

        assert_eq!(pop_ids(&mut q), vec![1, 2, 0]);
    }

    #[test]
    fn test_equal_priority_is_fifo_by_seq() {
        let mut q = TaskQueue::new();
        q.push(task(0, 2, 0));
        q.push(task(1, 2, 1));
        q.push(task(2, 2, 2));

        assert_eq!(pop_ids(&mut q), vec![0, 1, 2]);
    }

    #[test]
    fn test_fifo_holds_regardless_of_insertion_order() {
        let mut q = TaskQueue::new();
        q.push(task(2, 2, 2));
        q.push(task(0, 2, 0));
        q.push(task(1, 2, 1));

        assert_eq!(pop_ids(&mut q), vec![0, 1, 2]);
    }

    #[test]
    fn test_negative_priorities_sort_below_zero() {
        let mut q = TaskQueue::new();
        q.push(task(0, -5, 0));
        q.push(task(1, 0, 1));

        assert_eq!(pop_ids(&mut q), vec![1, 0]);
    }

    #[test]
    fn test_drain_empties_queue() {
        let mut q = TaskQueue::new();
        q.push(task(0, 1, 0));
        q.push(task(1, 2, 1));

        assert_eq!(q.drain().count(), 2);
        assert!(q.is_empty());
    }
}
