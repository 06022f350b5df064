use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::queue::SegQueue;

/// Shared, unbounded FIFO of opaque text payloads.
///
/// One store is owned by the server process for its lifetime and injected
/// into every connection handler. Each operation is atomic and FIFO order is
/// preserved under concurrent access; there is no capacity bound, so
/// sustained publishing without receiving grows process memory without
/// limit.
pub struct QueueStore {
    queue: SegQueue<String>,
    stats: QueueStats,
}

pub struct QueueStats {
    enqueued_total: AtomicU64,
    dequeued_total: AtomicU64,
}

impl QueueStats {
    pub fn new() -> Self {
        Self {
            enqueued_total: AtomicU64::new(0),
            dequeued_total: AtomicU64::new(0),
        }
    }

    pub fn enqueued_total(&self) -> u64 {
        self.enqueued_total.load(Ordering::SeqCst)
    }

    pub fn dequeued_total(&self) -> u64 {
        self.dequeued_total.load(Ordering::SeqCst)
    }
}

impl Default for QueueStats {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueStore {
    pub fn new() -> Self {
        Self {
            queue: SegQueue::new(),
            stats: QueueStats::new(),
        }
    }

    /// Append a message at the tail. Always succeeds.
    pub fn enqueue(&self, message: String) {
        self.queue.push(message);
        self.stats.enqueued_total.fetch_add(1, Ordering::SeqCst);
    }

    /// Remove and return the head, or `None` if the queue is empty. Never
    /// waits for a future publish.
    pub fn try_dequeue(&self) -> Option<String> {
        let message = self.queue.pop()?;
        self.stats.dequeued_total.fetch_add(1, Ordering::SeqCst);
        Some(message)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }
}

impl Default for QueueStore {
    fn default() -> Self {
        Self::new()
    }
}
