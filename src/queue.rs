//! FIFO work queue that holds each node at most once.

use std::collections::VecDeque;

/// Pushing a node that is already queued is a no-op; a node can be queued again after it
/// has been popped.
#[derive(Debug, Clone, Default)]
pub struct UniqueQueue {
    queue: VecDeque<usize>,
    queued: Vec<bool>,
}

impl UniqueQueue {
    pub fn new(node_count: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            queued: vec![false; node_count],
        }
    }

    /// Clear the queue and make room for `node_count` nodes.
    pub fn reset(&mut self, node_count: usize) {
        self.clear();
        self.queued.resize(node_count, false);
    }

    pub fn push(&mut self, node: usize) -> bool {
        if self.queued[node] {
            return false;
        }
        self.queued[node] = true;
        self.queue.push_back(node);
        true
    }

    pub fn pop(&mut self) -> Option<usize> {
        let node = self.queue.pop_front()?;
        self.queued[node] = false;
        Some(node)
    }

    pub fn contains(&self, node: usize) -> bool {
        self.queued[node]
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        for node in self.queue.drain(..) {
            self.queued[node] = false;
        }
    }
}
