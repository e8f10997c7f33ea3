//! Edge and cloud task queues.
//!
//! Each queue is a max-priority heap behind its own mutex. Equal priorities
//! come out in insertion order: every enqueue takes a sequence number from
//! a store-wide counter while holding the queue lock.

use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use thiserror::Error;

use crate::triage::ScoredTask;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("unknown queue `{0}` (expected `edge` or `cloud`)")]
    Unknown(String),
}

/// Which queue a task lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueId {
    /// Low-latency local processing.
    Edge,
    /// Deferred, high-capacity processing.
    Cloud,
}

impl QueueId {
    pub const ALL: [QueueId; 2] = [QueueId::Edge, QueueId::Cloud];

    pub fn as_str(self) -> &'static str {
        match self {
            QueueId::Edge => "edge",
            QueueId::Cloud => "cloud",
        }
    }
}

impl std::fmt::Display for QueueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueId {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "edge" => Ok(QueueId::Edge),
            "cloud" => Ok(QueueId::Cloud),
            _ => Err(QueueError::Unknown(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    seq: u64,
    task: ScoredTask,
}

// Higher priority first, then lower sequence number first.
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.task
            .priority()
            .total_cmp(&other.task.priority())
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == CmpOrdering::Equal
    }
}

impl Eq for Entry {}

/// Owner of the edge and cloud queues.
///
/// Shared behind an `Arc`; all methods take `&self`.
#[derive(Debug, Default)]
pub struct QueueStore {
    edge: Mutex<BinaryHeap<Entry>>,
    cloud: Mutex<BinaryHeap<Entry>>,
    next_seq: AtomicU64,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self, id: QueueId) -> MutexGuard<'_, BinaryHeap<Entry>> {
        let queue = match id {
            QueueId::Edge => &self.edge,
            QueueId::Cloud => &self.cloud,
        };
        // Critical sections never panic mid-update, so a poisoned heap is intact.
        queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a task. Returns its insertion sequence number.
    pub fn enqueue(&self, id: QueueId, task: ScoredTask) -> u64 {
        let mut heap = self.lock(id);
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        heap.push(Entry { seq, task });
        seq
    }

    /// Full contents, highest priority first. Leaves the queue untouched.
    pub fn snapshot_ordered(&self, id: QueueId) -> Vec<ScoredTask> {
        let mut entries: Vec<Entry> = self.lock(id).iter().cloned().collect();
        entries.sort_unstable_by(|a, b| b.cmp(a));
        entries.into_iter().map(|e| e.task).collect()
    }

    /// Remove and return every task, highest priority first.
    pub fn drain(&self, id: QueueId) -> Vec<ScoredTask> {
        let heap = std::mem::take(&mut *self.lock(id));
        let mut entries = heap.into_sorted_vec();
        entries.reverse();
        entries.into_iter().map(|e| e.task).collect()
    }

    /// Highest-priority task without removing it.
    pub fn peek(&self, id: QueueId) -> Option<ScoredTask> {
        self.lock(id).peek().map(|e| e.task.clone())
    }

    pub fn size(&self, id: QueueId) -> usize {
        self.lock(id).len()
    }

    /// Tasks across both queues.
    pub fn total(&self) -> usize {
        QueueId::ALL.iter().map(|&id| self.size(id)).sum()
    }

    /// Empty both queues.
    pub fn clear(&self) {
        for id in QueueId::ALL {
            self.lock(id).clear();
        }
    }

    /// [`snapshot_ordered`](Self::snapshot_ordered) addressed by name.
    pub fn snapshot_named(&self, name: &str) -> Result<Vec<ScoredTask>, QueueError> {
        Ok(self.snapshot_ordered(name.parse()?))
    }

    /// [`size`](Self::size) addressed by name.
    pub fn size_named(&self, name: &str) -> Result<usize, QueueError> {
        Ok(self.size(name.parse()?))
    }

    pub fn edge_tasks(&self) -> Vec<ScoredTask> {
        self.snapshot_ordered(QueueId::Edge)
    }

    pub fn cloud_tasks(&self) -> Vec<ScoredTask> {
        self.snapshot_ordered(QueueId::Cloud)
    }
}
