//! Deferred actions keyed by local fire time.
//!
//! Tasks fire on the first tick where `now >= fire_at`; nothing blocks.
//! Each [`TaskKind`] has a single slot, so scheduling a task replaces any
//! pending task of the same kind.

use std::{cmp::Ordering, cmp::Reverse, collections::BinaryHeap};

use ordered_float::OrderedFloat;
use url::Url;

#[derive(Debug, Clone, PartialEq)]
pub enum DeferredTask {
    /// (Re)load the currently replicated URL. Used for error retries.
    Load,
    /// Request playback of a URL, e.g. the default URL at session start.
    Play(Url),
    /// Stop local playback after the owner stopped. Deferred so it never
    /// runs inside the replication callback that observed the stop.
    StopLocal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Load,
    Play,
    StopLocal,
}

impl DeferredTask {
    pub fn kind(&self) -> TaskKind {
        match self {
            DeferredTask::Load => TaskKind::Load,
            DeferredTask::Play(_) => TaskKind::Play,
            DeferredTask::StopLocal => TaskKind::StopLocal,
        }
    }
}

#[derive(Debug)]
struct Entry {
    fire_at: OrderedFloat<f64>,
    seq: u64,
    task: DeferredTask,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fire_at
            .cmp(&other.fire_at)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Min-heap of deferred tasks processed once per scheduler tick.
#[derive(Debug, Default)]
pub struct Scheduler {
    heap: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` at local time `fire_at`, superseding a pending task
    /// of the same kind.
    pub fn schedule(&mut self, task: DeferredTask, fire_at: f64) {
        self.cancel(task.kind());
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Entry {
            fire_at: OrderedFloat(fire_at),
            seq,
            task,
        }));
    }

    pub fn cancel(&mut self, kind: TaskKind) {
        self.heap.retain(|Reverse(entry)| entry.task.kind() != kind);
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    /// Remove and return every task due at `now`, earliest first.
    ///
    /// Tasks scheduled while the returned ones run are left for the next tick.
    pub fn take_due(&mut self, now: f64) -> Vec<DeferredTask> {
        let mut due = Vec::new();
        while let Some(Reverse(entry)) = self.heap.peek() {
            if entry.fire_at.0 > now {
                break;
            }
            if let Some(Reverse(entry)) = self.heap.pop() {
                due.push(entry.task);
            }
        }
        due
    }

    pub fn fire_time(&self, kind: TaskKind) -> Option<f64> {
        self.heap
            .iter()
            .find(|Reverse(entry)| entry.task.kind() == kind)
            .map(|Reverse(entry)| entry.fire_at.0)
    }

    pub fn is_pending(&self, kind: TaskKind) -> bool {
        self.fire_time(kind).is_some()
    }

    pub fn next_fire_time(&self) -> Option<f64> {
        self.heap.peek().map(|Reverse(entry)| entry.fire_at.0)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
