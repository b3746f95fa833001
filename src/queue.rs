//! # Ingestion queue
//! Ordered, in-memory, at-least-once buffer of raw items awaiting enrichment.
//!
//! One queue per domain, owned by whoever wires the ingestion pipeline.
//! `drain_all` is snapshot-and-remove: items enqueued while a drain is being
//! processed land in the next drain. Nothing survives a process restart;
//! re-delivery is absorbed by the idempotent upsert downstream.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::model::RawItem;

#[derive(Debug, Default)]
pub struct IngestionQueue {
    inner: Mutex<VecDeque<RawItem>>,
}

impl IngestionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, item: RawItem) {
        let mut q = self.inner.lock().expect("queue mutex poisoned");
        q.push_back(item);
    }

    /// Enqueue a batch preserving order. Returns how many were added.
    pub fn enqueue_all<I: IntoIterator<Item = RawItem>>(&self, items: I) -> usize {
        let mut q = self.inner.lock().expect("queue mutex poisoned");
        let before = q.len();
        q.extend(items);
        q.len() - before
    }

    /// Remove and return everything currently present, in FIFO order.
    pub fn drain_all(&self) -> Vec<RawItem> {
        let mut q = self.inner.lock().expect("queue mutex poisoned");
        std::mem::take(&mut *q).into()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("queue mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(key: &str) -> RawItem {
        RawItem {
            natural_key: key.into(),
            title: key.into(),
            body: String::new(),
            link: String::new(),
            published_at: None,
            source: "Test".into(),
            social: None,
        }
    }

    #[test]
    fn drain_returns_fifo_and_empties() {
        let q = IngestionQueue::new();
        q.enqueue(item("a"));
        assert_eq!(q.enqueue_all(vec![item("b"), item("c")]), 2);
        let out: Vec<_> = q.drain_all().into_iter().map(|i| i.natural_key).collect();
        assert_eq!(out, vec!["a", "b", "c"]);
        assert!(q.is_empty());
        assert!(q.drain_all().is_empty());
    }

    #[test]
    fn arrivals_after_drain_wait_for_next_drain() {
        let q = IngestionQueue::new();
        q.enqueue(item("a"));
        let first = q.drain_all();
        q.enqueue(item("b"));
        assert_eq!(first.len(), 1);
        assert_eq!(q.len(), 1);
        assert_eq!(q.drain_all()[0].natural_key, "b");
    }

    #[test]
    fn duplicates_are_kept_for_redelivery() {
        let q = IngestionQueue::new();
        q.enqueue(item("a"));
        q.enqueue(item("a"));
        assert_eq!(q.drain_all().len(), 2);
    }
}
