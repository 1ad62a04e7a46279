//! Debounced search input.
//!
//! Every keystroke aborts the pending timer and starts a new one; only a
//! timer that runs out emits a `SearchRequest`. Requests carry a generation
//! so responses to superseded queries can be discarded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::SEARCH_DEBOUNCE_MS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub generation: u64,
}

/// Monotonic query counter shared between issuer and result handler.
#[derive(Debug, Default, Clone)]
pub struct QueryGeneration {
    current: Arc<AtomicU64>,
}

impl QueryGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new query and returns its generation.
    pub fn advance(&self) -> u64 {
        self.current.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    /// False once a newer query was started.
    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}

pub struct SearchDebouncer {
    delay: Duration,
    generation: QueryGeneration,
    pending: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<SearchRequest>,
}

impl SearchDebouncer {
    /// Must be created inside a tokio runtime.
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<SearchRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let debouncer = Self {
            delay,
            generation: QueryGeneration::new(),
            pending: None,
            tx,
        };
        (debouncer, rx)
    }

    pub fn with_default_delay() -> (Self, mpsc::UnboundedReceiver<SearchRequest>) {
        Self::new(Duration::from_millis(SEARCH_DEBOUNCE_MS))
    }

    /// Handle for checking whether a result is still wanted.
    pub fn generations(&self) -> QueryGeneration {
        self.generation.clone()
    }

    /// Registers a keystroke. Returns the generation the query will carry.
    pub fn input(&mut self, query: impl Into<String>) -> u64 {
        self.abort_pending();
        let generation = self.generation.advance();
        let request = SearchRequest {
            query: query.into().trim().to_string(),
            generation,
        };
        let tx = self.tx.clone();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(request).is_err() {
                tracing::debug!(generation, "Search receiver dropped");
            }
        }));
        generation
    }

    /// Drops the pending query, e.g. when the search field is cleared.
    pub fn cancel(&mut self) {
        self.abort_pending();
        self.generation.advance();
    }

    fn abort_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.abort_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn only_last_keystroke_fires() {
        let (mut debouncer, mut rx) = SearchDebouncer::new(Duration::from_millis(300));
        debouncer.input("T");
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.input("To");
        tokio::time::sleep(Duration::from_millis(100)).await;
        let last = debouncer.input("Top ");

        tokio::time::sleep(Duration::from_millis(301)).await;
        let request = rx.recv().await.unwrap();
        assert_eq!(request.query, "Top");
        assert_eq!(request.generation, last);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn separate_pauses_fire_separately() {
        let (mut debouncer, mut rx) = SearchDebouncer::new(Duration::from_millis(50));
        debouncer.input("Aura");
        tokio::time::sleep(Duration::from_millis(60)).await;
        debouncer.input("Aura links");
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(rx.recv().await.unwrap().query, "Aura");
        assert_eq!(rx.recv().await.unwrap().query, "Aura links");
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_suppresses_pending_query() {
        let (mut debouncer, mut rx) = SearchDebouncer::new(Duration::from_millis(50));
        let generation = debouncer.input("Wetter");
        debouncer.cancel();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
        assert!(!debouncer.generations().is_current(generation));
    }

    #[test]
    fn generation_marks_stale_results() {
        let generations = QueryGeneration::new();
        let first = generations.advance();
        let second = generations.advance();
        assert!(!generations.is_current(first));
        assert!(generations.is_current(second));
    }
}
