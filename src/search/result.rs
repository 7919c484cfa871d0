//! Flat, de-duplicated collection of matches with change notification
//!
//! Every [`SearchResult::remove_all`] starts a new generation. Additions and
//! completion signals tagged with an older generation belong to a scan that
//! has been superseded and are dropped, so listeners only ever see the most
//! recent search.

use crate::metrics::SearchMetrics;
use crate::search::item::{ResultItem, ResultObject};
use log::trace;
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Receives result changes. Callbacks run on whichever thread mutated the result.
pub trait SearchResultListener: Send + Sync {
    fn item_added(&self, result: &SearchResult, item: &ResultItem, index: usize);
    fn items_removed(&self, result: &SearchResult);
    fn finished(&self, result: &SearchResult);
}

#[derive(Default)]
struct ResultState {
    items: Vec<ResultItem>,
    seen: HashSet<ResultItem>,
}

pub struct SearchResult {
    state: Mutex<ResultState>,
    generation: AtomicU64,
    listeners: RwLock<Vec<Arc<dyn SearchResultListener>>>,
    // Serializes mutation + fan-out so listeners observe indices in order.
    delivery: ReentrantMutex<()>,
    metrics: Option<SearchMetrics>,
}

impl Default for SearchResult {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchResult {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ResultState::default()),
            generation: AtomicU64::new(0),
            listeners: RwLock::new(Vec::new()),
            delivery: ReentrantMutex::new(()),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: SearchMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Registers a listener; registering the same listener twice is a no-op.
    pub fn add_listener(&self, listener: Arc<dyn SearchResultListener>) {
        let mut listeners = self.listeners.write();
        if !listeners.iter().any(|l| same_listener(l, &listener)) {
            listeners.push(listener);
        }
    }

    pub fn remove_listener(&self, listener: &Arc<dyn SearchResultListener>) {
        self.listeners.write().retain(|l| !same_listener(l, listener));
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current_generation() == generation
    }

    /// Adds an object to the current generation.
    pub fn add_item(&self, object: ResultObject) -> bool {
        let _delivery = self.delivery.lock();
        self.add_item_tagged(self.current_generation(), object)
    }

    /// Adds an object found by the scan of `generation`. Returns whether an
    /// `item_added` event was fired.
    pub fn add_item_tagged(&self, generation: u64, object: ResultObject) -> bool {
        let _delivery = self.delivery.lock();
        if !self.is_current(generation) {
            self.record_stale(generation);
            return false;
        }

        let item = ResultItem::new(object);
        let index = {
            let mut state = self.state.lock();
            if !state.seen.insert(item.clone()) {
                return false;
            }
            state.items.push(item.clone());
            state.items.len() - 1
        };

        trace!("Result #{index} added: {item}");
        for listener in self.listeners_snapshot() {
            listener.item_added(self, &item, index);
        }
        true
    }

    /// Clears the collection, starts a new generation and returns it.
    pub fn remove_all(&self) -> u64 {
        let _delivery = self.delivery.lock();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state.lock();
            state.items.clear();
            state.seen.clear();
        }

        for listener in self.listeners_snapshot() {
            listener.items_removed(self);
        }
        generation
    }

    /// Signals completion of the current generation.
    pub fn fire_finished(&self) {
        let _delivery = self.delivery.lock();
        self.fire_finished_tagged(self.current_generation());
    }

    /// Signals completion of the scan for `generation`; stale signals are dropped.
    pub fn fire_finished_tagged(&self, generation: u64) -> bool {
        let _delivery = self.delivery.lock();
        if !self.is_current(generation) {
            self.record_stale(generation);
            return false;
        }

        for listener in self.listeners_snapshot() {
            listener.finished(self);
        }
        true
    }

    pub fn items(&self) -> Vec<ResultItem> {
        self.state.lock().items.clone()
    }

    pub fn get(&self, index: usize) -> Option<ResultItem> {
        self.state.lock().items.get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    fn listeners_snapshot(&self) -> Vec<Arc<dyn SearchResultListener>> {
        self.listeners.read().clone()
    }

    fn record_stale(&self, generation: u64) {
        trace!(
            "Dropping event from stale generation {generation} (current {})",
            self.current_generation()
        );
        if let Some(metrics) = &self.metrics {
            metrics.stale_events_dropped.inc();
        }
    }
}

fn same_listener(a: &Arc<dyn SearchResultListener>, b: &Arc<dyn SearchResultListener>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
