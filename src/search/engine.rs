//! Core search engine implementation
use crate::metrics::SearchMetrics;
use crate::model::GuidesSet;
use crate::search::cache::PatternCache;
use crate::search::item::ResultObject;
use crate::search::matcher::{SearchMatcher, DEFAULT_REGEX_SIZE_LIMIT};
use crate::search::result::SearchResult;
use crossbeam_channel::{unbounded, Sender};
use log::{debug, error, warn};
use parking_lot::{Condvar, Mutex, RwLock};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Engine tuning knobs
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub regex_size_limit: usize,
    pub pattern_cache_size: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            regex_size_limit: DEFAULT_REGEX_SIZE_LIMIT,
            pattern_cache_size: 64,
        }
    }
}

struct ScanJob {
    generation: u64,
    text: String,
    pinned_only: bool,
}

struct EngineShared {
    guides: RwLock<Option<Arc<GuidesSet>>>,
    result: Arc<SearchResult>,
    metrics: SearchMetrics,
    cache: PatternCache,
    options: EngineOptions,
    pending: Mutex<usize>,
    idle: Condvar,
}

/// Runs searches over the registered guides set and publishes matches into
/// a shared [`SearchResult`]. Scans run on a dedicated background thread.
pub struct SearchEngine {
    shared: Arc<EngineShared>,
    sender: Option<Sender<ScanJob>>,
    worker: Option<JoinHandle<()>>,
}

impl SearchEngine {
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default(), SearchMetrics::new())
    }

    pub fn with_options(options: EngineOptions, metrics: SearchMetrics) -> Self {
        let result = Arc::new(SearchResult::new().with_metrics(metrics.clone()));
        let shared = Arc::new(EngineShared {
            guides: RwLock::new(None),
            result,
            metrics,
            cache: PatternCache::new(options.pattern_cache_size),
            options,
            pending: Mutex::new(0),
            idle: Condvar::new(),
        });

        let (sender, receiver) = unbounded::<ScanJob>();
        let worker_shared = shared.clone();
        let spawned = thread::Builder::new()
            .name("search-worker".to_string())
            .spawn(move || {
                while let Ok(job) = receiver.recv() {
                    let generation = job.generation;
                    // The guard has already fired `finished`; keep serving queued scans.
                    if panic::catch_unwind(AssertUnwindSafe(|| worker_shared.run(job))).is_err() {
                        error!("Scan {generation} panicked in a result listener");
                    }
                }
                debug!("Search worker stopped");
            });

        let (sender, worker) = match spawned {
            Ok(handle) => (Some(sender), Some(handle)),
            Err(e) => {
                error!("Failed to start search worker, searching on caller thread: {e}");
                (None, None)
            }
        };

        Self {
            shared,
            sender,
            worker,
        }
    }

    /// Registers the root of the graph to scan.
    pub fn set_guides_set(&self, guides: Arc<GuidesSet>) {
        *self.shared.guides.write() = Some(guides);
    }

    pub fn result(&self) -> Arc<SearchResult> {
        self.shared.result.clone()
    }

    pub fn metrics(&self) -> &SearchMetrics {
        &self.shared.metrics
    }

    /// Starts a new search. Previous results are cleared before this returns;
    /// matches then arrive through the result's listeners.
    pub fn set_search_text(&self, text: &str, pinned_only: bool) {
        let generation = self.shared.result.remove_all();
        let text = text.trim();
        let has_guides = self.shared.guides.read().is_some();

        if text.is_empty() || !has_guides {
            self.shared.result.fire_finished_tagged(generation);
            return;
        }

        let job = ScanJob {
            generation,
            text: text.to_string(),
            pinned_only,
        };
        *self.shared.pending.lock() += 1;

        let rejected = match &self.sender {
            Some(sender) => sender.send(job).err().map(|e| e.into_inner()),
            None => Some(job),
        };
        if let Some(job) = rejected {
            warn!("Search worker unavailable, scanning on caller thread");
            self.shared.metrics.sync_fallbacks.inc();
            self.shared.run(job);
        }
    }

    /// Scans synchronously on the calling thread for the given generation.
    pub fn do_search(&self, generation: u64, text: &str, pinned_only: bool) {
        *self.shared.pending.lock() += 1;
        self.shared.run(ScanJob {
            generation,
            text: text.to_string(),
            pinned_only,
        });
    }

    /// Blocks until every queued scan has finished.
    pub fn wait_idle(&self) {
        let mut pending = self.shared.pending.lock();
        while *pending > 0 {
            self.shared.idle.wait(&mut pending);
        }
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SearchEngine {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Search worker panicked");
            }
        }
    }
}

/// Fires `finished` and releases the pending slot however the scan ends.
struct ScanGuard<'a> {
    shared: &'a EngineShared,
    generation: u64,
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.shared.result.fire_finished_tagged(self.generation);
        let mut pending = self.shared.pending.lock();
        *pending = pending.saturating_sub(1);
        if *pending == 0 {
            self.shared.idle.notify_all();
        }
    }
}

impl EngineShared {
    fn run(&self, job: ScanJob) {
        let _guard = ScanGuard {
            shared: self,
            generation: job.generation,
        };

        let guides = match self.guides.read().clone() {
            Some(guides) => guides,
            None => return,
        };

        self.metrics.scans_started.inc();
        let start = Instant::now();
        let matcher = SearchMatcher::build(
            &job.text,
            job.pinned_only,
            self.options.regex_size_limit,
            Some(&self.cache),
        );
        debug!(
            "Scan {} started for '{}' ({} matcher, pinned only: {})",
            job.generation,
            job.text,
            matcher.strategy_name(),
            job.pinned_only
        );

        if self.scan(&guides, &matcher, job.generation) {
            self.metrics.scans_completed.inc();
            debug!(
                "Scan {} completed in {:.2}ms with {} results",
                job.generation,
                start.elapsed().as_secs_f64() * 1000.0,
                self.result.len()
            );
        } else {
            debug!("Scan {} abandoned, superseded by a newer search", job.generation);
        }
    }

    /// Guides, then the flat feed list, then articles per feed. Returns false
    /// when the scan was superseded before reaching the end.
    fn scan(&self, guides: &GuidesSet, matcher: &SearchMatcher, generation: u64) -> bool {
        let snapshot = guides.snapshot();

        for guide in &snapshot.guides {
            if !self.result.is_current(generation) {
                return false;
            }
            if matcher.matches_guide(guide) {
                self.publish(generation, ResultObject::Guide(guide.clone()));
            }
        }

        for (feed, _) in &snapshot.feeds {
            if !self.result.is_current(generation) {
                return false;
            }
            if matcher.matches_feed(feed) {
                self.publish(generation, ResultObject::Feed(feed.clone()));
            }
        }

        for (feed, articles) in &snapshot.feeds {
            for article in articles {
                if !self.result.is_current(generation) {
                    return false;
                }
                if matcher.matches_article(article) {
                    self.publish(
                        generation,
                        ResultObject::Article {
                            article: article.clone(),
                            feed: feed.clone(),
                        },
                    );
                }
            }
        }

        true
    }

    fn publish(&self, generation: u64, object: ResultObject) {
        if self.result.add_item_tagged(generation, object) {
            self.metrics.items_matched.inc();
        }
    }
}
