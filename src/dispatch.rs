//! Moving search events to the thread that owns the view state
//!
//! The search core calls listeners on the worker thread. A front end either
//! feeds a shared [`ResultsListModel`] directly through [`ModelFeeder`] or
//! drains [`SearchEvent`]s from a [`ChannelListener`] on its own thread.

use crate::list_model::ResultsListModel;
use crate::search::item::ResultItem;
use crate::search::result::{SearchResult, SearchResultListener};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Result change, detached from the result it came from.
#[derive(Debug, Clone)]
pub enum SearchEvent {
    ItemAdded { item: ResultItem, index: usize },
    ItemsRemoved,
    Finished { total: usize },
}

impl SearchEvent {
    /// Applies the event to a list model.
    pub fn apply(&self, model: &mut ResultsListModel) {
        match self {
            SearchEvent::ItemAdded { item, .. } => {
                model.add(item.clone());
            }
            SearchEvent::ItemsRemoved => model.clear(),
            SearchEvent::Finished { .. } => {}
        }
    }
}

/// Forwards result events over a channel.
pub struct ChannelListener {
    sender: Sender<SearchEvent>,
}

impl ChannelListener {
    pub fn channel() -> (Arc<Self>, Receiver<SearchEvent>) {
        let (sender, receiver) = unbounded();
        (Arc::new(Self { sender }), receiver)
    }

    fn send(&self, event: SearchEvent) {
        // Receiver gone means the view closed; nothing left to update.
        let _ = self.sender.send(event);
    }
}

impl SearchResultListener for ChannelListener {
    fn item_added(&self, _result: &SearchResult, item: &ResultItem, index: usize) {
        self.send(SearchEvent::ItemAdded {
            item: item.clone(),
            index,
        });
    }

    fn items_removed(&self, _result: &SearchResult) {
        self.send(SearchEvent::ItemsRemoved);
    }

    fn finished(&self, result: &SearchResult) {
        self.send(SearchEvent::Finished {
            total: result.len(),
        });
    }
}

/// Feeds result events straight into a shared list model.
pub struct ModelFeeder {
    model: Arc<Mutex<ResultsListModel>>,
}

impl ModelFeeder {
    pub fn new(model: Arc<Mutex<ResultsListModel>>) -> Arc<Self> {
        Arc::new(Self { model })
    }
}

impl SearchResultListener for ModelFeeder {
    fn item_added(&self, _result: &SearchResult, item: &ResultItem, _index: usize) {
        self.model.lock().add(item.clone());
    }

    fn items_removed(&self, _result: &SearchResult) {
        self.model.lock().clear();
    }

    fn finished(&self, result: &SearchResult) {
        debug!("Search finished with {} results", result.len());
    }
}

enum DebounceMsg {
    Text(String),
    Commit,
}

/// Delivers the latest query text once input has been quiet for a while,
/// or immediately on commit. Pending text is flushed when dropped.
pub struct Debouncer {
    sender: Option<Sender<DebounceMsg>>,
    worker: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new<F>(quiet: Duration, mut deliver: F) -> Self
    where
        F: FnMut(String) + Send + 'static,
    {
        let (sender, receiver) = unbounded::<DebounceMsg>();
        let spawned = thread::Builder::new()
            .name("query-debounce".to_string())
            .spawn(move || {
                let mut pending: Option<String> = None;
                loop {
                    let msg = if pending.is_some() {
                        match receiver.recv_timeout(quiet) {
                            Ok(msg) => msg,
                            Err(RecvTimeoutError::Timeout) => DebounceMsg::Commit,
                            Err(RecvTimeoutError::Disconnected) => break,
                        }
                    } else {
                        match receiver.recv() {
                            Ok(msg) => msg,
                            Err(_) => break,
                        }
                    };

                    match msg {
                        DebounceMsg::Text(text) => pending = Some(text),
                        DebounceMsg::Commit => {
                            if let Some(text) = pending.take() {
                                deliver(text);
                            }
                        }
                    }
                }
                if let Some(text) = pending.take() {
                    deliver(text);
                }
            });

        match spawned {
            Ok(handle) => Self {
                sender: Some(sender),
                worker: Some(handle),
            },
            Err(e) => {
                error!("Failed to start debounce thread: {e}");
                Self {
                    sender: None,
                    worker: None,
                }
            }
        }
    }

    /// Replaces the pending text and restarts the quiet period.
    pub fn push(&self, text: impl Into<String>) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(DebounceMsg::Text(text.into()));
        }
    }

    /// Delivers pending text right away.
    pub fn commit(&self) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(DebounceMsg::Commit);
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list_model::GroupBy;
    use crate::model::Guide;
    use crate::search::item::ResultObject;

    #[test]
    fn test_debouncer_delivers_only_latest_text() {
        let (tx, rx) = unbounded();
        let debouncer = Debouncer::new(Duration::from_millis(50), move |text| {
            let _ = tx.send(text);
        });

        debouncer.push("s");
        debouncer.push("st");
        debouncer.push("storm");

        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), "storm");
        assert!(rx.recv_timeout(Duration::from_millis(150)).is_err());
    }

    #[test]
    fn test_debouncer_commit_and_drop_flush() {
        let (tx, rx) = unbounded();
        let debouncer = Debouncer::new(Duration::from_secs(60), move |text| {
            let _ = tx.send(text);
        });

        debouncer.push("now");
        debouncer.commit();
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), "now");

        debouncer.commit();
        debouncer.push("on close");
        drop(debouncer);
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec!["on close"]);
    }

    #[test]
    fn test_channel_events_rebuild_model() {
        let result = SearchResult::new();
        let (listener, events) = ChannelListener::channel();
        result.add_listener(listener);

        result.add_item(ResultObject::Guide(Arc::new(Guide::new("News"))));
        result.fire_finished();
        result.remove_all();

        let mut model = ResultsListModel::new(GroupBy::Kind);
        let received: Vec<SearchEvent> = events.try_iter().collect();
        assert!(matches!(received[0], SearchEvent::ItemAdded { index: 0, .. }));
        assert!(matches!(received[1], SearchEvent::Finished { total: 1 }));

        received[0].apply(&mut model);
        received[1].apply(&mut model);
        assert_eq!(model.len(), 1);
        received[2].apply(&mut model);
        assert!(model.is_empty());
    }

    #[test]
    fn test_model_feeder_tracks_result() {
        let model = Arc::new(Mutex::new(ResultsListModel::new(GroupBy::Flat)));
        let result = SearchResult::new();
        result.add_listener(ModelFeeder::new(model.clone()));

        result.add_item(ResultObject::Guide(Arc::new(Guide::new("A"))));
        result.add_item(ResultObject::Guide(Arc::new(Guide::new("B"))));
        assert_eq!(model.lock().len(), 2);

        result.remove_all();
        assert!(model.lock().is_empty());
    }
}
