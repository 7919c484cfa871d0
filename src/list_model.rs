//! Grouped projection of the flat result stream
//!
//! Items are kept in arrival order for the lifetime of the model. Groups are
//! derived from the current [`GroupBy`] mode and rebuilt from scratch when
//! the mode changes.

use crate::search::item::{ResultItem, ResultItemType};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    /// Everything in one group
    Flat,
    /// Guides, feeds, articles, pictures
    #[default]
    Kind,
    /// Age buckets
    Date,
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupBy::Flat => write!(f, "flat"),
            GroupBy::Kind => write!(f, "kind"),
            GroupBy::Date => write!(f, "date"),
        }
    }
}

const FLAT_GROUP_KEY: u32 = 0;
const FLAT_GROUP_NAME: &str = "All Results";

/// Age bucket of a dated item relative to "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DateRange {
    Today,
    Yesterday,
    LastWeek,
    LastMonth,
    Older,
    NoDate,
}

impl DateRange {
    pub fn classify(date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let Some(date) = date else {
            return DateRange::NoDate;
        };
        let days = (now.date_naive() - date.date_naive()).num_days();
        match days {
            i64::MIN..=0 => DateRange::Today,
            1 => DateRange::Yesterday,
            2..=6 => DateRange::LastWeek,
            7..=30 => DateRange::LastMonth,
            _ => DateRange::Older,
        }
    }

    pub fn index(&self) -> u32 {
        *self as u32
    }

    pub fn name(&self) -> &'static str {
        match self {
            DateRange::Today => "Today",
            DateRange::Yesterday => "Yesterday",
            DateRange::LastWeek => "Last 7 Days",
            DateRange::LastMonth => "Last 30 Days",
            DateRange::Older => "Older",
            DateRange::NoDate => "No Date",
        }
    }
}

/// Named bucket of result items.
#[derive(Debug, Clone)]
pub struct ResultGroup {
    key: u32,
    name: String,
    items: Vec<ResultItem>,
}

impl ResultGroup {
    fn new(key: u32, name: impl Into<String>) -> Self {
        Self {
            key,
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn key(&self) -> u32 {
        self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn items(&self) -> &[ResultItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Priority items go to the front of the group, after earlier pinned items,
/// so pinned results keep their arrival order. Others are appended.
    fn insert(&mut self, item: ResultItem) -> usize {
        let index = if item.is_priority() {
            self.items.iter().take_while(|i| i.is_priority()).count()
        } else {
            self.items.len()
        };
        self.items.insert(index, item);
        index
    }
}

/// Receives group and item lifecycle events. All methods default to no-ops.
pub trait ResultsListModelListener: Send + Sync {
    fn on_clear(&self) {}
    fn on_group_added(&self, _group: &ResultGroup, _index: usize) {}
    fn on_group_removed(&self, _group: &ResultGroup, _index: usize) {}
    fn on_group_updated(&self, _group: &ResultGroup, _index: usize) {}
    fn on_item_added(&self, _group: &ResultGroup, _item: &ResultItem, _index: usize) {}
    fn on_item_removed(&self, _group: &ResultGroup, _item: &ResultItem, _index: usize) {}
}

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct ResultsListModel {
    group_by: GroupBy,
    items: Vec<ResultItem>,
    seen: HashSet<ResultItem>,
    groups: Vec<ResultGroup>,
    listeners: Vec<Arc<dyn ResultsListModelListener>>,
    clock: Clock,
}

impl Default for ResultsListModel {
    fn default() -> Self {
        Self::new(GroupBy::default())
    }
}

impl ResultsListModel {
    pub fn new(group_by: GroupBy) -> Self {
        Self {
            group_by,
            items: Vec::new(),
            seen: HashSet::new(),
            groups: Vec::new(),
            listeners: Vec::new(),
            clock: Arc::new(Utc::now),
        }
    }

    /// Replaces the wall clock used for date grouping.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn add_listener(&mut self, listener: Arc<dyn ResultsListModelListener>) {
        let ptr = Arc::as_ptr(&listener) as *const ();
        if !self
            .listeners
            .iter()
            .any(|l| std::ptr::eq(Arc::as_ptr(l) as *const (), ptr))
        {
            self.listeners.push(listener);
        }
    }

    pub fn group_by(&self) -> GroupBy {
        self.group_by
    }

    pub fn groups(&self) -> &[ResultGroup] {
        &self.groups
    }

    /// Every item added since the last clear, in arrival order.
    pub fn items(&self) -> &[ResultItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds a new item; returns false if it was already present.
    pub fn add(&mut self, item: ResultItem) -> bool {
        if !self.seen.insert(item.clone()) {
            return false;
        }
        self.items.push(item.clone());
        self.add_existing_item(item);
        true
    }

    /// Removes an item, dropping its group once empty.
    pub fn remove(&mut self, item: &ResultItem) -> bool {
        if !self.seen.remove(item) {
            return false;
        }
        self.items.retain(|i| i != item);

        let located = self.groups.iter().enumerate().find_map(|(g, group)| {
            group.items.iter().position(|i| i == item).map(|pos| (g, pos))
        });
        let Some((group_index, item_index)) = located else {
            return true;
        };

        let removed = self.groups[group_index].items.remove(item_index);
        let group = &self.groups[group_index];
        for listener in &self.listeners {
            listener.on_item_removed(group, &removed, item_index);
        }

        if group.is_empty() {
            let group = self.groups.remove(group_index);
            for listener in &self.listeners {
                listener.on_group_removed(&group, group_index);
            }
        } else {
            for listener in &self.listeners {
                listener.on_group_updated(group, group_index);
            }
        }
        true
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.seen.clear();
        self.groups.clear();
        for listener in &self.listeners {
            listener.on_clear();
        }
    }

    /// Regroups every item under the new mode without re-running the search.
    pub fn set_group_by(&mut self, group_by: GroupBy) {
        self.group_by = group_by;
        self.groups.clear();
        for listener in &self.listeners {
            listener.on_clear();
        }
        for item in self.items.clone() {
            self.add_existing_item(item);
        }
    }

    fn group_key(&self, item: &ResultItem) -> (u32, &'static str) {
        match self.group_by {
            GroupBy::Flat => (FLAT_GROUP_KEY, FLAT_GROUP_NAME),
            GroupBy::Kind => {
                let kind: ResultItemType = item.item_type();
                (kind.order(), kind.display_name())
            }
            GroupBy::Date => {
                let range = DateRange::classify(item.date(), (self.clock)());
                (range.index(), range.name())
            }
        }
    }

    fn add_existing_item(&mut self, item: ResultItem) {
        let (key, name) = self.group_key(&item);

        let (group_index, created) = match self.groups.binary_search_by_key(&key, |g| g.key) {
            Ok(index) => (index, false),
            Err(index) => {
                self.groups.insert(index, ResultGroup::new(key, name));
                (index, true)
            }
        };

        if created {
            for listener in &self.listeners {
                listener.on_group_added(&self.groups[group_index], group_index);
            }
        }

        let item_index = self.groups[group_index].insert(item);
        let group = &self.groups[group_index];
        let item = &group.items[item_index];
        for listener in &self.listeners {
            listener.on_item_added(group, item, item_index);
        }
        if !created {
            for listener in &self.listeners {
                listener.on_group_updated(group, group_index);
            }
        }
    }
}
