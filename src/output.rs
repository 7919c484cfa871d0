//! Rendering grouped results for the terminal
use crate::list_model::ResultsListModel;
use crate::search::item::{ResultItem, ResultItemType};
use chrono::{DateTime, Utc};
use colored::*;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct GroupView<'a> {
    pub name: &'a str,
    pub total: usize,
    pub items: Vec<ItemView<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ItemView<'a> {
    #[serde(rename = "type")]
    pub item_type: ResultItemType,
    pub title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    pub pinned: bool,
}

impl<'a> From<&'a ResultItem> for ItemView<'a> {
    fn from(item: &'a ResultItem) -> Self {
        Self {
            item_type: item.item_type(),
            title: item.title(),
            source: item.source(),
            link: item.link(),
            date: item.date(),
            pinned: item.is_priority(),
        }
    }
}

/// Serializable view of the model, optionally capping items per group.
pub fn group_views(model: &ResultsListModel, max_items: Option<usize>) -> Vec<GroupView<'_>> {
    model
        .groups()
        .iter()
        .map(|group| GroupView {
            name: group.name(),
            total: group.len(),
            items: group
                .items()
                .iter()
                .take(max_items.unwrap_or(usize::MAX))
                .map(ItemView::from)
                .collect(),
        })
        .collect()
}

pub fn format_json(model: &ResultsListModel, max_items: Option<usize>) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&group_views(model, max_items))
}

pub fn format_text(model: &ResultsListModel, max_items: Option<usize>) -> String {
    let mut out = String::new();
    for group in group_views(model, max_items) {
        out.push_str(&format!(
            "{} {}\n",
            group.name.bold().underline(),
            format!("({})", group.total).dimmed()
        ));
        for item in &group.items {
            let marker = if item.pinned { "*".yellow() } else { " ".normal() };
            let mut line = format!("  {marker} {}", item.title.green());
            if let Some(source) = item.source {
                line.push_str(&format!(" {}", format!("[{source}]").cyan()));
            }
            if let Some(date) = item.date {
                line.push_str(&format!(" {}", date.format("%Y-%m-%d %H:%M").to_string().dimmed()));
            }
            out.push_str(&line);
            out.push('\n');
        }
        if group.items.len() < group.total {
            out.push_str(&format!(
                "  {}\n",
                format!("... {} more", group.total - group.items.len()).dimmed()
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list_model::GroupBy;
    use crate::model::{Article, Feed, Guide};
    use crate::search::item::ResultObject;
    use std::sync::Arc;

    fn sample_model() -> ResultsListModel {
        let mut model = ResultsListModel::new(GroupBy::Kind);
        model.add(ResultItem::new(ResultObject::Guide(Arc::new(Guide::new("News")))));
        let feed = Arc::new(Feed::new("BBC"));
        for title in ["Storm warning", "Storm over"] {
            model.add(ResultItem::new(ResultObject::Article {
                article: Arc::new(Article::new(title, "")),
                feed: feed.clone(),
            }));
        }
        model
    }

    #[test]
    fn test_text_lists_groups_and_truncates() {
        colored::control::set_override(false);
        let text = format_text(&sample_model(), Some(1));
        assert!(text.contains("Guides (1)"));
        assert!(text.contains("Articles (2)"));
        assert!(text.contains("Storm warning [BBC]"));
        assert!(!text.contains("Storm over"));
        assert!(text.contains("... 1 more"));
    }

    #[test]
    fn test_json_shape() {
        let json = format_json(&sample_model(), None).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["name"], "Guides");
        assert_eq!(value[1]["items"][0]["type"], "article");
        assert_eq!(value[1]["items"][1]["source"], "BBC");
        assert!(value[0]["items"][0].get("date").is_none());
    }
}
