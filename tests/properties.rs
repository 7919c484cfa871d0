use feedseek::{
    is_complex_search_pattern, Article, Feed, GroupBy, Guide, ResultItem, ResultObject,
    ResultsListModel, SearchMatcher, SearchResult,
};
use proptest::prelude::*;
use std::sync::Arc;

fn item_for(kind: u8, title: &str, pinned: bool) -> ResultItem {
    match kind % 3 {
        0 => ResultItem::new(ResultObject::Guide(Arc::new(Guide::new(title)))),
        1 => ResultItem::new(ResultObject::Feed(Arc::new(Feed::new(title)))),
        _ => ResultItem::new(ResultObject::Article {
            article: Arc::new(Article::new(title, "").with_pinned(pinned)),
            feed: Arc::new(Feed::new("Feed")),
        }),
    }
}

fn membership(model: &ResultsListModel) -> Vec<(u32, Vec<String>)> {
    model
        .groups()
        .iter()
        .map(|g| (g.key(), g.items().iter().map(|i| i.title().to_string()).collect()))
        .collect()
}

proptest! {
    #[test]
    fn simple_guide_match_is_case_insensitive_substring(
        title in "[a-zA-Z ]{0,24}",
        query in "[a-zA-Z]{1,6}",
    ) {
        let matcher = SearchMatcher::new(&query, false);
        let expected = title.to_lowercase().contains(&query.to_lowercase());
        prop_assert_eq!(matcher.matches_guide(&Guide::new(title.as_str())), expected);
    }

    #[test]
    fn complex_detection_tracks_trigger_characters(s in "[a-z\"*+ ]{0,16}") {
        let expected = s.contains('"') || s.contains('*') || s.contains('+');
        prop_assert_eq!(is_complex_search_pattern(&s), expected);
    }

    #[test]
    fn pinned_only_never_matches_unpinned(
        title in "[a-z ]{0,24}",
        query in "[a-z*+\" ]{1,8}",
    ) {
        let matcher = SearchMatcher::new(&query, true);
        prop_assert!(!matcher.matches_article(&Article::new(title.as_str(), title.as_str())));
    }

    #[test]
    fn regrouping_restores_kind_membership(
        specs in prop::collection::vec((0u8..3, "[a-z]{1,8}", any::<bool>()), 0..24),
    ) {
        let mut model = ResultsListModel::new(GroupBy::Kind);
        for (kind, title, pinned) in &specs {
            model.add(item_for(*kind, title, *pinned));
        }
        let first = membership(&model);

        model.set_group_by(GroupBy::Flat);
        prop_assert!(model.groups().len() <= 1);
        model.set_group_by(GroupBy::Kind);

        prop_assert_eq!(membership(&model), first);
    }

    #[test]
    fn result_never_holds_duplicates(picks in prop::collection::vec(0usize..5, 0..40)) {
        let guides: Vec<Arc<Guide>> = (0..5).map(|i| Arc::new(Guide::new(format!("g{i}")))).collect();
        let result = SearchResult::new();
        for pick in &picks {
            result.add_item(ResultObject::Guide(guides[*pick].clone()));
        }

        let mut distinct = picks.clone();
        distinct.sort_unstable();
        distinct.dedup();
        prop_assert_eq!(result.len(), distinct.len());
    }

    #[test]
    fn priority_items_lead_their_group(pins in prop::collection::vec(any::<bool>(), 1..20)) {
        let mut model = ResultsListModel::new(GroupBy::Kind);
        for (i, pinned) in pins.iter().enumerate() {
            model.add(item_for(2, &format!("a{i}"), *pinned));
        }

        let flags: Vec<bool> = model.groups()[0].items().iter().map(|i| i.is_priority()).collect();
        let first_plain = flags.iter().position(|p| !p).unwrap_or(flags.len());
        prop_assert!(flags[first_plain..].iter().all(|p| !p));
    }
}
