use criterion::{criterion_group, criterion_main, Criterion};
use feedseek::{Article, Feed, Guide, GuidesSet, SearchEngine, SearchMatcher};
use std::hint::black_box;
use std::sync::Arc;

fn build_set(feeds: usize, articles_per_feed: usize) -> Arc<GuidesSet> {
    let set = Arc::new(GuidesSet::new());
    let guide = Arc::new(Guide::new("Bench"));
    for f in 0..feeds {
        let feed = Arc::new(Feed::new(format!("Feed {f}")));
        for a in 0..articles_per_feed {
            feed.add_article(Arc::new(Article::new(
                format!("Article {a} of feed {f}"),
                "<p>Lorem ipsum dolor sit amet, <b>storm</b> consectetur adipiscing elit.</p>",
            )));
        }
        guide.add_feed(feed);
    }
    set.add_guide(guide);
    set
}

fn criterion_benchmark(c: &mut Criterion) {
    let article = Article::new(
        "Weekly digest",
        "<div>Plenty of text about weather, storms, and the occasional gale.</div>",
    );

    let simple = SearchMatcher::new("gale", false);
    c.bench_function("simple_matcher_article", |b| {
        b.iter(|| simple.matches_article(black_box(&article)))
    });

    let keyword = SearchMatcher::new("+storm* +gale", false);
    c.bench_function("keyword_matcher_article", |b| {
        b.iter(|| keyword.matches_article(black_box(&article)))
    });

    let engine = SearchEngine::new();
    engine.set_guides_set(build_set(20, 100));
    c.bench_function("engine_scan_2000_articles", |b| {
        b.iter(|| {
            engine.set_search_text(black_box("storm"), false);
            engine.wait_idle();
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
