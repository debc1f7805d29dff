// tests/trending_extract.rs
//
// Trending extraction through the public surface (items in, phrases out).

use newsfeed_ranker::analyze::{TrendingKind, TrendingPhrase};
use newsfeed_ranker::{extract_trending, NewsItem};

fn item(id: usize, title: &str) -> NewsItem {
    NewsItem {
        id: format!("n{id}"),
        title: title.to_string(),
        summary: "Summary text is ignored by extraction".to_string(),
        source: "Wire".to_string(),
        category: "world".to_string(),
        published_at: None,
        link: String::new(),
        image_url: None,
        regions: vec![],
    }
}

fn items(titles: &[&str]) -> Vec<NewsItem> {
    titles.iter().enumerate().map(|(i, t)| item(i, t)).collect()
}

#[test]
fn gulf_tensions_outranks_two_count_entries() {
    let out = extract_trending(&items(&[
        "Oil prices surge amid Gulf tensions",
        "Gulf tensions escalate as oil prices climb",
        "Markets react to Gulf tensions",
    ]));

    let gulf = out
        .iter()
        .position(|p| p.text == "gulf tensions")
        .expect("gulf tensions surfaced");
    assert_eq!(out[gulf].count, 3);
    assert_eq!(out[gulf].kind, TrendingKind::Phrase);

    for (i, p) in out.iter().enumerate() {
        if p.count == 2 {
            assert!(gulf < i, "{} ranked above gulf tensions", p.text);
        }
    }
}

#[test]
fn empty_pool_has_no_trending() {
    assert!(extract_trending(&[]).is_empty());
}

#[test]
fn output_is_capped_and_sorted() {
    let mut titles = Vec::new();
    for i in 0..30 {
        // 30 distinct bigrams seen twice each, one dominant pair seen 3x
        let w = format!("topic{}", (b'a' + (i % 26) as u8) as char);
        let a = format!("{w}x{i} market{i}");
        titles.push(format!("{a} rallies"));
        titles.push(format!("{a} falls"));
    }
    titles.push("Central banker speaks".into());
    titles.push("Central banker resigns".into());
    titles.push("Central banker returns".into());

    let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
    let out = extract_trending(&items(&refs));
    assert_eq!(out.len(), 20);
    assert_eq!(out[0].text, "central banker");
    assert!(out.windows(2).all(|w| w[0].count >= w[1].count));
}

#[test]
fn phrases_serialize_with_lowercase_kind() {
    let p = TrendingPhrase {
        text: "gulf tensions".into(),
        count: 3,
        kind: TrendingKind::Phrase,
    };
    let v = serde_json::to_value(&p).unwrap();
    assert_eq!(v["kind"], "phrase");
    assert_eq!(v["count"], 3);
}
