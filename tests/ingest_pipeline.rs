// tests/ingest_pipeline.rs
use anyhow::Result;
use async_trait::async_trait;
use newsfeed_ranker::ingest::scheduler::tick;
use newsfeed_ranker::ingest::types::{NewsItem, SnapshotSource};
use newsfeed_ranker::{FeedConfig, FeedSession};

fn news(id: &str, title: &str) -> NewsItem {
    NewsItem {
        id: id.to_string(),
        title: title.to_string(),
        summary: "<p>Body&nbsp;text</p>".to_string(),
        source: " Reuters ".to_string(),
        category: "economy".to_string(),
        published_at: Some("1757149200".to_string()),
        link: String::new(),
        image_url: None,
        regions: vec![],
    }
}

struct MockSource(Vec<NewsItem>);

#[async_trait]
impl SnapshotSource for MockSource {
    async fn fetch_snapshot(&self) -> Result<Vec<NewsItem>> {
        Ok(self.0.clone())
    }
    fn name(&self) -> &'static str {
        "MockSource"
    }
}

struct DownSource;

#[async_trait]
impl SnapshotSource for DownSource {
    async fn fetch_snapshot(&self) -> Result<Vec<NewsItem>> {
        anyhow::bail!("connection refused")
    }
    fn name(&self) -> &'static str {
        "DownSource"
    }
}

#[tokio::test]
async fn failing_source_does_not_block_the_others() {
    let sources: Vec<Box<dyn SnapshotSource>> = vec![
        Box::new(DownSource),
        Box::new(MockSource(vec![news("1", "<b>Oil&amp;gas</b> rally"), news("1", "dup")])),
    ];
    let out = newsfeed_ranker::ingest::run_once(&sources).await;
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].title, "Oil&gas rally");
    assert_eq!(out[0].summary, "Body text");
    assert_eq!(out[0].source, "Reuters");
}

#[tokio::test]
async fn ticks_feed_the_session_and_new_ids_pend() {
    let session = FeedSession::new(FeedConfig::default()).shared();

    let first: Vec<Box<dyn SnapshotSource>> = vec![Box::new(MockSource(vec![news("a", "First story")]))];
    assert_eq!(tick(&first, &session).await, Some(0));

    let second: Vec<Box<dyn SnapshotSource>> = vec![Box::new(MockSource(vec![
        news("a", "First story"),
        news("b", "Second story"),
    ]))];
    assert_eq!(tick(&second, &session).await, Some(1));

    let s = session.lock().unwrap();
    assert_eq!(s.pending_ids().to_vec(), vec!["b".to_string()]);
    assert_eq!(s.pool_len(), 2);
}

#[tokio::test]
async fn all_sources_down_keeps_the_pool() {
    let session = FeedSession::new(FeedConfig::default()).shared();
    let ok: Vec<Box<dyn SnapshotSource>> = vec![Box::new(MockSource(vec![news("a", "Story")]))];
    tick(&ok, &session).await;

    let down: Vec<Box<dyn SnapshotSource>> = vec![Box::new(DownSource)];
    assert_eq!(tick(&down, &session).await, None);
    assert_eq!(session.lock().unwrap().pool_len(), 1);
}
