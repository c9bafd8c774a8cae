use reqwest::StatusCode;

use super::*;

mod artifacts;
mod failures;

#[traced_test]
#[tokio::test]
async fn test_same_paper_on_two_sources_is_reported_once() {
  let dir = tempdir().unwrap();
  let http = Arc::new(StubHttp::academic());
  let manager = manager_for(dir.path(), &[Source::Arxiv, Source::Crossref], &http);

  let report = manager.fetch(&["graph neural networks"]).await;

  let arxiv = report.get(Source::Arxiv).unwrap();
  assert_eq!(arxiv.len(), 1);
  assert_eq!(arxiv[0].title, "A Survey of Graph Neural Networks");
  assert_eq!(arxiv[0].authors, vec!["Jane Doe", "John Smith"]);
  assert_eq!(arxiv[0].abstract_text, "Graphs are everywhere. We survey how to learn on them.");
  assert_eq!(arxiv[0].keyword, "graph neural networks");

  let crossref = report.get(Source::Crossref).unwrap();
  assert_eq!(crossref.len(), 1);
  assert_eq!(crossref[0].title, "Message Passing Revisited");
  assert_eq!(crossref[0].citations, Some(7));

  let academic = dir.path().join("academic");
  assert!(academic.join("metadata/arxiv_2401.00001v1.json").exists());
  assert!(academic.join("metadata/crossref_10.1000_mp.json").exists());
  assert!(!academic.join("metadata/crossref_10.1000_gnn.survey.json").exists());
  assert_eq!(
    std::fs::read(academic.join("arxiv_2401.00001v1.pdf")).unwrap(),
    b"%PDF-1.4 graph neural networks"
  );
  assert_eq!(arxiv[0].local_path.as_deref(), Some(academic.join("arxiv_2401.00001v1.pdf").as_path()));
}

#[traced_test]
#[tokio::test]
async fn test_second_run_finds_nothing_new() {
  let dir = tempdir().unwrap();
  let http = Arc::new(StubHttp::academic());
  let manager = manager_for(dir.path(), &[Source::Arxiv, Source::Crossref], &http);

  let first = manager.fetch(&["graph neural networks"]).await;
  assert_eq!(first.total(), 2);
  let stats = manager.stats();
  let downloads = http.calls_to(GNN_PDF);

  let second = manager.fetch(&["graph neural networks"]).await;
  assert_eq!(second.total(), 0);
  assert_eq!(second.sources().count(), 2);
  assert_eq!(manager.stats(), stats);
  assert_eq!(http.calls_to(GNN_PDF), downloads);
}

#[tokio::test]
async fn test_dedup_records_are_named_by_fingerprint() {
  let dir = tempdir().unwrap();
  let http = Arc::new(StubHttp::academic());
  let manager = manager_for(dir.path(), &[Source::Arxiv], &http);

  let report = manager.fetch(&["graph neural networks"]).await;
  let document = &report.get(Source::Arxiv).unwrap()[0];

  let expected = fingerprint("A Survey of Graph Neural Networks", &[
    "Jane Doe".to_string(),
    "John Smith".to_string(),
  ]);
  assert_eq!(document.unique_id, expected);
  assert!(dir.path().join(format!("academic/dedup/{expected}.json")).exists());

  // the stored metadata carries the same identity
  let stored = manager.storage().load_documents(document.source.category());
  assert_eq!(stored.len(), 1);
  assert_eq!(stored[0].unique_id, expected);
}

#[tokio::test]
async fn test_preview_counts_match_fetch() {
  let previewed = tempdir().unwrap();
  let fetched = tempdir().unwrap();
  let sources = [Source::Arxiv, Source::Crossref];

  let preview_http = Arc::new(StubHttp::academic());
  let counts = manager_for(previewed.path(), &sources, &preview_http)
    .preview(&["graph neural networks"])
    .await;

  let fetch_http = Arc::new(StubHttp::academic());
  let report =
    manager_for(fetched.path(), &sources, &fetch_http).fetch(&["graph neural networks"]).await;

  assert_eq!(counts, report.counts());
  // preview stores no metadata and downloads nothing
  assert!(files_with_extension(&previewed.path().join("academic/metadata"), "json").is_empty());
  assert_eq!(preview_http.calls_to(GNN_PDF), 0);
}

#[traced_test]
#[tokio::test]
async fn test_persist_stores_what_was_previewed() {
  let dir = tempdir().unwrap();
  let http = Arc::new(StubHttp::academic());
  let manager = manager_for(dir.path(), &[Source::Arxiv, Source::Crossref], &http);

  let preview = manager.preview_report(&["graph neural networks"]).await;
  assert_eq!(preview.total(), 2);

  let stored = manager.persist(preview.clone()).await;
  assert_eq!(stored.counts(), preview.counts());
  assert_eq!(manager.stats().documents, 2);
  assert_eq!(http.calls_to(GNN_PDF), 1);

  // previewing recorded the fingerprints, so a fetch afterwards is empty
  assert_eq!(manager.fetch(&["graph neural networks"]).await.total(), 0);
}

#[tokio::test]
async fn test_sources_see_every_keyword() {
  let dir = tempdir().unwrap();
  let http = Arc::new(StubHttp::academic());
  let manager = manager_for(dir.path(), &[Source::Crossref], &http);

  let report = manager.fetch(&["graph neural networks", "message passing"]).await;

  // the second keyword returns the same works, all of them already recorded
  assert_eq!(http.calls_to(CROSSREF), 2);
  let crossref = report.get(Source::Crossref).unwrap();
  assert_eq!(crossref.len(), 2);
  assert!(crossref.iter().all(|document| document.keyword == "graph neural networks"));
}

#[tokio::test]
async fn test_results_are_capped_per_source() {
  let dir = tempdir().unwrap();
  let http = Arc::new(StubHttp::academic());
  let config = config_for(dir.path(), &[Source::Crossref]).with_max_results(1);
  let manager = Manager::with_client(config, http.clone()).unwrap();

  let report = manager.fetch(&["graph neural networks"]).await;
  assert_eq!(report.total(), 1);
  assert_eq!(report.get(Source::Crossref).unwrap()[0].doi.as_deref(), Some("10.1000/gnn.survey"));
  assert_eq!(manager.storage().deduplicator(Source::Crossref.category()).unwrap().len(), 1);
}

#[tokio::test]
async fn test_news_articles_are_stored_as_text() {
  let dir = tempdir().unwrap();
  let feed = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Daily Planet</title>
  <item>
    <title>City council adopts graph neural networks</title>
    <link>https://planet.example/city/gnn-council</link>
    <description>The council will use GNNs for traffic planning.</description>
  </item>
  <item>
    <title>Sports roundup</title>
    <link>https://planet.example/sports/roundup</link>
    <description>Nothing about graphs here.</description>
  </item>
</channel></rss>"#;
  let http = Arc::new(StubHttp::new().route("https://planet.example/rss", [Reply::ok(feed)]));
  let config =
    config_for(dir.path(), &[Source::News]).with_news_feeds(["https://planet.example/rss"]);
  let manager = Manager::with_client(config, http.clone()).unwrap();

  let report = manager.fetch(&["graph neural networks"]).await;
  let news = report.get(Source::News).unwrap();
  assert_eq!(news.len(), 1);
  assert_eq!(news[0].venue.as_deref(), Some("Daily Planet"));

  let news_dir = dir.path().join("news");
  assert!(news_dir.join("metadata/news_gnn-council.json").exists());
  assert_eq!(
    std::fs::read_to_string(news_dir.join("news_gnn-council.txt")).unwrap(),
    "The council will use GNNs for traffic planning."
  );
  assert_eq!(http.calls(), vec!["https://planet.example/rss".to_string()]);
}

#[tokio::test]
async fn test_unexpected_status_is_not_retried() {
  let dir = tempdir().unwrap();
  let http = Arc::new(StubHttp::new().route(CROSSREF, [Reply::status(StatusCode::BAD_GATEWAY)]));
  let manager = manager_for(dir.path(), &[Source::Crossref], &http);

  assert_eq!(manager.fetch(&["anything"]).await.total(), 0);
  assert_eq!(http.calls_to(CROSSREF), 1);
}
