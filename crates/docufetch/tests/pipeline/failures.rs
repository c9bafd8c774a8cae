use super::*;

#[traced_test]
#[tokio::test]
async fn test_broken_source_does_not_hide_the_others() {
  let dir = tempdir().unwrap();
  let http = Arc::new(
    StubHttp::new()
      .route(ARXIV, [Reply::status(StatusCode::INTERNAL_SERVER_ERROR)])
      .route(CROSSREF, [Reply::ok(CROSSREF_WORKS)]),
  );
  let manager = manager_for(dir.path(), &[Source::Arxiv, Source::Crossref], &http);

  let report = manager.fetch(&["graph neural networks"]).await;
  assert_eq!(report.get(Source::Arxiv), Some(&Vec::new()));
  assert_eq!(report.get(Source::Crossref).unwrap().len(), 2);
}

#[traced_test]
#[tokio::test]
async fn test_unreadable_body_is_isolated() {
  let dir = tempdir().unwrap();
  let http = Arc::new(
    StubHttp::new()
      .route(ARXIV, [Reply::ok("<html><body>Service temporarily unavailable</body></html>")])
      .route(CROSSREF, [Reply::ok(CROSSREF_WORKS)]),
  );
  let manager = manager_for(dir.path(), &[Source::Arxiv, Source::Crossref], &http);

  let report = manager.fetch(&["graph neural networks"]).await;
  assert_eq!(report.get(Source::Arxiv).map(Vec::len), Some(0));
  assert_eq!(report.get(Source::Crossref).map(Vec::len), Some(2));
}

#[traced_test]
#[tokio::test]
async fn test_rate_limit_is_retried() {
  let dir = tempdir().unwrap();
  let http = Arc::new(StubHttp::new().route(CROSSREF, [
    Reply::status(StatusCode::TOO_MANY_REQUESTS),
    Reply::ok(CROSSREF_WORKS),
  ]));
  let manager = manager_for(dir.path(), &[Source::Crossref], &http);

  let report = manager.fetch(&["graph neural networks"]).await;
  assert_eq!(report.total(), 2);
  assert_eq!(http.calls_to(CROSSREF), 2);
}

#[traced_test]
#[tokio::test]
async fn test_rate_limit_gives_up_after_the_retry_budget() {
  let dir = tempdir().unwrap();
  let http =
    Arc::new(StubHttp::new().route(CROSSREF, [Reply::status(StatusCode::TOO_MANY_REQUESTS)]));
  let manager = manager_for(dir.path(), &[Source::Crossref], &http);

  let report = manager.fetch(&["graph neural networks"]).await;
  assert_eq!(report.get(Source::Crossref), Some(&Vec::new()));
  // the first attempt plus two retries
  assert_eq!(http.calls_to(CROSSREF), 3);
}

#[traced_test]
#[tokio::test]
async fn test_missing_required_credential_makes_no_calls() {
  let dir = tempdir().unwrap();
  let http = Arc::new(StubHttp::academic());
  let config = config_for(dir.path(), &[Source::Core, Source::Unpaywall])
    .with_credential(Source::Core, "  ")
    .unwrap()
    .with_credential(Source::Unpaywall, "")
    .unwrap();
  if config.credential(Source::Core).is_some() || config.credential(Source::Unpaywall).is_some() {
    // picked up from the environment
    return;
  }
  let manager = Manager::with_client(config, http.clone()).unwrap();

  let report = manager.fetch(&["graph neural networks"]).await;
  assert_eq!(report.total(), 0);
  assert_eq!(report.sources().collect::<Vec<_>>(), vec![Source::Core, Source::Unpaywall]);
  assert!(http.calls().is_empty());
}

#[traced_test]
#[tokio::test]
async fn test_malformed_records_are_normalized_or_dropped() {
  let dir = tempdir().unwrap();
  let works = r#"{"message": {"items": [
    {"DOI": "10.1000/odd", "title": "A Title That Is Not a List", "author": null,
     "published": "sometime", "is-referenced-by-count": "many", "container-title": "Solo Journal"},
    {"DOI": "10.1000/untitled", "title": [], "author": [{"given": "Nobody"}]},
    {"DOI": 42, "title": ["Numeric DOI"], "author": {"family": "Single"}},
    "not even an object"
  ]}}"#;
  let http = Arc::new(StubHttp::new().route(CROSSREF, [Reply::ok(works)]));
  let manager = manager_for(dir.path(), &[Source::Crossref], &http);

  let report = manager.fetch(&["odd"]).await;
  let documents = report.get(Source::Crossref).unwrap();
  assert_eq!(documents.len(), 2);

  let odd = &documents[0];
  assert_eq!(odd.title, "A Title That Is Not a List");
  assert!(odd.authors.is_empty());
  assert_eq!(odd.published, "");
  assert_eq!(odd.citations, None);
  assert_eq!(odd.journal.as_deref(), Some("Solo Journal"));

  let numeric = &documents[1];
  assert_eq!(numeric.id, "42");
  assert_eq!(numeric.authors, vec!["Single"]);
}

#[traced_test]
#[tokio::test]
async fn test_unpaywall_resolves_keywords_through_crossref() {
  let dir = tempdir().unwrap();
  let record = r#"{"doi": "10.1000/mp", "title": "Message Passing Revisited",
    "z_authors": [{"given": "Ada", "family": "Byron"}], "doi_url": "https://doi.org/10.1000/mp",
    "year": 2023, "journal_name": "Journal of Graph Learning",
    "oa_locations": [{"url_for_pdf": "https://repo.example/mp.pdf", "version": "acceptedVersion"}]}"#;
  let http = Arc::new(
    StubHttp::new()
      .route(CROSSREF, [Reply::ok(CROSSREF_WORKS)])
      .route("https://api.unpaywall.org/v2/10.1000/mp", [Reply::ok(record)]),
  );
  let config = config_for(dir.path(), &[Source::Unpaywall])
    .with_credential(Source::Unpaywall, "me@example.org")
    .unwrap()
    .with_download_pdfs(false);
  let manager = Manager::with_client(config, http.clone()).unwrap();

  let report = manager.fetch(&["graph neural networks"]).await;
  let documents = report.get(Source::Unpaywall).unwrap();
  assert_eq!(documents.len(), 1);
  assert_eq!(documents[0].pdf_url, "https://repo.example/mp.pdf");
  assert_eq!(documents[0].published, "2023");
  assert_eq!(http.calls_to(CROSSREF), 1);
  assert_eq!(http.calls_to("https://api.unpaywall.org/v2/"), 2);
}

#[traced_test]
#[tokio::test]
async fn test_rate_limited_source_stops_paging() {
  let dir = tempdir().unwrap();
  let search = "https://api.semanticscholar.org/graph/v1/paper/search";
  let http = Arc::new(StubHttp::new().route(search, [Reply::status(StatusCode::TOO_MANY_REQUESTS)]));
  let config = config_for(dir.path(), &[Source::SemanticScholar]).with_max_results(300);
  let manager = Manager::with_client(config, http.clone()).unwrap();

  let report = manager.fetch(&["graph neural networks"]).await;
  assert_eq!(report.get(Source::SemanticScholar), Some(&Vec::new()));
  // one page's retry budget, not three
  assert_eq!(http.calls_to(search), 3);
}
