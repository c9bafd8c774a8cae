use super::*;

#[traced_test]
#[tokio::test]
async fn test_failed_download_leaves_no_partial_file() {
  let dir = tempdir().unwrap();
  let http = Arc::new(StubHttp::new().route(ARXIV, [Reply::ok(ARXIV_FEED)]));
  let manager = manager_for(dir.path(), &[Source::Arxiv], &http);

  let report = manager.fetch(&["graph neural networks"]).await;
  let arxiv = report.get(Source::Arxiv).unwrap();
  assert_eq!(arxiv.len(), 1);
  assert_eq!(arxiv[0].local_path, None);
  assert_eq!(http.calls_to(GNN_PDF), 1);

  let academic = dir.path().join("academic");
  assert!(academic.join("metadata/arxiv_2401.00001v1.json").exists());
  assert!(files_with_extension(&academic, "pdf").is_empty());
  assert!(files_with_extension(&academic, "part").is_empty());
  assert_eq!(manager.storage().missing_artifacts().len(), 1);
}

#[traced_test]
#[tokio::test]
async fn test_missing_artifacts_are_repaired_later() {
  let dir = tempdir().unwrap();
  let offline = Arc::new(StubHttp::new().route(ARXIV, [Reply::ok(ARXIV_FEED)]));
  manager_for(dir.path(), &[Source::Arxiv], &offline).fetch(&["graph neural networks"]).await;

  let online = Arc::new(StubHttp::academic());
  let manager = manager_for(dir.path(), &[Source::Arxiv], &online);
  let repaired = manager.retry_missing_artifacts().await;
  assert_eq!(repaired.len(), 1);
  let path = dir.path().join("academic/arxiv_2401.00001v1.pdf");
  assert_eq!(repaired[0].local_path.as_deref(), Some(path.as_path()));
  assert!(path.exists());

  // nothing left to repair, nothing downloaded again
  assert!(manager.retry_missing_artifacts().await.is_empty());
  assert_eq!(online.calls_to(GNN_PDF), 1);
  assert_eq!(manager.stats().artifacts, 1);
}

#[tokio::test]
async fn test_existing_artifact_is_not_downloaded_again() {
  let dir = tempdir().unwrap();
  let http = Arc::new(StubHttp::academic());
  let manager = manager_for(dir.path(), &[Source::Arxiv], &http);
  let path = dir.path().join("academic/arxiv_2401.00001v1.pdf");
  std::fs::write(&path, b"already here").unwrap();

  let report = manager.fetch(&["graph neural networks"]).await;
  assert_eq!(report.get(Source::Arxiv).unwrap()[0].local_path.as_deref(), Some(path.as_path()));
  assert_eq!(http.calls_to(GNN_PDF), 0);
  assert_eq!(std::fs::read(&path).unwrap(), b"already here");
}

#[tokio::test]
async fn test_download_switch_keeps_metadata_only() {
  let dir = tempdir().unwrap();
  let http = Arc::new(StubHttp::academic());
  let config = config_for(dir.path(), &[Source::Arxiv]).with_download_pdfs(false);
  let manager = Manager::with_client(config, http.clone()).unwrap();

  let report = manager.fetch(&["graph neural networks"]).await;
  assert_eq!(report.total(), 1);
  assert_eq!(http.calls_to(GNN_PDF), 0);

  let stats = manager.stats();
  assert_eq!(stats.documents, 1);
  assert_eq!(stats.artifacts, 0);
  assert_eq!(stats.by_keyword.get("graph neural networks"), Some(&1));
}
