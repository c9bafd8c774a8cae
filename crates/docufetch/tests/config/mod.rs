use docufetch::error::DocuFetchError;

use super::*;

#[test]
fn test_config_survives_a_round_trip() {
  let dir = tempdir().unwrap();
  let path = dir.path().join("nested/config.toml");
  let config = Config::default()
    .with_keywords(["graph neural networks", "federated learning"])
    .with_source(Source::Crossref, true)
    .with_source(Source::Scholar, false)
    .with_credential(Source::Crossref, "me@example.org")
    .unwrap()
    .with_download_dir(dir.path().join("downloads"))
    .with_update_interval(6)
    .unwrap();

  config.save(&path).unwrap();
  let loaded = Config::load(&path).unwrap();
  assert_eq!(loaded, config);
  assert_eq!(loaded.enabled_sources(), vec![Source::Arxiv, Source::Crossref, Source::News]);
}

#[test]
fn test_hand_written_config() {
  let dir = tempdir().unwrap();
  let path = dir.path().join("config.toml");
  std::fs::write(
    &path,
    r#"
keywords = ["quantum computing"]
max_results_per_source = 10
news_sources_count = 40

[sources]
arxiv = false
pubmed = true
myspace = true

[api_keys]
ncbi_email = "lab@example.org"
"#,
  )
  .unwrap();

  let config = Config::load(&path).unwrap();
  assert_eq!(config.keywords, vec!["quantum computing"]);
  assert_eq!(config.max_results_per_source, 10);
  assert_eq!(config.news_sources_count, 10);
  assert!(config.download_pdfs);
  assert_eq!(config.enabled_sources(), vec![Source::Scholar, Source::Pubmed, Source::News]);
  assert_eq!(config.credential(Source::Pubmed).as_deref(), Some("lab@example.org"));
}

#[test]
fn test_broken_config_is_an_error() {
  let dir = tempdir().unwrap();
  let path = dir.path().join("config.toml");
  std::fs::write(&path, "keywords = [unterminated").unwrap();
  assert!(matches!(Config::load(&path), Err(DocuFetchError::TomlDe(_))));
}

#[test]
fn test_manager_changes_leave_the_original_untouched() {
  let dir = tempdir().unwrap();
  let http = Arc::new(StubHttp::new());
  let manager = manager_for(dir.path(), &[Source::Arxiv], &http);

  let changed = manager.enable_source("doaj").unwrap().disable_source("arxiv").unwrap();
  assert_eq!(changed.enabled_sources(), vec![Source::Doaj]);
  assert_eq!(manager.enabled_sources(), vec![Source::Arxiv]);
  assert!(matches!(manager.enable_source("nope"), Err(DocuFetchError::InvalidSource(_))));
}
