//! Fan-out over every enabled source.
//!
//! The [`Manager`] owns one [`Fetcher`] per enabled source, built from an immutable
//! [`Config`]. Sources run one after another in [`Source::ALL`] order, which makes the outcome
//! of cross-source deduplication deterministic: when arXiv and Crossref return the same paper,
//! arXiv always reports it.
//!
//! Changing which sources are enabled or which credentials are set produces a new `Manager`;
//! an existing one never changes behavior.
//!
//! # Examples
//!
//! ```no_run
//! use docufetch::prelude::*;
//!
//! # async fn example() -> Result<(), DocuFetchError> {
//! let manager = Manager::new(Config::default())?
//!   .enable_source("crossref")?
//!   .set_credential("crossref", "me@example.org")?;
//!
//! let report = manager.fetch(&["graph neural networks"]).await;
//! for (source, documents) in report.iter() {
//!   println!("{source}: {} new", documents.len());
//! }
//! # Ok(())
//! # }
//! ```

use super::*;

/// Documents per source from one run, ordered by source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
  /// Documents keyed by the source that produced them
  documents: BTreeMap<Source, Vec<Document>>,
}

impl Report {
  /// Sources and their documents, in source order.
  pub fn iter(&self) -> impl Iterator<Item = (&Source, &Vec<Document>)> { self.documents.iter() }

  /// Documents from `source`, if it took part.
  pub fn get(&self, source: Source) -> Option<&Vec<Document>> { self.documents.get(&source) }

  /// Number of documents across all sources.
  pub fn total(&self) -> usize { self.documents.values().map(Vec::len).sum() }

  /// Number of documents per source.
  pub fn counts(&self) -> BTreeMap<Source, usize> {
    self.documents.iter().map(|(source, documents)| (*source, documents.len())).collect()
  }

  /// Whether no source produced anything.
  pub fn is_empty(&self) -> bool { self.total() == 0 }

  /// Sources that took part.
  pub fn sources(&self) -> impl Iterator<Item = Source> + '_ { self.documents.keys().copied() }

  /// Records the documents of `source`.
  fn insert(&mut self, source: Source, documents: Vec<Document>) {
    self.documents.insert(source, documents);
  }
}

impl IntoIterator for Report {
  type IntoIter = std::collections::btree_map::IntoIter<Source, Vec<Document>>;
  type Item = (Source, Vec<Document>);

  fn into_iter(self) -> Self::IntoIter { self.documents.into_iter() }
}

/// Runs every enabled source over a keyword list.
#[derive(Debug, Clone)]
pub struct Manager {
  /// The configuration this manager was built from
  config:   Arc<Config>,
  /// Transport shared by every fetcher
  http:     Arc<dyn HttpClient>,
  /// The download tree
  storage:  Storage,
  /// One fetcher per enabled source, in source order
  fetchers: Vec<Fetcher>,
}

impl Manager {
  /// Builds a manager that talks to the network with [`ReqwestClient`].
  pub fn new(config: Config) -> Result<Self> {
    Self::with_client(config, Arc::new(ReqwestClient::new()?))
  }

  /// Builds a manager on top of `http`.
  pub fn with_client(config: Config, http: Arc<dyn HttpClient>) -> Result<Self> {
    let storage = Storage::open(&config.download_dir, http.clone())?;
    let fetchers = config
      .enabled_sources()
      .into_iter()
      .map(|source| {
        Fetcher::new(
          build_adapter(source, &config),
          http.clone(),
          storage.clone(),
          FetchSettings::from_config(source, &config),
        )
      })
      .collect::<Result<Vec<_>>>()?;
    debug!(
      "Manager ready with {} sources, storing under {}",
      fetchers.len(),
      config.download_dir.display()
    );
    Ok(Self { config: Arc::new(config), http, storage, fetchers })
  }

  /// The configuration this manager runs with.
  pub fn config(&self) -> &Config { &self.config }

  /// The storage this manager writes to.
  pub fn storage(&self) -> &Storage { &self.storage }

  /// Enabled sources in visiting order.
  pub fn enabled_sources(&self) -> Vec<Source> {
    self.fetchers.iter().map(Fetcher::source).collect()
  }

  /// Fetches and stores new documents for `keywords` from every enabled source.
  ///
  /// Every enabled source appears in the report, with an empty list if it failed.
  pub async fn fetch(&self, keywords: &[impl AsRef<str>]) -> Report {
    self.run(keywords, FetchMode::Download).await
  }

  /// Counts the new documents each source would return, without storing them.
  ///
  /// The documents counted are recorded as seen; a later [`Manager::fetch`] will not return
  /// them. Use [`Manager::preview_report`] and [`Manager::persist`] to store what was previewed.
  pub async fn preview(&self, keywords: &[impl AsRef<str>]) -> BTreeMap<Source, usize> {
    self.preview_report(keywords).await.counts()
  }

  /// Like [`Manager::preview`] but returns the documents.
  pub async fn preview_report(&self, keywords: &[impl AsRef<str>]) -> Report {
    self.run(keywords, FetchMode::Preview).await
  }

  /// Stores the documents of a previewed report and returns what was stored.
  ///
  /// Documents are not checked against the dedup store again; the preview already recorded
  /// them.
  pub async fn persist(&self, preview: Report) -> Report {
    let mut stored = Report::default();
    for (source, documents) in preview {
      let Some(fetcher) = self.fetcher(source) else {
        warn!("{source} is not enabled, dropping {} previewed documents", documents.len());
        continue;
      };
      let mut kept = Vec::with_capacity(documents.len());
      for document in documents {
        if let Some(document) = fetcher.store(document).await {
          kept.push(document);
        }
      }
      info!("{source}: stored {} documents", kept.len());
      stored.insert(source, kept);
    }
    stored
  }

  /// Downloads artifacts that are referenced by stored metadata but missing on disk.
  ///
  /// Returns the documents whose artifact is now present.
  pub async fn retry_missing_artifacts(&self) -> Vec<Document> {
    let missing = self.storage.missing_artifacts();
    info!("Retrying {} missing artifacts", missing.len());
    let mut repaired = Vec::new();
    for document in missing {
      let Some(target) = self.storage.artifact_path(&document) else { continue };
      if self.storage.download_artifact(&document.pdf_url, &target).await {
        repaired.push(Document { local_path: Some(target), ..document });
      }
    }
    repaired
  }

  /// Counts what is stored.
  pub fn stats(&self) -> StorageStats { self.storage.stats() }

  /// A manager with `name` enabled.
  pub fn enable_source(&self, name: &str) -> Result<Self> {
    let source = name.parse::<Source>()?;
    self.rebuild((*self.config).clone().with_source(source, true))
  }

  /// A manager with `name` disabled. Disabling a source that is already off changes nothing.
  pub fn disable_source(&self, name: &str) -> Result<Self> {
    let source = name.parse::<Source>()?;
    if !self.config.is_enabled(source) {
      debug!("{source} is already disabled");
      return Ok(self.clone());
    }
    self.rebuild((*self.config).clone().with_source(source, false))
  }

  /// A manager with `credential` configured for `name`.
  pub fn set_credential(&self, name: &str, credential: &str) -> Result<Self> {
    let source = name.parse::<Source>()?;
    self.rebuild((*self.config).clone().with_credential(source, credential)?)
  }

  /// Builds a manager from `config` sharing this one's transport.
  fn rebuild(&self, config: Config) -> Result<Self> { Self::with_client(config, self.http.clone()) }

  /// The fetcher for `source`, if enabled.
  fn fetcher(&self, source: Source) -> Option<&Fetcher> {
    self.fetchers.iter().find(|fetcher| fetcher.source() == source)
  }

  /// Runs every fetcher over `keywords` in `mode`.
  async fn run(&self, keywords: &[impl AsRef<str>], mode: FetchMode) -> Report {
    let mut report = Report::default();
    if keywords.is_empty() {
      warn!("No keywords to search for");
      return report;
    }
    for fetcher in &self.fetchers {
      let source = fetcher.source();
      let documents = match fetcher.fetch(keywords, mode).await {
        Ok(documents) => documents,
        Err(e) => {
          error!("{source} failed: {e}");
          Vec::new()
        },
      };
      report.insert(source, documents);
    }
    info!("Found {} new documents across {} sources", report.total(), self.fetchers.len());
    report
  }
}
