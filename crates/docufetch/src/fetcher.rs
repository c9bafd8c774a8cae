//! The per-source fetch loop.
//!
//! A [`Fetcher`] drives one [`Adapter`] through the same steps for every keyword:
//!
//! 1. refuse to run when the source needs a credential that is not configured
//! 2. search, with rate-limit retries
//! 3. keep at most `max_results` records
//! 4. pass each record through the category's [`Deduplicator`]
//! 5. in [`FetchMode::Download`], write metadata and the artifact
//!
//! Failures never escape a keyword. A search that fails yields no documents for that keyword and
//! the next keyword runs as usual.

use super::*;

/// Whether a fetch writes anything besides dedup records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
  /// Return documents without storing metadata or artifacts.
  Preview,
  /// Store metadata and artifacts for every new document.
  #[default]
  Download,
}

/// Knobs a fetcher takes from the configuration.
#[derive(Debug, Clone)]
pub struct FetchSettings {
  /// Most documents taken per keyword
  pub max_results:        usize,
  /// Whether remote artifacts are downloaded
  pub download_artifacts: bool,
  /// Rate limit handling
  pub retry:              RetryPolicy,
  /// The source's credential, if one is configured
  pub credential:         Option<String>,
}

/// Runs searches for one source and gates their results through deduplication and storage.
#[derive(Debug, Clone)]
pub struct Fetcher {
  /// Source specific request building and parsing
  adapter:  Arc<dyn Adapter>,
  /// Transport
  http:     Arc<dyn HttpClient>,
  /// Fingerprint store of the source's category
  dedup:    Deduplicator,
  /// Metadata and artifact files
  storage:  Storage,
  /// Limits and credentials
  settings: FetchSettings,
}

impl FetchSettings {
  /// Settings for `source` as described by `config`.
  pub fn from_config(source: Source, config: &Config) -> Self {
    Self {
      max_results:        config.max_results_per_source,
      download_artifacts: config.download_pdfs,
      retry:              config.retry,
      credential:         config.credential(source),
    }
  }
}

impl Fetcher {
  /// Creates a fetcher. The dedup store is the one `storage` keeps for the adapter's category.
  pub fn new(
    adapter: Arc<dyn Adapter>,
    http: Arc<dyn HttpClient>,
    storage: Storage,
    settings: FetchSettings,
  ) -> Result<Self> {
    let dedup = storage.deduplicator(adapter.source().category())?;
    Ok(Self { adapter, http, dedup, storage, settings })
  }

  /// The source this fetcher serves.
  pub fn source(&self) -> Source { self.adapter.source() }

  /// Fetches every keyword in order and concatenates the results.
  pub async fn fetch(&self, keywords: &[impl AsRef<str>], mode: FetchMode) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    for keyword in keywords {
      documents.extend(self.fetch_keyword(keyword.as_ref(), mode).await);
    }
    info!("{}: {} new documents for {} keywords", self.source(), documents.len(), keywords.len());
    Ok(documents)
  }

  /// Fetches one keyword. Never fails; problems are logged and yield fewer documents.
  pub async fn fetch_keyword(&self, keyword: &str, mode: FetchMode) -> Vec<Document> {
    let source = self.source();
    if source.credential() == Credential::Required && self.settings.credential.is_none() {
      warn!(
        "{source} needs `{}` to be configured (or ${}), skipping '{keyword}'",
        source.credential_key().unwrap_or_default(),
        source.credential_env().unwrap_or_default()
      );
      return Vec::new();
    }

    let ctx = SearchContext {
      http:  self.http.as_ref(),
      retry: &self.settings.retry,
      limit: self.settings.max_results,
    };
    let mut found = match self.adapter.search(&ctx, keyword).await {
      Ok(found) => found,
      Err(e) => {
        error!("{source}: search for '{keyword}' failed: {e}");
        return Vec::new();
      },
    };
    found.truncate(self.settings.max_results);
    let returned = found.len();

    let mut documents = Vec::new();
    for mut document in found {
      match self.dedup.check_and_record(&mut document) {
        Ok(true) => continue,
        Ok(false) => (),
        Err(e) => {
          error!("{source}: could not check '{}' against the dedup store: {e}", document.title);
          continue;
        },
      }
      match mode {
        FetchMode::Preview => documents.push(document),
        FetchMode::Download =>
          if let Some(stored) = self.store(document).await {
            documents.push(stored);
          },
      }
    }
    info!("{source}: {} of {returned} results for '{keyword}' are new", documents.len());
    documents
  }

  /// Writes metadata and the artifact of a document that passed the dedup gate.
  ///
  /// Returns `None` when the metadata could not be written; the dedup record is then dropped so
  /// the next run offers the document again. An artifact failure keeps the document, without a
  /// `local_path`.
  pub async fn store(&self, document: Document) -> Option<Document> {
    if let Err(e) = self.storage.save_metadata(&document) {
      error!("{}: could not save metadata for '{}': {e}", document.source, document.title);
      if let Err(e) = self.dedup.forget(&document.unique_id) {
        error!("{}: '{}' stays marked as seen: {e}", document.source, document.title);
      }
      return None;
    }
    Some(self.store_artifact(document).await)
  }

  /// Writes the artifact of `document` if it has one and artifacts are wanted.
  pub async fn store_artifact(&self, mut document: Document) -> Document {
    let Some(target) = self.storage.artifact_path(&document) else {
      return document;
    };
    let stored = match document.artifact() {
      Some(Artifact::Inline(text)) => Some(self.storage.save_text(&target, text)),
      Some(Artifact::Remote(url)) if self.settings.download_artifacts =>
        Some(self.storage.download_artifact(url, &target).await),
      _ => None,
    };
    let Some(stored) = stored else {
      return document;
    };
    if stored {
      document.local_path = Some(target);
    } else {
      warn!("{}: keeping '{}' without its artifact", document.source, document.title);
    }
    document
  }
}
