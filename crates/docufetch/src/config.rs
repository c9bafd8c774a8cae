//! Persistent user configuration.
//!
//! A [`Config`] is an immutable value: every `with_*` method consumes it and returns a modified
//! copy. Long lived components such as the [`Manager`](crate::manager::Manager) capture the
//! configuration they were built from and never observe later edits; to apply a change, build a
//! new manager from the new value.
//!
//! The on-disk representation is TOML. Missing keys fall back to their defaults, so a partial file
//! (or no file at all) is a valid configuration.
//!
//! ```toml
//! keywords = ["graph neural networks", "homomorphic encryption"]
//! max_results_per_source = 50
//! download_pdfs = true
//! update_interval = 12
//! news_sources_count = 5
//! download_dir = "/home/me/DocuFetch_Downloads"
//!
//! [sources]
//! arxiv = true
//! crossref = true
//!
//! [api_keys]
//! crossref_email = "me@example.org"
//! ```

use super::*;

/// Outlet feeds queried by the news source, in priority order.
pub const DEFAULT_NEWS_FEEDS: [&str; 10] = [
  "https://feeds.bbci.co.uk/news/rss.xml",
  "http://rss.cnn.com/rss/edition.rss",
  "https://feeds.reuters.com/reuters/topNews",
  "https://rss.nytimes.com/services/xml/rss/nyt/HomePage.xml",
  "https://www.theguardian.com/world/rss",
  "https://feeds.washingtonpost.com/rss/world",
  "https://www.aljazeera.com/xml/rss/all.xml",
  "https://feeds.bloomberg.com/markets/news.rss",
  "https://www.forbes.com/innovation/feed2",
  "https://techcrunch.com/feed/",
];

/// Environment variable overriding the default download directory.
pub const DOWNLOADS_DIR_ENV: &str = "DOWNLOADS_DIR";

/// User settings driving a fetch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Search terms, each queried independently against every enabled source
  pub keywords:               Vec<String>,
  /// Upper bound on documents taken per source and keyword
  pub max_results_per_source: usize,
  /// Whether remote artifacts (PDFs) are downloaded along with metadata
  pub download_pdfs:          bool,
  /// Hours between runs in monitor mode
  pub update_interval:        u64,
  /// How many news feeds to poll, between 1 and 10
  pub news_sources_count:     usize,
  /// Root of the download tree
  pub download_dir:           PathBuf,
  /// Feed URLs replacing the built-in outlet list when non-empty
  pub news_feeds:             Vec<String>,
  /// Explicit on/off switches per source name; unlisted sources use their default
  pub sources:                BTreeMap<String, bool>,
  /// Credentials keyed by [`Source::credential_key`]
  pub api_keys:               BTreeMap<String, String>,
  /// Rate limit handling
  pub retry:                  RetryPolicy,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      keywords:               Vec::new(),
      max_results_per_source: 50,
      download_pdfs:          true,
      update_interval:        12,
      news_sources_count:     5,
      download_dir:           Self::default_download_dir(),
      news_feeds:             Vec::new(),
      sources:                BTreeMap::new(),
      api_keys:               BTreeMap::new(),
      retry:                  RetryPolicy::default(),
    }
  }
}

impl Config {
  /// Returns the default location of the configuration file.
  ///
  /// - On Linux: `~/.config/docufetch/config.toml`
  /// - On macOS: `~/Library/Application Support/docufetch/config.toml`
  /// - On Windows: `%APPDATA%\docufetch\config.toml`
  /// - Fallback: `./docufetch/config.toml`
  pub fn default_path() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("docufetch").join("config.toml")
  }

  /// Returns the default download root: `$DOWNLOADS_DIR` if set, else `~/DocuFetch_Downloads`.
  pub fn default_download_dir() -> PathBuf {
    match std::env::var(DOWNLOADS_DIR_ENV) {
      Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
      _ => dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join("DocuFetch_Downloads"),
    }
  }

  /// Reads the configuration at `path`, or returns the defaults when the file does not exist.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if !path.exists() {
      debug!("No configuration at {}, using defaults", path.display());
      return Ok(Self::default());
    }
    let content = std::fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&content)?;
    config.news_sources_count = config.news_sources_count.clamp(1, DEFAULT_NEWS_FEEDS.len());
    for name in config.sources.keys() {
      if name.parse::<Source>().is_err() {
        warn!("Ignoring unknown source \"{name}\" in {}", path.display());
      }
    }
    Ok(config)
  }

  /// Writes the configuration to `path`, creating parent directories as needed.
  ///
  /// The file is replaced atomically so a crash never leaves half a configuration behind.
  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(self)?;
    let temp = path.with_extension("toml.tmp");
    std::fs::write(&temp, content)?;
    std::fs::rename(&temp, path)?;
    debug!("Saved configuration to {}", path.display());
    Ok(())
  }

  /// Replaces the keyword list. Blank and repeated keywords are dropped.
  pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>, {
    self.keywords.clear();
    for keyword in keywords {
      self = self.with_keyword(keyword);
    }
    self
  }

  /// Appends a keyword unless it is blank or already present.
  pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
    let keyword = keyword.into().trim().to_string();
    if !keyword.is_empty() && !self.keywords.contains(&keyword) {
      self.keywords.push(keyword);
    }
    self
  }

  /// Removes a keyword if present.
  pub fn without_keyword(mut self, keyword: &str) -> Self {
    let keyword = keyword.trim();
    self.keywords.retain(|existing| existing != keyword);
    self
  }

  /// Turns a source on or off.
  pub fn with_source(mut self, source: Source, enabled: bool) -> Self {
    self.sources.insert(source.name().to_string(), enabled);
    self
  }

  /// Stores the credential for `source`.
  ///
  /// Fails with [`DocuFetchError::CredentialNotSupported`] for sources that take none.
  pub fn with_credential(mut self, source: Source, value: impl Into<String>) -> Result<Self> {
    let key = source.credential_key().ok_or(DocuFetchError::CredentialNotSupported(source))?;
    self.api_keys.insert(key.to_string(), value.into().trim().to_string());
    Ok(self)
  }

  /// Sets the download root.
  pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.download_dir = dir.into();
    self
  }

  /// Sets the monitor interval in hours. Zero is rejected.
  pub fn with_update_interval(mut self, hours: u64) -> Result<Self> {
    if hours == 0 {
      return Err(DocuFetchError::Config("Update interval must be at least one hour".into()));
    }
    self.update_interval = hours;
    Ok(self)
  }

  /// Sets the per-source result cap.
  pub fn with_max_results(mut self, max_results: usize) -> Self {
    self.max_results_per_source = max_results;
    self
  }

  /// Sets whether remote artifacts are downloaded.
  pub fn with_download_pdfs(mut self, download: bool) -> Self {
    self.download_pdfs = download;
    self
  }

  /// Replaces the news feed list. An empty list restores the built-in outlets.
  pub fn with_news_feeds<I, S>(mut self, feeds: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>, {
    self.news_feeds = feeds.into_iter().map(Into::into).collect();
    self
  }

  /// Sets the retry policy used for rate-limited requests.
  pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
    self.retry = retry;
    self
  }

  /// Looks up the credential for `source`.
  ///
  /// The configuration wins over the environment. Empty values count as absent.
  pub fn credential(&self, source: Source) -> Option<String> {
    let from_config = source
      .credential_key()
      .and_then(|key| self.api_keys.get(key))
      .map(|value| value.trim().to_string())
      .filter(|value| !value.is_empty());
    from_config.or_else(|| {
      source
        .credential_env()
        .and_then(|var| std::env::var(var).ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
    })
  }

  /// Whether `source` takes part in fetch runs.
  pub fn is_enabled(&self, source: Source) -> bool {
    self.sources.get(source.name()).copied().unwrap_or_else(|| source.enabled_by_default())
  }

  /// Every enabled source in visiting order.
  pub fn enabled_sources(&self) -> Vec<Source> {
    Source::ALL.into_iter().filter(|source| self.is_enabled(*source)).collect()
  }

  /// The news feeds to poll, limited to `news_sources_count`.
  pub fn feeds(&self) -> Vec<String> {
    let count = self.news_sources_count.clamp(1, DEFAULT_NEWS_FEEDS.len());
    if self.news_feeds.is_empty() {
      DEFAULT_NEWS_FEEDS.iter().take(count).map(|feed| feed.to_string()).collect()
    } else {
      self.news_feeds.iter().take(count).cloned().collect()
    }
  }
}
