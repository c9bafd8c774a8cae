//! On-disk layout of fetched documents.
//!
//! Everything lives below a single root directory:
//!
//! ```text
//! <root>/
//! ├── academic/
//! │   ├── metadata/<prefix>_<id>.json
//! │   ├── dedup/<unique_id>.json
//! │   └── <prefix>_<id>.pdf
//! └── news/
//!     ├── metadata/news_<id>.json
//!     ├── dedup/<unique_id>.json
//!     └── news_<id>.txt
//! ```
//!
//! Metadata and artifacts are always written to a temporary sibling first and renamed into place,
//! so a file at its final path is complete. An existing artifact is never downloaded again.

use super::*;
use crate::format::{sanitize_filename, truncate_text, PARTIAL_SUFFIX};

/// Longest news body kept in a metadata file; the full text goes to the artifact.
const METADATA_CONTENT_CHARS: usize = 500;

/// File-system home of metadata, dedup records and artifacts.
#[derive(Debug, Clone)]
pub struct Storage {
  /// Download root
  root: PathBuf,
  /// Transport for artifact downloads
  http: Arc<dyn HttpClient>,
}

/// Summary of what is on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageStats {
  /// Metadata files found
  pub documents:   usize,
  /// Metadata files per source
  pub by_source:   BTreeMap<Source, usize>,
  /// Metadata files per keyword
  pub by_keyword:  BTreeMap<String, usize>,
  /// Artifact files found
  pub artifacts:   usize,
  /// Combined size of all artifacts in bytes
  pub total_bytes: u64,
}

impl Storage {
  /// Opens the tree at `root`, creating the category directories.
  pub fn open(root: impl Into<PathBuf>, http: Arc<dyn HttpClient>) -> Result<Self> {
    let root = root.into();
    for category in [Category::Academic, Category::News] {
      let dir = root.join(category.dir_name());
      std::fs::create_dir_all(dir.join("metadata"))?;
      std::fs::create_dir_all(dir.join("dedup"))?;
    }
    debug!("Storage ready at {}", root.display());
    Ok(Self { root, http })
  }

  /// The download root.
  pub fn root(&self) -> &Path { &self.root }

  /// Directory holding a category's artifacts.
  pub fn category_dir(&self, category: Category) -> PathBuf { self.root.join(category.dir_name()) }

  /// Directory holding a category's metadata files.
  pub fn metadata_dir(&self, category: Category) -> PathBuf {
    self.category_dir(category).join("metadata")
  }

  /// The dedup store shared by every source of `category`.
  pub fn deduplicator(&self, category: Category) -> Result<Deduplicator> {
    Deduplicator::open(self.category_dir(category).join("dedup"))
  }

  /// Base file name (without extension) of everything stored for `document`.
  fn stem(document: &Document) -> String {
    format!("{}_{}", document.source.file_prefix(), document.file_id())
  }

  /// Where the metadata of `document` is written.
  pub fn metadata_path(&self, document: &Document) -> PathBuf {
    let name = sanitize_filename(&format!("{}.json", Self::stem(document)));
    self.metadata_dir(document.source.category()).join(name)
  }

  /// Where the artifact of `document` is written, if it has one.
  pub fn artifact_path(&self, document: &Document) -> Option<PathBuf> {
    let extension = match document.artifact()? {
      Artifact::Remote(_) => "pdf",
      Artifact::Inline(_) => "txt",
    };
    let name = sanitize_filename(&format!("{}.{extension}", Self::stem(document)));
    Some(self.category_dir(document.source.category()).join(name))
  }

  /// Writes the metadata file for `document` and returns its path.
  ///
  /// Inline content longer than 500 characters is shortened in the metadata copy.
  pub fn save_metadata(&self, document: &Document) -> Result<PathBuf> {
    let path = self.metadata_path(document);
    let mut metadata = document.clone();
    if let Some(content) = &metadata.content {
      metadata.content = Some(truncate_text(content, METADATA_CONTENT_CHARS));
    }
    write_atomic(&path, &serde_json::to_vec_pretty(&metadata)?)?;
    debug!("Saved metadata to {}", path.display());
    Ok(path)
  }

  /// Writes `text` to `target`, returning whether it succeeded. Failures are logged.
  pub fn save_text(&self, target: &Path, text: &str) -> bool {
    match write_atomic(target, text.as_bytes()) {
      Ok(()) => {
        debug!("Saved text to {}", target.display());
        true
      },
      Err(e) => {
        error!("Failed to save text to {}: {e}", target.display());
        false
      },
    }
  }

  /// Downloads `url` to `target` unless `target` already exists.
  ///
  /// Returns whether the artifact is present afterwards. Failures are logged and leave nothing
  /// behind at `target`.
  pub async fn download_artifact(&self, url: &str, target: &Path) -> bool {
    if target.exists() {
      debug!("{} already present, not downloading again", target.display());
      return true;
    }
    let temp = temp_path(target);
    let result = async {
      if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
      }
      let mut file = tokio::fs::File::create(&temp).await?;
      let bytes = self.http.download(url, &mut file).await?;
      drop(file);
      tokio::fs::rename(&temp, target).await?;
      Ok::<_, DocuFetchError>(bytes)
    }
    .await;

    match result {
      Ok(bytes) => {
        info!("Downloaded {url} ({bytes} bytes) to {}", target.display());
        true
      },
      Err(e) => {
        if let Err(cleanup) = tokio::fs::remove_file(&temp).await {
          if cleanup.kind() != std::io::ErrorKind::NotFound {
            warn!("Could not remove {}: {cleanup}", temp.display());
          }
        }
        error!("Failed to download {url}: {e}");
        false
      },
    }
  }

  /// Every document whose metadata is stored under `category`.
  pub fn load_documents(&self, category: Category) -> Vec<Document> {
    let Ok(entries) = std::fs::read_dir(self.metadata_dir(category)) else {
      return Vec::new();
    };
    let mut documents: Vec<Document> = entries
      .filter_map(|entry| entry.ok())
      .map(|entry| entry.path())
      .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
      .filter_map(|path| match std::fs::read(&path) {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
          Ok(document) => Some(document),
          Err(e) => {
            warn!("Unreadable metadata {}: {e}", path.display());
            None
          },
        },
        Err(e) => {
          warn!("Could not read {}: {e}", path.display());
          None
        },
      })
      .collect();
    documents.sort_by(|a, b| (a.source, &a.id).cmp(&(b.source, &b.id)));
    documents
  }

  /// Stored documents with a remote artifact that is not on disk.
  pub fn missing_artifacts(&self) -> Vec<Document> {
    [Category::Academic, Category::News]
      .into_iter()
      .flat_map(|category| self.load_documents(category))
      .filter(|document| matches!(document.artifact(), Some(Artifact::Remote(_))))
      .filter(|document| self.artifact_path(document).is_some_and(|path| !path.exists()))
      .collect()
  }

  /// Counts what is stored.
  pub fn stats(&self) -> StorageStats {
    let mut stats = StorageStats::default();
    for category in [Category::Academic, Category::News] {
      for document in self.load_documents(category) {
        stats.documents += 1;
        *stats.by_source.entry(document.source).or_default() += 1;
        *stats.by_keyword.entry(document.keyword.clone()).or_default() += 1;
      }
      let Ok(entries) = std::fs::read_dir(self.category_dir(category)) else { continue };
      for entry in entries.filter_map(|entry| entry.ok()) {
        let path = entry.path();
        let is_artifact = path.extension().is_some_and(|ext| ext == "pdf" || ext == "txt");
        if is_artifact {
          stats.artifacts += 1;
          stats.total_bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
        }
      }
    }
    stats
  }
}

/// Sibling of `target` used while it is being written.
fn temp_path(target: &Path) -> PathBuf {
  let mut name = target.file_name().map(|name| name.to_os_string()).unwrap_or_default();
  name.push(PARTIAL_SUFFIX);
  target.with_file_name(name)
}

/// Writes `bytes` to `target` via a temporary sibling and a rename.
fn write_atomic(target: &Path, bytes: &[u8]) -> Result<()> {
  if let Some(parent) = target.parent() {
    std::fs::create_dir_all(parent)?;
  }
  let temp = temp_path(target);
  if let Err(e) = std::fs::write(&temp, bytes).and_then(|()| std::fs::rename(&temp, target)) {
    let _ = std::fs::remove_file(&temp);
    return Err(e.into());
  }
  Ok(())
}
