//! Content-addressed record of every document the pipeline has seen.
//!
//! The store is a directory holding one small JSON file per fingerprint, named
//! `<unique_id>.json`. Existence of the file is the whole truth: if it is there the document is a
//! duplicate, whatever the file contains. A record is written completely to a temporary file and
//! then hard-linked into place, so two fetchers racing on the same fingerprint cannot both win
//! and a failed write never leaves a half-written record behind.
//!
//! A document whose artifact failed to download stays recorded;
//! [`Manager::retry_missing_artifacts`](crate::manager::Manager::retry_missing_artifacts) is the
//! way to repair it. Only a document whose metadata could not be written is
//! [forgotten](Deduplicator::forget), so the next run offers it again.

use std::{fs::OpenOptions, io::Write};

use super::*;

/// What is written into a dedup record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupRecord {
  /// Title at the time the document was first seen
  pub title:   String,
  /// Authors at the time the document was first seen
  pub authors: Vec<String>,
  /// Source that saw it first
  pub source:  Source,
  /// Identifier within that source
  pub id:      String,
  /// Landing page
  pub url:     String,
}

/// Fingerprint store for one category of sources.
#[derive(Debug, Clone)]
pub struct Deduplicator {
  /// Directory holding the records
  dir: PathBuf,
}

impl From<&Document> for DedupRecord {
  fn from(document: &Document) -> Self {
    Self {
      title:   document.title.clone(),
      authors: document.authors.clone(),
      source:  document.source,
      id:      document.id.clone(),
      url:     document.url.clone(),
    }
  }
}

impl Deduplicator {
  /// Opens (creating if needed) the store at `dir`.
  pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
    let dir = dir.into();
    std::fs::create_dir_all(&dir)?;
    Ok(Self { dir })
  }

  /// Directory holding the records.
  pub fn dir(&self) -> &Path { &self.dir }

  /// Path of the record for `unique_id`.
  fn record_path(&self, unique_id: &str) -> PathBuf { self.dir.join(format!("{unique_id}.json")) }

  /// Whether a record for `unique_id` exists.
  pub fn contains(&self, unique_id: &str) -> bool { self.record_path(unique_id).exists() }

  /// Reads the record for `unique_id`, if it exists and is readable.
  pub fn record(&self, unique_id: &str) -> Option<DedupRecord> {
    let content = std::fs::read_to_string(self.record_path(unique_id)).ok()?;
    serde_json::from_str(&content).ok()
  }

  /// Number of records in the store.
  pub fn len(&self) -> usize {
    std::fs::read_dir(&self.dir)
      .map(|entries| {
        entries
          .filter_map(|entry| entry.ok())
          .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "json"))
          .count()
      })
      .unwrap_or(0)
  }

  /// Whether the store has no records.
  pub fn is_empty(&self) -> bool { self.len() == 0 }

  /// Decides whether `document` has been seen before, recording it if not.
  ///
  /// Computes [`Document::unique_id`] when it is missing. Returns `true` for a duplicate, in
  /// which case nothing is written. Returns `false` after creating the record for a new
  /// document.
  pub fn check_and_record(&self, document: &mut Document) -> Result<bool> {
    let unique_id = document.ensure_unique_id().to_string();
    let path = self.record_path(&unique_id);

    if path.exists() {
      self.log_duplicate(document, &unique_id);
      return Ok(true);
    }

    let content = serde_json::to_vec_pretty(&DedupRecord::from(&*document))?;
    let staged = self.dir.join(format!(".{unique_id}.{}.part", std::process::id()));
    let linked = write_staged(&staged, &content).and_then(|()| std::fs::hard_link(&staged, &path));
    let _ = std::fs::remove_file(&staged);
    match linked {
      Ok(()) => {
        trace!("Recorded {unique_id} for {} {}", document.source, document.id);
        Ok(false)
      },
      Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
        self.log_duplicate(document, &unique_id);
        Ok(true)
      },
      Err(e) => Err(e.into()),
    }
  }

  /// Drops the record for `unique_id` so the document counts as new again.
  pub fn forget(&self, unique_id: &str) -> Result<()> {
    match std::fs::remove_file(self.record_path(unique_id)) {
      Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
      _ => {
        debug!("Forgot {unique_id}");
        Ok(())
      },
    }
  }

  /// Logs a duplicate, naming the source that recorded it when the record can be read.
  fn log_duplicate(&self, document: &Document, unique_id: &str) {
    match self.record(unique_id) {
      Some(existing) => info!(
        "Skipping duplicate \"{}\" from {} (first seen on {} as {})",
        document.title, document.source, existing.source, existing.id
      ),
      None => info!("Skipping duplicate \"{}\" from {}", document.title, document.source),
    }
  }
}

/// Writes `content` to a fresh file at `path`.
fn write_staged(path: &Path, content: &[u8]) -> std::io::Result<()> {
  let mut file = OpenOptions::new().write(true).create(true).truncate(true).open(path)?;
  file.write_all(content)?;
  file.sync_all()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn paper(source: Source, title: &str) -> Document {
    Document {
      id: format!("{source}-1"),
      title: title.into(),
      authors: vec!["Jane Doe".into()],
      ..Document::new(source, "kw")
    }
  }

  #[traced_test]
  #[test]
  fn test_second_sighting_is_duplicate() {
    let dir = tempdir().unwrap();
    let dedup = Deduplicator::open(dir.path()).unwrap();

    let mut first = paper(Source::Arxiv, "Graph Neural Networks");
    assert!(!dedup.check_and_record(&mut first).unwrap());
    assert!(dedup.contains(&first.unique_id));

    let mut second = paper(Source::Crossref, "GRAPH NEURAL NETWORKS");
    assert!(dedup.check_and_record(&mut second).unwrap());
    assert_eq!(dedup.len(), 1);
    assert!(logs_contain("first seen on arxiv"));

    let record = dedup.record(&first.unique_id).unwrap();
    assert_eq!(record.source, Source::Arxiv);
  }

  #[test]
  fn test_unreadable_record_still_counts() {
    let dir = tempdir().unwrap();
    let dedup = Deduplicator::open(dir.path()).unwrap();
    let mut document = paper(Source::Doaj, "Open Journals");
    let id = document.ensure_unique_id().to_string();
    std::fs::write(dir.path().join(format!("{id}.json")), "not json").unwrap();

    assert!(dedup.check_and_record(&mut document).unwrap());
    assert!(dedup.record(&id).is_none());
  }

  #[test]
  fn test_precomputed_unique_id_is_kept() {
    let dir = tempdir().unwrap();
    let dedup = Deduplicator::open(dir.path()).unwrap();
    let mut document = Document { unique_id: "custom".into(), ..paper(Source::News, "Headline") };
    assert!(!dedup.check_and_record(&mut document).unwrap());
    assert!(dir.path().join("custom.json").exists());
  }

  #[test]
  fn test_reopen_sees_existing_records() {
    let dir = tempdir().unwrap();
    let mut document = paper(Source::Pubmed, "Clinical Trial");
    assert!(!Deduplicator::open(dir.path()).unwrap().check_and_record(&mut document).unwrap());

    let reopened = Deduplicator::open(dir.path()).unwrap();
    let mut again = paper(Source::Pubmed, "Clinical Trial");
    assert!(reopened.check_and_record(&mut again).unwrap());
  }

  #[test]
  fn test_failed_write_leaves_no_record() {
    let dir = tempdir().unwrap();
    let dedup = Deduplicator::open(dir.path()).unwrap();
    let mut document = paper(Source::Core, "Blocked Write");
    let id = document.ensure_unique_id().to_string();
    // a directory in the way of the staging file makes the write fail
    std::fs::create_dir(dir.path().join(format!(".{id}.{}.part", std::process::id()))).unwrap();

    assert!(dedup.check_and_record(&mut document).is_err());
    assert!(!dedup.contains(&id));
    assert!(dedup.is_empty());
  }

  #[test]
  fn test_forget_makes_a_document_new_again() {
    let dir = tempdir().unwrap();
    let dedup = Deduplicator::open(dir.path()).unwrap();
    let mut document = paper(Source::Arxiv, "Second Chance");
    assert!(!dedup.check_and_record(&mut document).unwrap());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

    dedup.forget(&document.unique_id).unwrap();
    dedup.forget(&document.unique_id).unwrap();
    assert!(!dedup.check_and_record(&mut document).unwrap());
  }
}
