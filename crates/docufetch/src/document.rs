//! The canonical document type shared by every source.
//!
//! Each external API has its own idea of what a paper or article looks like. Adapters in
//! [`sources`](crate::sources) flatten all of them into [`Document`], which is what the rest of
//! the pipeline (deduplication, storage, reporting) works with.
//!
//! # Examples
//!
//! ```
//! use docufetch::document::{Document, Source};
//!
//! let document = Document {
//!   id: "2301.07041".into(),
//!   title: "Verifiable Fully Homomorphic Encryption".into(),
//!   authors: vec!["Alexander Viand".into(), "Christian Knabenhans".into()],
//!   ..Document::new(Source::Arxiv, "homomorphic encryption")
//! };
//!
//! // The fingerprint ignores case and source
//! let other = Document {
//!   title: "VERIFIABLE fully homomorphic encryption".into(),
//!   authors: vec!["alexander viand".into(), "christian knabenhans".into()],
//!   ..Document::new(Source::Crossref, "fhe")
//! };
//! assert_eq!(document.fingerprint(), other.fingerprint());
//! ```

use sha2::{Digest, Sha256};

use super::*;

/// A single paper or article, normalized from whichever source produced it.
///
/// Canonical fields are always present; when an upstream record lacks one it is left empty
/// rather than omitted. Source-specific extras are optional and skipped on serialization when
/// absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
  /// Identifier assigned (or derived) by the source. Only unique within that source.
  pub id:            String,
  /// Content fingerprint used as the cross-source identity key. See [`fingerprint`].
  #[serde(default)]
  pub unique_id:     String,
  /// Full title
  pub title:         String,
  /// Author names in publication order
  #[serde(default)]
  pub authors:       Vec<String>,
  /// Abstract or summary text
  #[serde(rename = "abstract", default)]
  pub abstract_text: String,
  /// Landing page
  #[serde(default)]
  pub url:           String,
  /// Direct link to the full text, when the source knows one
  #[serde(default)]
  pub pdf_url:       String,
  /// Publication date as reported by the source; format varies
  #[serde(default)]
  pub published:     String,
  /// Which source produced this document
  pub source:        Source,
  /// The keyword whose query produced this document
  #[serde(default)]
  pub keyword:       String,
  /// When the document was retrieved
  pub fetched_at:    DateTime<Utc>,

  /// Digital Object Identifier
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub doi:        Option<String>,
  /// Conference or publication venue
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub venue:      Option<String>,
  /// Journal title
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub journal:    Option<String>,
  /// Citation count at retrieval time
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub citations:  Option<u64>,
  /// Subject categories
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub categories: Vec<String>,
  /// PubMed identifier
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pmid:       Option<String>,
  /// Article body for sources that deliver text rather than a file link (news)
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub content:    Option<String>,
  /// Where the artifact was stored, once it has been
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub local_path: Option<PathBuf>,
}

/// Where a document's artifact comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact<'a> {
  /// A file that has to be downloaded.
  Remote(&'a str),
  /// Text already delivered with the document.
  Inline(&'a str),
}

/// The external systems documents can be fetched from.
///
/// The declaration order is the order in which the [`Manager`](crate::manager::Manager) visits
/// sources, so when two sources return the same paper the earlier one wins.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
///
/// use docufetch::document::Source;
///
/// let source = Source::from_str("semantic_scholar").unwrap();
/// assert_eq!(source.file_prefix(), "semantic");
/// assert_eq!(source.to_string(), "semantic_scholar");
/// ```
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
  /// arXiv preprint server
  Arxiv,
  /// Google Scholar
  Scholar,
  /// Semantic Scholar graph API
  SemanticScholar,
  /// CORE open access aggregator
  Core,
  /// Crossref DOI registry
  Crossref,
  /// Unpaywall open access lookup (keyed by DOI)
  Unpaywall,
  /// PubMed via NCBI E-utilities
  Pubmed,
  /// Directory of Open Access Journals
  Doaj,
  /// OpenAIRE research graph
  Openaire,
  /// News outlet feeds
  News,
}

/// Broad grouping of sources, which decides where their files live.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Category {
  /// Papers
  Academic,
  /// Articles
  News,
}

/// Whether a source needs an API key or contact email to be queried.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Credential {
  /// The source is open.
  None,
  /// The source works without one but behaves better with it (higher rate limits).
  Optional,
  /// The source refuses to answer without one.
  Required,
}

impl Source {
  /// Every source, in visiting order.
  pub const ALL: [Source; 10] = [
    Source::Arxiv,
    Source::Scholar,
    Source::SemanticScholar,
    Source::Core,
    Source::Crossref,
    Source::Unpaywall,
    Source::Pubmed,
    Source::Doaj,
    Source::Openaire,
    Source::News,
  ];

  /// The name used in configuration files and on the command line.
  pub fn name(&self) -> &'static str {
    match self {
      Source::Arxiv => "arxiv",
      Source::Scholar => "scholar",
      Source::SemanticScholar => "semantic_scholar",
      Source::Core => "core",
      Source::Crossref => "crossref",
      Source::Unpaywall => "unpaywall",
      Source::Pubmed => "pubmed",
      Source::Doaj => "doaj",
      Source::Openaire => "openaire",
      Source::News => "news",
    }
  }

  /// Prefix of metadata and artifact file names.
  pub fn file_prefix(&self) -> &'static str {
    match self {
      Source::SemanticScholar => "semantic",
      other => other.name(),
    }
  }

  /// Which directory tree this source writes into.
  pub fn category(&self) -> Category {
    match self {
      Source::News => Category::News,
      _ => Category::Academic,
    }
  }

  /// Credential requirement of the source's API.
  pub fn credential(&self) -> Credential {
    match self {
      Source::Core | Source::Unpaywall => Credential::Required,
      Source::SemanticScholar | Source::Crossref | Source::Pubmed | Source::Doaj =>
        Credential::Optional,
      Source::Arxiv | Source::Scholar | Source::Openaire | Source::News => Credential::None,
    }
  }

  /// Key under `api_keys` in the configuration holding this source's credential.
  pub fn credential_key(&self) -> Option<&'static str> {
    match self {
      Source::Core => Some("core"),
      Source::Crossref => Some("crossref_email"),
      Source::Unpaywall => Some("unpaywall_email"),
      Source::Pubmed => Some("ncbi_email"),
      Source::Doaj => Some("doaj_api_key"),
      Source::SemanticScholar => Some("semantic_scholar"),
      _ => None,
    }
  }

  /// Environment variable consulted when the configuration has no credential.
  pub fn credential_env(&self) -> Option<&'static str> {
    match self {
      Source::Core => Some("CORE_API_KEY"),
      Source::Crossref => Some("CROSSREF_EMAIL"),
      Source::Unpaywall => Some("UNPAYWALL_EMAIL"),
      Source::Pubmed => Some("NCBI_EMAIL"),
      Source::Doaj => Some("DOAJ_API_KEY"),
      Source::SemanticScholar => Some("SEMANTIC_SCHOLAR_API_KEY"),
      _ => None,
    }
  }

  /// Whether a fresh configuration turns this source on.
  pub fn enabled_by_default(&self) -> bool {
    matches!(self, Source::Arxiv | Source::Scholar | Source::News)
  }
}

impl Category {
  /// Directory name under the download root.
  pub fn dir_name(&self) -> &'static str {
    match self {
      Category::Academic => "academic",
      Category::News => "news",
    }
  }
}

impl Display for Source {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.name()) }
}

impl FromStr for Source {
  type Err = DocuFetchError;

  fn from_str(s: &str) -> Result<Self> {
    let lowered = s.trim().to_lowercase();
    Source::ALL
      .into_iter()
      .find(|source| source.name() == lowered)
      .ok_or(DocuFetchError::InvalidSource(s.to_owned()))
  }
}

impl Document {
  /// Creates an empty document for `source`, produced by a query for `keyword`.
  ///
  /// Intended as the base of struct update syntax inside adapters.
  pub fn new(source: Source, keyword: impl Into<String>) -> Self {
    Self {
      id: String::new(),
      unique_id: String::new(),
      title: String::new(),
      authors: Vec::new(),
      abstract_text: String::new(),
      url: String::new(),
      pdf_url: String::new(),
      published: String::new(),
      source,
      keyword: keyword.into(),
      fetched_at: Utc::now(),
      doi: None,
      venue: None,
      journal: None,
      citations: None,
      categories: Vec::new(),
      pmid: None,
      content: None,
      local_path: None,
    }
  }

  /// The content fingerprint of this document.
  pub fn fingerprint(&self) -> String { fingerprint(&self.title, &self.authors) }

  /// Fills in [`Document::unique_id`] if it has not been computed yet and returns it.
  pub fn ensure_unique_id(&mut self) -> &str {
    if self.unique_id.is_empty() {
      self.unique_id = self.fingerprint();
    }
    &self.unique_id
  }

  /// The identifier as it appears in file names: `/` is not allowed there.
  pub fn file_id(&self) -> String { self.id.replace('/', "_") }

  /// The artifact belonging to this document, if any.
  ///
  /// Inline text takes precedence over a download link.
  pub fn artifact(&self) -> Option<Artifact<'_>> {
    match (&self.content, self.pdf_url.as_str()) {
      (Some(text), _) if !text.is_empty() => Some(Artifact::Inline(text)),
      (_, "") => None,
      (_, url) => Some(Artifact::Remote(url)),
    }
  }
}

/// Computes the cross-source identity of a document.
///
/// The fingerprint is the hex SHA-256 of the lower-cased title immediately followed by every
/// author name, without separators.
///
/// ```
/// use docufetch::document::fingerprint;
///
/// let a = fingerprint("Attention Is All You Need", &["Ashish Vaswani".to_string()]);
/// let b = fingerprint("attention is all you need", &["ASHISH VASWANI".to_string()]);
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 64);
/// ```
pub fn fingerprint(title: &str, authors: &[String]) -> String {
  let mut content = String::from(title);
  authors.iter().for_each(|author| content.push_str(author));
  let digest = Sha256::digest(content.to_lowercase().as_bytes());
  format!("{digest:x}")
}

/// Short stable identifier derived from arbitrary text, for sources that have none.
pub(crate) fn derived_id(text: &str) -> String {
  let digest = Sha256::digest(text.as_bytes());
  format!("{digest:x}")[..16].to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_fingerprint_ignores_case() {
    let authors = vec!["Ada Lovelace".to_string(), "Charles Babbage".to_string()];
    let shouted = vec!["ADA LOVELACE".to_string(), "CHARLES BABBAGE".to_string()];
    assert_eq!(
      fingerprint("Sketch of the Analytical Engine", &authors),
      fingerprint("SKETCH OF THE ANALYTICAL ENGINE", &shouted)
    );
  }

  #[test]
  fn test_fingerprint_is_author_order_sensitive() {
    let forward = vec!["A".to_string(), "B".to_string()];
    let backward = vec!["B".to_string(), "A".to_string()];
    assert_ne!(fingerprint("Title", &forward), fingerprint("Title", &backward));
  }

  #[test]
  fn test_fingerprint_equal_across_sources() {
    let arxiv = Document {
      title: "Graph Neural Networks".into(),
      authors: vec!["Jane Doe".into()],
      ..Document::new(Source::Arxiv, "gnn")
    };
    let crossref = Document {
      title: "graph neural networks".into(),
      authors: vec!["jane doe".into()],
      published: "2021".into(),
      ..Document::new(Source::Crossref, "graphs")
    };
    assert_eq!(arxiv.fingerprint(), crossref.fingerprint());
  }

  #[test]
  fn test_ensure_unique_id_is_computed_once() {
    let mut document =
      Document { title: "T".into(), ..Document::new(Source::Doaj, "kw") };
    let first = document.ensure_unique_id().to_string();
    document.title = "Changed".into();
    assert_eq!(document.ensure_unique_id(), first);
  }

  #[test]
  fn test_source_round_trip_names() {
    for source in Source::ALL {
      assert_eq!(source.name().parse::<Source>().unwrap(), source);
      assert_eq!(serde_json::to_string(&source).unwrap(), format!("\"{}\"", source.name()));
    }
    assert!(matches!("nope".parse::<Source>(), Err(DocuFetchError::InvalidSource(_))));
    assert_eq!(" ArXiv ".parse::<Source>().unwrap(), Source::Arxiv);
  }

  #[test]
  fn test_artifact_preference() {
    let mut document = Document::new(Source::News, "kw");
    assert_eq!(document.artifact(), None);
    document.pdf_url = "https://example.org/a.pdf".into();
    assert_eq!(document.artifact(), Some(Artifact::Remote("https://example.org/a.pdf")));
    document.content = Some("body".into());
    assert_eq!(document.artifact(), Some(Artifact::Inline("body")));
  }

  #[test]
  fn test_serialized_shape() {
    let document = Document {
      id: "10.1000/xyz".into(),
      title: "A title".into(),
      abstract_text: "Some text".into(),
      ..Document::new(Source::Crossref, "kw")
    };
    let json = serde_json::to_value(&document).unwrap();
    assert_eq!(json["abstract"], "Some text");
    assert_eq!(json["source"], "crossref");
    assert!(json.get("doi").is_none());
    assert_eq!(document.file_id(), "10.1000_xyz");
  }
}
