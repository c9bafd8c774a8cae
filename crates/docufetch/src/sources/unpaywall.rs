use super::*;

/// DOI lookup endpoint of the Unpaywall API; the DOI is appended to the path.
const ENDPOINT: &str = "https://api.unpaywall.org/v2/";

/// Finds open access copies through Unpaywall.
///
/// Unpaywall only answers DOI lookups. A keyword that is itself a DOI is looked up directly; any
/// other keyword is first searched on Crossref and each DOI found there is looked up in turn.
/// Requires a contact email.
#[derive(Debug, Clone)]
pub struct UnpaywallAdapter {
  /// Contact email, sent with every lookup
  email:    String,
  /// Keyword to DOI resolution
  crossref: CrossrefAdapter,
}

/// Lookup response.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Record {
  /// DOI
  #[serde(deserialize_with = "lenient_string")]
  doi:          String,
  /// Title
  #[serde(deserialize_with = "lenient_string")]
  title:        String,
  /// Authors
  #[serde(deserialize_with = "one_or_many")]
  z_authors:    Vec<Author>,
  /// Resolver URL
  #[serde(deserialize_with = "lenient_string")]
  doi_url:      String,
  /// Publication year
  #[serde(deserialize_with = "lenient_string")]
  year:         String,
  /// Journal
  #[serde(deserialize_with = "lenient_string")]
  journal_name: String,
  /// Known open access copies
  #[serde(deserialize_with = "one_or_many")]
  oa_locations: Vec<Location>,
}

/// Author entry.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Author {
  /// Given name
  #[serde(deserialize_with = "lenient_string")]
  given:  String,
  /// Family name
  #[serde(deserialize_with = "lenient_string")]
  family: String,
}

/// One open access copy.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Location {
  /// Direct file link, if the host offers one
  #[serde(deserialize_with = "lenient_string")]
  url_for_pdf: String,
  /// `publishedVersion`, `acceptedVersion` or `submittedVersion`
  #[serde(deserialize_with = "lenient_string")]
  version:     String,
}

impl UnpaywallAdapter {
  /// Creates the adapter. `crossref` resolves non-DOI keywords.
  pub fn new(email: impl Into<String>, crossref: CrossrefAdapter) -> Self {
    Self { email: email.into(), crossref }
  }

  /// Lookup request for one DOI.
  fn lookup(&self, doi: &str) -> HttpRequest {
    HttpRequest::get(format!("{ENDPOINT}{doi}")).query("email", &self.email)
  }
}

/// Picks the PDF link: the first location with one, unless a later one is the published version.
fn best_pdf(locations: &[Location]) -> String {
  let mut best: Option<&Location> = None;
  for location in locations.iter().filter(|location| !location.url_for_pdf.is_empty()) {
    if best.is_none() || location.version == "publishedVersion" {
      best = Some(location);
    }
  }
  best.map(|location| location.url_for_pdf.clone()).unwrap_or_default()
}

#[async_trait]
impl Adapter for UnpaywallAdapter {
  fn source(&self) -> Source { Source::Unpaywall }

  fn requests(&self, keyword: &str, _limit: usize) -> Result<Vec<HttpRequest>> {
    let keyword = keyword.trim();
    if DOI_PATTERN.is_match(keyword) {
      Ok(vec![self.lookup(keyword)])
    } else {
      Ok(Vec::new())
    }
  }

  fn parse(&self, keyword: &str, body: &[u8]) -> Result<Vec<Document>> {
    let record: Record = parse_json(Source::Unpaywall, body)?;
    let Some(title) = non_empty(&record.title) else {
      return Ok(Vec::new());
    };
    Ok(vec![Document {
      id: record.doi.replace('/', "_"),
      title,
      authors: record
        .z_authors
        .iter()
        .filter_map(|author| non_empty(format!("{} {}", author.given, author.family)))
        .collect(),
      url: record.doi_url,
      pdf_url: best_pdf(&record.oa_locations),
      published: record.year,
      journal: non_empty(record.journal_name),
      doi: non_empty(record.doi),
      ..Document::new(Source::Unpaywall, keyword)
    }])
  }

  fn stops_on_empty_page(&self) -> bool { false }

  async fn search(&self, ctx: &SearchContext<'_>, keyword: &str) -> Result<Vec<Document>> {
    if self.email.trim().is_empty() {
      return Err(DocuFetchError::MissingCredential(Source::Unpaywall));
    }

    let direct = self.requests(keyword, ctx.limit)?;
    if !direct.is_empty() {
      return collect_pages(self, ctx, keyword, direct).await;
    }

    let dois: Vec<String> = self
      .crossref
      .search(ctx, keyword)
      .await?
      .into_iter()
      .filter_map(|document| document.doi)
      .collect();
    debug!("unpaywall: resolving {} DOIs found on crossref for '{keyword}'", dois.len());
    let lookups = dois.iter().map(|doi| self.lookup(doi)).collect();
    collect_pages(self, ctx, keyword, lookups).await
  }
}
