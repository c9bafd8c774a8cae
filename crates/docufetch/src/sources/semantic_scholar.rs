use super::*;

/// Paper search endpoint of the Semantic Scholar graph API.
const ENDPOINT: &str = "https://api.semanticscholar.org/graph/v1/paper/search";

/// Largest page the search endpoint serves.
const PAGE_SIZE: usize = 100;

/// Fields requested for every paper.
const FIELDS: &str =
  "paperId,title,abstract,authors,year,url,venue,publicationDate,externalIds,openAccessPdf,citationCount";

/// Searches the Semantic Scholar graph API. An API key raises the rate limit but is not needed.
#[derive(Debug, Clone, Default)]
pub struct SemanticScholarAdapter {
  /// Value of the `x-api-key` header
  api_key: Option<String>,
}

/// Search response.
#[derive(Debug, Deserialize)]
struct SearchResponse {
  /// One page of papers
  #[serde(default, deserialize_with = "one_or_many")]
  data: Vec<Paper>,
}

/// One paper record.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Paper {
  /// Semantic Scholar id
  #[serde(deserialize_with = "lenient_string")]
  paper_id:         String,
  /// Title
  #[serde(deserialize_with = "lenient_string")]
  title:            String,
  /// Abstract
  #[serde(rename = "abstract", deserialize_with = "lenient_string")]
  abstract_text:    String,
  /// Authors
  #[serde(deserialize_with = "one_or_many")]
  authors:          Vec<Author>,
  /// Publication year
  #[serde(deserialize_with = "lenient_string")]
  year:             String,
  /// Full publication date, when known
  #[serde(deserialize_with = "lenient_string")]
  publication_date: String,
  /// Landing page
  #[serde(deserialize_with = "lenient_string")]
  url:              String,
  /// Venue
  #[serde(deserialize_with = "lenient_string")]
  venue:            String,
  /// Ids in other systems
  #[serde(deserialize_with = "lenient")]
  external_ids:     ExternalIds,
  /// Open access copy
  #[serde(deserialize_with = "lenient")]
  open_access_pdf:  Option<OpenAccessPdf>,
  /// Citations
  #[serde(deserialize_with = "lenient")]
  citation_count:   Option<u64>,
}

/// Author entry.
#[derive(Debug, Deserialize)]
struct Author {
  /// Display name
  #[serde(default, deserialize_with = "lenient_string")]
  name: String,
}

/// Identifiers in other systems.
#[derive(Debug, Default, Deserialize)]
struct ExternalIds {
  /// DOI
  #[serde(rename = "DOI", default, deserialize_with = "lenient_string")]
  doi: String,
}

/// Open access location.
#[derive(Debug, Default, Deserialize)]
struct OpenAccessPdf {
  /// Direct file URL
  #[serde(default, deserialize_with = "lenient_string")]
  url: String,
}

impl SemanticScholarAdapter {
  /// Creates the adapter, sending `api_key` when present.
  pub fn new(api_key: Option<String>) -> Self { Self { api_key } }
}

#[async_trait]
impl Adapter for SemanticScholarAdapter {
  fn source(&self) -> Source { Source::SemanticScholar }

  fn requests(&self, keyword: &str, limit: usize) -> Result<Vec<HttpRequest>> {
    Ok(
      pages(limit, PAGE_SIZE)
        .into_iter()
        .map(|(offset, size)| {
          let request = HttpRequest::get(ENDPOINT)
            .query("query", keyword)
            .query("offset", offset)
            .query("limit", size)
            .query("fields", FIELDS);
          match &self.api_key {
            Some(key) => request.header("x-api-key", key.clone()),
            None => request,
          }
        })
        .collect(),
    )
  }

  fn parse(&self, keyword: &str, body: &[u8]) -> Result<Vec<Document>> {
    let response: SearchResponse = parse_json(Source::SemanticScholar, body)?;
    Ok(
      response
        .data
        .into_iter()
        .filter_map(|paper| {
          let title = non_empty(&paper.title)?;
          let published =
            if paper.publication_date.is_empty() { paper.year } else { paper.publication_date };
          Some(Document {
            id: paper.paper_id,
            title,
            authors: paper
              .authors
              .into_iter()
              .filter_map(|author| non_empty(author.name))
              .collect(),
            abstract_text: paper.abstract_text,
            url: paper.url,
            pdf_url: paper.open_access_pdf.map(|pdf| pdf.url).unwrap_or_default(),
            published,
            doi: non_empty(paper.external_ids.doi),
            venue: non_empty(paper.venue),
            citations: paper.citation_count,
            ..Document::new(Source::SemanticScholar, keyword)
          })
        })
        .collect(),
    )
  }
}
