use super::*;

/// Work search endpoint of the CORE v3 API.
const ENDPOINT: &str = "https://api.core.ac.uk/v3/search/works";

/// Largest page CORE serves.
const PAGE_SIZE: usize = 100;

/// Searches the CORE open access aggregator. Requires an API key.
#[derive(Debug, Clone, Default)]
pub struct CoreAdapter {
  /// Bearer token
  api_key: Option<String>,
}

/// Search response.
#[derive(Debug, Deserialize)]
struct SearchResponse {
  /// One page of works
  #[serde(default, deserialize_with = "one_or_many")]
  results: Vec<Work>,
}

/// One work record.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Work {
  /// CORE id, numeric in practice
  #[serde(deserialize_with = "lenient_string")]
  id:             String,
  /// Title
  #[serde(deserialize_with = "lenient_string")]
  title:          String,
  /// Authors
  #[serde(deserialize_with = "one_or_many")]
  authors:        Vec<Author>,
  /// Abstract
  #[serde(rename = "abstract", deserialize_with = "lenient_string")]
  abstract_text:  String,
  /// Full text location
  #[serde(deserialize_with = "lenient_string")]
  download_url:   String,
  /// Publication date
  #[serde(deserialize_with = "lenient_string")]
  published_date: String,
  /// DOI
  #[serde(deserialize_with = "lenient_string")]
  doi:            String,
  /// Times cited
  #[serde(deserialize_with = "lenient")]
  citation_count: Option<u64>,
}

/// Author entry.
#[derive(Debug, Deserialize)]
struct Author {
  /// Display name
  #[serde(default, deserialize_with = "lenient_string")]
  name: String,
}

impl CoreAdapter {
  /// Creates the adapter with the API key it authenticates with.
  pub fn new(api_key: Option<String>) -> Self { Self { api_key } }
}

#[async_trait]
impl Adapter for CoreAdapter {
  fn source(&self) -> Source { Source::Core }

  fn requests(&self, keyword: &str, limit: usize) -> Result<Vec<HttpRequest>> {
    let api_key = self.api_key.as_deref().ok_or(DocuFetchError::MissingCredential(Source::Core))?;
    Ok(
      pages(limit, PAGE_SIZE)
        .into_iter()
        .map(|(offset, size)| {
          HttpRequest::post_json(
            ENDPOINT,
            serde_json::json!({ "q": keyword, "limit": size, "offset": offset }),
          )
          .header("Authorization", format!("Bearer {api_key}"))
        })
        .collect(),
    )
  }

  fn parse(&self, keyword: &str, body: &[u8]) -> Result<Vec<Document>> {
    let response: SearchResponse = parse_json(Source::Core, body)?;
    Ok(
      response
        .results
        .into_iter()
        .filter_map(|work| {
          let title = non_empty(&work.title)?;
          Some(Document {
            id: work.id,
            title,
            authors: work.authors.into_iter().filter_map(|author| non_empty(author.name)).collect(),
            abstract_text: work.abstract_text,
            url: work.download_url.clone(),
            pdf_url: work.download_url,
            published: work.published_date,
            doi: non_empty(work.doi),
            citations: work.citation_count,
            ..Document::new(Source::Core, keyword)
          })
        })
        .collect(),
    )
  }
}
