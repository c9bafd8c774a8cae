use super::*;

/// Works endpoint of the Crossref REST API.
const ENDPOINT: &str = "https://api.crossref.org/works";

/// Largest `rows` value Crossref accepts.
const PAGE_SIZE: usize = 1000;

/// Searches the Crossref DOI registry, most relevant first.
///
/// A contact email, when configured, is sent as `mailto` and routes requests to Crossref's
/// faster "polite" pool.
#[derive(Debug, Clone, Default)]
pub struct CrossrefAdapter {
  /// Contact email
  mailto: Option<String>,
}

/// Search response envelope.
#[derive(Debug, Deserialize)]
struct SearchResponse {
  /// Payload
  message: Message,
}

/// Search payload.
#[derive(Debug, Deserialize)]
struct Message {
  /// Matching works
  #[serde(default, deserialize_with = "one_or_many")]
  items: Vec<Work>,
}

/// One work record.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Work {
  /// DOI
  #[serde(rename = "DOI", deserialize_with = "lenient_string")]
  doi:             String,
  /// Titles; the first one is used
  #[serde(deserialize_with = "one_or_many")]
  title:           Vec<String>,
  /// Authors
  #[serde(deserialize_with = "one_or_many")]
  author:          Vec<Author>,
  /// JATS abstract
  #[serde(rename = "abstract", deserialize_with = "lenient_string")]
  abstract_text:   String,
  /// Full text links
  #[serde(deserialize_with = "one_or_many")]
  link:            Vec<Link>,
  /// Earliest publication date
  #[serde(deserialize_with = "lenient")]
  published:       DateParts,
  /// Journal or proceedings title
  #[serde(rename = "container-title", deserialize_with = "one_or_many")]
  container_title: Vec<String>,
  /// Citations counted by Crossref
  #[serde(rename = "is-referenced-by-count", deserialize_with = "lenient")]
  referenced_by:   Option<u64>,
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

/// Full text link.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Link {
  /// Target
  #[serde(rename = "URL", deserialize_with = "lenient_string")]
  url:          String,
  /// MIME type of the target
  #[serde(rename = "content-type", deserialize_with = "lenient_string")]
  content_type: String,
}

/// `{"date-parts": [[2021, 3, 4]]}`
#[derive(Debug, Default, Deserialize)]
struct DateParts {
  /// Year, month and day, as far as known
  #[serde(rename = "date-parts", default)]
  parts: Vec<Vec<serde_json::Value>>,
}

impl DateParts {
  /// Renders the known parts as `YYYY-M-D`, `YYYY-M` or `YYYY`.
  fn render(&self) -> String {
    self
      .parts
      .first()
      .map(|parts| {
        parts
          .iter()
          .filter_map(|part| match part {
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::String(s) => Some(s.clone()),
            _ => None,
          })
          .collect::<Vec<_>>()
          .join("-")
      })
      .unwrap_or_default()
  }
}

impl CrossrefAdapter {
  /// Creates the adapter, identifying as `mailto` when given.
  pub fn new(mailto: Option<String>) -> Self { Self { mailto } }
}

#[async_trait]
impl Adapter for CrossrefAdapter {
  fn source(&self) -> Source { Source::Crossref }

  fn requests(&self, keyword: &str, limit: usize) -> Result<Vec<HttpRequest>> {
    Ok(
      pages(limit, PAGE_SIZE)
        .into_iter()
        .map(|(offset, size)| {
          let request = HttpRequest::get(ENDPOINT)
            .query("query", keyword)
            .query("rows", size)
            .query("offset", offset)
            .query("sort", "relevance")
            .query("order", "desc");
          match &self.mailto {
            Some(mailto) => request.query("mailto", mailto),
            None => request,
          }
        })
        .collect(),
    )
  }

  fn parse(&self, keyword: &str, body: &[u8]) -> Result<Vec<Document>> {
    let response: SearchResponse = parse_json(Source::Crossref, body)?;
    Ok(
      response
        .message
        .items
        .into_iter()
        .filter_map(|work| {
          let title = work.title.first().and_then(non_empty)?;
          let pdf_url = work
            .link
            .iter()
            .find(|link| link.content_type.eq_ignore_ascii_case("application/pdf"))
            .map(|link| link.url.clone())
            .unwrap_or_default();
          let url =
            if work.doi.is_empty() { String::new() } else { format!("https://doi.org/{}", work.doi) };

          Some(Document {
            id: work.doi.replace('/', "_"),
            title,
            authors: work
              .author
              .iter()
              .filter_map(|author| non_empty(format!("{} {}", author.given, author.family)))
              .collect(),
            abstract_text: work.abstract_text,
            url,
            pdf_url,
            published: work.published.render(),
            journal: work.container_title.first().and_then(non_empty),
            citations: work.referenced_by,
            doi: non_empty(work.doi),
            ..Document::new(Source::Crossref, keyword)
          })
        })
        .collect(),
    )
  }
}
