use url::Url;

use super::*;

/// Article search endpoint of the DOAJ API; the query is the last path segment.
const ENDPOINT: &str = "https://doaj.org/api/search/articles/";

/// Largest page DOAJ serves.
const PAGE_SIZE: usize = 100;

/// Searches the Directory of Open Access Journals.
#[derive(Debug, Clone, Default)]
pub struct DoajAdapter {
  /// Optional API key
  api_key: Option<String>,
}

/// Search response.
#[derive(Debug, Deserialize)]
struct SearchResponse {
  /// Matching articles
  #[serde(default, deserialize_with = "one_or_many")]
  results: Vec<Article>,
}

/// One article.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Article {
  /// DOAJ id
  #[serde(deserialize_with = "lenient_string")]
  id:      String,
  /// Bibliographic record
  #[serde(deserialize_with = "lenient")]
  bibjson: BibJson,
}

/// Bibliographic record.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BibJson {
  /// Title
  #[serde(deserialize_with = "lenient_string")]
  title:         String,
  /// Authors
  #[serde(deserialize_with = "one_or_many")]
  author:        Vec<Named>,
  /// Abstract
  #[serde(rename = "abstract", deserialize_with = "lenient_string")]
  abstract_text: String,
  /// DOI, ISSN and friends
  #[serde(deserialize_with = "one_or_many")]
  identifier:    Vec<Identifier>,
  /// Full text links
  #[serde(deserialize_with = "one_or_many")]
  link:          Vec<Link>,
  /// Publication year
  #[serde(deserialize_with = "lenient_string")]
  year:          String,
  /// Journal
  #[serde(deserialize_with = "lenient")]
  journal:       Journal,
}

/// Author entry.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Named {
  /// Display name
  #[serde(deserialize_with = "lenient_string")]
  name: String,
}

/// Typed identifier.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Identifier {
  /// `doi`, `pissn`, `eissn`
  #[serde(rename = "type", deserialize_with = "lenient_string")]
  kind: String,
  /// Value
  #[serde(deserialize_with = "lenient_string")]
  id:   String,
}

/// Link to the article.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Link {
  /// `fulltext` for the article itself
  #[serde(rename = "type", deserialize_with = "lenient_string")]
  kind:         String,
  /// Target
  #[serde(deserialize_with = "lenient_string")]
  url:          String,
  /// `PDF`, `HTML`, `application/pdf`, ...
  #[serde(deserialize_with = "lenient_string")]
  content_type: String,
}

/// Journal block.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Journal {
  /// Journal title
  #[serde(deserialize_with = "lenient_string")]
  title: String,
}

impl DoajAdapter {
  /// Creates the adapter, authenticating with `api_key` when given.
  pub fn new(api_key: Option<String>) -> Self { Self { api_key } }

  /// Search URL with `keyword` percent-encoded into the path.
  fn search_url(keyword: &str) -> Result<String> {
    let mut url = Url::parse(ENDPOINT)?;
    url
      .path_segments_mut()
      .map_err(|()| DocuFetchError::Parse(format!("{ENDPOINT} cannot take a path")))?
      .pop_if_empty()
      .push(keyword);
    Ok(url.to_string())
  }
}

#[async_trait]
impl Adapter for DoajAdapter {
  fn source(&self) -> Source { Source::Doaj }

  fn requests(&self, keyword: &str, limit: usize) -> Result<Vec<HttpRequest>> {
    let url = Self::search_url(keyword)?;
    Ok(
      pages(limit, PAGE_SIZE)
        .into_iter()
        .map(|(offset, _)| {
          // DOAJ pages are fixed-size windows; the caller truncates the last one.
          let request = HttpRequest::get(url.clone())
            .query("page", offset / PAGE_SIZE + 1)
            .query("pageSize", PAGE_SIZE);
          match &self.api_key {
            Some(key) => request.header("x-api-key", key.clone()),
            None => request,
          }
        })
        .collect(),
    )
  }

  fn parse(&self, keyword: &str, body: &[u8]) -> Result<Vec<Document>> {
    let response: SearchResponse = parse_json(Source::Doaj, body)?;
    Ok(
      response
        .results
        .into_iter()
        .filter_map(|article| {
          let bib = article.bibjson;
          let title = non_empty(&bib.title)?;
          let doi = bib
            .identifier
            .iter()
            .find(|identifier| identifier.kind.eq_ignore_ascii_case("doi"))
            .and_then(|identifier| non_empty(&identifier.id));
          let pdf_url = bib
            .link
            .iter()
            .find(|link| {
              link.kind == "fulltext" && link.content_type.to_lowercase().contains("pdf")
            })
            .map(|link| link.url.clone())
            .unwrap_or_default();
          let url = match &doi {
            Some(doi) => format!("https://doi.org/{doi}"),
            None => bib.link.first().map(|link| link.url.clone()).unwrap_or_default(),
          };

          Some(Document {
            id: article.id,
            title,
            authors: bib.author.into_iter().filter_map(|author| non_empty(author.name)).collect(),
            abstract_text: bib.abstract_text,
            url,
            pdf_url,
            published: bib.year,
            journal: non_empty(bib.journal.title),
            doi,
            ..Document::new(Source::Doaj, keyword)
          })
        })
        .collect(),
    )
  }
}
