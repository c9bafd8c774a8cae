//! Per-source adapters.
//!
//! Every external system is wrapped in an [`Adapter`]. An adapter knows two things: how to turn a
//! keyword into one or more [`HttpRequest`]s, and how to turn a response body into
//! [`Document`]s. Everything else (retrying, deduplication, persistence) is shared and lives in
//! the [`Fetcher`](crate::fetcher::Fetcher).
//!
//! Sources that need more than "send every request, parse every body" override
//! [`Adapter::search`]: PubMed searches and then fetches, Unpaywall resolves DOIs that it first
//! looks up through Crossref.
//!
//! # Normalization
//!
//! Response bodies are modeled as `serde` structs at this boundary. The upstream APIs are not
//! consistent about their types (a list sometimes arrives as a single value, a year as a string
//! or a number, fields as `null`), so record fields go through the lenient deserializers in this
//! module instead of failing the whole page. A body that is not JSON, XML or HTML at all is a
//! [`DocuFetchError::Parse`]; a record without a title is dropped.
//!
//! # Examples
//!
//! ```
//! use docufetch::{
//!   document::Source,
//!   sources::{Adapter, CrossrefAdapter},
//! };
//!
//! let adapter = CrossrefAdapter::new(None);
//! let body = br#"{"message": {"items": [
//!   {"DOI": "10.1000/xyz", "title": ["A Study"], "author": [{"given": "Jane", "family": "Doe"}]}
//! ]}}"#;
//! let documents = adapter.parse("study", body).unwrap();
//! assert_eq!(documents[0].source, Source::Crossref);
//! assert_eq!(documents[0].authors, vec!["Jane Doe".to_string()]);
//! ```

use serde::{de::DeserializeOwned, Deserializer};

use super::*;

mod arxiv;
mod core_ac;
mod crossref;
mod doaj;
mod news;
mod openaire;
mod pubmed;
mod scholar;
mod semantic_scholar;
mod unpaywall;
pub mod xml;

pub use self::{
  arxiv::ArxivAdapter, core_ac::CoreAdapter, crossref::CrossrefAdapter, doaj::DoajAdapter,
  news::NewsAdapter, openaire::OpenaireAdapter, pubmed::PubmedAdapter, scholar::ScholarAdapter,
  semantic_scholar::SemanticScholarAdapter, unpaywall::UnpaywallAdapter,
};

lazy_static! {
  /// A bare DOI such as `10.1145/1327452.1327492`.
  pub static ref DOI_PATTERN: Regex = Regex::new(r"^10\.\d{4,9}/\S+$").unwrap();
}

/// What an adapter needs from the caller to run a search.
#[derive(Debug, Clone, Copy)]
pub struct SearchContext<'a> {
  /// Transport
  pub http:  &'a dyn HttpClient,
  /// Rate limit handling
  pub retry: &'a RetryPolicy,
  /// Most documents the caller will use
  pub limit: usize,
}

/// Translation between one external API and [`Document`]s.
#[async_trait]
pub trait Adapter: Send + Sync + std::fmt::Debug {
  /// The source this adapter speaks for.
  fn source(&self) -> Source;

  /// Requests needed to collect up to `limit` results for `keyword`, in the order they should
  /// be sent.
  fn requests(&self, keyword: &str, limit: usize) -> Result<Vec<HttpRequest>>;

  /// Normalizes one response body.
  fn parse(&self, keyword: &str, body: &[u8]) -> Result<Vec<Document>>;

  /// Whether the requests are pages of one result list, so that an empty or rate-limited page
  /// means there is nothing more to fetch.
  ///
  /// True for paginated APIs; false where requests are independent (feeds, lookups).
  fn stops_on_empty_page(&self) -> bool { true }

  /// Runs the whole search for `keyword`.
  ///
  /// The default sends every request from [`Adapter::requests`] through
  /// [`send_with_retry`](crate::http::send_with_retry) and parses the bodies, stopping once
  /// `limit` documents are collected.
  async fn search(&self, ctx: &SearchContext<'_>, keyword: &str) -> Result<Vec<Document>> {
    let requests = self.requests(keyword, ctx.limit)?;
    collect_pages(self, ctx, keyword, requests).await
  }
}

/// Sends `requests` one after another and gathers the documents they yield.
///
/// A failing request is logged and skipped; its error is returned only when nothing at all was
/// collected. Paginated sources stop at the first page that stays rate limited.
pub async fn collect_pages<A: Adapter + ?Sized>(
  adapter: &A,
  ctx: &SearchContext<'_>,
  keyword: &str,
  requests: Vec<HttpRequest>,
) -> Result<Vec<Document>> {
  let source = adapter.source();
  let mut documents = Vec::new();
  let mut failure = None;

  for request in requests {
    if documents.len() >= ctx.limit {
      break;
    }
    debug!("{source}: requesting {}", request.url);
    let page = send_with_retry(ctx.http, source, &request, ctx.retry)
      .await
      .and_then(|body| adapter.parse(keyword, &body));
    match page {
      Ok(page) if page.is_empty() && adapter.stops_on_empty_page() => break,
      Ok(page) => documents.extend(page),
      Err(e @ DocuFetchError::RateLimited(_)) if adapter.stops_on_empty_page() => {
        warn!("{source}: still rate limited, keeping {} documents", documents.len());
        failure = Some(e);
        break;
      },
      Err(e) => {
        warn!("{source}: request to {} failed: {e}", request.url);
        failure = Some(e);
      },
    }
  }

  documents.truncate(ctx.limit);
  match failure {
    Some(e) if documents.is_empty() => Err(e),
    _ => Ok(documents),
  }
}

/// Builds the adapter for `source` with the credentials in `config`.
pub fn build_adapter(source: Source, config: &Config) -> Arc<dyn Adapter> {
  let credential = config.credential(source);
  match source {
    Source::Arxiv => Arc::new(ArxivAdapter),
    Source::Scholar => Arc::new(ScholarAdapter),
    Source::SemanticScholar => Arc::new(SemanticScholarAdapter::new(credential)),
    Source::Core => Arc::new(CoreAdapter::new(credential)),
    Source::Crossref => Arc::new(CrossrefAdapter::new(credential)),
    Source::Unpaywall => Arc::new(UnpaywallAdapter::new(
      credential.unwrap_or_default(),
      CrossrefAdapter::new(config.credential(Source::Crossref)),
    )),
    Source::Pubmed => Arc::new(PubmedAdapter::new(credential)),
    Source::Doaj => Arc::new(DoajAdapter::new(credential)),
    Source::Openaire => Arc::new(OpenaireAdapter),
    Source::News => Arc::new(NewsAdapter::new(config.feeds())),
  }
}

/// Page sizes for fetching `limit` results `page_size` at a time: `(offset, size)` pairs.
pub(crate) fn pages(limit: usize, page_size: usize) -> Vec<(usize, usize)> {
  (0..limit).step_by(page_size.max(1)).map(|offset| (offset, page_size.min(limit - offset))).collect()
}

/// Parses a JSON body, mapping failure to [`DocuFetchError::Parse`].
pub(crate) fn parse_json<T: DeserializeOwned>(source: Source, body: &[u8]) -> Result<T> {
  serde_json::from_slice(body)
    .map_err(|e| DocuFetchError::Parse(format!("{source} returned an unreadable body: {e}")))
}

/// Deserializes `T`, falling back to its default when the value has the wrong shape.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> core::result::Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: DeserializeOwned + Default, {
  let value = serde_json::Value::deserialize(deserializer)?;
  Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Deserializes strings, numbers and booleans as a string; anything else becomes empty.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> core::result::Result<String, D::Error>
where D: Deserializer<'de> {
  Ok(match serde_json::Value::deserialize(deserializer)? {
    serde_json::Value::String(s) => s,
    serde_json::Value::Number(n) => n.to_string(),
    serde_json::Value::Bool(b) => b.to_string(),
    _ => String::new(),
  })
}

/// Deserializes a list that may also arrive as a single value or `null`.
///
/// Elements of the wrong shape are skipped.
pub(crate) fn one_or_many<'de, D, T>(deserializer: D) -> core::result::Result<Vec<T>, D::Error>
where
  D: Deserializer<'de>,
  T: DeserializeOwned, {
  Ok(match serde_json::Value::deserialize(deserializer)? {
    serde_json::Value::Array(items) =>
      items.into_iter().filter_map(|item| serde_json::from_value(item).ok()).collect(),
    serde_json::Value::Null => Vec::new(),
    single => serde_json::from_value(single).ok().into_iter().collect(),
  })
}

/// The part of `text` left after trimming, or `None` if nothing is left.
pub(crate) fn non_empty(text: impl AsRef<str>) -> Option<String> {
  let text = text.as_ref().trim();
  (!text.is_empty()).then(|| text.to_string())
}
