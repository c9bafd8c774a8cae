use feed_rs::model::{Entry, Feed};
use scraper::Html;
use url::Url;

use super::*;

/// Polls news outlet feeds (RSS or Atom) and keeps the entries that mention the keyword.
#[derive(Debug, Clone, Default)]
pub struct NewsAdapter {
  /// Feed URLs, in priority order
  feeds: Vec<String>,
}

/// Plain text of an HTML fragment, whitespace collapsed.
fn strip_html(html: &str) -> String {
  let fragment = Html::parse_fragment(html);
  format::squash_whitespace(&fragment.root_element().text().collect::<String>())
}

/// Path segments many outlets share, which say nothing about the article.
const GENERIC_SEGMENTS: &[&str] =
  &["index", "default", "story", "article", "articles", "news", "amp", "home", "main", "page", "view"];

/// Identifier derived from an article link: its last path segment without extension.
///
/// Links that end in a generic segment (`/index.html`, `/story`) or in none at all get a hash of
/// the whole link instead.
fn article_id(link: &str, title: &str) -> String {
  Url::parse(link)
    .ok()
    .and_then(|url| {
      url
        .path_segments()
        .and_then(|segments| segments.filter(|segment| !segment.is_empty()).last().map(String::from))
    })
    .map(|segment| segment.split('.').next().unwrap_or_default().to_string())
    .filter(|id| !id.is_empty() && !GENERIC_SEGMENTS.contains(&id.to_lowercase().as_str()))
    .unwrap_or_else(|| derived_id(if link.is_empty() { title } else { link }))
}

impl NewsAdapter {
  /// Creates the adapter over `feeds`.
  pub fn new(feeds: Vec<String>) -> Self { Self { feeds } }

  /// Normalizes one feed entry; `None` when it has no title.
  fn normalize(feed: &Feed, entry: &Entry, keyword: &str) -> Option<Document> {
    let title = non_empty(entry.title.as_ref().map(|t| strip_html(&t.content)).unwrap_or_default())?;
    let summary = entry.summary.as_ref().map(|s| strip_html(&s.content)).unwrap_or_default();
    let body = entry
      .content
      .as_ref()
      .and_then(|content| content.body.as_deref())
      .map(strip_html)
      .filter(|text| !text.is_empty())
      .unwrap_or_else(|| summary.clone());
    let link = entry.links.first().map(|link| link.href.clone()).unwrap_or_default();
    let published = entry.published.or(entry.updated).map(|date| date.to_rfc3339()).unwrap_or_default();

    Some(Document {
      id: article_id(&link, &title),
      title,
      authors: entry.authors.iter().filter_map(|person| non_empty(&person.name)).collect(),
      abstract_text: summary,
      url: link,
      published,
      venue: feed.title.as_ref().and_then(|t| non_empty(&t.content)),
      content: non_empty(body),
      ..Document::new(Source::News, keyword)
    })
  }
}

/// Whether `document` mentions `keyword`, ignoring case.
fn mentions(document: &Document, keyword: &str) -> bool {
  let needle = keyword.to_lowercase();
  document.title.to_lowercase().contains(&needle)
    || document.content.as_deref().is_some_and(|text| text.to_lowercase().contains(&needle))
}

#[async_trait]
impl Adapter for NewsAdapter {
  fn source(&self) -> Source { Source::News }

  fn requests(&self, _keyword: &str, _limit: usize) -> Result<Vec<HttpRequest>> {
    Ok(self.feeds.iter().map(HttpRequest::get).collect())
  }

  fn parse(&self, keyword: &str, body: &[u8]) -> Result<Vec<Document>> {
    let feed = feed_rs::parser::parse(body)
      .map_err(|e| DocuFetchError::Parse(format!("news feed could not be read: {e}")))?;
    let keyword = keyword.trim();
    Ok(
      feed
        .entries
        .iter()
        .filter_map(|entry| Self::normalize(&feed, entry, keyword))
        .filter(|document| mentions(document, keyword))
        .collect(),
    )
  }

  fn stops_on_empty_page(&self) -> bool { false }
}
