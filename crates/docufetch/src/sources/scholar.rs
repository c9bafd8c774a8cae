use scraper::{ElementRef, Html, Selector};

use super::*;

/// Google Scholar results page.
const ENDPOINT: &str = "https://scholar.google.com/scholar";

/// Results Scholar serves per page.
const PAGE_SIZE: usize = 10;

/// Scholar rejects obvious bots; a desktop browser agent gets regular result pages.
const BROWSER_AGENT: &str =
  "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
   Chrome/120.0 Safari/537.36";

lazy_static! {
  /// `Cited by 42`
  static ref CITED_BY: Regex = Regex::new(r"Cited by (\d+)").unwrap();
  /// A plausible publication year
  static ref YEAR: Regex = Regex::new(r"\b(1[89]\d{2}|20\d{2})\b").unwrap();
}

/// Scrapes Google Scholar result pages.
///
/// Scholar has no API. Result pages are paged ten at a time with `start`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScholarAdapter;

/// Compiled selectors for one results page.
struct Selectors {
  /// One search hit
  result:  Selector,
  /// Title heading
  title:   Selector,
  /// Link inside the title heading
  link:    Selector,
  /// "authors - venue, year - host" line
  meta:    Selector,
  /// Snippet
  snippet: Selector,
  /// Side link to a full text copy
  pdf:     Selector,
  /// Footer links, including "Cited by"
  footer:  Selector,
}

/// Compiles a CSS selector.
fn selector(css: &str) -> Result<Selector> {
  Selector::parse(css).map_err(|e| DocuFetchError::Parse(format!("invalid selector {css}: {e:?}")))
}

impl Selectors {
  /// Compiles every selector used on a results page.
  fn new() -> Result<Self> {
    Ok(Self {
      result:  selector(".gs_r.gs_or.gs_scl")?,
      title:   selector(".gs_rt")?,
      link:    selector(".gs_rt a")?,
      meta:    selector(".gs_a")?,
      snippet: selector(".gs_rs")?,
      pdf:     selector(".gs_or_ggsm a")?,
      footer:  selector(".gs_fl a")?,
    })
  }
}

/// Collapsed text of the first match of `selector` inside `element`.
fn first_text(element: &ElementRef<'_>, selector: &Selector) -> String {
  element
    .select(selector)
    .next()
    .map(|found| format::squash_whitespace(&found.text().collect::<String>()))
    .unwrap_or_default()
}

/// `href` of the first match of `selector` inside `element`.
fn first_href(element: &ElementRef<'_>, selector: &Selector) -> String {
  element
    .select(selector)
    .next()
    .and_then(|found| found.value().attr("href"))
    .map(String::from)
    .unwrap_or_default()
}

/// Removes Scholar's `[PDF]`, `[HTML]`, `[BOOK]` and `[CITATION]` markers from a title.
fn strip_markers(title: &str) -> String {
  let mut title = title.trim();
  while let Some(rest) = title.strip_prefix('[') {
    match rest.split_once(']') {
      Some((_, after)) => title = after.trim_start(),
      None => break,
    }
  }
  title.to_string()
}

/// Splits the "authors - venue, year - host" line.
///
/// Returns authors, the venue (if any) and the year (empty if none).
fn split_meta(meta: &str) -> (Vec<String>, Option<String>, String) {
  let mut parts = meta.split(" - ");
  let authors = parts
    .next()
    .unwrap_or_default()
    .split(',')
    .map(|name| name.trim().trim_end_matches('…').trim())
    .filter(|name| !name.is_empty())
    .map(String::from)
    .collect();
  let publication = parts.next().unwrap_or_default();
  let year = YEAR.find(publication).map(|m| m.as_str().to_string()).unwrap_or_default();
  let venue = non_empty(YEAR.replace(publication, "").trim().trim_end_matches(',').trim_end());
  (authors, venue, year)
}

#[async_trait]
impl Adapter for ScholarAdapter {
  fn source(&self) -> Source { Source::Scholar }

  fn requests(&self, keyword: &str, limit: usize) -> Result<Vec<HttpRequest>> {
    Ok(
      pages(limit, PAGE_SIZE)
        .into_iter()
        .map(|(start, _)| {
          HttpRequest::get(ENDPOINT)
            .query("q", keyword)
            .query("hl", "en")
            .query("start", start)
            .header("User-Agent", BROWSER_AGENT)
        })
        .collect(),
    )
  }

  fn parse(&self, keyword: &str, body: &[u8]) -> Result<Vec<Document>> {
    let html = Html::parse_document(&String::from_utf8_lossy(body));
    let selectors = Selectors::new()?;

    Ok(
      html
        .select(&selectors.result)
        .filter_map(|result| {
          let title = non_empty(strip_markers(&first_text(&result, &selectors.title)))?;
          let (authors, venue, published) = split_meta(&first_text(&result, &selectors.meta));
          let citations = result
            .select(&selectors.footer)
            .filter_map(|link| {
              let text = link.text().collect::<String>();
              CITED_BY.captures(&text).and_then(|caps| caps[1].parse::<u64>().ok())
            })
            .next();
          let id = result
            .value()
            .attr("data-cid")
            .map(String::from)
            .unwrap_or_else(|| derived_id(&title));

          Some(Document {
            id,
            title,
            authors,
            abstract_text: first_text(&result, &selectors.snippet),
            url: first_href(&result, &selectors.link),
            pdf_url: first_href(&result, &selectors.pdf),
            published,
            venue,
            citations,
            ..Document::new(Source::Scholar, keyword)
          })
        })
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const PAGE: &str = r#"<html><body><div id="gs_res_ccl_mid">
    <div class="gs_r gs_or gs_scl" data-cid="abc123">
      <div class="gs_ggs gs_fl"><div class="gs_or_ggsm"><a href="https://example.org/gnn.pdf">[PDF] example.org</a></div></div>
      <div class="gs_ri">
        <h3 class="gs_rt"><span>[PDF]</span> <a href="https://example.org/gnn">Graph Neural Networks: A Review</a></h3>
        <div class="gs_a">J Zhou, G Cui, S Hu - AI open, 2020 - Elsevier</div>
        <div class="gs_rs">Lots of learning tasks require dealing with graph data.</div>
        <div class="gs_fl"><a href="/scholar?cites=1">Cited by 5123</a><a href="/related">Related articles</a></div>
      </div>
    </div>
    <div class="gs_r gs_or gs_scl">
      <div class="gs_ri">
        <h3 class="gs_rt"><span>[CITATION]</span> Message Passing</h3>
        <div class="gs_a">A Author - 2017</div>
      </div>
    </div>
    <div class="gs_r gs_or gs_scl"><div class="gs_ri"><h3 class="gs_rt"></h3></div></div>
  </div></body></html>"#;

  #[test]
  fn test_parse_results_page() {
    let documents = ScholarAdapter.parse("gnn", PAGE.as_bytes()).unwrap();
    assert_eq!(documents.len(), 2);

    let first = &documents[0];
    assert_eq!(first.id, "abc123");
    assert_eq!(first.title, "Graph Neural Networks: A Review");
    assert_eq!(first.url, "https://example.org/gnn");
    assert_eq!(first.pdf_url, "https://example.org/gnn.pdf");
    assert_eq!(first.authors, vec!["J Zhou", "G Cui", "S Hu"]);
    assert_eq!(first.venue.as_deref(), Some("AI open"));
    assert_eq!(first.published, "2020");
    assert_eq!(first.citations, Some(5123));
    assert!(first.abstract_text.starts_with("Lots of learning"));

    let second = &documents[1];
    assert_eq!(second.title, "Message Passing");
    assert_eq!(second.id, derived_id("Message Passing"));
    assert_eq!(second.published, "2017");
    assert_eq!(second.venue, None);
    assert_eq!(second.citations, None);
  }

  #[test]
  fn test_paging() {
    let requests = ScholarAdapter.requests("gnn", 25).unwrap();
    let starts: Vec<_> = requests.iter().filter_map(|r| r.query_value("start")).collect();
    assert_eq!(starts, vec!["0", "10", "20"]);
  }

  #[test]
  fn test_strip_markers() {
    assert_eq!(strip_markers("[HTML][HTML] Title"), "Title");
    assert_eq!(strip_markers("Plain [not a marker]"), "Plain [not a marker]");
  }
}
