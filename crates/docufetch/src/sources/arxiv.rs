use super::{xml::parse_xml, *};

/// Query endpoint of the arXiv export API.
const ENDPOINT: &str = "http://export.arxiv.org/api/query";

/// Searches arXiv through its Atom export API, newest submissions first.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArxivAdapter;

#[async_trait]
impl Adapter for ArxivAdapter {
  fn source(&self) -> Source { Source::Arxiv }

  fn requests(&self, keyword: &str, limit: usize) -> Result<Vec<HttpRequest>> {
    Ok(vec![HttpRequest::get(ENDPOINT)
      .query("search_query", format!("all:{keyword}"))
      .query("start", 0)
      .query("max_results", limit)
      .query("sortBy", "submittedDate")
      .query("sortOrder", "descending")])
  }

  fn parse(&self, keyword: &str, body: &[u8]) -> Result<Vec<Document>> {
    let root = parse_xml(body)?;
    let feed = root
      .child("feed")
      .ok_or_else(|| DocuFetchError::Parse("arxiv response is not an Atom feed".into()))?;

    Ok(
      feed
        .children("entry")
        .filter_map(|entry| {
          let title = non_empty(entry.text_at("title"))?;
          let abs_url = entry.text_at("id");
          let id = abs_url.rsplit_once("abs/").map(|(_, id)| id.to_string()).unwrap_or_default();
          let pdf_url = entry
            .children("link")
            .find(|link| link.attr("title") == Some("pdf"))
            .and_then(|link| link.attr("href"))
            .map(String::from)
            .unwrap_or_else(|| abs_url.replace("abs", "pdf"));

          Some(Document {
            id,
            title,
            authors: entry.children("author").map(|author| author.text_at("name")).collect(),
            abstract_text: entry.text_at("summary"),
            url: abs_url.clone(),
            pdf_url,
            published: entry.text_at("published").chars().take(10).collect(),
            doi: non_empty(entry.text_at("doi")),
            venue: non_empty(entry.text_at("journal_ref")),
            categories: entry
              .children("category")
              .filter_map(|category| category.attr("term"))
              .map(String::from)
              .collect(),
            ..Document::new(Source::Arxiv, keyword)
          })
        })
        .collect(),
    )
  }
}
