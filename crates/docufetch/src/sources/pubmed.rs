use super::{xml::parse_xml, *};

/// NCBI E-utilities base.
const EUTILS: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Searches PubMed through NCBI E-utilities.
///
/// A search takes two steps: `esearch` returns matching PMIDs as JSON, then one `efetch` call
/// returns the article records for all of them as XML. A contact email is optional and is sent
/// with both calls when configured.
#[derive(Debug, Clone, Default)]
pub struct PubmedAdapter {
  /// Contact email
  email: Option<String>,
}

/// `esearch` response.
#[derive(Debug, Deserialize)]
struct SearchResponse {
  /// Payload
  #[serde(default, deserialize_with = "lenient")]
  esearchresult: SearchResult,
}

/// `esearch` payload.
#[derive(Debug, Default, Deserialize)]
struct SearchResult {
  /// Matching PMIDs
  #[serde(default, deserialize_with = "one_or_many")]
  idlist: Vec<String>,
}

impl PubmedAdapter {
  /// Creates the adapter, identifying as `email` when given.
  pub fn new(email: Option<String>) -> Self { Self { email } }

  /// Adds the contact email to `request` when one is configured.
  fn identify(&self, request: HttpRequest) -> HttpRequest {
    match &self.email {
      Some(email) => request.query("email", email),
      None => request,
    }
  }

  /// The `efetch` request for `pmids`.
  fn fetch_request(&self, pmids: &[String]) -> HttpRequest {
    self.identify(
      HttpRequest::get(format!("{EUTILS}/efetch.fcgi"))
        .query("db", "pubmed")
        .query("id", pmids.join(","))
        .query("retmode", "xml"),
    )
  }

  /// Extracts PMIDs from an `esearch` body.
  fn parse_ids(&self, body: &[u8]) -> Result<Vec<String>> {
    let response: SearchResponse = parse_json(Source::Pubmed, body)?;
    Ok(response.esearchresult.idlist)
  }
}

#[async_trait]
impl Adapter for PubmedAdapter {
  fn source(&self) -> Source { Source::Pubmed }

  /// The `esearch` request. The follow-up `efetch` depends on its answer.
  fn requests(&self, keyword: &str, limit: usize) -> Result<Vec<HttpRequest>> {
    Ok(vec![self.identify(
      HttpRequest::get(format!("{EUTILS}/esearch.fcgi"))
        .query("db", "pubmed")
        .query("term", keyword)
        .query("retmax", limit)
        .query("retmode", "json")
        .query("sort", "relevance"),
    )])
  }

  /// Normalizes an `efetch` body.
  fn parse(&self, keyword: &str, body: &[u8]) -> Result<Vec<Document>> {
    let root = parse_xml(body)?;
    let set = root
      .child("PubmedArticleSet")
      .ok_or_else(|| DocuFetchError::Parse("pubmed response is not a PubmedArticleSet".into()))?;

    Ok(
      set
        .children("PubmedArticle")
        .filter_map(|record| {
          let citation = record.child("MedlineCitation")?;
          let article = citation.child("Article")?;
          let title = non_empty(article.text_at("ArticleTitle"))?;
          let pmid = citation.text_at("PMID");

          let authors = article
            .descendants("Author")
            .into_iter()
            .filter_map(|author| {
              let last = author.text_at("LastName");
              let fore = author.text_at("ForeName");
              match (fore.is_empty(), last.is_empty()) {
                (_, true) => None,
                (true, false) => Some(last),
                (false, false) => Some(format!("{fore} {last}")),
              }
            })
            .collect();
          let abstract_text = article
            .find("Abstract")
            .map(|abstract_node| {
              abstract_node.children("AbstractText").map(|part| part.text()).collect::<Vec<_>>().join(" ")
            })
            .unwrap_or_default();
          let doi = record
            .descendants("ArticleId")
            .into_iter()
            .find(|id| id.attr("IdType") == Some("doi"))
            .and_then(|id| non_empty(id.text()));

          Some(Document {
            id: pmid.clone(),
            title,
            authors,
            abstract_text,
            url: format!("https://pubmed.ncbi.nlm.nih.gov/{pmid}/"),
            published: article.text_at("Journal/JournalIssue/PubDate/Year"),
            journal: non_empty(article.text_at("Journal/Title")),
            doi,
            pmid: non_empty(pmid),
            ..Document::new(Source::Pubmed, keyword)
          })
        })
        .collect(),
    )
  }

  async fn search(&self, ctx: &SearchContext<'_>, keyword: &str) -> Result<Vec<Document>> {
    let mut pmids = Vec::new();
    for request in self.requests(keyword, ctx.limit)? {
      let body = send_with_retry(ctx.http, Source::Pubmed, &request, ctx.retry).await?;
      pmids.extend(self.parse_ids(&body)?);
    }
    pmids.truncate(ctx.limit);
    if pmids.is_empty() {
      info!("pubmed: no results for '{keyword}'");
      return Ok(Vec::new());
    }

    let body =
      send_with_retry(ctx.http, Source::Pubmed, &self.fetch_request(&pmids), ctx.retry).await?;
    self.parse(keyword, &body)
  }
}
