use std::{collections::VecDeque, sync::Mutex};

use docufetch::{
  error::{DocuFetchError, Result},
  http::{HttpRequest, HttpResponse},
};
use reqwest::StatusCode;
use tokio::io::AsyncWriteExt;

use super::*;

pub const ARXIV: &str = "http://export.arxiv.org/api/query";
pub const CROSSREF: &str = "https://api.crossref.org/works";
pub const CORE: &str = "https://api.core.ac.uk";
pub const GNN_PDF: &str = "http://arxiv.org/pdf/2401.00001v1";

pub const ARXIV_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title type="html">ArXiv Query: search_query=all:graph neural networks</title>
  <entry>
    <id>http://arxiv.org/abs/2401.00001v1</id>
    <published>2024-01-01T09:00:00Z</published>
    <title>A Survey of Graph Neural Networks</title>
    <summary>  Graphs are everywhere.
      We survey how to learn on them. </summary>
    <author><name>Jane Doe</name></author>
    <author><name>John Smith</name></author>
    <link href="http://arxiv.org/abs/2401.00001v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2401.00001v1" rel="related" type="application/pdf"/>
    <category term="cs.LG" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#;

pub const CROSSREF_WORKS: &str = r#"{"status": "ok", "message": {"items": [
  {"DOI": "10.1000/gnn.survey", "title": ["A survey of graph neural networks"],
   "author": [{"given": "Jane", "family": "Doe"}, {"given": "John", "family": "Smith"}],
   "published": {"date-parts": [[2024, 1, 5]]}},
  {"DOI": "10.1000/mp", "title": ["Message Passing Revisited"],
   "author": [{"given": "Ada", "family": "Byron"}],
   "container-title": ["Journal of Graph Learning"], "is-referenced-by-count": 7}
]}}"#;

/// One canned answer.
#[derive(Debug, Clone)]
pub struct Reply {
  pub status: StatusCode,
  pub body:   Vec<u8>,
}

impl Reply {
  pub fn ok(body: &str) -> Self { Self { status: StatusCode::OK, body: body.as_bytes().to_vec() } }

  pub fn status(status: StatusCode) -> Self { Self { status, body: Vec::new() } }
}

/// Answers requests by URL prefix and remembers every URL it was asked for.
///
/// A route plays its replies in order and keeps repeating the last one.
#[derive(Debug, Default)]
pub struct StubHttp {
  routes: Vec<(String, Mutex<VecDeque<Reply>>)>,
  files:  Vec<(String, Vec<u8>)>,
  calls:  Mutex<Vec<String>>,
}

impl StubHttp {
  pub fn new() -> Self { Self::default() }

  pub fn route(mut self, prefix: &str, replies: impl IntoIterator<Item = Reply>) -> Self {
    self.routes.push((prefix.to_string(), Mutex::new(replies.into_iter().collect())));
    self
  }

  pub fn file(mut self, url: &str, bytes: &[u8]) -> Self {
    self.files.push((url.to_string(), bytes.to_vec()));
    self
  }

  /// The academic scenario: one arXiv paper, the same paper plus another on Crossref.
  pub fn academic() -> Self {
    Self::new()
      .route(ARXIV, [Reply::ok(ARXIV_FEED)])
      .route(CROSSREF, [Reply::ok(CROSSREF_WORKS)])
      .file(GNN_PDF, b"%PDF-1.4 graph neural networks")
  }

  pub fn calls(&self) -> Vec<String> { self.calls.lock().unwrap().clone() }

  pub fn calls_to(&self, prefix: &str) -> usize {
    self.calls().iter().filter(|url| url.starts_with(prefix)).count()
  }
}

#[async_trait::async_trait]
impl HttpClient for StubHttp {
  async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
    self.calls.lock().unwrap().push(request.url.clone());
    let reply = self
      .routes
      .iter()
      .find(|(prefix, _)| request.url.starts_with(prefix.as_str()))
      .and_then(|(_, replies)| {
        let mut replies = replies.lock().unwrap();
        if replies.len() > 1 {
          replies.pop_front()
        } else {
          replies.front().cloned()
        }
      })
      .unwrap_or_else(|| Reply::status(StatusCode::NOT_FOUND));
    Ok(HttpResponse { status: reply.status, retry_after: Some(0), body: reply.body })
  }

  async fn download(&self, url: &str, file: &mut tokio::fs::File) -> Result<u64> {
    self.calls.lock().unwrap().push(url.to_string());
    let Some((_, bytes)) = self.files.iter().find(|(known, _)| known == url) else {
      return Err(DocuFetchError::Download { url: url.to_string(), status: StatusCode::NOT_FOUND });
    };
    file.write_all(bytes).await?;
    file.flush().await?;
    Ok(bytes.len() as u64)
  }
}

/// Configuration that only runs `sources`, stores below `dir` and never sleeps between retries.
pub fn config_for(dir: &Path, sources: &[Source]) -> Config {
  Source::ALL
    .into_iter()
    .fold(Config::default(), |config, source| config.with_source(source, sources.contains(&source)))
    .with_download_dir(dir)
    .with_retry(RetryPolicy { max_retries: 2, delay_secs: 0, max_delay_secs: 0 })
}

pub fn manager_for(dir: &Path, sources: &[Source], http: &Arc<StubHttp>) -> Manager {
  Manager::with_client(config_for(dir, sources), http.clone()).unwrap()
}

/// Files directly inside `dir` with the given extension.
pub fn files_with_extension(dir: &Path, extension: &str) -> Vec<PathBuf> {
  std::fs::read_dir(dir)
    .map(|entries| {
      entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == extension))
        .collect()
    })
    .unwrap_or_default()
}
