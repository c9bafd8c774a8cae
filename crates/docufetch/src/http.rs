//! The HTTP boundary of the pipeline.
//!
//! Adapters never talk to the network themselves. They describe what they want as
//! [`HttpRequest`]s and hand them to an [`HttpClient`], which keeps the parsing side of every
//! source testable against canned bodies. [`ReqwestClient`] is the production implementation.
//!
//! Rate limiting is handled in one place, [`send_with_retry`]: a `429 Too Many Requests` answer
//! is retried after the server's `Retry-After` hint (or a fixed delay) up to a bounded number of
//! times. Every other failure is returned immediately.

use std::time::Duration;

use reqwest::{Method, StatusCode};
use tokio::io::AsyncWriteExt;

use super::*;

/// User agent sent with every request unless an adapter overrides it.
pub const USER_AGENT: &str =
  concat!("DocuFetch/", env!("CARGO_PKG_VERSION"), " (+https://github.com/docufetch/docufetch)");

/// Timeout applied to every request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A request as described by an adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
  /// HTTP method
  pub method:  Method,
  /// Absolute URL without query string
  pub url:     String,
  /// Query parameters, in order
  pub query:   Vec<(String, String)>,
  /// Extra headers
  pub headers: Vec<(String, String)>,
  /// JSON body for POST requests
  pub json:    Option<serde_json::Value>,
}

/// The parts of a response the pipeline cares about.
#[derive(Debug, Clone)]
pub struct HttpResponse {
  /// Status code
  pub status:      StatusCode,
  /// Parsed `Retry-After` header, in seconds
  pub retry_after: Option<u64>,
  /// Raw body
  pub body:        Vec<u8>,
}

/// How rate-limited requests are retried.
///
/// ```
/// use docufetch::http::RetryPolicy;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_retries, 3);
/// assert_eq!(policy.delay(None).as_secs(), 2);
/// assert_eq!(policy.delay(Some(600)).as_secs(), 60);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
  /// Retries after the first attempt before giving up
  pub max_retries:    u32,
  /// Wait between attempts when the server gives no hint, in seconds
  pub delay_secs:     u64,
  /// Upper bound on any single wait, in seconds
  pub max_delay_secs: u64,
}

/// Transport used by adapters and storage.
#[async_trait]
pub trait HttpClient: Send + Sync + std::fmt::Debug {
  /// Performs `request` and returns the response regardless of its status.
  async fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;

  /// Streams the body at `url` into `file`, returning the number of bytes written.
  ///
  /// Non-success statuses fail with [`DocuFetchError::Download`].
  async fn download(&self, url: &str, file: &mut tokio::fs::File) -> Result<u64>;
}

/// [`HttpClient`] backed by [`reqwest`].
#[derive(Debug, Clone)]
pub struct ReqwestClient {
  /// Shared connection pool
  client: reqwest::Client,
}

impl Default for RetryPolicy {
  fn default() -> Self { Self { max_retries: 3, delay_secs: 2, max_delay_secs: 60 } }
}

impl RetryPolicy {
  /// How long to wait before the next attempt given the server's hint.
  pub fn delay(&self, retry_after: Option<u64>) -> Duration {
    Duration::from_secs(retry_after.unwrap_or(self.delay_secs).min(self.max_delay_secs))
  }
}

impl HttpRequest {
  /// A GET request for `url`.
  pub fn get(url: impl Into<String>) -> Self {
    Self {
      method:  Method::GET,
      url:     url.into(),
      query:   Vec::new(),
      headers: Vec::new(),
      json:    None,
    }
  }

  /// A POST request for `url` carrying `body` as JSON.
  pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
    Self { method: Method::POST, json: Some(body), ..Self::get(url) }
  }

  /// Adds a query parameter.
  pub fn query(mut self, key: &str, value: impl ToString) -> Self {
    self.query.push((key.to_string(), value.to_string()));
    self
  }

  /// Adds a header.
  pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
    self.headers.push((key.to_string(), value.into()));
    self
  }

  /// Value of the query parameter `key`, if present.
  pub fn query_value(&self, key: &str) -> Option<&str> {
    self.query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
  }
}

impl ReqwestClient {
  /// Builds a client with the default user agent and timeout.
  pub fn new() -> Result<Self> {
    let client =
      reqwest::Client::builder().user_agent(USER_AGENT).timeout(REQUEST_TIMEOUT).build()?;
    Ok(Self { client })
  }
}

#[async_trait]
impl HttpClient for ReqwestClient {
  async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
    let mut builder =
      self.client.request(request.method.clone(), &request.url).query(&request.query);
    for (key, value) in &request.headers {
      builder = builder.header(key.as_str(), value.as_str());
    }
    if let Some(body) = &request.json {
      builder = builder.json(body);
    }

    trace!("{} {} {:?}", request.method, request.url, request.query);
    let response = builder.send().await?;
    let status = response.status();
    let retry_after = response
      .headers()
      .get(reqwest::header::RETRY_AFTER)
      .and_then(|value| value.to_str().ok())
      .and_then(|value| value.trim().parse::<u64>().ok());
    let body = response.bytes().await?.to_vec();
    Ok(HttpResponse { status, retry_after, body })
  }

  async fn download(&self, url: &str, file: &mut tokio::fs::File) -> Result<u64> {
    let mut response = self.client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
      trace!("Download response: {response:?}");
      return Err(DocuFetchError::Download { url: url.to_string(), status });
    }

    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await? {
      file.write_all(&chunk).await?;
      written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
  }
}

/// Sends `request` on behalf of `source`, retrying while the server rate limits us.
///
/// Returns the body of the first successful response. A `429` that persists past
/// [`RetryPolicy::max_retries`] becomes [`DocuFetchError::RateLimited`]; any other non-success
/// status becomes [`DocuFetchError::Status`] without retrying.
pub async fn send_with_retry(
  http: &dyn HttpClient,
  source: Source,
  request: &HttpRequest,
  policy: &RetryPolicy,
) -> Result<Vec<u8>> {
  let mut attempt = 0;
  loop {
    let response = http.send(request).await?;
    if response.status.is_success() {
      return Ok(response.body);
    }
    if response.status != StatusCode::TOO_MANY_REQUESTS {
      return Err(DocuFetchError::Status { api: source, status: response.status });
    }
    if attempt >= policy.max_retries {
      warn!("{source} still rate limited after {attempt} retries, giving up");
      return Err(DocuFetchError::RateLimited(source));
    }
    attempt += 1;
    let delay = policy.delay(response.retry_after);
    warn!("{source} rate limited, retry {attempt}/{} in {}s", policy.max_retries, delay.as_secs());
    tokio::time::sleep(delay).await;
  }
}
