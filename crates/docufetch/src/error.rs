//! Error types for the docufetch library.
//!
//! Almost every failure inside the fetch pipeline is recoverable: a source that times out, answers
//! with garbage or refuses to serve us is logged and simply contributes nothing to the report.
//! [`DocuFetchError`] is therefore mostly seen by adapters and by callers of the lower level
//! building blocks ([`Storage`](crate::storage::Storage),
//! [`Deduplicator`](crate::dedup::Deduplicator), [`Config`](crate::config::Config)).
//!
//! # Examples
//!
//! ```
//! use docufetch::{document::Source, error::DocuFetchError};
//!
//! let err = "bogus".parse::<Source>().unwrap_err();
//! assert!(matches!(err, DocuFetchError::InvalidSource(_)));
//! ```

use reqwest::StatusCode;
use thiserror::Error;

use crate::document::Source;

/// Error type alias used for the [`docufetch`](crate) crate.
pub type Result<T> = core::result::Result<T, DocuFetchError>;

/// Errors that can occur while fetching, normalizing or storing documents.
#[derive(Error, Debug)]
pub enum DocuFetchError {
  /// A network request failed.
  ///
  /// This covers unreachable hosts, TLS failures and request timeouts.
  #[error(transparent)]
  Network(#[from] reqwest::Error),

  /// An API answered with a non-success status that is not a rate limit.
  #[error("{api} answered with HTTP {status}")]
  Status {
    /// The source whose API failed.
    api:    Source,
    /// The status code returned.
    status: StatusCode,
  },

  /// An artifact download was answered with a non-success status.
  #[error("Download of {url} failed with HTTP {status}")]
  Download {
    /// The artifact location.
    url:    String,
    /// The status code returned.
    status: StatusCode,
  },

  /// The source kept answering `429 Too Many Requests` until the retry budget ran out.
  #[error("{0} is rate limiting us and the retry budget is exhausted")]
  RateLimited(Source),

  /// A response body could not be understood at all.
  ///
  /// Individual malformed records never produce this; only a body that is not the expected
  /// JSON, XML or HTML document does.
  #[error("Failed to parse response: {0}")]
  Parse(String),

  /// JSON (de)serialization failed.
  #[error(transparent)]
  Json(#[from] serde_json::Error),

  /// XML reading failed.
  #[error(transparent)]
  Xml(#[from] quick_xml::Error),

  /// A file system operation failed.
  #[error(transparent)]
  Path(#[from] std::io::Error),

  /// The configuration file could not be parsed.
  #[error(transparent)]
  TomlDe(#[from] toml::de::Error),

  /// The configuration could not be written out.
  #[error(transparent)]
  TomlSer(#[from] toml::ser::Error),

  /// A request URL could not be assembled.
  #[error(transparent)]
  Url(#[from] url::ParseError),

  /// The provided source name doesn't match any known source.
  #[error("Invalid source name \"{0}\", see `docufetch::document::Source`")]
  InvalidSource(String),

  /// A source needs an API key or contact email that has not been configured.
  #[error("{0} requires a credential that is not configured")]
  MissingCredential(Source),

  /// A credential was supplied for a source that does not take one.
  #[error("{0} does not take an API key or email")]
  CredentialNotSupported(Source),

  /// Any other configuration problem.
  #[error("{0}")]
  Config(String),
}
