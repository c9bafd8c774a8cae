//! Error types for the docufetch CLI.

use thiserror::Error;

use super::*;

/// Errors that end a CLI command.
#[derive(Error, Debug)]
pub enum DocufetchdError {
  /// Errors from the docufetch library.
  #[error(transparent)]
  DocuFetch(#[from] DocuFetchError),

  /// File system errors outside the library.
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// A prompt could not be shown or answered.
  #[error(transparent)]
  Dialog(#[from] dialoguer::Error),

  /// The command was given arguments it cannot act on.
  #[error("{0}")]
  Usage(String),
}

/// Type alias for Results from docufetchd operations.
pub type Result<T> = core::result::Result<T, DocufetchdError>;
