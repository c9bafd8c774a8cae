use super::*;

pub mod fetch;
pub mod keywords;
pub mod settings;
pub mod sources;
pub mod storage;

pub use fetch::{fetch, monitor, preview, retry, FetchArgs};
pub use keywords::{add, clear, list, remove, KeywordArgs};
pub use settings::{api, interval, ApiArgs, IntervalArgs};
pub use sources::{sources, SourcesCommands};
pub use storage::{open, stats};

/// Available commands for the CLI
#[derive(Subcommand, Clone)]
pub enum Commands {
  /// Track one or more keywords
  Add(KeywordArgs),

  /// Stop tracking one or more keywords
  Remove(KeywordArgs),

  /// Stop tracking every keyword after confirmation
  Clear,

  /// Show the tracked keywords
  List,

  /// List, enable or disable sources
  Sources {
    /// What to do with the sources
    #[command(subcommand)]
    cmd: SourcesCommands,
  },

  /// Store the API key or contact email of a source
  /// Example: `docufetch api core <key>`, `docufetch api crossref me@example.org`
  Api(ApiArgs),

  /// Set the hours between runs in monitor mode
  Interval(IntervalArgs),

  /// Count new documents per source without storing them; counted documents are marked as seen
  Preview,

  /// Preview, confirm and store new documents
  Fetch(FetchArgs),

  /// Fetch every `update_interval` hours until interrupted
  Monitor,

  /// Download artifacts that failed on earlier runs
  Retry,

  /// Show what has been stored so far
  Stats,

  /// Open the download directory in the file manager
  Open,
}

/// Builds a manager for the current configuration.
fn manager<I: UserInteraction>(interaction: &I) -> Result<Manager> {
  Ok(Manager::new(interaction.config().clone())?)
}
