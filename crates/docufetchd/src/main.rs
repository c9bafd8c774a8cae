//! Command line interface and monitor for the docufetch pipeline.
//!
//! This crate wraps the `docufetch` library in a CLI that keeps a configuration file of keywords,
//! enabled sources and credentials, and runs the fetch pipeline on demand or on a schedule.
//!
//! # Usage
//!
//! ```bash
//! # Track a couple of topics
//! docufetch add "graph neural networks" "federated learning"
//!
//! # Turn on a source that needs a contact email
//! docufetch sources enable crossref
//! docufetch api crossref me@example.org
//!
//! # See how much is new, then download it
//! docufetch preview
//! docufetch fetch
//!
//! # Keep fetching every `update_interval` hours
//! docufetch monitor
//! ```
//!
//! Output is colored and destructive operations ask for confirmation. Logging verbosity is
//! raised with `-v` (repeatable) and every run also logs to a file next to the configuration.

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use clap::{builder::ArgAction, Args, Parser, Subcommand};
use console::style;
use docufetch::{
  config::Config,
  document::Source,
  error::DocuFetchError,
  manager::{Manager, Report},
  storage::StorageStats,
};
use tracing::{debug, trace};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub mod commands;
pub mod error;
pub mod interaction;

use crate::{commands::*, error::*, interaction::*};

/// Command line interface configuration and argument parsing
#[derive(Parser)]
#[command(author, version, about = "Fetch, deduplicate and store papers and news for your keywords")]
pub struct Cli {
  /// Verbose mode (-v, -vv, -vvv) for different levels of logging detail
  #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase logging verbosity"
    )]
  verbose: u8,

  /// Path to the configuration file. If not specified, uses the default platform-specific
  /// configuration directory.
  #[arg(long, short, global = true)]
  config: Option<PathBuf>,

  /// The subcommand to execute
  #[command(subcommand)]
  command: Commands,

  /// Skip all prompts and accept defaults (mostly for testing)
  #[arg(long, hide = true, global = true)]
  accept_defaults: bool,
}

/// Configures the logging system based on the verbosity level
///
/// Events go to stderr filtered by verbosity, and to `logs/docufetch.log` next to the
/// configuration file at `info` and above. `RUST_LOG` overrides both.
///
/// The verbosity levels are:
/// - 0: error (default)
/// - 1: warn
/// - 2: info
/// - 3: debug
/// - 4+: trace
///
/// The returned guard flushes the log file when dropped and has to live until exit.
fn setup_logging(verbosity: u8, log_dir: &Path) -> Option<tracing_appender::non_blocking::WorkerGuard> {
  let filter = match verbosity {
    0 => "error",
    1 => "warn",
    2 => "info",
    3 => "debug",
    _ => "trace",
  };
  let stderr_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
  let stderr = fmt::layer()
    .with_writer(std::io::stderr)
    .with_file(true)
    .with_line_number(true)
    .with_target(true)
    .with_filter(stderr_filter);

  // The file log is best effort: an unwritable directory only costs the file copy.
  let (file, guard) = match std::fs::create_dir_all(log_dir) {
    Ok(()) => {
      let appender = tracing_appender::rolling::never(log_dir, "docufetch.log");
      let (writer, guard) = tracing_appender::non_blocking(appender);
      let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
      let layer = fmt::layer().with_writer(writer).with_ansi(false).with_filter(file_filter);
      (Some(layer), Some(guard))
    },
    Err(_) => (None, None),
  };

  tracing_subscriber::registry().with(stderr).with(file).init();
  guard
}

/// Entry point for the docufetch CLI application
///
/// Parses arguments, sets up logging, loads the configuration and runs the requested command.
/// Failures are printed in red and end the process with a non-zero exit code.
#[tokio::main]
async fn main() {
  let cli = Cli::parse();
  let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
  let log_dir = config_path.parent().map(|dir| dir.join("logs")).unwrap_or_else(|| "logs".into());
  let _guard = setup_logging(cli.verbose, &log_dir);
  trace!("Using configuration at {}", config_path.display());

  let result = match Terminal::open(config_path, cli.accept_defaults) {
    Ok(mut terminal) => run(&mut terminal, cli.command).await,
    Err(e) => Err(e),
  };

  if let Err(e) = result {
    eprintln!("{} {e}", style(ERROR_PREFIX).red());
    std::process::exit(1);
  }
}

/// Dispatches `command`.
async fn run<I: UserInteraction>(interaction: &mut I, command: Commands) -> Result<()> {
  match command {
    Commands::Add(args) => add(interaction, args),
    Commands::Remove(args) => remove(interaction, args),
    Commands::Clear => clear(interaction),
    Commands::List => list(interaction),
    Commands::Sources { cmd } => sources(interaction, cmd),
    Commands::Api(args) => api(interaction, args),
    Commands::Interval(args) => interval(interaction, args),
    Commands::Preview => preview(interaction).await,
    Commands::Fetch(args) => fetch(interaction, args).await,
    Commands::Monitor => monitor(interaction).await,
    Commands::Retry => retry(interaction).await,
    Commands::Stats => stats(interaction),
    Commands::Open => open(interaction),
  }
}
