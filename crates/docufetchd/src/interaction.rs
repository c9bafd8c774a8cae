//! Everything the commands say to, and ask of, the user.

use std::collections::BTreeMap;

use console::Style;
use dialoguer::Confirm;

use super::*;

/// Prefix for information messages
pub static INFO_PREFIX: &str = "ℹ ";
/// Prefix for success messages
pub static SUCCESS_PREFIX: &str = "✓ ";
/// Prefix for warning messages
pub static WARNING_PREFIX: &str = "! ";
/// Prefix for error messages
pub static ERROR_PREFIX: &str = "✗ ";
/// Branch of a listing
pub static ITEM_PREFIX: &str = "├─";
/// Last branch of a listing
pub static LAST_ITEM_PREFIX: &str = "└─";

/// What a command wants to show.
#[derive(Debug)]
pub enum ResponseContent<'a> {
  /// Neutral status line
  Info(&'a str),
  /// Something completed
  Success(&'a str),
  /// Something needs attention but did not fail
  Warning(&'a str),
  /// The tracked keywords
  Keywords(&'a [String]),
  /// Every source with its switch and credential state
  Sources(&'a Config),
  /// Counts of a preview run
  Preview(&'a BTreeMap<Source, usize>),
  /// Documents of a fetch run
  Report(&'a Report),
  /// What is on disk
  Stats(&'a StorageStats),
}

/// The user's side of a command: configuration, prompts and output.
pub trait UserInteraction {
  /// The loaded configuration.
  fn config(&self) -> &Config;

  /// Replaces the configuration and writes it to disk.
  fn save_config(&mut self, config: Config) -> Result<()>;

  /// Asks a yes/no question.
  fn confirm(&self, message: &str) -> Result<bool>;

  /// Shows `content`.
  fn reply(&self, content: ResponseContent) -> Result<()>;
}

/// [`UserInteraction`] on a terminal, backed by a configuration file.
#[derive(Debug)]
pub struct Terminal {
  /// Where the configuration lives
  config_path:     PathBuf,
  /// The configuration as loaded or last saved
  config:          Config,
  /// Answer every prompt with its default
  accept_defaults: bool,
}

impl Terminal {
  /// Loads the configuration at `config_path`; a missing file means defaults.
  pub fn open(config_path: PathBuf, accept_defaults: bool) -> Result<Self> {
    let config = Config::load(&config_path)?;
    debug!("Loaded configuration from {}", config_path.display());
    Ok(Self { config_path, config, accept_defaults })
  }

  /// Prints a titled list, one entry per line.
  fn print_tree(title: &str, items: &[String]) {
    println!("{} {}", style(INFO_PREFIX).cyan(), style(title).bold());
    for (i, item) in items.iter().enumerate() {
      let branch = if i + 1 == items.len() { LAST_ITEM_PREFIX } else { ITEM_PREFIX };
      println!("  {} {item}", style(branch).dim());
    }
  }
}

impl UserInteraction for Terminal {
  fn config(&self) -> &Config { &self.config }

  fn save_config(&mut self, config: Config) -> Result<()> {
    config.save(&self.config_path)?;
    self.config = config;
    Ok(())
  }

  fn confirm(&self, message: &str) -> Result<bool> {
    if self.accept_defaults {
      return Ok(true);
    }
    Ok(Confirm::new().with_prompt(message).default(true).interact()?)
  }

  fn reply(&self, content: ResponseContent) -> Result<()> {
    match content {
      ResponseContent::Info(message) => println!("{} {message}", style(INFO_PREFIX).cyan()),
      ResponseContent::Success(message) => println!("{} {message}", style(SUCCESS_PREFIX).green()),
      ResponseContent::Warning(message) => println!("{} {message}", style(WARNING_PREFIX).yellow()),
      ResponseContent::Keywords(keywords) if keywords.is_empty() => println!(
        "{} No keywords configured. Add some with {}",
        style(WARNING_PREFIX).yellow(),
        style("docufetch add <keyword>").yellow()
      ),
      ResponseContent::Keywords(keywords) => Self::print_tree(
        &format!("{} keywords", keywords.len()),
        &keywords.iter().map(|keyword| style(keyword).yellow().to_string()).collect::<Vec<_>>(),
      ),
      ResponseContent::Sources(config) => {
        let rows: Vec<String> = Source::ALL
          .into_iter()
          .map(|source| {
            let (mark, look) = if config.is_enabled(source) {
              ("enabled ", Style::new().green())
            } else {
              ("disabled", Style::new().dim())
            };
            let credential = match (source.credential_key(), config.credential(source)) {
              (None, _) => String::new(),
              (Some(key), Some(_)) => format!("{} configured", style(key).cyan()),
              (Some(key), None) => format!("{} not set", style(key).yellow()),
            };
            format!("{:<17} {} {credential}", source.name(), look.apply_to(mark))
          })
          .collect();
        Self::print_tree("Sources", &rows);
      },
      ResponseContent::Preview(counts) => {
        let rows: Vec<String> = counts
          .iter()
          .map(|(source, count)| format!("{:<17} {}", source.name(), style(count).yellow()))
          .collect();
        let total: usize = counts.values().sum();
        Self::print_tree(&format!("{total} new documents available"), &rows);
      },
      ResponseContent::Report(report) => {
        let mut rows = Vec::new();
        for (source, documents) in report.iter() {
          rows.push(format!("{:<17} {}", source.name(), style(documents.len()).yellow()));
          for document in documents {
            let saved = match &document.local_path {
              Some(path) => style(path.display().to_string()).dim().to_string(),
              None => style("metadata only").dim().to_string(),
            };
            rows.push(format!("   {} {}  {saved}", style("•").dim(), document.title));
          }
        }
        Self::print_tree(&format!("Stored {} new documents", report.total()), &rows);
      },
      ResponseContent::Stats(stats) => {
        let mut rows = vec![format!(
          "artifacts  {} ({})",
          style(stats.artifacts).yellow(),
          docufetch::format::format_file_size(stats.total_bytes)
        )];
        rows.extend(
          stats.by_source.iter().map(|(source, count)| format!("{:<17} {count}", source.name())),
        );
        rows.extend(
          stats.by_keyword.iter().map(|(keyword, count)| format!("\"{keyword}\"  {count}")),
        );
        Self::print_tree(&format!("{} documents stored", stats.documents), &rows);
      },
    }
    Ok(())
  }
}
