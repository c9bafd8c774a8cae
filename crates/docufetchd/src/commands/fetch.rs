//! Module for the commands that run the pipeline: [`Commands::Preview`], [`Commands::Fetch`],
//! [`Commands::Monitor`] and [`Commands::Retry`].

use std::time::Duration;

use super::*;

/// Arguments of [`Commands::Fetch`]
#[derive(Args, Clone)]
pub struct FetchArgs {
  /// Store without asking for confirmation
  #[arg(long, short)]
  pub yes: bool,
}

/// The configured keywords, or `None` after telling the user there are none.
fn keywords<I: UserInteraction>(interaction: &I) -> Result<Option<Vec<String>>> {
  let keywords = interaction.config().keywords.clone();
  if keywords.is_empty() {
    interaction.reply(ResponseContent::Keywords(&keywords))?;
    return Ok(None);
  }
  Ok(Some(keywords))
}

/// Runs a preview and shows the counts. Returns the previewed documents for a later commit.
async fn preview_report<I: UserInteraction>(
  interaction: &I,
  manager: &Manager,
  keywords: &[String],
) -> Result<Report> {
  interaction.reply(ResponseContent::Info(&format!(
    "Searching {} sources for {} keywords...",
    manager.enabled_sources().len(),
    keywords.len()
  )))?;
  let report = manager.preview_report(keywords).await;
  interaction.reply(ResponseContent::Preview(&report.counts()))?;
  Ok(report)
}

/// Function for the [`Commands::Preview`] in the CLI.
///
/// Documents counted here are remembered as seen: a later `fetch` will not offer them again.
pub async fn preview<I: UserInteraction>(interaction: &I) -> Result<()> {
  let Some(keywords) = keywords(interaction)? else { return Ok(()) };
  let manager = manager(interaction)?;
  let report = preview_report(interaction, &manager, &keywords).await?;
  if !report.is_empty() {
    interaction.reply(ResponseContent::Warning(
      "These documents are now marked as seen and will not be offered again. Use `docufetch \
       fetch` to review and store new documents in one go",
    ))?;
  }
  Ok(())
}

/// Function for the [`Commands::Fetch`] in the CLI.
///
/// Stores exactly the documents the preview found, so nothing is fetched twice.
pub async fn fetch<I: UserInteraction>(interaction: &I, args: FetchArgs) -> Result<()> {
  let Some(keywords) = keywords(interaction)? else { return Ok(()) };
  let manager = manager(interaction)?;
  let report = preview_report(interaction, &manager, &keywords).await?;
  if report.is_empty() {
    return interaction.reply(ResponseContent::Success("Everything is up to date"));
  }
  if !args.yes && !interaction.confirm(&format!("Download {} new documents?", report.total()))? {
    return interaction.reply(ResponseContent::Warning(
      "Nothing stored. These documents are marked as seen and will not be offered again",
    ));
  }
  let stored = manager.persist(report).await;
  interaction.reply(ResponseContent::Report(&stored))
}

/// Time between two monitor runs, never shorter than an hour.
fn monitor_period(hours: u64) -> Duration {
  Duration::from_secs(hours.max(1).saturating_mul(60 * 60))
}

/// Function for the [`Commands::Monitor`] in the CLI.
///
/// Runs a fetch immediately and then every `update_interval` hours. Ctrl-C stops the loop
/// between runs.
pub async fn monitor<I: UserInteraction>(interaction: &I) -> Result<()> {
  let Some(keywords) = keywords(interaction)? else { return Ok(()) };
  let manager = manager(interaction)?;
  let period = monitor_period(manager.config().update_interval);
  interaction.reply(ResponseContent::Info(&format!(
    "Monitoring {} keywords every {} hours, press Ctrl-C to stop",
    keywords.len(),
    manager.config().update_interval
  )))?;

  loop {
    let report = manager.fetch(keywords.as_slice()).await;
    interaction.reply(ResponseContent::Report(&report))?;
    debug!("Next run in {}s", period.as_secs());
    tokio::select! {
      _ = tokio::time::sleep(period) => {},
      _ = tokio::signal::ctrl_c() => {
        return interaction.reply(ResponseContent::Info("Monitoring stopped"));
      },
    }
  }
}

/// Function for the [`Commands::Retry`] in the CLI.
pub async fn retry<I: UserInteraction>(interaction: &I) -> Result<()> {
  let manager = manager(interaction)?;
  let missing = manager.storage().missing_artifacts().len();
  if missing == 0 {
    return interaction.reply(ResponseContent::Success("No missing artifacts"));
  }
  interaction.reply(ResponseContent::Info(&format!("Retrying {missing} missing artifacts...")))?;
  let repaired = manager.retry_missing_artifacts().await;
  let message = format!("Downloaded {} of {missing} missing artifacts", repaired.len());
  if repaired.len() == missing {
    interaction.reply(ResponseContent::Success(&message))
  } else {
    interaction.reply(ResponseContent::Warning(&message))
  }
}
