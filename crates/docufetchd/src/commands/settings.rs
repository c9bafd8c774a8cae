//! Module for [`Commands::Api`] and [`Commands::Interval`].

use super::*;

/// Arguments of [`Commands::Api`]
#[derive(Args, Clone)]
pub struct ApiArgs {
  /// Source name, e.g. `core`, `crossref` or `unpaywall`
  pub source: String,

  /// API key, or contact email for the sources that identify callers by email
  pub credential: String,
}

/// Arguments of [`Commands::Interval`]
#[derive(Args, Clone)]
pub struct IntervalArgs {
  /// Hours between runs, at least 1
  pub hours: u64,
}

/// Function for the [`Commands::Api`] in the CLI.
pub fn api<I: UserInteraction>(interaction: &mut I, args: ApiArgs) -> Result<()> {
  let ApiArgs { source, credential } = args;
  if credential.trim().is_empty() {
    return Err(DocufetchdError::Usage("The credential must not be empty".into()));
  }
  let manager = manager(interaction)?.set_credential(&source, &credential)?;
  interaction.save_config(manager.config().clone())?;
  interaction.reply(ResponseContent::Success(&format!("Saved credential for {}", source.trim())))
}

/// Function for the [`Commands::Interval`] in the CLI.
pub fn interval<I: UserInteraction>(interaction: &mut I, args: IntervalArgs) -> Result<()> {
  let config = interaction.config().clone().with_update_interval(args.hours)?;
  interaction.save_config(config)?;
  interaction
    .reply(ResponseContent::Success(&format!("Monitor will run every {} hours", args.hours)))
}
