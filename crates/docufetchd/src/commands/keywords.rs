//! Module for the keyword commands: [`Commands::Add`], [`Commands::Remove`],
//! [`Commands::Clear`] and [`Commands::List`].

use super::*;

/// Arguments of [`Commands::Add`] and [`Commands::Remove`]
#[derive(Args, Clone)]
pub struct KeywordArgs {
  /// Keywords, quoted when they contain spaces
  /// Example: "graph neural networks"
  #[arg(required = true)]
  pub keywords: Vec<String>,
}

/// Function for the [`Commands::Add`] in the CLI.
pub fn add<I: UserInteraction>(interaction: &mut I, args: KeywordArgs) -> Result<()> {
  let before = interaction.config().keywords.len();
  let config = args
    .keywords
    .iter()
    .fold(interaction.config().clone(), |config, keyword| config.with_keyword(keyword.as_str()));
  let added = config.keywords.len() - before;
  interaction.save_config(config)?;

  if added == 0 {
    interaction.reply(ResponseContent::Info("Those keywords are already tracked"))?;
  } else {
    interaction.reply(ResponseContent::Success(&format!("Added {added} keywords")))?;
  }
  interaction.reply(ResponseContent::Keywords(&interaction.config().keywords))
}

/// Function for the [`Commands::Remove`] in the CLI.
pub fn remove<I: UserInteraction>(interaction: &mut I, args: KeywordArgs) -> Result<()> {
  for keyword in &args.keywords {
    if !interaction.config().keywords.iter().any(|tracked| tracked == keyword.trim()) {
      interaction.reply(ResponseContent::Warning(&format!("\"{keyword}\" is not tracked")))?;
    }
  }
  let before = interaction.config().keywords.len();
  let config = args
    .keywords
    .iter()
    .fold(interaction.config().clone(), |config, keyword| config.without_keyword(keyword));
  let removed = before - config.keywords.len();
  interaction.save_config(config)?;

  interaction.reply(ResponseContent::Success(&format!("Removed {removed} keywords")))?;
  interaction.reply(ResponseContent::Keywords(&interaction.config().keywords))
}

/// Function for the [`Commands::Clear`] in the CLI.
pub fn clear<I: UserInteraction>(interaction: &mut I) -> Result<()> {
  let count = interaction.config().keywords.len();
  if count == 0 {
    return interaction.reply(ResponseContent::Info("No keywords to clear"));
  }
  if !interaction.confirm(&format!("Stop tracking all {count} keywords?"))? {
    return interaction.reply(ResponseContent::Info("Operation cancelled"));
  }
  let config = interaction.config().clone().with_keywords(Vec::<String>::new());
  interaction.save_config(config)?;
  interaction.reply(ResponseContent::Success("All keywords cleared"))
}

/// Function for the [`Commands::List`] in the CLI.
pub fn list<I: UserInteraction>(interaction: &I) -> Result<()> {
  interaction.reply(ResponseContent::Keywords(&interaction.config().keywords))
}
