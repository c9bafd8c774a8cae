//! Module for the [`Commands::Sources`] subcommands.

use super::*;

/// Ways to look at or change the enabled sources
#[derive(Subcommand, Clone)]
pub enum SourcesCommands {
  /// Show every source, whether it is enabled and whether its credential is set
  List,

  /// Enable a source
  Enable {
    /// Source name, e.g. `crossref` or `semantic_scholar`
    name: String,
  },

  /// Disable a source
  Disable {
    /// Source name, e.g. `scholar`
    name: String,
  },
}

/// Function for the [`Commands::Sources`] in the CLI.
pub fn sources<I: UserInteraction>(interaction: &mut I, cmd: SourcesCommands) -> Result<()> {
  match cmd {
    SourcesCommands::List => interaction.reply(ResponseContent::Sources(interaction.config())),
    SourcesCommands::Enable { name } => {
      let manager = manager(interaction)?.enable_source(&name)?;
      interaction.save_config(manager.config().clone())?;
      let source = name.parse::<Source>()?;
      interaction.reply(ResponseContent::Success(&format!("Enabled {source}")))?;
      if let (Some(key), None) = (source.credential_key(), manager.config().credential(source)) {
        let hint = format!(
          "{source} works better with a credential: docufetch api {source} <{key}>{}",
          source.credential_env().map(|var| format!(" (or set ${var})")).unwrap_or_default()
        );
        interaction.reply(ResponseContent::Warning(&hint))?;
      }
      Ok(())
    },
    SourcesCommands::Disable { name } => {
      let manager = manager(interaction)?.disable_source(&name)?;
      interaction.save_config(manager.config().clone())?;
      interaction.reply(ResponseContent::Success(&format!("Disabled {}", name.trim())))
    },
  }
}
