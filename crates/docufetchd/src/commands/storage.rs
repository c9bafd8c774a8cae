//! Module for [`Commands::Stats`] and [`Commands::Open`].

use std::process::Command;

use super::*;

/// Function for the [`Commands::Stats`] in the CLI.
pub fn stats<I: UserInteraction>(interaction: &I) -> Result<()> {
  let manager = manager(interaction)?;
  interaction.reply(ResponseContent::Info(&format!(
    "Download directory: {}",
    manager.storage().root().display()
  )))?;
  interaction.reply(ResponseContent::Stats(&manager.stats()))
}

/// Function for the [`Commands::Open`] in the CLI.
pub fn open<I: UserInteraction>(interaction: &I) -> Result<()> {
  let dir = interaction.config().download_dir.clone();
  std::fs::create_dir_all(&dir)?;

  #[cfg(target_os = "macos")]
  let opener = "open";
  #[cfg(target_os = "windows")]
  let opener = "explorer";
  #[cfg(not(any(target_os = "macos", target_os = "windows")))]
  let opener = "xdg-open";

  trace!("Running {opener} {}", dir.display());
  match Command::new(opener).arg(&dir).spawn() {
    Ok(_) => interaction.reply(ResponseContent::Success(&format!("Opened {}", dir.display()))),
    Err(e) => {
      interaction.reply(ResponseContent::Warning(&format!("Could not run {opener}: {e}")))?;
      interaction.reply(ResponseContent::Info(&format!("Downloads are in {}", dir.display())))
    },
  }
}
