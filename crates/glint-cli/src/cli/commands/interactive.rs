//! Interactive (TUI) command handler.

use anyhow::Result;
use glint_core::config::Config;

pub async fn run(config: &Config, query: Option<String>) -> Result<()> {
    let query = query.map(|q| q.trim().to_string()).filter(|q| !q.is_empty());
    glint_tui::run_interactive(config, query).await
}
