//! Full-screen TUI implementation for Glint.

pub mod effects;
pub mod events;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod textfield;
pub mod toast;
pub mod update;
pub mod views;

use std::io::{IsTerminal, stderr};

use anyhow::Result;
use glint_core::config::Config;
pub use runtime::TuiRuntime;

/// Runs the interactive search loop, optionally seeded with a query.
pub async fn run_interactive(config: &Config, initial_query: Option<String>) -> Result<()> {
    // Interactive mode requires a terminal to render the TUI
    if !stderr().is_terminal() {
        anyhow::bail!(
            "Interactive mode requires a terminal.\n\
             Use `glint search '...'` for non-interactive output."
        );
    }

    let mut runtime = TuiRuntime::new(config.clone(), initial_query)?;
    let result = runtime.run();

    terminal::restore_terminal()?;
    result
}
