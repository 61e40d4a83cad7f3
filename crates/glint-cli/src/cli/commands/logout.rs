//! Logout command handler.

use anyhow::Result;
use glint_core::identity::cache;

pub fn run() -> Result<()> {
    let had_session = cache::load().unwrap_or(None).is_some();
    cache::clear()?;
    if had_session {
        println!("Signed out.");
    } else {
        println!("No cached session.");
    }
    Ok(())
}
