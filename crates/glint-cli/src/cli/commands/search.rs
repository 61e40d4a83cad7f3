//! Search command handler (non-interactive).
//!
//! Runs one fetch and prints the gated result list. The gate uses the cached
//! session: a signed-in cache sees up to 50 results, anonymous sees 3.

use anyhow::{Context, Result};
use glint_core::config::Config;
use glint_core::identity::cache;
use glint_core::paging;
use glint_core::search::{AiSearchResponse, SearchClient, SearchClientConfig};

pub async fn run(config: &Config, query: &str, max: usize, json: bool) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        anyhow::bail!("Query must not be empty");
    }

    let signed_in = cache::load().unwrap_or(None).is_some();
    let max = max.min(paging::requested_results(signed_in));

    let client = SearchClient::new(SearchClientConfig::from_config(config)?);
    let response = client
        .search(query, max)
        .await
        .with_context(|| format!("search for '{query}'"))?;

    let gated = AiSearchResponse {
        introduction: response.introduction,
        results: paging::gate(&response.results, signed_in).to_vec(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&gated)?);
        return Ok(());
    }

    if !gated.introduction.is_empty() {
        println!("{}", gated.introduction);
        println!();
    }

    if gated.results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in gated.results.iter().enumerate() {
        println!("{}. {}", i + 1, result.title);
        println!("   {}", result.url);
        println!("   {}", result.snippet);
        if i + 1 < gated.results.len() {
            println!();
        }
    }

    if !signed_in && gated.results.len() == paging::MAX_FREE_RESULTS {
        println!();
        println!("Sign in to see more results.");
    }

    Ok(())
}
