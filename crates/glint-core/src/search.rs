//! Generative search client.
//!
//! Sends a fixed system instruction plus the user's query to a hosted
//! chat-completions endpoint and parses the reply body as a JSON document of
//! search results. Malformed content is recovered locally (empty response);
//! transport failures are surfaced to the caller. One attempt per call, no
//! retry, no timeout override.

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::config::{Config, resolve_search_api_key, resolve_search_base_url};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const COMPLETIONS_PATH: &str = "/chat/completions";

const SYSTEM_PROMPT: &str = "\
You are an up-to-date AI assistant, witty but professional.
When you receive a query about a topic you must:

1. Provide a short introduction (a few lines) that explains the topic in a \
flowing, engaging way with a touch of humor.
2. Provide a list of relevant search results, where each result has:
   - title,
   - snippet (a short description plus a small witty remark),
   - url (only plausibly real, valid sites).
3. Return only and exclusively a JSON document with this structure:

{
  \"introduction\": \"Short, thorough explanation of the topic in a relaxed tone\",
  \"results\": [
    {
      \"title\": \"Clear, descriptive title\",
      \"snippet\": \"Explanation + remark\",
      \"url\": \"A URL that plausibly exists\"
    }
  ]
}

Guidelines:
- Add no text outside the JSON schema.
- If you cannot find recent information, briefly say why and give more
  general context instead.
- Do not invent unverified information.
- Make sure the links plausibly work (well-known, valid domains).";

/// A single synthesized search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

/// One completed search: an introduction paragraph plus an ordered result
/// list. `results` is always present, even on recovered parse failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiSearchResponse {
    #[serde(default)]
    pub introduction: String,
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

/// Search endpoint configuration, resolved from [`Config`] and environment.
#[derive(Debug, Clone)]
pub struct SearchClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

impl SearchClientConfig {
    /// Resolves the client config from the app config and environment.
    ///
    /// Authentication resolution order:
    /// 1. `api_key` in the `[search]` config table
    /// 2. `OPENAI_API_KEY` environment variable
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = resolve_search_api_key(config.search.api_key.as_deref())?;
        let base_url =
            resolve_search_base_url(config.search.base_url.as_deref(), DEFAULT_BASE_URL)?;
        Ok(Self {
            api_key,
            base_url,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

/// Wire format for the chat-completions request.
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

/// Client for the generative search endpoint.
pub struct SearchClient {
    config: SearchClientConfig,
    http: reqwest::Client,
}

impl SearchClient {
    pub fn new(config: SearchClientConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Runs one search: a single completion round trip, then local parsing.
    ///
    /// # Errors
    /// Fails on transport errors (unreachable endpoint, non-success status,
    /// reply without content). Malformed content does not fail; it yields an
    /// empty response instead.
    pub async fn search(&self, query: &str, max_results: usize) -> Result<AiSearchResponse> {
        let user_prompt = format!(
            "Generate an introduction and {max_results} search results for the query: \"{query}\""
        );

        let request = CompletionRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            temperature: self.config.temperature,
        };

        let url = format!("{}{COMPLETIONS_PATH}", self.config.base_url);
        let response = self
            .http
            .post(&url)
            .headers(build_headers(&self.config.api_key)?)
            .json(&request)
            .send()
            .await
            .context("Failed to reach the search endpoint")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Search endpoint returned HTTP {status}: {body}");
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .context("Failed to read the search endpoint reply")?;

        let content = completion
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .context("Search endpoint reply contained no content")?;

        Ok(parse_payload(content))
    }
}

/// Parses the model's textual reply into a search response.
///
/// Recovery rules (never propagates an error):
/// - non-JSON content -> empty introduction, empty results
/// - missing/non-array `results` -> keep the introduction, empty results
/// - result entries whose `url` is not an absolute http/https URL are dropped
pub fn parse_payload(content: &str) -> AiSearchResponse {
    let value: serde_json::Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, "search reply was not valid JSON");
            return AiSearchResponse::default();
        }
    };

    let introduction = value
        .get("introduction")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let Some(entries) = value.get("results").and_then(|v| v.as_array()) else {
        return AiSearchResponse {
            introduction,
            results: Vec::new(),
        };
    };

    let results = entries
        .iter()
        .filter_map(|entry| serde_json::from_value::<SearchResult>(entry.clone()).ok())
        .filter(|result| {
            let valid = is_valid_result_url(&result.url);
            if !valid {
                tracing::debug!(url = %result.url, "dropping result with invalid url");
            }
            valid
        })
        .collect();

    AiSearchResponse {
        introduction,
        results,
    }
}

fn is_valid_result_url(raw: &str) -> bool {
    match url::Url::parse(raw) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

fn build_headers(api_key: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        "Authorization",
        HeaderValue::from_str(&format!("Bearer {api_key}"))
            .context("Search API key contains characters not allowed in a header")?,
    );
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_payload_parses() {
        let content = r#"{
            "introduction": "Rome is sunny.",
            "results": [
                {"title": "Weather Rome", "snippet": "Sun!", "url": "https://weather.example.com/rome"},
                {"title": "Forecast", "snippet": "More sun", "url": "http://forecast.example.com"}
            ]
        }"#;

        let parsed = parse_payload(content);
        assert_eq!(parsed.introduction, "Rome is sunny.");
        assert_eq!(parsed.results.len(), 2);
        assert_eq!(parsed.results[0].title, "Weather Rome");
    }

    #[test]
    fn non_json_content_recovers_to_empty() {
        let parsed = parse_payload("Sorry, I can't answer that in JSON today.");
        assert_eq!(parsed.introduction, "");
        assert!(parsed.results.is_empty());
    }

    #[test]
    fn non_array_results_keeps_introduction() {
        let parsed = parse_payload(r#"{"introduction": "hi", "results": "nope"}"#);
        assert_eq!(parsed.introduction, "hi");
        assert!(parsed.results.is_empty());
    }

    #[test]
    fn invalid_url_entry_is_dropped_siblings_kept() {
        let content = r#"{
            "introduction": "x",
            "results": [
                {"title": "bad", "snippet": "", "url": "not-a-url"},
                {"title": "good", "snippet": "", "url": "https://example.com"},
                {"title": "ftp", "snippet": "", "url": "ftp://example.com/file"}
            ]
        }"#;

        let parsed = parse_payload(content);
        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.results[0].title, "good");
    }

    #[test]
    fn control_characters_in_api_key_are_rejected() {
        let err = build_headers("sk-bad\nkey").unwrap_err();
        assert!(err.to_string().contains("Search API key"));

        let headers = build_headers("sk-good-key").unwrap();
        assert_eq!(
            headers.get("Authorization").unwrap(),
            "Bearer sk-good-key"
        );
    }

    #[test]
    fn missing_fields_in_entry_drop_that_entry() {
        let content = r#"{
            "introduction": "x",
            "results": [
                {"title": "no url or snippet"},
                {"title": "ok", "snippet": "s", "url": "https://example.com"}
            ]
        }"#;

        let parsed = parse_payload(content);
        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.results[0].title, "ok");
    }
}
