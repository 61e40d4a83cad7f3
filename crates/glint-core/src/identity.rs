//! Identity delegate: a thin REST proxy over the hosted identity-toolkit
//! provider, plus the Google browser sign-in flow and the on-disk session
//! cache used for restoration.
//!
//! Provider failures carry a short message in the reply body; that message is
//! surfaced verbatim so the UI can show it as-is.

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::IdentityConfig;

const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com";
const DEFAULT_TOKEN_BASE_URL: &str = "https://securetoken.googleapis.com";

/// Token expiry safety margin (refresh this much before the real expiry).
const EXPIRY_BUFFER_MILLIS: u64 = 5 * 60 * 1000;

fn now_millis_u64() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|d| u64::try_from(d.as_millis()).ok())
        .unwrap_or(u64::MAX)
}

/// Opaque authenticated user handle returned by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub id_token: String,
    pub refresh_token: String,
    /// Expiry timestamp in milliseconds since epoch (with safety buffer).
    pub expires_at: u64,
}

impl AuthUser {
    /// Returns true if the ID token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        now_millis_u64() >= self.expires_at
    }
}

/// Resolved identity endpoint configuration.
#[derive(Debug, Clone)]
pub struct IdentityClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub token_base_url: String,
}

impl IdentityClientConfig {
    /// Resolves from the `[identity]` config table and environment.
    ///
    /// API key resolution order: config, then `GLINT_IDENTITY_API_KEY`.
    /// Base URLs are overridable via `GLINT_IDENTITY_BASE_URL` for tests.
    pub fn from_config(config: &IdentityConfig) -> Result<Self> {
        let api_key = match config.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => std::env::var("GLINT_IDENTITY_API_KEY").context(
                "No identity API key available. Set GLINT_IDENTITY_API_KEY or api_key in [identity].",
            )?,
        };

        let base_url = std::env::var("GLINT_IDENTITY_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| config.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let token_base_url = std::env::var("GLINT_IDENTITY_TOKEN_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| config.token_base_url.clone())
            .unwrap_or_else(|| {
                if base_url == DEFAULT_BASE_URL {
                    DEFAULT_TOKEN_BASE_URL.to_string()
                } else {
                    // Tests point both endpoints at one mock server.
                    base_url.clone()
                }
            });

        Ok(Self {
            api_key,
            base_url,
            token_base_url,
        })
    }
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    #[serde(rename = "localId")]
    local_id: String,
    email: Option<String>,
    #[serde(rename = "idToken")]
    id_token: String,
    #[serde(rename = "refreshToken")]
    refresh_token: String,
    #[serde(rename = "expiresIn")]
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    user_id: String,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    message: String,
}

/// Client for the identity provider's REST surface.
pub struct IdentityClient {
    config: IdentityClientConfig,
    http: reqwest::Client,
}

impl IdentityClient {
    pub fn new(config: IdentityClientConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Registers a new email/password account.
    pub async fn sign_up_with_email(&self, email: &str, password: &str) -> Result<AuthUser> {
        self.account_call(
            "accounts:signUp",
            &serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }),
        )
        .await
    }

    /// Signs in an existing email/password account.
    pub async fn sign_in_with_email(&self, email: &str, password: &str) -> Result<AuthUser> {
        self.account_call(
            "accounts:signInWithPassword",
            &serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }),
        )
        .await
    }

    /// Signs in with a Google ID token obtained from the browser flow.
    pub async fn sign_in_with_google(&self, google_id_token: &str) -> Result<AuthUser> {
        self.account_call(
            "accounts:signInWithIdp",
            &serde_json::json!({
                "postBody": format!("id_token={google_id_token}&providerId=google.com"),
                "requestUri": "http://localhost",
                "returnSecureToken": true,
                "returnIdpCredential": true,
            }),
        )
        .await
    }

    /// Exchanges a refresh token for a fresh ID token (session restoration).
    pub async fn refresh_id_token(&self, refresh_token: &str) -> Result<AuthUser> {
        let url = format!(
            "{}/v1/token?key={}",
            self.config.token_base_url, self.config.api_key
        );
        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .context("Failed to reach the identity provider")?;

        if !response.status().is_success() {
            anyhow::bail!(provider_error_message(response).await);
        }

        let body: RefreshResponse = response
            .json()
            .await
            .context("Failed to parse token refresh response")?;

        Ok(AuthUser {
            uid: body.user_id,
            email: None,
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            expires_at: expires_at_from(&body.expires_in),
        })
    }

    async fn account_call(&self, method: &str, body: &serde_json::Value) -> Result<AuthUser> {
        let url = format!(
            "{}/v1/{method}?key={}",
            self.config.base_url, self.config.api_key
        );
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .context("Failed to reach the identity provider")?;

        if !response.status().is_success() {
            anyhow::bail!(provider_error_message(response).await);
        }

        let body: AccountResponse = response
            .json()
            .await
            .context("Failed to parse identity provider response")?;

        Ok(AuthUser {
            uid: body.local_id,
            email: body.email,
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            expires_at: expires_at_from(&body.expires_in),
        })
    }
}

/// Extracts the provider's own error message, verbatim, from a failed reply.
async fn provider_error_message(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ProviderErrorBody>(&body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => format!("Identity provider returned HTTP {status}"),
    }
}

fn expires_at_from(expires_in_secs: &str) -> u64 {
    let secs: u64 = expires_in_secs.parse().unwrap_or(0);
    now_millis_u64() + secs * 1000 - EXPIRY_BUFFER_MILLIS.min(secs * 1000)
}

/// Google OAuth helpers for the browser sign-in flow.
pub mod google {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::time::Duration;

    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use sha2::{Digest, Sha256};

    use super::{Context, Deserialize, Result};

    const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
    const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
    /// Local OAuth callback path (port is dynamic).
    pub const LOCAL_CALLBACK_PATH: &str = "/oauth2callback";
    const SCOPES: &str = "openid email profile";

    /// How long the local callback listener waits for the browser.
    const CALLBACK_DEADLINE: Duration = Duration::from_secs(120);

    /// PKCE code verifier and challenge.
    pub struct Pkce {
        pub verifier: String,
        pub challenge: String,
    }

    /// Tokens returned by the Google token endpoint.
    #[derive(Debug, Clone)]
    pub struct GoogleTokens {
        pub id_token: String,
    }

    /// Generate PKCE code verifier and challenge.
    pub fn generate_pkce() -> Pkce {
        // Use two UUIDs (16 bytes each) to get 32 random bytes
        let uuid1 = uuid::Uuid::new_v4();
        let uuid2 = uuid::Uuid::new_v4();
        let mut verifier_bytes = [0u8; 32];
        verifier_bytes[..16].copy_from_slice(uuid1.as_bytes());
        verifier_bytes[16..].copy_from_slice(uuid2.as_bytes());
        let verifier = URL_SAFE_NO_PAD.encode(verifier_bytes);

        let mut hasher = Sha256::new();
        hasher.update(verifier.as_bytes());
        let challenge = URL_SAFE_NO_PAD.encode(hasher.finalize());

        Pkce {
            verifier,
            challenge,
        }
    }

    /// Builds the Google authorization URL.
    pub fn build_auth_url(client_id: &str, pkce: &Pkce, state: &str, redirect_uri: &str) -> String {
        let params = [
            ("client_id", client_id),
            ("response_type", "code"),
            ("redirect_uri", redirect_uri),
            ("scope", SCOPES),
            ("code_challenge", &pkce.challenge),
            ("code_challenge_method", "S256"),
            ("state", state),
        ];

        let query: String = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();

        format!("{AUTHORIZE_URL}?{query}")
    }

    /// Builds the redirect URI for a given localhost port.
    pub fn build_redirect_uri(port: u16) -> String {
        format!("http://localhost:{port}{LOCAL_CALLBACK_PATH}")
    }

    /// Generates a random high localhost port for OAuth callbacks.
    pub fn random_local_port() -> u16 {
        let id = uuid::Uuid::new_v4();
        let bytes = id.as_bytes();
        let raw = u16::from_le_bytes([bytes[0], bytes[1]]);
        49152 + (raw % 16384)
    }

    /// Exchanges an authorization code for Google tokens.
    ///
    /// # Errors
    /// Fails if the token endpoint is unreachable or rejects the code.
    pub async fn exchange_code(
        client_id: &str,
        client_secret: Option<&str>,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
    ) -> Result<GoogleTokens> {
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("client_id", client_id),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("code_verifier", verifier),
        ];
        if let Some(secret) = client_secret {
            form.push(("client_secret", secret));
        }

        let client = reqwest::Client::new();
        let response = client
            .post(TOKEN_URL)
            .form(&form)
            .send()
            .await
            .context("Failed to send token exchange request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Token exchange failed (HTTP {status}): {body}");
        }

        let token_data: TokenResponse = response
            .json()
            .await
            .context("Failed to parse token response")?;

        Ok(GoogleTokens {
            id_token: token_data.id_token,
        })
    }

    #[derive(Debug, Deserialize)]
    struct TokenResponse {
        id_token: String,
    }

    /// Blocks until the browser hits the local callback, or the deadline.
    ///
    /// Returns the authorization code when the request matches the callback
    /// path and the expected `state` parameter.
    pub fn wait_for_local_code(port: u16, expected_state: Option<&str>) -> Option<String> {
        let listener = match TcpListener::bind(format!("127.0.0.1:{port}")) {
            Ok(listener) => listener,
            Err(_) => return None,
        };
        let _ = listener.set_nonblocking(true);

        let (tx, rx) = std::sync::mpsc::channel::<Option<String>>();
        let expected_state = expected_state.map(|s| s.to_string());

        std::thread::spawn(move || {
            let start = std::time::Instant::now();
            loop {
                match listener.accept() {
                    Ok((mut stream, _)) => {
                        let mut buffer = [0u8; 2048];
                        let _ = stream.read(&mut buffer);
                        let request = String::from_utf8_lossy(&buffer);
                        let code = extract_code_from_request(&request, expected_state.as_deref());
                        let response = match code.is_some() {
                            true => callback_success_response(),
                            false => callback_error_response(),
                        };
                        let _ = stream.write_all(response.as_bytes());
                        let _ = tx.send(code);
                        break;
                    }
                    Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                        if start.elapsed() > CALLBACK_DEADLINE {
                            let _ = tx.send(None);
                            break;
                        }
                        std::thread::sleep(Duration::from_millis(100));
                    }
                    Err(_) => {
                        let _ = tx.send(None);
                        break;
                    }
                }
            }
        });

        rx.recv_timeout(CALLBACK_DEADLINE).ok().flatten()
    }

    fn extract_code_from_request(request: &str, expected_state: Option<&str>) -> Option<String> {
        let mut lines = request.lines();
        let request_line = lines.next()?;
        let mut parts = request_line.split_whitespace();
        let _method = parts.next()?;
        let path = parts.next()?;

        let url = url::Url::parse(&format!("http://localhost{path}")).ok()?;
        if url.path() != LOCAL_CALLBACK_PATH {
            return None;
        }
        if let Some(expected) = expected_state {
            let state = url
                .query_pairs()
                .find(|(k, _)| k == "state")
                .map(|(_, v)| v.to_string())?;
            if state != expected {
                return None;
            }
        }
        url.query_pairs()
            .find(|(k, _)| k == "code")
            .map(|(_, v)| v.to_string())
    }

    fn callback_success_response() -> String {
        let body =
            "<html><body><h3>Sign-in complete</h3><p>You can close this window.</p></body></html>";
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        )
    }

    fn callback_error_response() -> String {
        let body = "<html><body><h3>Sign-in failed</h3><p>Please return to the terminal and try again.</p></body></html>";
        format!(
            "HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        )
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn pkce_challenge_is_s256_of_verifier() {
            let pkce = generate_pkce();
            let mut hasher = Sha256::new();
            hasher.update(pkce.verifier.as_bytes());
            let expected = URL_SAFE_NO_PAD.encode(hasher.finalize());
            assert_eq!(pkce.challenge, expected);
        }

        #[test]
        fn auth_url_carries_state_and_challenge() {
            let pkce = generate_pkce();
            let url = build_auth_url("client-1", &pkce, "state-xyz", "http://localhost:50000/oauth2callback");
            assert!(url.starts_with(AUTHORIZE_URL));
            assert!(url.contains("state=state-xyz"));
            assert!(url.contains("code_challenge_method=S256"));
        }

        #[test]
        fn extract_code_checks_path_and_state() {
            let request = "GET /oauth2callback?code=abc&state=s1 HTTP/1.1\r\nHost: localhost\r\n\r\n";
            assert_eq!(
                extract_code_from_request(request, Some("s1")),
                Some("abc".to_string())
            );
            assert_eq!(extract_code_from_request(request, Some("other")), None);

            let wrong_path = "GET /elsewhere?code=abc HTTP/1.1\r\n\r\n";
            assert_eq!(extract_code_from_request(wrong_path, None), None);
        }

        #[test]
        fn random_port_is_in_dynamic_range() {
            for _ in 0..32 {
                let port = random_local_port();
                assert!(port >= 49152);
            }
        }
    }
}

/// On-disk session cache used for restoration across runs.
///
/// Stored in `${GLINT_HOME}/session.json` with restricted permissions (0600).
/// Tokens are never logged.
pub mod cache {
    use std::fs::{self, OpenOptions};
    use std::io::Write;
    use std::path::PathBuf;

    use anyhow::{Context, Result};

    use super::AuthUser;
    use crate::config::paths;

    /// Returns the path to the session cache file.
    pub fn cache_path() -> PathBuf {
        paths::session_path()
    }

    /// Loads the cached user, if any.
    pub fn load() -> Result<Option<AuthUser>> {
        let path = cache_path();
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read session cache from {}", path.display()))?;

        serde_json::from_str(&contents)
            .map(Some)
            .with_context(|| format!("Failed to parse session cache from {}", path.display()))
    }

    /// Saves the user to the cache with restricted permissions.
    pub fn save(user: &AuthUser) -> Result<()> {
        let path = cache_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(user).context("Failed to serialize session cache")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&path)
                .with_context(|| format!("Failed to open {} for writing", path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&path, contents)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }

        Ok(())
    }

    /// Removes the cached session, if present.
    pub fn clear() -> Result<()> {
        let path = cache_path();
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        Ok(())
    }
}
