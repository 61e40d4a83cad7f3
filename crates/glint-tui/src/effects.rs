//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! They represent I/O and task spawning only (no direct UI mutations).
//!
//! This keeps the reducer pure: it only mutates state and returns effects,
//! never performs I/O or spawns tasks directly.

/// Effects returned by the reducer for the runtime to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    /// Quit the application.
    Quit,

    /// Run a search against the completion endpoint.
    StartSearch {
        seq: u64,
        query: String,
        max_results: usize,
    },

    /// Sign in with email and password.
    SignInEmail { email: String, password: String },

    /// Register a new email/password account.
    SignUpEmail { email: String, password: String },

    /// Open a URL in the system browser.
    OpenBrowser { url: String },

    /// Start the local OAuth callback listener.
    StartOauthCallback { port: u16, state: String },

    /// Exchange an OAuth code for a signed-in session.
    ExchangeOauthCode {
        code: String,
        verifier: String,
        redirect_uri: String,
    },

    /// Clear the session and the on-disk cache.
    SignOut,
}
