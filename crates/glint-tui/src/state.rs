//! Application state composition.
//!
//! The top-level state hierarchy for the TUI:
//!
//! ```text
//! AppState
//! ├── view: View             (which screen is active)
//! ├── query: TextField       (entry screen query box)
//! ├── results: ResultsState  (last search, phase, pagination)
//! ├── login: LoginState      (sign-in form / browser flow)
//! ├── session: Session       (auth state, mirrored from the session manager)
//! └── toasts: Toasts         (transient notifications)
//! ```
//!
//! The reducer in `update` is the only place that mutates this.

use std::time::Instant;

use glint_core::paging::{self, Pagination};
use glint_core::search::AiSearchResponse;
use glint_core::session::Session;

use crate::textfield::TextField;
use crate::toast::Toasts;

/// How long the introduction renders dimmed before the full reveal.
pub const INTRO_REVEAL_DELAY: std::time::Duration = std::time::Duration::from_millis(100);

/// Which screen is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Entry,
    Results,
    Login,
}

/// Search lifecycle for the results screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPhase {
    /// No search submitted yet.
    Idle,
    /// A query was submitted while session restoration was still running;
    /// the fetch starts once the session resolves.
    WaitingForAuth,
    /// A fetch is in flight. Only a completion carrying this sequence number
    /// is accepted; anything else is a stale reply from a superseded fetch.
    Fetching { seq: u64 },
    Loaded,
    Failed { message: String },
}

/// State backing the results screen.
#[derive(Debug)]
pub struct ResultsState {
    pub query: String,
    pub phase: SearchPhase,
    pub response: AiSearchResponse,
    /// 1-based requested page; clamped against the visible set at render time.
    pub page: usize,
    /// When the current response arrived (drives the intro reveal).
    pub loaded_at: Option<Instant>,
    /// Monotonic fetch counter; bumped on every new fetch.
    pub seq: u64,
}

impl ResultsState {
    pub fn new() -> Self {
        Self {
            query: String::new(),
            phase: SearchPhase::Idle,
            response: AiSearchResponse::default(),
            page: 1,
            loaded_at: None,
            seq: 0,
        }
    }

    /// Results visible under the current session's gate.
    pub fn visible<'a>(&'a self, session: &Session) -> &'a [glint_core::search::SearchResult] {
        paging::gate(&self.response.results, session.signed_in())
    }

    /// Pagination over the visible set, with the requested page clamped.
    pub fn pagination(&self, session: &Session) -> Pagination {
        Pagination::compute(self.visible(session).len(), self.page)
    }

    /// True once the intro reveal delay has elapsed.
    pub fn intro_revealed(&self) -> bool {
        self.loaded_at
            .is_some_and(|at| at.elapsed() >= INTRO_REVEAL_DELAY)
    }
}

impl Default for ResultsState {
    fn default() -> Self {
        Self::new()
    }
}

/// Which login form input has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
}

/// Sign in vs. register with the same form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMode {
    SignIn,
    SignUp,
}

/// State backing the login screen.
#[derive(Debug)]
pub enum LoginState {
    /// Email/password form.
    Form {
        mode: LoginMode,
        email: TextField,
        password: TextField,
        focus: LoginField,
        error: Option<String>,
    },
    /// Waiting on an email sign-in/sign-up round trip.
    Submitting { mode: LoginMode, email: String },
    /// Waiting on the browser to hit the local OAuth callback.
    AwaitingBrowser {
        url: String,
        verifier: String,
        redirect_uri: String,
    },
    /// Exchanging the OAuth code for a session.
    Exchanging,
}

impl LoginState {
    pub fn form() -> Self {
        LoginState::Form {
            mode: LoginMode::SignIn,
            email: TextField::new(),
            password: TextField::new(),
            focus: LoginField::Email,
            error: None,
        }
    }

    /// Reopens the form after a failed attempt, keeping the email.
    pub fn reopen(mode: LoginMode, email: &str, error: String) -> Self {
        LoginState::Form {
            mode,
            email: TextField::with_text(email),
            password: TextField::new(),
            focus: LoginField::Password,
            error: Some(error),
        }
    }
}

/// Combined application state for the TUI.
pub struct AppState {
    pub view: View,
    pub query: TextField,
    pub results: ResultsState,
    pub login: LoginState,
    pub session: Session,
    pub toasts: Toasts,
    pub should_quit: bool,
    pub spinner_frame: u8,
    /// Where to go back to when the login screen closes.
    pub login_return: View,
    /// OAuth client for the Google browser flow, when configured.
    pub google_client_id: Option<String>,
}

impl AppState {
    pub fn new(initial_query: Option<String>) -> Self {
        Self {
            view: View::Entry,
            query: initial_query.map_or_else(TextField::new, TextField::with_text),
            results: ResultsState::new(),
            login: LoginState::form(),
            session: Session {
                user: None,
                loading: true,
            },
            toasts: Toasts::default(),
            should_quit: false,
            spinner_frame: 0,
            login_return: View::Entry,
            google_client_id: None,
        }
    }
}
