//! UI event types.
//!
//! Events are the reducer's only input. Terminal input, async task results,
//! and session changes all arrive as `UiEvent`s through the runtime's inbox.

use glint_core::identity::AuthUser;
use glint_core::search::AiSearchResponse;
use glint_core::session::Session;

/// Events processed by the reducer.
#[derive(Debug)]
pub enum UiEvent {
    /// Periodic tick (spinner, toast sweep, intro reveal).
    Tick,

    /// Raw terminal input.
    Terminal(crossterm::event::Event),

    /// The session manager published a new session value.
    SessionChanged(Session),

    /// A search fetch completed. `seq` identifies which fetch; replies that
    /// do not match the in-flight sequence are dropped.
    SearchFinished {
        seq: u64,
        result: Result<AiSearchResponse, String>,
    },

    /// An email sign-in, sign-up, or OAuth exchange completed.
    LoginFinished { result: Result<AuthUser, String> },

    /// The local OAuth callback produced a code (or timed out).
    OauthCallback { code: Option<String> },

    /// Sign-out completed.
    SignedOut { result: Result<(), String> },
}
