//! TUI runtime - owns terminal, runs event loop, executes effects.
//!
//! This is the "Elm runtime" boundary: all side effects happen here.
//! The reducer stays pure and produces effects; this module executes them.
//!
//! ## Inbox Pattern
//!
//! Async results are collected through an "inbox" channel:
//! - Effect tasks send `UiEvent`s to `inbox_tx` when they finish
//! - The runtime drains `inbox_rx` each frame
//! - Session changes are forwarded into the inbox by a watch subscriber

use std::io::Stdout;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::event;
use glint_core::config::Config;
use glint_core::identity::{IdentityClient, IdentityClientConfig, google};
use glint_core::search::{SearchClient, SearchClientConfig};
use glint_core::session::SessionManager;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::{AppState, LoginState, SearchPhase};
use crate::{render, terminal, update};

/// Tick interval while something is animating or in flight.
pub const FRAME_DURATION: std::time::Duration = std::time::Duration::from_millis(16);

/// Poll duration when idle. Longer timeout reduces CPU usage.
pub const IDLE_POLL_DURATION: std::time::Duration = std::time::Duration::from_millis(100);

type UiEventSender = mpsc::UnboundedSender<UiEvent>;
type UiEventReceiver = mpsc::UnboundedReceiver<UiEvent>;

/// Full-screen TUI runtime.
///
/// Owns the terminal and state. Runs the event loop and executes effects.
/// Terminal state is restored on drop, panic, and Ctrl+C.
pub struct TuiRuntime {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    pub state: AppState,
    inbox_tx: UiEventSender,
    inbox_rx: UiEventReceiver,
    last_tick: std::time::Instant,
    search: Arc<SearchClient>,
    /// Absent when no identity key is configured; login then fails with a
    /// message instead of a broken flow.
    identity: Option<Arc<IdentityClient>>,
    session: Arc<SessionManager>,
    google_client_secret: Option<String>,
}

impl TuiRuntime {
    /// Creates a new TUI runtime and kicks off session restoration.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: Config, initial_query: Option<String>) -> Result<Self> {
        // Set up panic hook BEFORE entering alternate screen
        terminal::install_panic_hook();

        let search = Arc::new(SearchClient::new(SearchClientConfig::from_config(&config)?));

        let identity = match IdentityClientConfig::from_config(&config.identity) {
            Ok(identity_config) => Some(Arc::new(IdentityClient::new(identity_config))),
            Err(err) => {
                debug!("identity disabled: {err:#}");
                None
            }
        };

        let terminal = terminal::setup_terminal().context("Failed to setup terminal")?;

        let mut state = AppState::new(initial_query);
        state.google_client_id = config.identity.google_client_id.clone();

        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let session = Arc::new(SessionManager::new());

        // Forward session broadcasts into the inbox
        let mut session_rx = session.subscribe();
        let forward_tx = inbox_tx.clone();
        tokio::spawn(async move {
            while session_rx.changed().await.is_ok() {
                let snapshot = session_rx.borrow_and_update().clone();
                if forward_tx.send(UiEvent::SessionChanged(snapshot)).is_err() {
                    break;
                }
            }
        });

        // Restore a cached session in the background
        {
            let session = Arc::clone(&session);
            let identity = identity.clone();
            tokio::spawn(async move {
                match identity {
                    Some(client) => session.restore(&client).await,
                    None => session.resolve_anonymous(),
                }
            });
        }

        Ok(Self {
            terminal,
            state,
            inbox_tx,
            inbox_rx,
            last_tick: std::time::Instant::now(),
            search,
            identity,
            session,
            google_client_secret: config.identity.google_client_secret.clone(),
        })
    }

    /// Runs the main event loop.
    pub fn run(&mut self) -> Result<()> {
        // A seeded query submits immediately
        if !self.state.query.is_empty() {
            self.dispatch_event(UiEvent::Terminal(event::Event::Key(
                event::KeyEvent::new(event::KeyCode::Enter, event::KeyModifiers::NONE),
            )));
        }

        let mut dirty = true; // Start dirty to ensure initial render

        while !self.state.should_quit {
            let events = self.collect_events()?;

            for event in events {
                // Only Tick triggers render - this caps frame rate at tick cadence
                let marks_dirty = matches!(&event, UiEvent::Tick);
                let effects = update::update(&mut self.state, event);
                if marks_dirty {
                    dirty = true;
                }
                self.execute_effects(effects);
            }

            if dirty {
                self.terminal.draw(|frame| {
                    render::render(&self.state, frame);
                })?;
                dirty = false;
            }
        }

        Ok(())
    }

    // ========================================================================
    // Event Collection
    // ========================================================================

    /// Collects events from the terminal and the inbox.
    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        let tick_interval = if self.needs_fast_poll() {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };

        // Drain inbox - all async results arrive here
        while let Ok(ev) = self.inbox_rx.try_recv() {
            events.push(ev);
        }

        // Poll terminal events:
        // - If we already have events, non-blocking poll (don't delay them)
        // - Otherwise block until the next tick is due
        let time_until_tick = tick_interval.saturating_sub(self.last_tick.elapsed());
        let poll_duration = if events.is_empty() {
            time_until_tick
        } else {
            std::time::Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            // Drain any remaining buffered events (non-blocking)
            while event::poll(std::time::Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= tick_interval {
            events.push(UiEvent::Tick);
            self.last_tick = std::time::Instant::now();
        }

        Ok(events)
    }

    /// Fast ticks while spinners run, toasts age out, or the intro reveal
    /// timer is pending.
    fn needs_fast_poll(&self) -> bool {
        let searching = matches!(
            self.state.results.phase,
            SearchPhase::Fetching { .. } | SearchPhase::WaitingForAuth
        );
        let logging_in = matches!(
            self.state.login,
            LoginState::Submitting { .. } | LoginState::Exchanging
        );
        let intro_pending = matches!(self.state.results.phase, SearchPhase::Loaded)
            && !self.state.results.intro_revealed();

        searching || logging_in || intro_pending || !self.state.toasts.is_empty()
    }

    // ========================================================================
    // Effect Dispatch
    // ========================================================================

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    fn dispatch_event(&mut self, event: UiEvent) {
        let effects = update::update(&mut self.state, event);
        if !effects.is_empty() {
            self.execute_effects(effects);
        }
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        match effect {
            UiEffect::Quit => {
                self.state.should_quit = true;
            }

            UiEffect::StartSearch {
                seq,
                query,
                max_results,
            } => {
                let client = Arc::clone(&self.search);
                self.spawn_effect(async move {
                    let result = client
                        .search(&query, max_results)
                        .await
                        .map_err(|err| format!("{err:#}"));
                    UiEvent::SearchFinished { seq, result }
                });
            }

            UiEffect::SignInEmail { email, password } => {
                self.spawn_login(move |client| async move {
                    client.sign_in_with_email(&email, &password).await
                });
            }

            UiEffect::SignUpEmail { email, password } => {
                self.spawn_login(move |client| async move {
                    client.sign_up_with_email(&email, &password).await
                });
            }

            UiEffect::OpenBrowser { url } => {
                if let Err(err) = open::that(&url) {
                    warn!("failed to open browser: {err}");
                    self.state
                        .toasts
                        .error("Could not open the browser; copy the URL shown");
                }
            }

            UiEffect::StartOauthCallback { port, state } => {
                let tx = self.inbox_tx.clone();
                tokio::task::spawn_blocking(move || {
                    let code = google::wait_for_local_code(port, Some(&state));
                    let _ = tx.send(UiEvent::OauthCallback { code });
                });
            }

            UiEffect::ExchangeOauthCode {
                code,
                verifier,
                redirect_uri,
            } => {
                let Some(identity) = self.identity.clone() else {
                    self.login_unavailable();
                    return;
                };
                let Some(client_id) = self.state.google_client_id.clone() else {
                    self.login_unavailable();
                    return;
                };
                let client_secret = self.google_client_secret.clone();
                let session = Arc::clone(&self.session);
                self.spawn_effect(async move {
                    let result = async {
                        let tokens = google::exchange_code(
                            &client_id,
                            client_secret.as_deref(),
                            &code,
                            &verifier,
                            &redirect_uri,
                        )
                        .await?;
                        identity.sign_in_with_google(&tokens.id_token).await
                    }
                    .await;

                    match result {
                        Ok(user) => {
                            session.set_user(user.clone());
                            UiEvent::LoginFinished { result: Ok(user) }
                        }
                        Err(err) => UiEvent::LoginFinished {
                            result: Err(format!("{err:#}")),
                        },
                    }
                });
            }

            UiEffect::SignOut => {
                let result = self.session.sign_out().map_err(|err| format!("{err:#}"));
                self.dispatch_event(UiEvent::SignedOut { result });
            }
        }
    }

    /// Runs an email auth round trip and installs the user on success.
    fn spawn_login<F, Fut>(&mut self, f: F)
    where
        F: FnOnce(Arc<IdentityClient>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<glint_core::identity::AuthUser>> + Send + 'static,
    {
        let Some(identity) = self.identity.clone() else {
            self.login_unavailable();
            return;
        };
        let session = Arc::clone(&self.session);
        self.spawn_effect(async move {
            match f(identity).await {
                Ok(user) => {
                    session.set_user(user.clone());
                    UiEvent::LoginFinished { result: Ok(user) }
                }
                Err(err) => UiEvent::LoginFinished {
                    result: Err(format!("{err:#}")),
                },
            }
        });
    }

    fn login_unavailable(&mut self) {
        self.dispatch_event(UiEvent::LoginFinished {
            result: Err("Sign-in is not configured; set an identity api_key".to_string()),
        });
    }

    /// Spawns an async effect, sending the result event to the inbox.
    fn spawn_effect<Fut>(&self, fut: Fut)
    where
        Fut: Future<Output = UiEvent> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        tokio::spawn(async move {
            let event = fut.await;
            let _ = tx.send(event);
        });
    }
}

impl Drop for TuiRuntime {
    fn drop(&mut self) {
        let _ = terminal::restore_terminal();
    }
}
