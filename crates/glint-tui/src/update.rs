//! TUI reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.
//!
//! This is the single source of truth for how events modify state.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use glint_core::identity::google;
use glint_core::paging;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::{AppState, LoginField, LoginMode, LoginState, SearchPhase, View};

/// The main reducer function.
///
/// Takes the current state and an event, mutates state, and returns effects
/// for the runtime to execute.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => {
            app.spinner_frame = app.spinner_frame.wrapping_add(1);
            app.toasts.sweep();
            vec![]
        }
        UiEvent::Terminal(term_event) => handle_terminal_event(app, term_event),
        UiEvent::SessionChanged(session) => handle_session_changed(app, session),
        UiEvent::SearchFinished { seq, result } => handle_search_finished(app, seq, result),
        UiEvent::LoginFinished { result } => handle_login_finished(app, result),
        UiEvent::OauthCallback { code } => handle_oauth_callback(app, code),
        UiEvent::SignedOut { result } => {
            match result {
                Ok(()) => app.toasts.success("Signed out"),
                Err(message) => app.toasts.error(message),
            }
            vec![]
        }
    }
}

fn handle_terminal_event(app: &mut AppState, event: Event) -> Vec<UiEffect> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(app, key),
        Event::Paste(text) => {
            handle_paste(app, &text);
            vec![]
        }
        _ => vec![],
    }
}

fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    // Ctrl+C quits from anywhere
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return vec![UiEffect::Quit];
    }

    match app.view {
        View::Entry => handle_entry_key(app, key),
        View::Results => handle_results_key(app, key),
        View::Login => handle_login_key(app, key),
    }
}

fn handle_paste(app: &mut AppState, text: &str) {
    // Strip control chars so a pasted newline does not submit
    let clean: String = text.chars().filter(|c| !c.is_control()).collect();
    match app.view {
        View::Entry => app.query.insert_str(&clean),
        View::Login => {
            if let LoginState::Form {
                email,
                password,
                focus,
                ..
            } = &mut app.login
            {
                match focus {
                    LoginField::Email => email.insert_str(&clean),
                    LoginField::Password => password.insert_str(&clean),
                }
            }
        }
        View::Results => {}
    }
}

// ============================================================================
// Entry screen
// ============================================================================

fn handle_entry_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    match key.code {
        KeyCode::Enter => submit_search(app),
        KeyCode::Esc => {
            app.should_quit = true;
            vec![UiEffect::Quit]
        }
        KeyCode::Backspace => {
            app.query.backspace();
            vec![]
        }
        KeyCode::Delete => {
            app.query.delete();
            vec![]
        }
        KeyCode::Left => {
            app.query.move_left();
            vec![]
        }
        KeyCode::Right => {
            app.query.move_right();
            vec![]
        }
        KeyCode::Home => {
            app.query.move_home();
            vec![]
        }
        KeyCode::End => {
            app.query.move_end();
            vec![]
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.query.clear();
            vec![]
        }
        KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            open_login(app);
            vec![]
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.query.insert(ch);
            vec![]
        }
        _ => vec![],
    }
}

/// Submits the entry query: one fetch per submit, superseding any in-flight
/// fetch via the sequence number.
fn submit_search(app: &mut AppState) -> Vec<UiEffect> {
    let query = app.query.text().trim().to_string();
    if query.is_empty() {
        return vec![];
    }

    app.view = View::Results;
    app.results.query = query.clone();
    app.results.page = 1;
    app.results.loaded_at = None;

    if app.session.loading {
        // Restoration decides the result cap; fetch once it resolves.
        app.results.phase = SearchPhase::WaitingForAuth;
        return vec![];
    }

    start_fetch(app)
}

/// Bumps the sequence and returns the fetch effect for the current query.
fn start_fetch(app: &mut AppState) -> Vec<UiEffect> {
    app.results.seq += 1;
    let seq = app.results.seq;
    app.results.phase = SearchPhase::Fetching { seq };
    vec![UiEffect::StartSearch {
        seq,
        query: app.results.query.clone(),
        max_results: paging::requested_results(app.session.signed_in()),
    }]
}

// ============================================================================
// Results screen
// ============================================================================

fn handle_results_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    let pagination = app.results.pagination(&app.session);
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.view = View::Entry;
            vec![]
        }
        // Paging is purely local: no re-fetch
        KeyCode::Left | KeyCode::Char('p') => {
            if let Some(page) = pagination.prev() {
                app.results.page = page;
            }
            vec![]
        }
        KeyCode::Right | KeyCode::Char('n') => {
            if let Some(page) = pagination.next() {
                app.results.page = page;
            }
            vec![]
        }
        KeyCode::Home => {
            app.results.page = 1;
            vec![]
        }
        KeyCode::End => {
            app.results.page = pagination.total_pages;
            vec![]
        }
        KeyCode::Char(ch @ '1'..='9') => {
            let target = (ch as usize) - ('0' as usize);
            if target <= pagination.total_pages {
                app.results.page = target;
            }
            vec![]
        }
        KeyCode::Char('/') => {
            app.view = View::Entry;
            app.query.move_end();
            vec![]
        }
        KeyCode::Char('r') => {
            if matches!(
                app.results.phase,
                SearchPhase::Loaded | SearchPhase::Failed { .. }
            ) {
                return start_fetch(app);
            }
            vec![]
        }
        KeyCode::Char('s') if !app.session.signed_in() => {
            open_login(app);
            vec![]
        }
        KeyCode::Char('o') if app.session.signed_in() => {
            vec![UiEffect::SignOut]
        }
        _ => vec![],
    }
}

fn handle_search_finished(
    app: &mut AppState,
    seq: u64,
    result: Result<glint_core::search::AiSearchResponse, String>,
) -> Vec<UiEffect> {
    // Stale reply from a superseded fetch
    if app.results.phase != (SearchPhase::Fetching { seq }) {
        return vec![];
    }

    match result {
        Ok(response) => {
            app.results.response = response;
            app.results.phase = SearchPhase::Loaded;
            app.results.loaded_at = Some(std::time::Instant::now());
            // Requested page may exceed the new result set
            app.results.page = app.results.pagination(&app.session).current_page;
        }
        Err(message) => {
            app.results.response = glint_core::search::AiSearchResponse::default();
            app.results.phase = SearchPhase::Failed { message };
        }
    }
    vec![]
}

fn handle_session_changed(
    app: &mut AppState,
    session: glint_core::session::Session,
) -> Vec<UiEffect> {
    let was_signed_in = app.session.signed_in();
    let was_loading = app.session.loading;
    app.session = session;

    if app.session.loading {
        return vec![];
    }

    // A submit that raced restoration starts now
    if app.results.phase == SearchPhase::WaitingForAuth {
        return start_fetch(app);
    }

    // Sign-in/out changes the result cap; any search in progress or on
    // screen re-fetches so the response matches what the session is entitled
    // to see. The seq bump in start_fetch invalidates an in-flight reply.
    let signed_in_flipped = !was_loading && was_signed_in != app.session.signed_in();
    if signed_in_flipped
        && matches!(
            app.results.phase,
            SearchPhase::Fetching { .. } | SearchPhase::Loaded | SearchPhase::Failed { .. }
        )
    {
        app.results.page = 1;
        return start_fetch(app);
    }

    vec![]
}

// ============================================================================
// Login screen
// ============================================================================

fn open_login(app: &mut AppState) {
    // Nothing to do for an already signed-in session
    if app.session.signed_in() {
        app.toasts.success("Already signed in");
        return;
    }
    app.login_return = app.view;
    app.login = LoginState::form();
    app.view = View::Login;
}

fn close_login(app: &mut AppState) {
    app.view = app.login_return;
}

fn handle_login_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    // Transitions that replace the whole login state go first, outside any
    // borrow of its contents.
    if key.code == KeyCode::Esc {
        if matches!(app.login, LoginState::Form { .. }) {
            close_login(app);
        } else {
            // An in-flight reply is ignored once the form reopens
            app.login = LoginState::form();
        }
        return vec![];
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('g') {
        if matches!(app.login, LoginState::Form { .. }) {
            return start_google_login(app);
        }
        return vec![];
    }

    if key.code == KeyCode::Enter {
        return submit_login_form(app);
    }

    match &mut app.login {
        LoginState::Form {
            mode,
            email,
            password,
            focus,
            error,
        } => {
            match key.code {
                KeyCode::Tab | KeyCode::BackTab | KeyCode::Down | KeyCode::Up => {
                    *focus = match focus {
                        LoginField::Email => LoginField::Password,
                        LoginField::Password => LoginField::Email,
                    };
                }
                KeyCode::Char('t') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    *mode = match mode {
                        LoginMode::SignIn => LoginMode::SignUp,
                        LoginMode::SignUp => LoginMode::SignIn,
                    };
                    *error = None;
                }
                KeyCode::Backspace => match focus {
                    LoginField::Email => email.backspace(),
                    LoginField::Password => password.backspace(),
                },
                KeyCode::Left => match focus {
                    LoginField::Email => email.move_left(),
                    LoginField::Password => password.move_left(),
                },
                KeyCode::Right => match focus {
                    LoginField::Email => email.move_right(),
                    LoginField::Password => password.move_right(),
                },
                KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    match focus {
                        LoginField::Email => email.insert(ch),
                        LoginField::Password => password.insert(ch),
                    }
                }
                _ => {}
            }
            vec![]
        }
        LoginState::AwaitingBrowser { url, .. } if key.code == KeyCode::Char('o') => {
            let url = url.clone();
            vec![UiEffect::OpenBrowser { url }]
        }
        _ => vec![],
    }
}

fn submit_login_form(app: &mut AppState) -> Vec<UiEffect> {
    let LoginState::Form {
        mode,
        email,
        password,
        error,
        ..
    } = &mut app.login
    else {
        return vec![];
    };

    let email_text = email.text().trim().to_string();
    let password_text = password.text().to_string();
    if email_text.is_empty() || password_text.is_empty() {
        *error = Some("Email and password are required".to_string());
        return vec![];
    }

    let mode = *mode;
    let effect = match mode {
        LoginMode::SignIn => UiEffect::SignInEmail {
            email: email_text.clone(),
            password: password_text,
        },
        LoginMode::SignUp => UiEffect::SignUpEmail {
            email: email_text.clone(),
            password: password_text,
        },
    };
    app.login = LoginState::Submitting {
        mode,
        email: email_text,
    };
    vec![effect]
}

/// Starts the Google browser flow: build the PKCE challenge and auth URL,
/// open the browser, and listen on a localhost callback.
fn start_google_login(app: &mut AppState) -> Vec<UiEffect> {
    let Some(client_id) = app.google_client_id.clone() else {
        if let LoginState::Form { error, .. } = &mut app.login {
            *error = Some("Google sign-in is not configured".to_string());
        }
        return vec![];
    };

    let pkce = google::generate_pkce();
    let oauth_state = uuid::Uuid::new_v4().to_string();
    let port = google::random_local_port();
    let redirect_uri = google::build_redirect_uri(port);
    let url = google::build_auth_url(&client_id, &pkce, &oauth_state, &redirect_uri);

    app.login = LoginState::AwaitingBrowser {
        url: url.clone(),
        verifier: pkce.verifier,
        redirect_uri,
    };

    vec![
        UiEffect::OpenBrowser { url },
        UiEffect::StartOauthCallback {
            port,
            state: oauth_state,
        },
    ]
}

fn handle_oauth_callback(app: &mut AppState, code: Option<String>) -> Vec<UiEffect> {
    let LoginState::AwaitingBrowser {
        verifier,
        redirect_uri,
        ..
    } = &app.login
    else {
        return vec![];
    };

    match code {
        Some(code) => {
            let effect = UiEffect::ExchangeOauthCode {
                code,
                verifier: verifier.clone(),
                redirect_uri: redirect_uri.clone(),
            };
            app.login = LoginState::Exchanging;
            vec![effect]
        }
        None => {
            app.login = LoginState::form();
            app.toasts.error("Sign-in was cancelled or timed out");
            vec![]
        }
    }
}

fn handle_login_finished(
    app: &mut AppState,
    result: Result<glint_core::identity::AuthUser, String>,
) -> Vec<UiEffect> {
    match result {
        Ok(user) => {
            let who = user.email.clone().unwrap_or_else(|| user.uid.clone());
            app.toasts.success(format!("Signed in as {who}"));
            if app.view == View::Login {
                close_login(app);
            }
            // The session manager broadcast carries the user into state;
            // nothing to install here.
            vec![]
        }
        Err(message) => {
            let (mode, email) = match &app.login {
                LoginState::Submitting { mode, email } => (*mode, email.clone()),
                _ => (LoginMode::SignIn, String::new()),
            };
            app.toasts.error(message.clone());
            if app.view == View::Login {
                app.login = LoginState::reopen(mode, &email, message);
            }
            vec![]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent;
    use glint_core::search::{AiSearchResponse, SearchResult};
    use glint_core::session::Session;

    fn key(code: KeyCode) -> UiEvent {
        UiEvent::Terminal(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn ctrl(ch: char) -> UiEvent {
        UiEvent::Terminal(Event::Key(KeyEvent::new(
            KeyCode::Char(ch),
            KeyModifiers::CONTROL,
        )))
    }

    fn resolved_app() -> AppState {
        let mut app = AppState::new(None);
        app.session = Session {
            user: None,
            loading: false,
        };
        app
    }

    fn signed_in_session() -> Session {
        Session {
            user: Some(glint_core::identity::AuthUser {
                uid: "u1".to_string(),
                email: Some("a@b.test".to_string()),
                id_token: "t".to_string(),
                refresh_token: "r".to_string(),
                expires_at: u64::MAX,
            }),
            loading: false,
        }
    }

    fn results(n: usize) -> AiSearchResponse {
        AiSearchResponse {
            introduction: "intro".to_string(),
            results: (0..n)
                .map(|i| SearchResult {
                    title: format!("Result {i}"),
                    snippet: format!("Snippet {i}"),
                    url: format!("https://example.com/{i}"),
                })
                .collect(),
        }
    }

    fn type_query(app: &mut AppState, text: &str) {
        for ch in text.chars() {
            update(app, key(KeyCode::Char(ch)));
        }
    }

    #[test]
    fn submit_starts_fetch_on_page_one() {
        let mut app = resolved_app();
        type_query(&mut app, "rust");
        let effects = update(&mut app, key(KeyCode::Enter));

        assert_eq!(app.view, View::Results);
        assert_eq!(app.results.page, 1);
        assert_eq!(app.results.phase, SearchPhase::Fetching { seq: 1 });
        assert_eq!(
            effects,
            vec![UiEffect::StartSearch {
                seq: 1,
                query: "rust".to_string(),
                max_results: glint_core::paging::MAX_FREE_RESULTS,
            }]
        );
    }

    #[test]
    fn signed_in_submit_requests_full_cap() {
        let mut app = resolved_app();
        app.session = signed_in_session();
        type_query(&mut app, "rust");
        let effects = update(&mut app, key(KeyCode::Enter));

        assert_eq!(
            effects,
            vec![UiEffect::StartSearch {
                seq: 1,
                query: "rust".to_string(),
                max_results: glint_core::paging::MAX_REGISTERED_RESULTS,
            }]
        );
    }

    #[test]
    fn empty_query_does_not_submit() {
        let mut app = resolved_app();
        type_query(&mut app, "   ");
        let effects = update(&mut app, key(KeyCode::Enter));
        assert!(effects.is_empty());
        assert_eq!(app.view, View::Entry);
    }

    #[test]
    fn submit_during_restoration_waits_for_session() {
        let mut app = AppState::new(Some("rust".to_string()));
        assert!(app.session.loading);

        let effects = update(&mut app, key(KeyCode::Enter));
        assert!(effects.is_empty());
        assert_eq!(app.results.phase, SearchPhase::WaitingForAuth);

        let effects = update(
            &mut app,
            UiEvent::SessionChanged(Session {
                user: None,
                loading: false,
            }),
        );
        assert_eq!(app.results.phase, SearchPhase::Fetching { seq: 1 });
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn stale_search_reply_is_dropped() {
        let mut app = resolved_app();
        type_query(&mut app, "first");
        update(&mut app, key(KeyCode::Enter));

        // Second submit supersedes the first
        update(&mut app, key(KeyCode::Char('/')));
        for _ in 0.."first".len() {
            update(&mut app, key(KeyCode::Backspace));
        }
        type_query(&mut app, "second");
        update(&mut app, key(KeyCode::Enter));
        assert_eq!(app.results.phase, SearchPhase::Fetching { seq: 2 });

        // The first fetch's reply arrives late
        let effects = update(
            &mut app,
            UiEvent::SearchFinished {
                seq: 1,
                result: Ok(results(5)),
            },
        );
        assert!(effects.is_empty());
        assert_eq!(app.results.phase, SearchPhase::Fetching { seq: 2 });

        let _ = update(
            &mut app,
            UiEvent::SearchFinished {
                seq: 2,
                result: Ok(results(3)),
            },
        );
        assert_eq!(app.results.phase, SearchPhase::Loaded);
        assert_eq!(app.results.response.results.len(), 3);
    }

    #[test]
    fn search_failure_records_message() {
        let mut app = resolved_app();
        type_query(&mut app, "rust");
        update(&mut app, key(KeyCode::Enter));

        update(
            &mut app,
            UiEvent::SearchFinished {
                seq: 1,
                result: Err("Search endpoint returned HTTP 500".to_string()),
            },
        );
        assert_eq!(
            app.results.phase,
            SearchPhase::Failed {
                message: "Search endpoint returned HTTP 500".to_string()
            }
        );
    }

    #[test]
    fn paging_is_local_and_clamped() {
        let mut app = resolved_app();
        app.session = signed_in_session();
        type_query(&mut app, "rust");
        update(&mut app, key(KeyCode::Enter));
        update(
            &mut app,
            UiEvent::SearchFinished {
                seq: 1,
                result: Ok(results(12)),
            },
        );

        // 12 visible results -> 2 pages
        assert_eq!(app.results.pagination(&app.session).total_pages, 2);

        let effects = update(&mut app, key(KeyCode::Right));
        assert!(effects.is_empty(), "paging must not re-fetch");
        assert_eq!(app.results.page, 2);

        // Clamped at the last page
        update(&mut app, key(KeyCode::Right));
        assert_eq!(app.results.page, 2);

        update(&mut app, key(KeyCode::Left));
        assert_eq!(app.results.page, 1);
        update(&mut app, key(KeyCode::Left));
        assert_eq!(app.results.page, 1);
    }

    #[test]
    fn anonymous_gate_shows_three_results() {
        let mut app = resolved_app();
        type_query(&mut app, "rust");
        update(&mut app, key(KeyCode::Enter));
        update(
            &mut app,
            UiEvent::SearchFinished {
                seq: 1,
                result: Ok(results(12)),
            },
        );

        assert_eq!(app.results.visible(&app.session).len(), 3);
        assert_eq!(app.results.pagination(&app.session).total_pages, 1);
    }

    #[test]
    fn sign_in_refetches_a_loaded_search() {
        let mut app = resolved_app();
        type_query(&mut app, "rust");
        update(&mut app, key(KeyCode::Enter));
        update(
            &mut app,
            UiEvent::SearchFinished {
                seq: 1,
                result: Ok(results(3)),
            },
        );
        assert_eq!(app.results.phase, SearchPhase::Loaded);

        let effects = update(&mut app, UiEvent::SessionChanged(signed_in_session()));
        assert_eq!(app.results.phase, SearchPhase::Fetching { seq: 2 });
        assert_eq!(
            effects,
            vec![UiEffect::StartSearch {
                seq: 2,
                query: "rust".to_string(),
                max_results: glint_core::paging::MAX_REGISTERED_RESULTS,
            }]
        );
    }

    #[test]
    fn sign_in_restarts_an_in_flight_fetch() {
        let mut app = resolved_app();
        type_query(&mut app, "rust");
        update(&mut app, key(KeyCode::Enter));
        assert_eq!(app.results.phase, SearchPhase::Fetching { seq: 1 });

        let effects = update(&mut app, UiEvent::SessionChanged(signed_in_session()));
        assert_eq!(app.results.phase, SearchPhase::Fetching { seq: 2 });
        assert_eq!(
            effects,
            vec![UiEffect::StartSearch {
                seq: 2,
                query: "rust".to_string(),
                max_results: glint_core::paging::MAX_REGISTERED_RESULTS,
            }]
        );

        // The anonymous fetch's reply is superseded, not installed
        let effects = update(
            &mut app,
            UiEvent::SearchFinished {
                seq: 1,
                result: Ok(results(3)),
            },
        );
        assert!(effects.is_empty());
        assert_eq!(app.results.phase, SearchPhase::Fetching { seq: 2 });

        update(
            &mut app,
            UiEvent::SearchFinished {
                seq: 2,
                result: Ok(results(12)),
            },
        );
        assert_eq!(app.results.phase, SearchPhase::Loaded);
        assert_eq!(app.results.visible(&app.session).len(), 12);
    }

    #[test]
    fn sign_in_retries_a_failed_search() {
        let mut app = resolved_app();
        type_query(&mut app, "rust");
        update(&mut app, key(KeyCode::Enter));
        update(
            &mut app,
            UiEvent::SearchFinished {
                seq: 1,
                result: Err("Search endpoint returned HTTP 500".to_string()),
            },
        );
        assert!(matches!(app.results.phase, SearchPhase::Failed { .. }));

        let effects = update(&mut app, UiEvent::SessionChanged(signed_in_session()));
        assert_eq!(app.results.phase, SearchPhase::Fetching { seq: 2 });
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn session_change_without_flip_does_not_refetch() {
        let mut app = resolved_app();
        type_query(&mut app, "rust");
        update(&mut app, key(KeyCode::Enter));
        update(
            &mut app,
            UiEvent::SearchFinished {
                seq: 1,
                result: Ok(results(3)),
            },
        );

        let effects = update(
            &mut app,
            UiEvent::SessionChanged(Session {
                user: None,
                loading: false,
            }),
        );
        assert!(effects.is_empty());
        assert_eq!(app.results.phase, SearchPhase::Loaded);
    }

    #[test]
    fn login_form_submits_credentials() {
        let mut app = resolved_app();
        update(&mut app, ctrl('l'));
        assert_eq!(app.view, View::Login);

        type_query(&mut app, "a@b.test");
        update(&mut app, key(KeyCode::Tab));
        type_query(&mut app, "hunter2");
        let effects = update(&mut app, key(KeyCode::Enter));

        assert_eq!(
            effects,
            vec![UiEffect::SignInEmail {
                email: "a@b.test".to_string(),
                password: "hunter2".to_string(),
            }]
        );
        assert!(matches!(
            app.login,
            LoginState::Submitting {
                mode: LoginMode::SignIn,
                ..
            }
        ));
    }

    #[test]
    fn login_form_requires_both_fields() {
        let mut app = resolved_app();
        update(&mut app, ctrl('l'));
        type_query(&mut app, "a@b.test");
        let effects = update(&mut app, key(KeyCode::Enter));
        assert!(effects.is_empty());
        assert!(matches!(
            &app.login,
            LoginState::Form { error: Some(_), .. }
        ));
    }

    #[test]
    fn login_failure_reopens_form_with_provider_message() {
        let mut app = resolved_app();
        update(&mut app, ctrl('l'));
        type_query(&mut app, "a@b.test");
        update(&mut app, key(KeyCode::Tab));
        type_query(&mut app, "wrong");
        update(&mut app, key(KeyCode::Enter));

        update(
            &mut app,
            UiEvent::LoginFinished {
                result: Err("INVALID_PASSWORD".to_string()),
            },
        );

        assert_eq!(app.view, View::Login);
        match &app.login {
            LoginState::Form { error, .. } => {
                assert_eq!(error.as_deref(), Some("INVALID_PASSWORD"));
            }
            other => panic!("expected form, got {other:?}"),
        }
        assert!(!app.toasts.is_empty());
    }

    #[test]
    fn login_success_returns_to_previous_view() {
        let mut app = resolved_app();
        type_query(&mut app, "rust");
        update(&mut app, key(KeyCode::Enter));
        update(
            &mut app,
            UiEvent::SearchFinished {
                seq: 1,
                result: Ok(results(3)),
            },
        );

        // Open login from the results screen
        update(&mut app, key(KeyCode::Char('s')));
        assert_eq!(app.view, View::Login);

        type_query(&mut app, "a@b.test");
        update(&mut app, key(KeyCode::Tab));
        type_query(&mut app, "hunter2");
        update(&mut app, key(KeyCode::Enter));

        update(
            &mut app,
            UiEvent::LoginFinished {
                result: Ok(signed_in_session().user.unwrap()),
            },
        );
        assert_eq!(app.view, View::Results);
    }

    #[test]
    fn google_login_needs_a_client_id() {
        let mut app = resolved_app();
        update(&mut app, ctrl('l'));
        let effects = update(&mut app, ctrl('g'));
        assert!(effects.is_empty());
        assert!(matches!(
            &app.login,
            LoginState::Form { error: Some(_), .. }
        ));
    }

    #[test]
    fn google_login_opens_browser_and_listens() {
        let mut app = resolved_app();
        app.google_client_id = Some("client-1".to_string());
        update(&mut app, ctrl('l'));
        let effects = update(&mut app, ctrl('g'));

        assert_eq!(effects.len(), 2);
        assert!(matches!(effects[0], UiEffect::OpenBrowser { .. }));
        assert!(matches!(effects[1], UiEffect::StartOauthCallback { .. }));
        assert!(matches!(app.login, LoginState::AwaitingBrowser { .. }));

        let effects = update(
            &mut app,
            UiEvent::OauthCallback {
                code: Some("auth-code".to_string()),
            },
        );
        assert!(matches!(
            effects.as_slice(),
            [UiEffect::ExchangeOauthCode { code, .. }] if code == "auth-code"
        ));
        assert!(matches!(app.login, LoginState::Exchanging));
    }

    #[test]
    fn oauth_timeout_reopens_the_form() {
        let mut app = resolved_app();
        app.google_client_id = Some("client-1".to_string());
        update(&mut app, ctrl('l'));
        update(&mut app, ctrl('g'));

        let effects = update(&mut app, UiEvent::OauthCallback { code: None });
        assert!(effects.is_empty());
        assert!(matches!(&app.login, LoginState::Form { .. }));
        assert!(!app.toasts.is_empty());
    }

    #[test]
    fn ctrl_c_quits_from_any_view() {
        let mut app = resolved_app();
        let effects = update(&mut app, ctrl('c'));
        assert!(app.should_quit);
        assert_eq!(effects, vec![UiEffect::Quit]);
    }

    #[test]
    fn page_jump_digit_respects_bounds() {
        let mut app = resolved_app();
        app.session = signed_in_session();
        type_query(&mut app, "rust");
        update(&mut app, key(KeyCode::Enter));
        update(
            &mut app,
            UiEvent::SearchFinished {
                seq: 1,
                result: Ok(results(25)),
            },
        );
        assert_eq!(app.results.pagination(&app.session).total_pages, 3);

        update(&mut app, key(KeyCode::Char('3')));
        assert_eq!(app.results.page, 3);
        update(&mut app, key(KeyCode::Char('9')));
        assert_eq!(app.results.page, 3);
    }
}
