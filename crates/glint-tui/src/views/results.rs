//! Results screen: synthesized introduction, the current page of results,
//! and the pagination bar.

use glint_core::paging;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

use crate::render::spinner_frame;
use crate::state::{AppState, SearchPhase};

pub fn render(app: &AppState, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // header
            Constraint::Min(1),    // body
            Constraint::Length(1), // pagination bar
            Constraint::Length(1), // hints
        ])
        .split(area);

    render_header(app, frame, chunks[0]);

    match &app.results.phase {
        SearchPhase::Idle => {}
        SearchPhase::WaitingForAuth | SearchPhase::Fetching { .. } => {
            let line = Line::from(vec![
                Span::styled(spinner_frame(app), Style::default().fg(Color::Yellow)),
                Span::raw(" Searching..."),
            ]);
            frame.render_widget(Paragraph::new(line), chunks[1]);
        }
        SearchPhase::Failed { message } => {
            let lines = vec![
                Line::from(Span::styled(
                    "Failed to fetch results. Please try again.",
                    Style::default()
                        .fg(Color::Red)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(Span::raw(message.clone())),
                Line::from(""),
                Line::from(Span::styled(
                    "r to retry",
                    Style::default().fg(Color::DarkGray),
                )),
            ];
            frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), chunks[1]);
        }
        SearchPhase::Loaded => render_loaded(app, frame, chunks[1]),
    }

    render_pagination_bar(app, frame, chunks[2]);
    render_hints(app, frame, chunks[3]);
}

fn render_header(app: &AppState, frame: &mut Frame, area: Rect) {
    let visible = app.results.visible(&app.session).len();
    let about = match app.results.phase {
        SearchPhase::Loaded => format!("About {visible} results"),
        _ => String::new(),
    };
    let line = Line::from(vec![
        Span::styled(
            "Glint",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(&app.results.query, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("   "),
        Span::styled(about, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_loaded(app: &AppState, frame: &mut Frame, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();

    if !app.results.response.introduction.is_empty() {
        // Dimmed until the reveal delay elapses, then full intensity
        let style = if app.results.intro_revealed() {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        lines.push(Line::from(Span::styled(
            app.results.response.introduction.clone(),
            style,
        )));
        lines.push(Line::from(""));
    }

    let visible = app.results.visible(&app.session);
    let pagination = app.results.pagination(&app.session);

    if visible.is_empty() {
        lines.push(Line::from(Span::styled(
            "No results.",
            Style::default().fg(Color::DarkGray),
        )));
    }

    for result in &visible[pagination.page_range(visible.len())] {
        lines.push(Line::from(Span::styled(
            result.title.clone(),
            Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            result.url.clone(),
            Style::default().fg(Color::Green),
        )));
        lines.push(Line::from(Span::raw(result.snippet.clone())));
        lines.push(Line::from(""));
    }

    // Anonymous sessions see the free slice only; nudge toward an account
    if !app.session.signed_in() && visible.len() == paging::MAX_FREE_RESULTS {
        lines.push(Line::from(Span::styled(
            "Sign in to see more results (press s)",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn render_pagination_bar(app: &AppState, frame: &mut Frame, area: Rect) {
    if app.results.phase != SearchPhase::Loaded {
        return;
    }
    let pagination = app.results.pagination(&app.session);
    if pagination.total_pages <= 1 {
        return;
    }

    let mut spans: Vec<Span> = Vec::new();
    for entry in pagination.page_numbers() {
        match entry {
            Some(page) if page == pagination.current_page => {
                spans.push(Span::styled(
                    format!(" {page} "),
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ));
            }
            Some(page) => {
                spans.push(Span::raw(format!(" {page} ")));
            }
            None => {
                spans.push(Span::styled(" … ", Style::default().fg(Color::DarkGray)));
            }
        }
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
        area,
    );
}

fn render_hints(app: &AppState, frame: &mut Frame, area: Rect) {
    let auth_hint = if app.session.signed_in() {
        "o sign out"
    } else {
        "s sign in"
    };
    let line = Line::from(Span::styled(
        format!("←/→ pages · / new search · r retry · {auth_hint} · Esc back"),
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(line), area);
}
