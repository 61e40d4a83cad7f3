//! Login screen: email/password form plus the Google browser flow states.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::render::{centered_rect, spinner_frame};
use crate::state::{AppState, LoginField, LoginMode, LoginState};
use crate::textfield::TextField;

const POPUP_WIDTH: u16 = 56;
const POPUP_HEIGHT: u16 = 14;

pub fn render(app: &AppState, frame: &mut Frame, area: Rect) {
    let popup = centered_rect(area, POPUP_WIDTH, POPUP_HEIGHT);

    let title = match &app.login {
        LoginState::Form {
            mode: LoginMode::SignIn,
            ..
        } => " Sign in ",
        LoginState::Form {
            mode: LoginMode::SignUp,
            ..
        } => " Create account ",
        LoginState::Submitting { .. } => " Signing in ",
        LoginState::AwaitingBrowser { .. } => " Google sign-in ",
        LoginState::Exchanging => " Google sign-in ",
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    match &app.login {
        LoginState::Form {
            email,
            password,
            focus,
            error,
            mode,
        } => render_form(frame, inner, *mode, email, password, *focus, error.as_deref()),
        LoginState::Submitting { .. } => {
            render_status_lines(
                frame,
                inner,
                vec![
                    Line::from(""),
                    Line::from(vec![
                        Span::styled(spinner_frame(app), Style::default().fg(Color::Yellow)),
                        Span::raw(" Contacting the identity service..."),
                    ]),
                    Line::from(""),
                    Line::from(dim("Esc to cancel")),
                ],
            );
        }
        LoginState::AwaitingBrowser { url, .. } => {
            render_status_lines(
                frame,
                inner,
                vec![
                    Line::from("Complete the sign-in in your browser."),
                    Line::from(""),
                    Line::from(Span::styled(
                        url.clone(),
                        Style::default().fg(Color::Blue),
                    )),
                    Line::from(""),
                    Line::from(dim("o open again · Esc to cancel")),
                ],
            );
        }
        LoginState::Exchanging => {
            render_status_lines(
                frame,
                inner,
                vec![
                    Line::from(""),
                    Line::from(vec![
                        Span::styled(spinner_frame(app), Style::default().fg(Color::Yellow)),
                        Span::raw(" Completing sign-in..."),
                    ]),
                    Line::from(""),
                    Line::from(dim("Esc to cancel")),
                ],
            );
        }
    }
}

fn render_form(
    frame: &mut Frame,
    inner: Rect,
    mode: LoginMode,
    email: &TextField,
    password: &TextField,
    focus: LoginField,
    error: Option<&str>,
) {
    let field_width = inner.width.saturating_sub(2);

    let email_area = Rect::new(inner.x + 1, inner.y + 1, field_width, 3);
    let email_widget = Paragraph::new(Line::from(email.text())).block(
        field_block(" Email ", focus == LoginField::Email),
    );
    frame.render_widget(email_widget, email_area);

    let password_area = Rect::new(inner.x + 1, inner.y + 4, field_width, 3);
    let masked: String = "•".repeat(password.text().chars().count());
    let password_widget = Paragraph::new(Line::from(masked)).block(
        field_block(" Password ", focus == LoginField::Password),
    );
    frame.render_widget(password_widget, password_area);

    let (active_area, active_field) = match focus {
        LoginField::Email => (email_area, email),
        LoginField::Password => (password_area, password),
    };
    let cursor_x = active_area.x + 1 + active_field.cursor_column().min(field_width.saturating_sub(3));
    frame.set_cursor_position((cursor_x, active_area.y + 1));

    let mut lines = Vec::new();
    if let Some(error) = error {
        lines.push(Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )));
    }
    let toggle_hint = match mode {
        LoginMode::SignIn => "Ctrl+T create account",
        LoginMode::SignUp => "Ctrl+T sign in instead",
    };
    lines.push(Line::from(dim(&format!(
        "Enter submit · Tab next field · {toggle_hint}"
    ))));
    lines.push(Line::from(dim("Ctrl+G sign in with Google · Esc close")));

    let hints_area = Rect::new(
        inner.x + 1,
        inner.y + 8,
        field_width,
        inner.height.saturating_sub(8),
    );
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), hints_area);
}

fn field_block(title: &'static str, focused: bool) -> Block<'static> {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(Span::styled(
            title,
            style.add_modifier(if focused { Modifier::BOLD } else { Modifier::empty() }),
        ))
}

fn render_status_lines(frame: &mut Frame, inner: Rect, lines: Vec<Line<'_>>) {
    let area = Rect::new(
        inner.x + 1,
        inner.y + 1,
        inner.width.saturating_sub(2),
        inner.height.saturating_sub(2),
    );
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn dim(text: &str) -> Span<'static> {
    Span::styled(text.to_string(), Style::default().fg(Color::DarkGray))
}
