//! Entry screen: centered wordmark and the query box.

use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::render::centered_rect;
use crate::state::AppState;

/// Width of the query box (clamped to the terminal).
const QUERY_BOX_WIDTH: u16 = 64;

pub fn render(app: &AppState, frame: &mut Frame, area: Rect) {
    let container = centered_rect(area, QUERY_BOX_WIDTH, 8);

    let wordmark = Paragraph::new(Line::from(Span::styled(
        "Glint",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(wordmark, Rect::new(container.x, container.y, container.width, 1));

    let input_area = Rect::new(container.x, container.y + 2, container.width, 3);
    let input = Paragraph::new(Line::from(app.query.text()))
        .block(Block::default().borders(Borders::ALL).title(" Search "));
    frame.render_widget(input, input_area);

    // Cursor inside the bordered box
    let cursor_x = input_area.x + 1 + app.query.cursor_column().min(input_area.width.saturating_sub(3));
    frame.set_cursor_position((cursor_x, input_area.y + 1));

    let account = match &app.session.user {
        Some(user) => {
            let who = user.email.as_deref().unwrap_or(&user.uid);
            format!("Signed in as {who}")
        }
        None if app.session.loading => "Checking session...".to_string(),
        None => "Not signed in".to_string(),
    };
    let hints = Paragraph::new(vec![
        Line::from(Span::styled(
            "Enter to search · Ctrl+L to sign in · Esc to quit",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled(account, Style::default().fg(Color::DarkGray))),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(
        hints,
        Rect::new(container.x, container.y + 6, container.width, 2),
    );
}
