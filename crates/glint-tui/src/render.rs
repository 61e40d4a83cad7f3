//! Pure view/render functions for the TUI.
//!
//! Functions here take `&AppState` by immutable reference, draw to a ratatui
//! Frame, and never mutate state or return effects.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::state::{AppState, View};
use crate::toast::ToastKind;
use crate::views;

/// Spinner frames for in-flight indicators.
pub const SPINNER_FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];

/// Renders the entire TUI to the frame.
pub fn render(app: &AppState, frame: &mut Frame) {
    let area = frame.area();

    match app.view {
        View::Entry => views::entry::render(app, frame, area),
        View::Results => views::results::render(app, frame, area),
        View::Login => views::login::render(app, frame, area),
    }

    render_toasts(app, frame, area);
}

pub fn spinner_frame(app: &AppState) -> &'static str {
    SPINNER_FRAMES[usize::from(app.spinner_frame) % SPINNER_FRAMES.len()]
}

/// Draws toasts as single-line banners anchored to the bottom edge.
fn render_toasts(app: &AppState, frame: &mut Frame, area: Rect) {
    if app.toasts.is_empty() || area.height < 2 {
        return;
    }

    let toasts: Vec<_> = app.toasts.iter().collect();
    let count = u16::try_from(toasts.len()).unwrap_or(u16::MAX).min(3);
    let start_y = area.bottom().saturating_sub(count);

    for (i, toast) in toasts.iter().rev().take(usize::from(count)).enumerate() {
        let color = match toast.kind {
            ToastKind::Success => Color::Green,
            ToastKind::Error => Color::Red,
        };
        let line = Line::from(Span::styled(
            format!(" {} ", toast.message),
            Style::default().fg(Color::Black).bg(color),
        ));
        let y = start_y + u16::try_from(i).unwrap_or(0);
        let row = Rect::new(area.x, y, area.width, 1);
        frame.render_widget(Paragraph::new(line), row);
    }
}

/// Centers a box of the given size within `area`, clamping to fit.
pub fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}
