use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};

use crate::render::NoticeKind;

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// Footer colour for each notice category.
pub(crate) fn notice_style(kind: NoticeKind) -> Style {
    match kind {
        NoticeKind::Success => Style::default().fg(Color::Green),
        NoticeKind::Destructive => Style::default().fg(Color::Magenta),
        NoticeKind::Error => Style::default().fg(Color::Red),
    }
}

/// Keep `selected` inside a list of `len` rows.
pub(crate) fn clamp_selection(selected: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        selected.min(len - 1)
    }
}

/// Move `selected` by `offset`, stopping at either end.
pub(crate) fn offset_selection(selected: usize, offset: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let moved = selected as isize + offset;
    moved.clamp(0, len as isize - 1) as usize
}
