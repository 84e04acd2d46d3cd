//! Status bar rendering with keybindings and state indicators

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Data needed to render the status bar
pub struct StatusRenderData<'a> {
    pub message: &'a str,
    /// History index of the live state
    pub current_step: usize,
    /// Number of recorded history entries
    pub total_steps: usize,
    pub halted: bool,
    pub has_error: bool,
    pub is_playing: bool,
}

const KEYBINDS: [(&str, &str); 4] = [
    ("←/→", "step"),
    ("⎵", "play"),
    ("↵/⌫", "end/start"),
    ("q", "quit"),
];

/// Where the viewer sits in the run, shown at the right edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionBadge {
    Playing,
    Halted,
    End,
    Start,
}

impl PositionBadge {
    fn text(self) -> &'static str {
        match self {
            PositionBadge::Playing => "▶ PLAYING",
            PositionBadge::Halted => "HALTED",
            PositionBadge::End => "END",
            PositionBadge::Start => "START",
        }
    }

    fn color(self) -> Color {
        match self {
            PositionBadge::Playing => DEFAULT_THEME.secondary,
            PositionBadge::Halted | PositionBadge::End => DEFAULT_THEME.error,
            PositionBadge::Start => DEFAULT_THEME.success,
        }
    }
}

/// Badge for the current position; playback wins over position
pub fn position_badge(data: &StatusRenderData) -> Option<PositionBadge> {
    if data.is_playing {
        Some(PositionBadge::Playing)
    } else if data.halted {
        Some(PositionBadge::Halted)
    } else if data.current_step + 1 >= data.total_steps {
        Some(PositionBadge::End)
    } else if data.current_step == 0 {
        Some(PositionBadge::Start)
    } else {
        None
    }
}

/// Render the status bar at the bottom.
pub fn render_status_bar(frame: &mut Frame, area: Rect, data: StatusRenderData) {
    // Split status bar into left and right
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let (accent, message_fg) = if data.has_error {
        (DEFAULT_THEME.error, DEFAULT_THEME.error)
    } else {
        (DEFAULT_THEME.primary, DEFAULT_THEME.fg)
    };
    let bar = Style::default().bg(DEFAULT_THEME.current_line_bg);

    let left_spans = vec![
        Span::styled(
            format!(" Step {}/{} ", data.current_step + 1, data.total_steps),
            Style::default()
                .bg(accent)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" | ", bar.fg(DEFAULT_THEME.comment)),
        Span::styled(format!(" {} ", data.message), bar.fg(message_fg)),
    ];

    let left_paragraph = Paragraph::new(Line::from(left_spans))
        .style(bar)
        .alignment(Alignment::Left);

    frame.render_widget(left_paragraph, layout[0]);

    // keybind hints, then the position badge
    let key_style = Style::default().bg(DEFAULT_THEME.comment).fg(Color::Black);
    let desc_style = bar.fg(DEFAULT_THEME.fg);
    let sep_style = bar.fg(DEFAULT_THEME.comment);

    let mut right_spans = Vec::new();
    for (i, (key, desc)) in KEYBINDS.iter().enumerate() {
        if i > 0 {
            right_spans.push(Span::styled("│", sep_style));
            right_spans.push(Span::styled(" ", desc_style));
        }
        right_spans.push(Span::styled(format!(" {} ", key), key_style));
        right_spans.push(Span::styled(format!(" {} ", desc), desc_style));
    }

    if let Some(badge) = position_badge(&data) {
        right_spans.push(Span::styled("│", sep_style));
        right_spans.push(Span::styled(
            format!(" {} ", badge.text()),
            Style::default()
                .bg(badge.color())
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ));
    }

    let right_paragraph = Paragraph::new(Line::from(right_spans))
        .style(bar)
        .alignment(Alignment::Right);

    frame.render_widget(right_paragraph, layout[1]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(current_step: usize, total_steps: usize, halted: bool) -> StatusRenderData<'static> {
        StatusRenderData {
            message: "",
            current_step,
            total_steps,
            halted,
            has_error: false,
            is_playing: false,
        }
    }

    #[test]
    fn test_position_badge() {
        assert_eq!(position_badge(&data(0, 10, false)), Some(PositionBadge::Start));
        assert_eq!(position_badge(&data(4, 10, false)), None);
        // a failed run ends short of halting
        assert_eq!(position_badge(&data(9, 10, false)), Some(PositionBadge::End));
        assert_eq!(position_badge(&data(9, 10, true)), Some(PositionBadge::Halted));

        let playing = StatusRenderData {
            is_playing: true,
            ..data(9, 10, true)
        };
        assert_eq!(position_badge(&playing), Some(PositionBadge::Playing));
    }
}
