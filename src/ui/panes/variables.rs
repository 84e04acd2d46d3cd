//! Variable store pane rendering

use super::{clamp_scroll, pane_block};
use crate::interpreter::engine::Machine;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
    Frame,
};
use std::collections::BTreeMap;

/// Render the variables pane, marking values that differ from the previous
/// history entry
pub fn render_variables_pane(
    frame: &mut Frame,
    area: Rect,
    machine: &Machine,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = pane_block(" Variables ".to_string(), is_focused);
    let current = machine.variables();

    if current.is_empty() {
        let paragraph = Paragraph::new("(no variables)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    }

    let previous: BTreeMap<String, u64> = machine
        .history_parent(machine.history_position())
        .and_then(|parent| machine.history(parent))
        .map(|snapshot| machine.variables_of(snapshot))
        .unwrap_or_default();
    let width = current.keys().map(|name| name.len()).max().unwrap_or(0);

    let all_items: Vec<ListItem> = current
        .iter()
        .map(|(name, value)| {
            let changed = previous.get(name) != Some(value) && !previous.is_empty();
            let value_style = if changed {
                Style::default()
                    .fg(DEFAULT_THEME.changed)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DEFAULT_THEME.number)
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    if changed { "● " } else { "  " },
                    Style::default().fg(DEFAULT_THEME.changed),
                ),
                Span::styled(
                    format!("{:<width$}", name, width = width),
                    Style::default().fg(DEFAULT_THEME.fg),
                ),
                Span::styled(" = ", Style::default().fg(DEFAULT_THEME.comment)),
                Span::styled(value.to_string(), value_style),
            ]))
        })
        .collect();

    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    clamp_scroll(scroll_offset, all_items.len(), visible_height);

    let visible_items: Vec<ListItem> = all_items
        .into_iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}
