//! Call stack pane rendering
//!
//! Each frame is displayed outermost first:
//! - frame index, macro name with activation id, program counter
//! - the frame's alias bindings (formal or local name → real variable)

use super::{clamp_scroll, pane_block};
use crate::interpreter::engine::Machine;
use crate::memory::stack::Binding;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
    Frame,
};

/// Render the stack pane
pub fn render_stack_pane(
    frame: &mut Frame,
    area: Rect,
    machine: &Machine,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = pane_block(
        format!(" Call Stack (depth {}) ", machine.depth()),
        is_focused,
    );

    let frames = machine.stack().frames();
    let mut all_items = Vec::new();

    if frames.is_empty() {
        all_items.push(ListItem::new("(empty)").style(Style::default().fg(DEFAULT_THEME.comment)));
    }

    for (depth, stack_frame) in frames.iter().enumerate() {
        let is_top = depth + 1 == frames.len();
        let name_style = if is_top {
            Style::default()
                .fg(DEFAULT_THEME.function)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(DEFAULT_THEME.muted_function)
        };

        all_items.push(ListItem::new(Line::from(vec![
            Span::styled("▸ ", Style::default().fg(DEFAULT_THEME.secondary)),
            Span::styled(
                format!("Frame {} ", depth),
                Style::default().fg(DEFAULT_THEME.comment),
            ),
            Span::styled("│ ", Style::default().fg(DEFAULT_THEME.comment)),
            Span::styled(machine.frame_name(stack_frame), name_style),
            Span::styled(
                format!("  pc={}", stack_frame.pc()),
                Style::default().fg(DEFAULT_THEME.number),
            ),
        ])));

        let mut bindings: Vec<(String, String)> = stack_frame
            .aliases()
            .iter()
            .map(|(name, binding)| {
                let target = match binding {
                    Binding::Global(global) => machine.symbols().resolve(global).to_string(),
                    Binding::Local { var, .. } => {
                        machine.var_table().display_name(var, machine.symbols())
                    }
                };
                (machine.symbols().resolve(name).to_string(), target)
            })
            .collect();
        bindings.sort();

        for (name, target) in bindings {
            all_items.push(ListItem::new(Line::from(vec![
                Span::raw("    "),
                Span::styled(name, Style::default().fg(DEFAULT_THEME.fg)),
                Span::styled(" → ", Style::default().fg(DEFAULT_THEME.comment)),
                Span::styled(target, Style::default().fg(DEFAULT_THEME.primary)),
            ])));
        }
    }

    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    clamp_scroll(scroll_offset, all_items.len(), visible_height);

    let visible_items: Vec<ListItem> = all_items
        .into_iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}
