//! Program pane rendering
//!
//! Shows the block the active frame is executing: the root program or the
//! body of the macro activation on top of the stack. Labels are listed at
//! the position they point to, and the instruction at the program counter is
//! highlighted. When the program counter has run off the end of the block
//! the pane shows the pending implicit return instead.

use super::{clamp_scroll, pane_block};
use crate::interpreter::engine::Machine;
use crate::program::instruction::Instruction;
use crate::program::labels::Block;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
    Frame,
};

/// Render the program pane
pub fn render_program_pane(
    frame: &mut Frame,
    area: Rect,
    machine: &Machine,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let Some(active) = machine.stack().current_frame() else {
        let block = pane_block(" Program ".to_string(), is_focused);
        let paragraph = Paragraph::new(format!("(halted, y = {})", machine.output()))
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    };

    let title = format!(" {} ", machine.frame_name(active));
    let block = pane_block(title, is_focused);

    let (lines, current_row) = listing(active.block(), active.pc(), machine);

    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    // keep the current instruction on screen
    if current_row < *scroll_offset {
        *scroll_offset = current_row;
    } else if current_row >= *scroll_offset + visible_height {
        *scroll_offset = current_row + 1 - visible_height;
    }
    clamp_scroll(scroll_offset, lines.len(), visible_height);

    let items: Vec<ListItem> = lines
        .into_iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .map(ListItem::new)
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

/// Build the listing lines and the row index of the program counter
fn listing(block: &Block, pc: usize, machine: &Machine) -> (Vec<Line<'static>>, usize) {
    let mut labels: Vec<(usize, &str)> = block
        .labels()
        .map(|(sym, idx)| (idx, machine.symbols().resolve(sym)))
        .collect();
    labels.sort();
    let mut labels = labels.into_iter().peekable();

    let mut lines = Vec::new();
    let mut current_row = 0;

    for idx in 0..=block.len() {
        while let Some((_, name)) = labels.next_if(|(at, _)| *at == idx) {
            lines.push(Line::from(Span::styled(
                format!("{}:", name),
                Style::default().fg(DEFAULT_THEME.label),
            )));
        }

        let is_current = idx == pc;
        if is_current {
            current_row = lines.len();
        }

        let mut spans = vec![
            Span::styled(
                format!("{:>4} ", idx),
                Style::default().fg(DEFAULT_THEME.comment),
            ),
            Span::styled(
                if is_current { "▶ " } else { "  " },
                Style::default().fg(DEFAULT_THEME.secondary),
            ),
        ];

        match block.source().get(idx) {
            Some(instr) => spans.extend(instruction_spans(instr)),
            None if is_current => spans.push(Span::styled(
                "↩ return",
                Style::default().fg(DEFAULT_THEME.muted_function),
            )),
            None => break,
        }

        let mut line = Line::from(spans);
        if is_current {
            line = line.style(
                Style::default()
                    .bg(DEFAULT_THEME.current_line_bg)
                    .add_modifier(Modifier::BOLD),
            );
        }
        lines.push(line);
    }

    (lines, current_row)
}

fn instruction_spans(instr: &Instruction) -> Vec<Span<'static>> {
    let keyword = Style::default().fg(DEFAULT_THEME.keyword);
    let operand = Style::default().fg(DEFAULT_THEME.fg);
    let label = Style::default().fg(DEFAULT_THEME.label);

    match instr {
        Instruction::Inc(var) => vec![
            Span::styled("inc ", keyword),
            Span::styled(var.clone(), operand),
        ],
        Instruction::Dec(var) => vec![
            Span::styled("dec ", keyword),
            Span::styled(var.clone(), operand),
        ],
        Instruction::Jnz(var, target) => vec![
            Span::styled("jnz ", keyword),
            Span::styled(format!("{} ", var), operand),
            Span::styled(target.clone(), label),
        ],
        Instruction::Label(name) => vec![Span::styled(format!("{}:", name), label)],
        Instruction::Call(name, args) => vec![
            Span::styled(
                name.clone(),
                Style::default()
                    .fg(DEFAULT_THEME.function)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("({})", args.join(", ")), operand),
        ],
    }
}
