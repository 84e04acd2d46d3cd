//! TUI pane rendering modules
//!
//! This module provides the rendering logic for all visual panes in the TUI,
//! organized by responsibility.
//!
//! # Pane Modules
//!
//! - [`program`]: instruction listing of the active frame with labels and the
//!   program counter
//! - [`stack`]: call stack with each frame's activation and alias bindings
//! - [`variables`]: the variable store, highlighting values the last step wrote
//! - [`status`]: status bar with keybindings and execution state
//!
//! # Architecture
//!
//! Each pane module exports a primary `render_*()` function taking the
//! machine by shared reference and the pane's scroll offset.

pub mod program;
pub mod stack;
pub mod status;
pub mod variables;

use crate::ui::theme::DEFAULT_THEME;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders};

// Re-export render functions for convenience
pub use program::render_program_pane;
pub use stack::render_stack_pane;
pub use status::{render_status_bar, StatusRenderData};
pub use variables::render_variables_pane;

/// Bordered block with the focus-dependent border style shared by all panes
pub(crate) fn pane_block(title: String, is_focused: bool) -> Block<'static> {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style)
}

/// Clamp `scroll_offset` so the visible window stays inside `total_items`
pub(crate) fn clamp_scroll(scroll_offset: &mut usize, total_items: usize, visible_height: usize) {
    if total_items > visible_height {
        *scroll_offset = (*scroll_offset).min(total_items - visible_height);
    } else {
        *scroll_offset = 0;
    }
}
