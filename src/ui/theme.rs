//! Colour palette shared by every pane

use ratatui::style::Color;

pub struct Theme {
    /// Plain text
    pub fg: Color,
    /// Accent for the step counter and alias targets
    pub primary: Color,
    /// Accent for the program-counter marker and playback
    pub secondary: Color,
    /// Dim text: indices, separators, placeholders
    pub comment: Color,
    pub success: Color,
    pub error: Color,
    /// `inc`, `dec` and `jnz`
    pub keyword: Color,
    pub label: Color,
    /// Variable values
    pub number: Color,
    pub border_focused: Color,
    pub border_normal: Color,
    /// Background of the highlighted instruction and the status bar
    pub current_line_bg: Color,
    /// Macro name of the active frame
    pub function: Color,
    /// Macro names further down the stack
    pub muted_function: Color,
    /// Values that differ from the parent history entry
    pub changed: Color,
}

pub const DEFAULT_THEME: Theme = Theme {
    fg: Color::Rgb(205, 214, 244),
    primary: Color::Rgb(137, 180, 250),
    secondary: Color::Rgb(250, 179, 135),
    comment: Color::Rgb(108, 112, 134),
    success: Color::Rgb(166, 227, 161),
    error: Color::Rgb(243, 139, 168),
    keyword: Color::Rgb(203, 166, 247),
    label: Color::Rgb(148, 226, 213),
    number: Color::Rgb(250, 179, 135),
    border_focused: Color::Rgb(249, 226, 175),
    border_normal: Color::Rgb(108, 112, 134),
    current_line_bg: Color::Rgb(50, 50, 70),
    function: Color::Rgb(249, 226, 175),
    muted_function: Color::Rgb(180, 165, 120),
    changed: Color::Rgb(245, 194, 231),
};
