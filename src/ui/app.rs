//! Main TUI application state and logic

use crate::interpreter::engine::Machine;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Program,
    Stack,
    Variables,
}

impl FocusedPane {
    /// Move focus to the next pane (clockwise: program -> stack -> variables)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Program => FocusedPane::Stack,
            FocusedPane::Stack => FocusedPane::Variables,
            FocusedPane::Variables => FocusedPane::Program,
        }
    }

    /// Move focus to the previous pane (counter-clockwise)
    pub fn prev(self) -> Self {
        match self {
            FocusedPane::Program => FocusedPane::Variables,
            FocusedPane::Stack => FocusedPane::Program,
            FocusedPane::Variables => FocusedPane::Stack,
        }
    }
}

/// Something the user asked the viewer to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    /// Step forward up to n times
    Forward(usize),
    /// Step back to the parent history entry
    Backward,
    /// Cycle focus; `true` moves clockwise
    Focus(bool),
    Scroll(isize),
    TogglePlay,
    /// Jump to the last history entry
    End,
    /// Jump to the post-reset snapshot
    Start,
}

impl Action {
    pub fn from_key(code: KeyCode) -> Option<Self> {
        let action = match code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Action::Quit,
            KeyCode::Char(c @ '1'..='9') => Action::Forward(c as usize - '0' as usize),
            KeyCode::Right => Action::Forward(1),
            KeyCode::Left => Action::Backward,
            KeyCode::Tab => Action::Focus(true),
            KeyCode::BackTab => Action::Focus(false),
            KeyCode::Up => Action::Scroll(-1),
            KeyCode::Down => Action::Scroll(1),
            KeyCode::Char(' ') => Action::TogglePlay,
            KeyCode::Enter => Action::End,
            KeyCode::Backspace => Action::Start,
            _ => return None,
        };
        Some(action)
    }
}

/// The main application state
pub struct App {
    /// The machine whose history is being browsed
    pub machine: Machine,

    /// Currently focused pane
    pub focused_pane: FocusedPane,

    /// Per-pane scroll offsets
    pub program_scroll: usize,
    pub stack_scroll: usize,
    pub variables_scroll: usize,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,

    /// Error that ended the run, if any
    pub run_error: Option<String>,

    /// Whether auto-play mode is active
    pub is_playing: bool,

    /// Last time a step was taken in play mode
    pub last_play_time: Instant,

    /// Last time space was pressed (for debouncing)
    pub last_space_press: Instant,
}

impl App {
    /// Create a new app around a machine that has already been run
    pub fn new(machine: Machine, run_error: Option<String>) -> Self {
        let status_message = match &run_error {
            Some(err) => format!("Run failed: {}", err),
            None => String::from("Ready!"),
        };

        App {
            machine,
            focused_pane: FocusedPane::Program,
            program_scroll: 0,
            stack_scroll: 0,
            variables_scroll: 0,
            should_quit: false,
            status_message,
            run_error,
            is_playing: false,
            last_play_time: Instant::now(),
            last_space_press: Instant::now()
                .checked_sub(Duration::from_secs(1))
                .unwrap_or(Instant::now()),
        }
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            // Handle auto-play mode
            if self.is_playing && self.last_play_time.elapsed() >= Duration::from_millis(250) {
                if self.step_forward() {
                    self.status_message = "Playing...".to_string();
                } else {
                    self.is_playing = false;
                    self.status_message = "Playback complete".to_string();
                }
                self.last_play_time = Instant::now();
            }

            // Use poll with timeout to allow auto-play to work
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // 3 panes in 2 columns, plus status bar at bottom
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(main_chunks[0]);

        // Right column: Stack (top) | Variables (bottom)
        let right_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(columns[1]);

        super::panes::render_program_pane(
            frame,
            columns[0],
            &self.machine,
            self.focused_pane == FocusedPane::Program,
            &mut self.program_scroll,
        );

        super::panes::render_stack_pane(
            frame,
            right_rows[0],
            &self.machine,
            self.focused_pane == FocusedPane::Stack,
            &mut self.stack_scroll,
        );

        super::panes::render_variables_pane(
            frame,
            right_rows[1],
            &self.machine,
            self.focused_pane == FocusedPane::Variables,
            &mut self.variables_scroll,
        );

        super::panes::render_status_bar(
            frame,
            main_chunks[1],
            super::panes::StatusRenderData {
                message: &self.status_message,
                current_step: self.machine.history_position(),
                total_steps: self.machine.history_len(),
                halted: self.machine.is_halted(),
                has_error: self.run_error.is_some(),
                is_playing: self.is_playing,
            },
        );
    }

    /// Handle keyboard events
    fn handle_key_event(&mut self, key: KeyEvent) {
        if let Some(action) = Action::from_key(key.code) {
            self.apply(action);
        }
    }

    /// Perform one viewer action
    pub fn apply(&mut self, action: Action) {
        if !matches!(action, Action::TogglePlay | Action::Scroll(_) | Action::Focus(_)) {
            self.is_playing = false;
        }

        match action {
            Action::Quit => self.should_quit = true,
            Action::Forward(n) => {
                let stepped = (0..n).take_while(|_| self.step_forward()).count();
                self.status_message = match (n, stepped) {
                    (1, 1) => "Stepped forward".to_string(),
                    (_, 0) => "Execution finished".to_string(),
                    _ => format!("Stepped forward {} step(s)", stepped),
                };
            }
            Action::Backward => {
                self.status_message = if self.step_backward() {
                    "Stepped backward".to_string()
                } else {
                    "Already at the beginning of execution".to_string()
                };
            }
            Action::Focus(forward) => {
                self.focused_pane = if forward {
                    self.focused_pane.next()
                } else {
                    self.focused_pane.prev()
                };
            }
            Action::Scroll(delta) => {
                let scroll = self.focused_scroll();
                *scroll = scroll.saturating_add_signed(delta);
            }
            Action::TogglePlay => {
                // debounce key repeat
                if self.last_space_press.elapsed() >= Duration::from_millis(200) {
                    self.last_space_press = Instant::now();
                    self.is_playing = !self.is_playing;
                    if self.is_playing {
                        self.last_play_time = Instant::now()
                            .checked_sub(Duration::from_secs(1))
                            .unwrap_or(Instant::now());
                        self.status_message = "Playing...".to_string();
                    } else {
                        self.status_message = "Paused".to_string();
                    }
                }
            }
            Action::End => {
                let last = self.machine.history_len().saturating_sub(1);
                self.rewind(last, "Jumped to end");
            }
            Action::Start => self.rewind(0, "Jumped to start"),
        }
    }

    fn focused_scroll(&mut self) -> &mut usize {
        match self.focused_pane {
            FocusedPane::Program => &mut self.program_scroll,
            FocusedPane::Stack => &mut self.stack_scroll,
            FocusedPane::Variables => &mut self.variables_scroll,
        }
    }

    fn rewind(&mut self, index: usize, message: &str) {
        self.status_message = match self.machine.rewind(index) {
            Ok(()) => message.to_string(),
            Err(e) => format!("Error: {}", e),
        };
    }

    /// Move one step forward: replay recorded history, or execute a new
    /// step once the end of history is reached.
    ///
    /// Returns whether the position moved.
    fn step_forward(&mut self) -> bool {
        let next = self.machine.history_position() + 1;
        if next < self.machine.history_len() {
            return self.machine.rewind(next).is_ok();
        }
        if self.run_error.is_some() || self.machine.is_halted() {
            return false;
        }
        match self.machine.step(false) {
            Ok(_) => true,
            Err(e) => {
                let message = e.to_string();
                self.status_message = format!("Error: {}", message);
                self.run_error = Some(message);
                false
            }
        }
    }

    /// Move back to the entry the current one was stepped from
    fn step_backward(&mut self) -> bool {
        let position = self.machine.history_position();
        match self.machine.history_parent(position) {
            Some(parent) => self.machine.rewind(parent).is_ok(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{library, Instruction};

    fn ran_app() -> App {
        let mut machine = Machine::new();
        machine
            .register_macros(library::standard_macros(), false)
            .unwrap();
        machine.set_inputs([("x1", 1), ("x2", 1)]);
        machine
            .set_program(vec![Instruction::call("add", ["y", "x1", "x2"])])
            .unwrap();
        machine.run(100_000, false).unwrap();
        machine.rewind_to_start().unwrap();
        App::new(machine, None)
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(Action::from_key(KeyCode::Char('3')), Some(Action::Forward(3)));
        assert_eq!(Action::from_key(KeyCode::Right), Some(Action::Forward(1)));
        assert_eq!(Action::from_key(KeyCode::Esc), Some(Action::Quit));
        assert_eq!(Action::from_key(KeyCode::Char('x')), None);
    }

    #[test]
    fn test_forward_and_backward_walk_history() {
        let mut app = ran_app();
        let len = app.machine.history_len();

        app.apply(Action::Forward(3));
        assert_eq!(app.machine.history_position(), 3);
        app.apply(Action::Backward);
        assert_eq!(app.machine.history_position(), 2);

        app.apply(Action::End);
        assert_eq!(app.machine.history_position(), len - 1);
        app.apply(Action::Forward(1));
        assert_eq!(app.status_message, "Execution finished");
        // replaying recorded history never grows it
        assert_eq!(app.machine.history_len(), len);

        app.apply(Action::Start);
        app.apply(Action::Backward);
        assert_eq!(app.status_message, "Already at the beginning of execution");
    }

    #[test]
    fn test_focus_cycles() {
        let mut app = ran_app();
        app.apply(Action::Focus(true));
        assert_eq!(app.focused_pane, FocusedPane::Stack);
        app.apply(Action::Focus(false));
        app.apply(Action::Focus(false));
        assert_eq!(app.focused_pane, FocusedPane::Variables);
    }
}
