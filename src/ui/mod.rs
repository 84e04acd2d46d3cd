//! Terminal user interface built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The UI is organized into three layers:
//!
//! - **[`app`]** — application state, keyboard event loop, pane focus, playback
//! - **[`panes`]** — stateless render functions for each visible pane (program,
//!   call stack, variables, status bar)
//! - **[`theme`]** — centralized color palette used by all panes
//!
//! The entry point for consumers is [`App`]: construct it with a [`Machine`]
//! that has already run, and call [`App::run`] to browse its history.
//!
//! [`Machine`]: crate::interpreter::engine::Machine
//! [`App::run`]: app::App::run

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;
