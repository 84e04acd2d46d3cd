//! # Introduction
//!
//! tally executes programs for a minimal counter machine (increment,
//! decrement floored at zero, jump if non-zero) extended with named,
//! parameterised and possibly recursive macros. Every step captures a
//! snapshot of the full machine state, and execution can be rewound to any
//! earlier snapshot and stepped forward again.
//!
//! ## Execution pipeline
//!
//! ```text
//! Instructions + Macros → Label resolution → Machine (step/run) → Snapshots → TUI
//! ```
//!
//! 1. [`program`] — structured [`program::Instruction`]s, macro definitions,
//!    label resolution and a library of arithmetic macros.
//! 2. [`interpreter`] — the [`interpreter::Machine`]: macro registry, call
//!    expansion, label search across frames, the step loop and rewind.
//! 3. [`memory`] — the shared variable store and the call stack of frames.
//! 4. [`snapshot`] — immutable snapshots and the append-only history.
//! 5. [`ui`] — ratatui-based time-travel viewer; not part of the stable
//!    library API.
//!
//! ## Example
//!
//! ```
//! use tally::interpreter::Machine;
//! use tally::program::{library, Instruction};
//!
//! let mut machine = Machine::new();
//! machine.register_macros(library::standard_macros(), false).unwrap();
//! machine.set_inputs([("x1", 2), ("x2", 3)]);
//! machine
//!     .set_program(vec![Instruction::call("add", ["y", "x1", "x2"])])
//!     .unwrap();
//!
//! assert_eq!(machine.run(100_000, false).unwrap(), 5);
//!
//! machine.rewind(0).unwrap();
//! assert_eq!(machine.value("y"), 0);
//! ```

pub mod interpreter;
pub mod memory;
pub mod program;
pub mod snapshot;
pub mod ui;
