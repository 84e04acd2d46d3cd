//! Counter-machine execution engine
//!
//! This module provides the core execution logic:
//! - [`engine`]: the [`Machine`](engine::Machine) with its step/run loop and history
//! - [`calls`]: macro-call expansion into fresh frames
//! - [`jumps`]: label search across nested frames
//! - [`registry`]: the macro registry
//! - [`config`]: machine configuration and input parsing
//! - [`trace`]: human-readable step records
//! - [`errors`]: the error taxonomy
//!
//! # Execution Model
//!
//! `step` is the atomic unit of progress: one primitive, one jump, one macro
//! call (push) or one implicit return (pop). After every step a snapshot of
//! the variable store, call stack and step counter is appended to history.

pub mod calls;
pub mod config;
pub mod engine;
pub mod errors;
pub mod jumps;
pub mod registry;
pub mod trace;

pub use config::MachineConfig;
pub use engine::Machine;
pub use errors::MachineError;
