//! Memory model for the counter machine
//!
//! This module provides the core state abstractions:
//! - [`variables`]: the flat store of non-negative counters and the table of
//!   storage cells (globals and per-activation locals)
//! - [`stack`]: call stack with frames, alias maps and activation ids
//!
//! # Sharing
//!
//! There is exactly one variable store per machine. Frames hold no values;
//! isolation between activations comes entirely from each frame's alias map
//! pointing its locals at cells nobody else can name.

pub mod stack;
pub mod variables;
