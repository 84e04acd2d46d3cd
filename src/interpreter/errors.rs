//! Error types for the counter machine
//!
//! This module defines [`MachineError`], which covers every failure a
//! machine operation can report: bad inputs, malformed macros or programs,
//! failed calls and jumps, budget exhaustion and history misuse.
//!
//! All errors are fail-fast. A failed `step` leaves the live state exactly as
//! it was before the instruction began; history recorded up to the failure
//! stays inspectable and rewindable.

use thiserror::Error;

/// Errors raised by machine operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    /// An input has an unusable name or a value that is not a natural number
    #[error("Input '{name}' is invalid: {reason}")]
    InvalidInput { name: String, reason: String },

    /// Macro call argument count differs from its parameter count
    #[error(
        "Macro '{name}' expects {expected} argument{}, got {got}",
        plural(.expected)
    )]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    /// Operation is neither a primitive nor a registered macro
    #[error("Unknown instruction '{name}'")]
    UnknownInstruction { name: String },

    /// Lookup of a macro that is not registered
    #[error("Unknown macro '{name}'")]
    UnknownMacro { name: String },

    /// Registration with overwrite disallowed on an existing name
    #[error("Macro '{name}' is already registered")]
    DuplicateMacro { name: String },

    /// Registration rejected by validation
    #[error("Invalid macro '{name}': {reason}")]
    InvalidMacro { name: String, reason: String },

    /// A label is defined more than once in the same block
    #[error("Label '{label}' is defined more than once in {block}")]
    DuplicateLabel { label: String, block: String },

    /// Jump target is not defined in any active frame
    #[error("Label '{label}' not found in any frame")]
    LabelNotFound { label: String },

    /// Step budget exhausted while the machine was still running
    #[error("Maximum step count of {limit} exceeded; possible undefined condition")]
    StepLimitExceeded { limit: usize },

    /// Rewind to a history position that does not exist
    #[error("Rewind index {index} out of range: history holds {len} snapshot{}", plural(.len))]
    RewindIndexOutOfRange { index: usize, len: usize },

    /// Snapshot history would exceed its memory budget
    #[error("Snapshot memory limit exceeded: {current} + {requested} > {limit} bytes")]
    SnapshotLimitExceeded {
        current: usize,
        requested: usize,
        limit: usize,
    },
}

fn plural(n: &usize) -> &'static str {
    if *n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = MachineError::ArityMismatch {
            name: "add".to_string(),
            expected: 3,
            got: 2,
        };
        assert_eq!(err.to_string(), "Macro 'add' expects 3 arguments, got 2");

        let err = MachineError::ArityMismatch {
            name: "zeros".to_string(),
            expected: 1,
            got: 0,
        };
        assert_eq!(err.to_string(), "Macro 'zeros' expects 1 argument, got 0");

        let err = MachineError::RewindIndexOutOfRange { index: 4, len: 1 };
        assert_eq!(
            err.to_string(),
            "Rewind index 4 out of range: history holds 1 snapshot"
        );
    }
}
