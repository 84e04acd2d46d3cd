// Machine configuration and input parsing

use crate::interpreter::errors::MachineError;

/// Default step budget for `run`
pub const DEFAULT_MAX_STEPS: usize = 100_000;

/// Default snapshot history budget (256 MiB)
pub const DEFAULT_SNAPSHOT_LIMIT: usize = 256 * 1024 * 1024;

/// Conventional name of the result variable
pub const DEFAULT_OUTPUT_VARIABLE: &str = "y";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineConfig {
    /// Step budget used by [`Machine::run_default`](crate::interpreter::engine::Machine::run_default)
    pub max_steps: usize,
    /// Upper bound on the estimated size of the snapshot history, in bytes
    pub snapshot_memory_limit: usize,
    /// Variable zeroed by `reset` and returned by `run`
    pub output_variable: String,
}

impl Default for MachineConfig {
    fn default() -> Self {
        MachineConfig {
            max_steps: DEFAULT_MAX_STEPS,
            snapshot_memory_limit: DEFAULT_SNAPSHOT_LIMIT,
            output_variable: DEFAULT_OUTPUT_VARIABLE.to_string(),
        }
    }
}

/// Parse a `name=value` input assignment
///
/// The value must be a natural number; anything else (including negative
/// numbers) fails with [`MachineError::InvalidInput`].
pub fn parse_input(assignment: &str) -> Result<(String, u64), MachineError> {
    let (name, value) = assignment
        .split_once('=')
        .ok_or_else(|| MachineError::InvalidInput {
            name: assignment.to_string(),
            reason: "expected NAME=VALUE".to_string(),
        })?;
    let name = name.trim();
    check_input_name(name)?;

    let value = value.trim();
    let parsed = value.parse::<u64>().map_err(|_| MachineError::InvalidInput {
        name: name.to_string(),
        reason: format!("'{}' is not a non-negative integer", value),
    })?;
    Ok((name.to_string(), parsed))
}

/// Input names must be non-empty and free of whitespace
pub fn check_input_name(name: &str) -> Result<(), MachineError> {
    if name.is_empty() {
        return Err(MachineError::InvalidInput {
            name: name.to_string(),
            reason: "name is empty".to_string(),
        });
    }
    if name.chars().any(char::is_whitespace) {
        return Err(MachineError::InvalidInput {
            name: name.to_string(),
            reason: "name contains whitespace".to_string(),
        });
    }
    Ok(())
}
