// Human-readable step records

use std::collections::BTreeMap;
use std::fmt;

/// Target used for step trace events
pub const TRACE_TARGET: &str = "tally::trace";

/// What the machine is about to do, captured just before a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    pub step: usize,
    pub depth: usize,
    pub pc: usize,
    /// The instruction at the program counter, or `return` when the frame is done
    pub instruction: String,
    pub variables: BTreeMap<String, u64>,
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "step={} depth={} pc={} instr={} vars={{",
            self.step, self.depth, self.pc, self.instruction
        )?;
        for (i, (name, value)) in self.variables.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        write!(f, "}}")
    }
}
