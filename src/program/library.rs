//! Classic arithmetic macros built purely from the three primitives
//!
//! None of these are special to the engine; they are registered like any
//! user macro. Locals are prefixed with `_` by convention.

use super::instruction::{Instruction, MacroDef};

/// Unconditional jump to a label in the caller's block
pub fn goto() -> MacroDef {
    MacroDef::new(
        ["label"],
        vec![Instruction::inc("_z"), Instruction::jnz("_z", "label")],
    )
    .with_locals(["_z"])
}

/// `y = 0`
pub fn zeros() -> MacroDef {
    MacroDef::new(
        ["y"],
        vec![
            Instruction::label("A"),
            Instruction::dec("y"),
            Instruction::jnz("y", "A"),
        ],
    )
}

/// `y = x`, leaving `x` intact
pub fn equals() -> MacroDef {
    MacroDef::new(
        ["y", "x"],
        vec![
            Instruction::call("zeros", ["y"]),
            // drain x into y and _z
            Instruction::label("A"),
            Instruction::jnz("x", "B"),
            Instruction::call("goto", ["C"]),
            Instruction::label("B"),
            Instruction::dec("x"),
            Instruction::inc("y"),
            Instruction::inc("_z"),
            Instruction::call("goto", ["A"]),
            // refill x from _z
            Instruction::label("C"),
            Instruction::jnz("_z", "D"),
            Instruction::call("goto", ["E"]),
            Instruction::label("D"),
            Instruction::dec("_z"),
            Instruction::inc("x"),
            Instruction::call("goto", ["C"]),
            Instruction::label("E"),
        ],
    )
    .with_locals(["_z"])
}

/// `y = x1 + x2`
pub fn add() -> MacroDef {
    MacroDef::new(
        ["y", "x1", "x2"],
        vec![
            Instruction::call("equals", ["_y", "x1"]),
            Instruction::call("equals", ["_z", "x2"]),
            Instruction::label("B"),
            Instruction::jnz("_z", "A"),
            Instruction::call("goto", ["E"]),
            Instruction::label("A"),
            Instruction::dec("_z"),
            Instruction::inc("_y"),
            Instruction::call("goto", ["B"]),
            Instruction::label("E"),
            Instruction::call("equals", ["y", "_y"]),
        ],
    )
    .with_locals(["_z", "_y"])
}

/// `y = x1 - x2`, looping forever when `x2 > x1`
///
/// The loop is deliberate: there is no negative result to return, so the
/// step budget turns it into an error.
pub fn subtract() -> MacroDef {
    MacroDef::new(
        ["y", "x1", "x2"],
        vec![
            Instruction::call("equals", ["_y", "x1"]),
            Instruction::call("equals", ["_z", "x2"]),
            Instruction::label("C"),
            Instruction::jnz("_z", "A"),
            Instruction::call("goto", ["E"]),
            Instruction::label("A"),
            Instruction::jnz("_y", "B"),
            Instruction::call("goto", ["A"]),
            Instruction::label("B"),
            Instruction::dec("_y"),
            Instruction::dec("_z"),
            Instruction::call("goto", ["C"]),
            Instruction::label("E"),
            Instruction::call("equals", ["y", "_y"]),
        ],
    )
    .with_locals(["_z", "_y"])
}

/// `y = x1 * x2`
pub fn mul() -> MacroDef {
    MacroDef::new(
        ["y", "x1", "x2"],
        vec![
            Instruction::call("equals", ["_z2", "x2"]),
            Instruction::label("B"),
            Instruction::jnz("_z2", "A"),
            Instruction::call("goto", ["E"]),
            Instruction::label("A"),
            Instruction::dec("_z2"),
            Instruction::call("add", ["_z1", "x1", "_y"]),
            Instruction::call("equals", ["_y", "_z1"]),
            Instruction::call("goto", ["B"]),
            Instruction::label("E"),
            Instruction::call("equals", ["y", "_y"]),
        ],
    )
    .with_locals(["_z1", "_z2", "_y"])
}

/// `y = x!`, by recursion on `x - 1`
pub fn fact() -> MacroDef {
    MacroDef::new(
        ["y", "x"],
        vec![
            Instruction::call("zeros", ["_y"]),
            Instruction::call("equals", ["_z1", "x"]),
            Instruction::label("A"),
            Instruction::jnz("_z1", "B"),
            Instruction::inc("_y"),
            Instruction::call("goto", ["E"]),
            Instruction::label("B"),
            Instruction::dec("_z1"),
            Instruction::call("fact", ["_z2", "_z1"]),
            Instruction::call("mul", ["_y", "_z2", "x"]),
            Instruction::label("E"),
            Instruction::call("equals", ["y", "_y"]),
        ],
    )
    .with_locals(["_z1", "_z2", "_y"])
}

/// Every macro in the library, keyed by its conventional name
pub fn standard_macros() -> Vec<(&'static str, MacroDef)> {
    vec![
        ("goto", goto()),
        ("zeros", zeros()),
        ("equals", equals()),
        ("add", add()),
        ("subtract", subtract()),
        ("mul", mul()),
        ("fact", fact()),
    ]
}
