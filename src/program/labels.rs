//! Label resolution
//!
//! Turns a block of [`Instruction`]s into a flat, label-free list of
//! executable [`Op`]s plus a map from label name to the index of the
//! instruction that follows the label.
//!
//! # Namespace isolation
//!
//! Label names are not rewritten with a per-call suffix. A resolved [`Block`]
//! is immutable and shared by every activation of the macro it came from; the
//! frame executing it carries its own activation id, so the pair
//! `(activation, label)` is what identifies a label at run time. Two
//! activations of the same macro therefore never see each other's labels,
//! and a label can never collide with a user name that happens to look like
//! a suffixed one.

use super::instruction::Instruction;
use super::symbols::{Interner, Symbol};
use crate::interpreter::errors::MachineError;
use rustc_hash::FxHashMap;

/// Executable instruction with interned operands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Inc(Symbol),
    Dec(Symbol),
    Jnz(Symbol, Symbol),
    Call(Symbol, Vec<Symbol>),
}

/// A label-stripped instruction block with its label map
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Block {
    ops: Vec<Op>,
    source: Vec<Instruction>,
    labels: FxHashMap<Symbol, usize>,
}

impl Block {
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// The label-stripped instructions, index-aligned with [`Block::ops`]
    pub fn source(&self) -> &[Instruction] {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Index of the instruction following `label`, if the block defines it
    pub fn label(&self, label: Symbol) -> Option<usize> {
        self.labels.get(&label).copied()
    }

    pub fn labels(&self) -> impl Iterator<Item = (Symbol, usize)> + '_ {
        self.labels.iter().map(|(&sym, &idx)| (sym, idx))
    }

    /// Names of all macros called directly from this block
    pub fn called_macros(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.ops.iter().filter_map(|op| match op {
            Op::Call(name, _) => Some(*name),
            _ => None,
        })
    }
}

/// Strip labels from `instructions` and record where each one points.
///
/// `owner` names the block in error messages. A label defined twice in the
/// same block is a malformed program and fails with
/// [`MachineError::DuplicateLabel`].
pub fn resolve_labels(
    instructions: &[Instruction],
    owner: &str,
    interner: &mut Interner,
) -> Result<Block, MachineError> {
    let mut ops = Vec::with_capacity(instructions.len());
    let mut source = Vec::with_capacity(instructions.len());
    let mut labels = FxHashMap::default();

    for instr in instructions {
        let op = match instr {
            Instruction::Label(name) => {
                let sym = interner.intern(name);
                if labels.insert(sym, ops.len()).is_some() {
                    return Err(MachineError::DuplicateLabel {
                        label: name.clone(),
                        block: owner.to_string(),
                    });
                }
                continue;
            }
            Instruction::Inc(var) => Op::Inc(interner.intern(var)),
            Instruction::Dec(var) => Op::Dec(interner.intern(var)),
            Instruction::Jnz(var, label) => Op::Jnz(interner.intern(var), interner.intern(label)),
            Instruction::Call(name, args) => Op::Call(
                interner.intern(name),
                args.iter().map(|arg| interner.intern(arg)).collect(),
            ),
        };
        ops.push(op);
        source.push(instr.clone());
    }

    Ok(Block {
        ops,
        source,
        labels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_point_past_marker() {
        let mut interner = Interner::new();
        let block = resolve_labels(
            &[
                Instruction::label("A"),
                Instruction::dec("y"),
                Instruction::jnz("y", "A"),
                Instruction::label("E"),
            ],
            "zeros",
            &mut interner,
        )
        .unwrap();

        assert_eq!(block.len(), 2);
        assert_eq!(block.label(interner.intern("A")), Some(0));
        // A trailing label points one past the last instruction
        assert_eq!(block.label(interner.intern("E")), Some(2));
        assert!(block.source().iter().all(|i| !i.is_label()));
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let mut interner = Interner::new();
        let result = resolve_labels(
            &[
                Instruction::label("A"),
                Instruction::inc("x"),
                Instruction::label("A"),
            ],
            "broken",
            &mut interner,
        );

        match result {
            Err(MachineError::DuplicateLabel { label, block }) => {
                assert_eq!(label, "A");
                assert_eq!(block, "broken");
            }
            other => panic!("Expected DuplicateLabel, got {:?}", other),
        }
    }

    #[test]
    fn test_called_macros() {
        let mut interner = Interner::new();
        let block = resolve_labels(
            &[
                Instruction::call("equals", ["_y", "x1"]),
                Instruction::inc("x"),
                Instruction::call("goto", ["E"]),
            ],
            "add",
            &mut interner,
        )
        .unwrap();

        let called: Vec<&str> = block
            .called_macros()
            .map(|sym| interner.resolve(sym))
            .collect();
        assert_eq!(called, vec!["equals", "goto"]);
    }
}
