use crate::interpreter::engine::Machine;
use crate::interpreter::errors::MachineError;
use crate::memory::stack::CallStack;
use crate::program::symbols::Symbol;
use tracing::debug;

/// Find `label`, searching the active frame first and then each enclosing
/// frame outward.
///
/// Returns the index of the first frame that defines it and the program
/// counter the label points to. Frames are strictly nested, so at most one
/// frame per depth can match.
pub fn find_label(stack: &CallStack, label: Symbol) -> Option<(usize, usize)> {
    stack
        .frames()
        .iter()
        .enumerate()
        .rev()
        .find_map(|(index, frame)| frame.block().label(label).map(|pc| (index, pc)))
}

impl Machine {
    /// Transfer control to `label`.
    ///
    /// Frames above the one that defines the label are discarded, which is
    /// how a `goto`-style macro jumps back into its caller's block.
    pub(crate) fn jump(&mut self, label: Symbol) -> Result<(), MachineError> {
        let (index, pc) =
            find_label(&self.stack, label).ok_or_else(|| MachineError::LabelNotFound {
                label: self.symbols.resolve(label).to_string(),
            })?;

        let dropped = self.stack.unwind_to(index);
        if let Some(frame) = self.stack.current_frame_mut() {
            frame.jump_to(pc);
        }

        if dropped > 0 {
            debug!(
                label = self.symbols.resolve(label),
                dropped,
                depth = self.stack.depth(),
                "jump unwound frames"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::stack::{ActivationId, AliasMap, Frame};
    use crate::program::instruction::Instruction;
    use crate::program::labels::resolve_labels;
    use crate::program::symbols::Interner;
    use std::rc::Rc;

    #[test]
    fn test_innermost_frame_wins() {
        let mut interner = Interner::new();
        let outer = resolve_labels(
            &[
                Instruction::inc("x"),
                Instruction::label("A"),
                Instruction::inc("x"),
            ],
            "outer",
            &mut interner,
        )
        .unwrap();
        let inner = resolve_labels(
            &[Instruction::label("A"), Instruction::dec("x")],
            "inner",
            &mut interner,
        )
        .unwrap();
        let label_a = interner.intern("A");
        let name = interner.intern("inner");

        let mut stack = CallStack::new();
        stack.push_frame(Frame::root(Rc::new(outer)));
        stack.push_frame(Frame::call(
            name,
            Rc::new(inner),
            ActivationId::new(1),
            AliasMap::new(),
        ));

        assert_eq!(find_label(&stack, label_a), Some((1, 0)));
        assert_eq!(find_label(&stack, interner.intern("B")), None);

        stack.pop_frame();
        assert_eq!(find_label(&stack, label_a), Some((0, 1)));
    }
}
