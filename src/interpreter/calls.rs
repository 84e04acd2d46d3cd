use crate::interpreter::engine::Machine;
use crate::interpreter::errors::MachineError;
use crate::memory::stack::{AliasMap, Binding, Frame};
use crate::program::symbols::Symbol;
use std::rc::Rc;
use tracing::debug;

impl Machine {
    /// Expand a macro call into a fresh frame on top of the caller.
    ///
    /// Every check runs before anything is mutated, so a failed call leaves
    /// the machine exactly as it was.
    pub(crate) fn expand_call(&mut self, name: Symbol, args: &[Symbol]) -> Result<(), MachineError> {
        let macro_name = self.symbols.resolve(name).to_string();
        let compiled =
            self.registry
                .compiled(&macro_name)
                .ok_or_else(|| MachineError::UnknownInstruction {
                    name: macro_name.clone(),
                })?;

        if args.len() != compiled.params.len() {
            return Err(MachineError::ArityMismatch {
                name: macro_name,
                expected: compiled.params.len(),
                got: args.len(),
            });
        }

        let activation = self.activations.next_id();
        let mut aliases = AliasMap::new();

        // formals see the caller's resolution of each argument
        for (&formal, &actual) in compiled.params.iter().zip(args) {
            let binding = match self.stack.current_frame() {
                Some(caller) => caller.aliases().resolve(actual),
                None => Binding::Global(actual),
            };
            aliases.bind(formal, binding);
        }
        for &local in &compiled.locals {
            let var = self.var_table.fresh_local(local, activation);
            aliases.bind(local, Binding::Local { var, name: local });
        }

        let frame = Frame::call(name, Rc::clone(&compiled.block), activation, aliases);
        if let Some(caller) = self.stack.current_frame_mut() {
            caller.advance();
        }
        self.stack.push_frame(frame);

        debug!(
            name = macro_name.as_str(),
            activation = activation.get(),
            depth = self.stack.depth(),
            "macro call"
        );
        Ok(())
    }
}
