//! Macro registry
//!
//! Maps macro names to their definitions. Each definition is validated and
//! compiled once at registration: names are interned and labels resolved, so
//! a call only has to bind arguments and push a frame.

use crate::interpreter::errors::MachineError;
use crate::program::instruction::MacroDef;
use crate::program::labels::{resolve_labels, Block};
use crate::program::symbols::{Interner, Symbol};
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;
use tracing::debug;

/// A registered macro in executable form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledMacro {
    pub params: Vec<Symbol>,
    pub locals: Vec<Symbol>,
    pub block: Rc<Block>,
}

#[derive(Debug, Clone)]
struct MacroEntry {
    def: MacroDef,
    compiled: Rc<CompiledMacro>,
}

/// Name → macro definition, listed in lexicographic order
#[derive(Debug, Clone, Default)]
pub struct MacroRegistry {
    macros: BTreeMap<String, MacroEntry>,
}

impl MacroRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate, compile and insert a macro.
    ///
    /// Fails with [`MachineError::DuplicateMacro`] when `name` exists and
    /// `overwrite` is false; with [`MachineError::InvalidMacro`] or
    /// [`MachineError::DuplicateLabel`] when the definition is malformed.
    /// A failed registration leaves the registry untouched.
    pub fn register(
        &mut self,
        interner: &mut Interner,
        name: &str,
        def: MacroDef,
        overwrite: bool,
    ) -> Result<(), MachineError> {
        if !overwrite && self.macros.contains_key(name) {
            return Err(MachineError::DuplicateMacro {
                name: name.to_string(),
            });
        }
        validate(name, &def)?;

        let block = resolve_labels(&def.body, name, interner)?;
        let compiled = CompiledMacro {
            params: def.params.iter().map(|p| interner.intern(p)).collect(),
            locals: def.locals.iter().map(|l| interner.intern(l)).collect(),
            block: Rc::new(block),
        };
        interner.intern(name);

        let replaced = self
            .macros
            .insert(
                name.to_string(),
                MacroEntry {
                    def,
                    compiled: Rc::new(compiled),
                },
            )
            .is_some();
        debug!(name, replaced, "registered macro");
        Ok(())
    }

    /// The definition registered under `name`
    pub fn lookup(&self, name: &str) -> Result<&MacroDef, MachineError> {
        self.macros
            .get(name)
            .map(|entry| &entry.def)
            .ok_or_else(|| MachineError::UnknownMacro {
                name: name.to_string(),
            })
    }

    /// The executable form of `name`, if registered
    pub fn compiled(&self, name: &str) -> Option<Rc<CompiledMacro>> {
        self.macros.get(name).map(|entry| Rc::clone(&entry.compiled))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    /// Remove `name`; a no-op if it is not registered
    pub fn remove(&mut self, name: &str) -> bool {
        let removed = self.macros.remove(name).is_some();
        if removed {
            debug!(name, "removed macro");
        }
        removed
    }

    /// Registered names in lexicographic order
    pub fn list(&self) -> Vec<String> {
        self.macros.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MacroDef)> + '_ {
        self.macros
            .iter()
            .map(|(name, entry)| (name.as_str(), &entry.def))
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}

fn validate(name: &str, def: &MacroDef) -> Result<(), MachineError> {
    let invalid = |reason: String| MachineError::InvalidMacro {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("macro name is empty".to_string()));
    }
    if def.body.is_empty() {
        return Err(invalid("body is empty".to_string()));
    }

    let mut params = HashSet::new();
    for param in &def.params {
        if param.is_empty() {
            return Err(invalid("parameter name is empty".to_string()));
        }
        if !params.insert(param.as_str()) {
            return Err(invalid(format!("parameter '{}' is declared twice", param)));
        }
    }

    let mut locals = HashSet::new();
    for local in &def.locals {
        if local.is_empty() {
            return Err(invalid("local name is empty".to_string()));
        }
        if params.contains(local.as_str()) {
            return Err(invalid(format!(
                "'{}' is declared as both parameter and local",
                local
            )));
        }
        if !locals.insert(local.as_str()) {
            return Err(invalid(format!("local '{}' is declared twice", local)));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::instruction::Instruction;
    use crate::program::library;

    fn registry_with(names: &[(&str, MacroDef)]) -> (MacroRegistry, Interner) {
        let mut registry = MacroRegistry::new();
        let mut interner = Interner::new();
        for (name, def) in names {
            registry
                .register(&mut interner, name, def.clone(), false)
                .unwrap();
        }
        (registry, interner)
    }

    #[test]
    fn test_register_and_lookup() {
        let (registry, _) = registry_with(&[("zeros", library::zeros())]);
        assert_eq!(registry.lookup("zeros").unwrap(), &library::zeros());
        assert!(registry.compiled("zeros").is_some());
        assert!(matches!(
            registry.lookup("nope"),
            Err(MachineError::UnknownMacro { .. })
        ));
    }

    #[test]
    fn test_duplicate_guard() {
        let (mut registry, mut interner) = registry_with(&[("zeros", library::zeros())]);
        let replacement = MacroDef::new(["y"], vec![Instruction::dec("y")]);

        let result = registry.register(&mut interner, "zeros", replacement.clone(), false);
        assert_eq!(
            result,
            Err(MachineError::DuplicateMacro {
                name: "zeros".to_string()
            })
        );
        assert_eq!(registry.lookup("zeros").unwrap(), &library::zeros());

        registry
            .register(&mut interner, "zeros", replacement.clone(), true)
            .unwrap();
        assert_eq!(registry.lookup("zeros").unwrap(), &replacement);
    }

    #[test]
    fn test_list_is_sorted_and_remove_is_idempotent() {
        let (mut registry, _) = registry_with(&[
            ("zeros", library::zeros()),
            ("goto", library::goto()),
            ("equals", library::equals()),
        ]);
        assert_eq!(registry.list(), vec!["equals", "goto", "zeros"]);

        assert!(registry.remove("goto"));
        assert!(!registry.remove("goto"));
        assert_eq!(registry.list(), vec!["equals", "zeros"]);
    }

    #[test]
    fn test_validation() {
        let mut registry = MacroRegistry::new();
        let mut interner = Interner::new();
        let body = vec![Instruction::inc("y")];

        let cases = vec![
            ("", MacroDef::new(["y"], body.clone())),
            ("empty", MacroDef::new(["y"], Vec::new())),
            ("twice", MacroDef::new(["y", "y"], body.clone())),
            (
                "overlap",
                MacroDef::new(["y"], body.clone()).with_locals(["y"]),
            ),
            (
                "locals",
                MacroDef::new(["y"], body.clone()).with_locals(["_z", "_z"]),
            ),
        ];

        for (name, def) in cases {
            let result = registry.register(&mut interner, name, def, false);
            assert!(
                matches!(result, Err(MachineError::InvalidMacro { .. })),
                "{:?} should be rejected, got {:?}",
                name,
                result
            );
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_label_in_body() {
        let mut registry = MacroRegistry::new();
        let mut interner = Interner::new();
        let def = MacroDef::new(
            ["y"],
            vec![
                Instruction::label("A"),
                Instruction::dec("y"),
                Instruction::label("A"),
            ],
        );
        assert!(matches!(
            registry.register(&mut interner, "bad", def, false),
            Err(MachineError::DuplicateLabel { .. })
        ));
        assert!(!registry.contains("bad"));
    }
}
