//! Name interning
//!
//! Variable, label and macro names are interned once when a block is compiled
//! so the engine works with small integer [`Symbol`]s instead of strings.

use rustc_hash::FxHashMap;

/// Interned name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(usize);

/// Append-only string table owned by a single machine
#[derive(Debug, Clone, Default)]
pub struct Interner {
    names: Vec<String>,
    index: FxHashMap<String, Symbol>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a name, returning the existing symbol if it was seen before
    pub fn intern(&mut self, name: &str) -> Symbol {
        if let Some(&sym) = self.index.get(name) {
            return sym;
        }
        let sym = Symbol(self.names.len());
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), sym);
        sym
    }

    /// Look up a name without interning it
    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.index.get(name).copied()
    }

    pub fn resolve(&self, sym: Symbol) -> &str {
        &self.names[sym.0]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_idempotent() {
        let mut interner = Interner::new();
        let a = interner.intern("x1");
        let b = interner.intern("x2");
        assert_ne!(a, b);
        assert_eq!(interner.intern("x1"), a);
        assert_eq!(interner.resolve(b), "x2");
        assert_eq!(interner.len(), 2);
        assert_eq!(interner.get("y"), None);
    }
}
