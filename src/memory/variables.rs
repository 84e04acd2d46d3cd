//! Variable storage
//!
//! All frames share one flat store of non-negative counters. Frames never own
//! storage of their own: a macro's formals and locals reach the store only
//! through the frame's alias map.
//!
//! Variables are identified by [`VarId`]. Program-level names map to one
//! global id each; every activation of a macro gets brand-new ids for its
//! locals, so two activations can never alias each other's locals no matter
//! what the user names their variables.
//!
//! # Snapshots
//!
//! Locals are never destroyed, so the store only grows over a run. It is
//! kept as a copy-on-write trie indexed by [`VarId`]: cloning it for a
//! snapshot bumps one reference count, and a write copies only the nodes on
//! the path to the written cell.

use crate::memory::stack::ActivationId;
use crate::program::symbols::{Interner, Symbol};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fmt;
use std::mem::size_of;
use std::rc::Rc;

/// Identity of one storage cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

#[derive(Debug, Clone)]
struct VarEntry {
    name: Symbol,
    activation: Option<ActivationId>,
}

/// Append-only registry of every storage cell a machine has created
#[derive(Debug, Clone, Default)]
pub struct VarTable {
    entries: Vec<VarEntry>,
    globals: FxHashMap<Symbol, VarId>,
}

impl VarTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The global variable called `name`, created on first use
    pub fn global(&mut self, name: Symbol) -> VarId {
        if let Some(&id) = self.globals.get(&name) {
            return id;
        }
        let id = self.push(name, None);
        self.globals.insert(name, id);
        id
    }

    pub fn lookup_global(&self, name: Symbol) -> Option<VarId> {
        self.globals.get(&name).copied()
    }

    /// A fresh cell for local `name` of one macro activation
    pub fn fresh_local(&mut self, name: Symbol, activation: ActivationId) -> VarId {
        self.push(name, Some(activation))
    }

    fn push(&mut self, name: Symbol, activation: Option<ActivationId>) -> VarId {
        let id = VarId(self.entries.len());
        self.entries.push(VarEntry { name, activation });
        id
    }

    /// Declared name of the variable, without activation qualifier
    pub fn name(&self, id: VarId) -> Symbol {
        self.entries[id.0].name
    }

    /// Activation that owns the variable; `None` for globals
    pub fn activation(&self, id: VarId) -> Option<ActivationId> {
        self.entries[id.0].activation
    }

    /// Human-readable name: `x1` for globals, `_z#7` for a local of activation 7
    pub fn display_name(&self, id: VarId, interner: &Interner) -> String {
        let entry = &self.entries[id.0];
        let base = interner.resolve(entry.name);
        match entry.activation {
            Some(activation) => format!("{}#{}", base, activation.get()),
            None => base.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

const BITS: u32 = 5;
const WIDTH: usize = 1 << BITS;
const MASK: usize = WIDTH - 1;

#[derive(Clone)]
enum Node {
    Leaf([Option<u64>; WIDTH]),
    Branch([Option<Rc<Node>>; WIDTH]),
}

impl Node {
    fn empty(level: u32) -> Self {
        if level == 0 {
            Node::Leaf([None; WIDTH])
        } else {
            Node::Branch(Default::default())
        }
    }

    fn get(&self, level: u32, index: usize) -> Option<u64> {
        let slot = (index >> (level * BITS)) & MASK;
        match self {
            Node::Leaf(values) => values[slot],
            Node::Branch(children) => children[slot].as_ref()?.get(level - 1, index),
        }
    }

    fn collect(&self, base: usize, level: u32, out: &mut Vec<(VarId, u64)>) {
        match self {
            Node::Leaf(values) => out.extend(
                values
                    .iter()
                    .enumerate()
                    .filter_map(|(slot, value)| value.map(|v| (VarId(base + slot), v))),
            ),
            Node::Branch(children) => {
                for (slot, child) in children.iter().enumerate() {
                    if let Some(child) = child {
                        let offset = slot << (level * BITS);
                        child.collect(base + offset, level - 1, out);
                    }
                }
            }
        }
    }
}

/// Number of ids a trie with `height` branch levels can hold
fn capacity(height: u32) -> usize {
    1usize
        .checked_shl(BITS * (height + 1))
        .unwrap_or(usize::MAX)
}

/// Write `value` at `index`, copying shared nodes on the way down.
///
/// Returns whether the cell was previously unset.
fn write(node: &mut Rc<Node>, level: u32, index: usize, value: u64) -> bool {
    let slot = (index >> (level * BITS)) & MASK;
    match Rc::make_mut(node) {
        Node::Leaf(values) => values[slot].replace(value).is_none(),
        Node::Branch(children) => {
            let child = children[slot].get_or_insert_with(|| Rc::new(Node::empty(level - 1)));
            write(child, level - 1, index, value)
        }
    }
}

/// The value store: every value is a non-negative integer
///
/// Unset variables read as zero. A variable appears in the store once it has
/// been written. Clones share structure; see the module docs.
#[derive(Clone, Default)]
pub struct Variables {
    root: Option<Rc<Node>>,
    /// Branch levels above the leaves
    height: u32,
    len: usize,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    fn lookup(&self, id: VarId) -> Option<u64> {
        let root = self.root.as_ref()?;
        if id.0 >= capacity(self.height) {
            return None;
        }
        root.get(self.height, id.0)
    }

    pub fn get(&self, id: VarId) -> u64 {
        self.lookup(id).unwrap_or(0)
    }

    pub fn set(&mut self, id: VarId, value: u64) {
        let root = self.root.get_or_insert_with(|| Rc::new(Node::empty(0)));
        while id.0 >= capacity(self.height) {
            let mut children: [Option<Rc<Node>>; WIDTH] = Default::default();
            children[0] = Some(Rc::clone(root));
            *root = Rc::new(Node::Branch(children));
            self.height += 1;
        }
        if write(root, self.height, id.0, value) {
            self.len += 1;
        }
    }

    pub fn increment(&mut self, id: VarId) {
        self.set(id, self.get(id).saturating_add(1));
    }

    /// Decrement, flooring at zero
    pub fn decrement(&mut self, id: VarId) {
        self.set(id, self.get(id).saturating_sub(1));
    }

    pub fn contains(&self, id: VarId) -> bool {
        self.lookup(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Every set cell in id order
    pub fn iter(&self) -> impl Iterator<Item = (VarId, u64)> {
        let mut out = Vec::with_capacity(self.len);
        if let Some(root) = &self.root {
            root.collect(0, self.height, &mut out);
        }
        out.into_iter()
    }

    /// Upper bound on the bytes one write copies when the store is shared
    pub fn write_cost(&self) -> usize {
        let nodes = self.height as usize + 1;
        nodes * (size_of::<Node>() + 2 * size_of::<usize>())
    }

    /// Render the store keyed by display name, sorted
    pub fn named(&self, table: &VarTable, interner: &Interner) -> BTreeMap<String, u64> {
        self.iter()
            .map(|(id, value)| (table.display_name(id, interner), value))
            .collect()
    }
}

impl PartialEq for Variables {
    fn eq(&self, other: &Self) -> bool {
        let same_root = match (&self.root, &other.root) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_root || (self.len == other.len && self.iter().eq(other.iter()))
    }
}

impl Eq for Variables {}

impl fmt::Debug for Variables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decrement_floors_at_zero() {
        let mut table = VarTable::new();
        let mut interner = Interner::new();
        let x = table.global(interner.intern("x"));

        let mut vars = Variables::new();
        vars.decrement(x);
        assert_eq!(vars.get(x), 0);
        assert!(vars.contains(x));

        vars.increment(x);
        vars.increment(x);
        vars.decrement(x);
        assert_eq!(vars.get(x), 1);
    }

    #[test]
    fn test_locals_never_alias_globals() {
        let mut table = VarTable::new();
        let mut interner = Interner::new();
        let z = interner.intern("_z");

        let global = table.global(z);
        let first = table.fresh_local(z, ActivationId::new(1));
        let second = table.fresh_local(z, ActivationId::new(2));

        assert_ne!(global, first);
        assert_ne!(first, second);
        assert_eq!(table.global(z), global);
        assert_eq!(table.display_name(global, &interner), "_z");
        assert_eq!(table.display_name(second, &interner), "_z#2");
        assert_eq!(table.activation(first), Some(ActivationId::new(1)));
    }

    #[test]
    fn test_clone_is_unaffected_by_later_writes() {
        let mut vars = Variables::new();
        for i in 0..100 {
            vars.set(VarId(i), i as u64);
        }
        let saved = vars.clone();

        vars.increment(VarId(7));
        vars.set(VarId(5_000), 1);

        assert_eq!(saved.get(VarId(7)), 7);
        assert!(!saved.contains(VarId(5_000)));
        assert_eq!(saved.len(), 100);
        assert_eq!(vars.get(VarId(7)), 8);
        assert_eq!(vars.len(), 101);
        assert_ne!(vars, saved);
    }

    #[test]
    fn test_iter_in_id_order() {
        let mut vars = Variables::new();
        vars.set(VarId(40), 4);
        vars.set(VarId(3), 0);
        vars.set(VarId(1_025), 9);

        let entries: Vec<_> = vars.iter().collect();
        assert_eq!(entries, vec![(VarId(3), 0), (VarId(40), 4), (VarId(1_025), 9)]);
    }

    #[test]
    fn test_ids_past_u32_stay_distinct() {
        let mut vars = Variables::new();
        let wide = VarId(u32::MAX as usize + 1);
        vars.set(VarId(0), 1);
        vars.set(wide, 2);

        assert_eq!(vars.get(VarId(0)), 1);
        assert_eq!(vars.get(wide), 2);
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn test_write_cost_tracks_depth_not_size() {
        let mut small = Variables::new();
        small.set(VarId(0), 1);

        let mut large = Variables::new();
        for i in 0..20_000 {
            large.set(VarId(i), 1);
        }

        // 20k cells need three levels against one
        assert_eq!(large.write_cost(), 3 * small.write_cost());
    }
}
