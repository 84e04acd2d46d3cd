//! Call stack implementation
//!
//! This module provides the call stack for macro execution:
//! - [`CallStack`]: LIFO sequence of frames; its depth is the recursion depth
//! - [`Frame`]: a single macro activation (or the root program)
//! - [`Binding`]: what a name used inside a frame actually refers to
//! - [`ActivationId`]: call-unique identity handed out by an [`ActivationCounter`]
//!
//! # Aliasing
//!
//! A frame's alias map is built once, at call time, by resolving every actual
//! argument through the *caller's* alias map. Chains therefore always
//! compress to a real variable (or label name) and never point at another
//! frame's formal parameter.

use crate::memory::variables::{VarId, VarTable};
use crate::program::labels::{Block, Op};
use crate::program::symbols::Symbol;
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// Identity of one call activation; the root program is activation 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActivationId(u64);

impl ActivationId {
    pub const ROOT: ActivationId = ActivationId(0);

    pub fn new(id: u64) -> Self {
        ActivationId(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Monotonic source of activation ids, private to one machine
#[derive(Debug, Clone)]
pub struct ActivationCounter {
    next: u64,
}

impl ActivationCounter {
    pub fn new() -> Self {
        ActivationCounter { next: 1 }
    }

    pub fn next_id(&mut self) -> ActivationId {
        let id = ActivationId(self.next);
        self.next += 1;
        id
    }

    /// Number of activations handed out so far
    pub fn issued(&self) -> u64 {
        self.next - 1
    }
}

impl Default for ActivationCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// What a name inside a frame refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// A program-level name: a global variable or a label name
    Global(Symbol),
    /// A local of some activation, with the name it was declared under
    Local { var: VarId, name: Symbol },
}

/// Formal-parameter and local-name translation for one frame
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AliasMap {
    bindings: FxHashMap<Symbol, Binding>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: Symbol, binding: Binding) {
        self.bindings.insert(name, binding);
    }

    /// Resolve `name`; unmapped names refer to the program-level name itself
    pub fn resolve(&self, name: Symbol) -> Binding {
        self.bindings
            .get(&name)
            .copied()
            .unwrap_or(Binding::Global(name))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, Binding)> + '_ {
        self.bindings.iter().map(|(&name, &binding)| (name, binding))
    }
}

/// One call activation
///
/// The block and alias map never change after the frame is built and are
/// shared by reference; cloning a frame for a snapshot copies only the
/// program counter and a few ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    block: Rc<Block>,
    pc: usize,
    activation: ActivationId,
    macro_name: Option<Symbol>,
    aliases: Rc<AliasMap>,
}

impl Frame {
    /// The frame for the top-level program
    pub fn root(block: Rc<Block>) -> Self {
        Frame {
            block,
            pc: 0,
            activation: ActivationId::ROOT,
            macro_name: None,
            aliases: Rc::new(AliasMap::new()),
        }
    }

    /// A fresh activation of macro `name`
    pub fn call(
        name: Symbol,
        block: Rc<Block>,
        activation: ActivationId,
        aliases: AliasMap,
    ) -> Self {
        Frame {
            block,
            pc: 0,
            activation,
            macro_name: Some(name),
            aliases: Rc::new(aliases),
        }
    }

    pub fn block(&self) -> &Rc<Block> {
        &self.block
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn activation(&self) -> ActivationId {
        self.activation
    }

    /// The macro this frame runs; `None` for the root program
    pub fn macro_name(&self) -> Option<Symbol> {
        self.macro_name
    }

    pub fn aliases(&self) -> &AliasMap {
        &self.aliases
    }

    /// The instruction at the program counter, or `None` once the block is done
    pub fn current_op(&self) -> Option<&Op> {
        self.block.ops().get(self.pc)
    }

    /// Whether the program counter has run past the end of the block
    pub fn is_finished(&self) -> bool {
        self.pc >= self.block.len()
    }

    pub fn advance(&mut self) {
        self.pc += 1;
    }

    pub fn jump_to(&mut self, pc: usize) {
        self.pc = pc;
    }

    /// Resolve a variable operand to its storage cell
    pub fn resolve_var(&self, name: Symbol, table: &mut VarTable) -> VarId {
        match self.aliases.resolve(name) {
            Binding::Global(global) => table.global(global),
            Binding::Local { var, .. } => var,
        }
    }

    /// Resolve a label operand to the label name to search for
    ///
    /// Labels may be passed as arguments (e.g. to a `goto` macro), so the
    /// operand goes through the alias map like a variable would.
    pub fn resolve_label(&self, label: Symbol) -> Symbol {
        match self.aliases.resolve(label) {
            Binding::Global(name) => name,
            Binding::Local { name, .. } => name,
        }
    }
}

/// The call stack
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallStack {
    frames: Vec<Frame>,
}

impl CallStack {
    pub fn new() -> Self {
        CallStack { frames: Vec::new() }
    }

    /// Push a new frame on top of the current one
    pub fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Pop the top frame
    pub fn pop_frame(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// Get the active (top) frame
    pub fn current_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Get a mutable reference to the active frame
    pub fn current_frame_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    /// Get all frames, outermost first
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Get the depth of the call stack
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Check if stack is empty
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Get a mutable reference to a specific frame by index
    pub fn frame_mut(&mut self, index: usize) -> Option<&mut Frame> {
        self.frames.get_mut(index)
    }

    /// Discard every frame above `index`, returning how many were dropped
    pub fn unwind_to(&mut self, index: usize) -> usize {
        let dropped = self.frames.len().saturating_sub(index + 1);
        self.frames.truncate(index + 1);
        dropped
    }
}
