// Execution engine for the counter machine

use crate::interpreter::config::{check_input_name, MachineConfig};
use crate::interpreter::errors::MachineError;
use crate::interpreter::registry::MacroRegistry;
use crate::interpreter::trace::{TraceRecord, TRACE_TARGET};
use crate::memory::stack::{ActivationCounter, CallStack, Frame};
use crate::memory::variables::{VarId, VarTable, Variables};
use crate::program::instruction::{Instruction, MacroDef};
use crate::program::labels::{resolve_labels, Block, Op};
use crate::program::symbols::{Interner, Symbol};
use crate::snapshot::{Snapshot, SnapshotManager};
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Name shown for the root frame
pub const ROOT_FRAME_NAME: &str = "<program>";

/// A counter machine with macros and time-travel history
///
/// Every piece of state, including the activation counter that keeps macro
/// locals apart, belongs to one instance. Two machines never interfere.
pub struct Machine {
    config: MachineConfig,

    /// Names of everything the machine has seen
    pub(crate) symbols: Interner,

    /// Every storage cell ever created (globals and activation locals)
    pub(crate) var_table: VarTable,

    /// Registered macros
    pub(crate) registry: MacroRegistry,

    /// Inputs applied by `reset`
    inputs: BTreeMap<String, u64>,

    /// The loaded program and its resolved root block
    program: Vec<Instruction>,
    root_block: Rc<Block>,

    /// Live variable store
    variables: Variables,

    /// Live call stack; empty exactly when halted
    pub(crate) stack: CallStack,

    /// Steps executed since reset
    step_count: usize,

    /// Source of call-unique activation ids; never rewound or reset
    pub(crate) activations: ActivationCounter,

    /// Execution history for rewind
    snapshot_manager: SnapshotManager,

    /// Index of the snapshot that mirrors the live state
    history_position: usize,
}

impl Machine {
    /// Create a machine with the default configuration
    pub fn new() -> Self {
        Self::with_config(MachineConfig::default())
    }

    pub fn with_config(config: MachineConfig) -> Self {
        let snapshot_manager = SnapshotManager::new(config.snapshot_memory_limit);
        let mut symbols = Interner::new();
        symbols.intern(&config.output_variable);

        Machine {
            config,
            symbols,
            var_table: VarTable::new(),
            registry: MacroRegistry::new(),
            inputs: BTreeMap::new(),
            program: Vec::new(),
            root_block: Rc::new(Block::default()),
            variables: Variables::new(),
            stack: CallStack::new(),
            step_count: 0,
            activations: ActivationCounter::new(),
            snapshot_manager,
            history_position: 0,
        }
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    // ========== Program and inputs ==========

    /// Replace the inputs applied by the next `reset`
    pub fn set_inputs<I, K>(&mut self, inputs: I)
    where
        I: IntoIterator<Item = (K, u64)>,
        K: Into<String>,
    {
        self.inputs = inputs
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .collect();
    }

    pub fn inputs(&self) -> &BTreeMap<String, u64> {
        &self.inputs
    }

    /// Load a program; labels are resolved immediately.
    ///
    /// Takes effect at the next `reset`.
    pub fn set_program(&mut self, program: Vec<Instruction>) -> Result<(), MachineError> {
        let block = resolve_labels(&program, ROOT_FRAME_NAME, &mut self.symbols)?;
        self.root_block = Rc::new(block);
        self.program = program;
        Ok(())
    }

    pub fn program(&self) -> &[Instruction] {
        &self.program
    }

    // ========== Macro registry ==========

    /// Register a macro; see [`MacroRegistry::register`]
    pub fn register_macro(
        &mut self,
        name: &str,
        def: MacroDef,
        overwrite: bool,
    ) -> Result<(), MachineError> {
        self.registry
            .register(&mut self.symbols, name, def, overwrite)
    }

    /// Register several macros, stopping at the first failure
    ///
    /// Macros before the failing one stay registered.
    pub fn register_macros<I, S>(&mut self, macros: I, overwrite: bool) -> Result<(), MachineError>
    where
        I: IntoIterator<Item = (S, MacroDef)>,
        S: AsRef<str>,
    {
        for (name, def) in macros {
            self.register_macro(name.as_ref(), def, overwrite)?;
        }
        Ok(())
    }

    /// Remove a macro; removing an unknown name is a no-op
    pub fn remove_macro(&mut self, name: &str) {
        self.registry.remove(name);
    }

    pub fn remove_macros<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.registry.remove(name.as_ref());
        }
    }

    /// Registered macro names in lexicographic order
    pub fn list_macros(&self) -> Vec<String> {
        self.registry.list()
    }

    pub fn get_macro(&self, name: &str) -> Result<&MacroDef, MachineError> {
        self.registry.lookup(name)
    }

    /// Pretty-printed definition of one macro
    pub fn describe_macro(&self, name: &str) -> Result<String, MachineError> {
        Ok(self.registry.lookup(name)?.render(name))
    }

    /// Pretty-printed definitions of every macro, separated by blank lines
    pub fn describe_macros(&self) -> String {
        self.registry
            .iter()
            .map(|(name, def)| def.render(name))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn registry(&self) -> &MacroRegistry {
        &self.registry
    }

    // ========== Execution ==========

    /// Validate inputs and the program, rebuild the root frame, clear history
    /// and record the initial snapshot.
    pub fn reset(&mut self) -> Result<(), MachineError> {
        for name in self.inputs.keys() {
            check_input_name(name)?;
        }
        self.check_calls()?;

        let mut variables = Variables::new();
        for (name, &value) in &self.inputs {
            let id = self.var_table.global(self.symbols.intern(name));
            variables.set(id, value);
        }
        let output = self.output_var();
        variables.set(output, 0);

        let mut stack = CallStack::new();
        stack.push_frame(Frame::root(Rc::clone(&self.root_block)));

        self.variables = variables;
        self.stack = stack;
        self.step_count = 0;
        self.snapshot_manager.clear();
        let initial = self.snapshot();
        self.history_position = self.snapshot_manager.push(initial, None)?;

        info!(
            inputs = self.inputs.len(),
            instructions = self.root_block.len(),
            "machine reset"
        );
        Ok(())
    }

    /// Every macro reachable from the program must be registered
    fn check_calls(&self) -> Result<(), MachineError> {
        let mut pending: Vec<Symbol> = self.root_block.called_macros().collect();
        let mut seen = FxHashSet::default();

        while let Some(sym) = pending.pop() {
            if !seen.insert(sym) {
                continue;
            }
            let name = self.symbols.resolve(sym);
            let compiled =
                self.registry
                    .compiled(name)
                    .ok_or_else(|| MachineError::UnknownInstruction {
                        name: name.to_string(),
                    })?;
            pending.extend(compiled.block.called_macros());
        }
        Ok(())
    }

    /// Execute exactly one transition.
    ///
    /// Returns whether the machine is still running afterwards. Stepping a
    /// halted machine does nothing and returns `false`. On error the live
    /// state and history are left as they were.
    pub fn step(&mut self, trace: bool) -> Result<bool, MachineError> {
        if self.stack.is_empty() {
            return Ok(false);
        }

        if trace {
            if let Some(record) = self.trace_record() {
                info!(target: TRACE_TARGET, "{}", record);
            }
        }

        self.execute_current()?;
        self.step_count += 1;
        self.record_snapshot()?;

        Ok(!self.stack.is_empty())
    }

    fn execute_current(&mut self) -> Result<(), MachineError> {
        let (block, pc) = match self.stack.current_frame() {
            Some(frame) => (Rc::clone(frame.block()), frame.pc()),
            None => return Ok(()),
        };

        let Some(op) = block.ops().get(pc) else {
            // implicit return
            if let Some(frame) = self.stack.pop_frame() {
                debug!(
                    activation = frame.activation().get(),
                    depth = self.stack.depth(),
                    "frame returned"
                );
            }
            return Ok(());
        };

        match op {
            Op::Inc(var) => {
                let id = self.resolve_var(*var);
                self.variables.increment(id);
                self.advance();
            }
            Op::Dec(var) => {
                let id = self.resolve_var(*var);
                self.variables.decrement(id);
                self.advance();
            }
            Op::Jnz(var, label) => {
                let id = self.resolve_var(*var);
                if self.variables.get(id) != 0 {
                    let target = self.resolve_label(*label);
                    self.jump(target)?;
                } else {
                    self.advance();
                }
            }
            Op::Call(name, args) => self.expand_call(*name, args)?,
        }
        Ok(())
    }

    fn record_snapshot(&mut self) -> Result<(), MachineError> {
        let snapshot = self.snapshot();
        match self
            .snapshot_manager
            .push(snapshot, Some(self.history_position))
        {
            Ok(index) => {
                self.history_position = index;
                Ok(())
            }
            Err(err) => {
                // the live state must not run ahead of its history
                self.restore(self.history_position);
                Err(err)
            }
        }
    }

    /// Reset, then step until halted.
    ///
    /// Returns the output variable. Fails with
    /// [`MachineError::StepLimitExceeded`] if the machine is still running
    /// after exactly `max_steps` steps.
    pub fn run(&mut self, max_steps: usize, trace: bool) -> Result<u64, MachineError> {
        self.reset()?;
        self.resume(max_steps, trace)
    }

    /// [`Machine::run`] with the configured step budget
    pub fn run_default(&mut self, trace: bool) -> Result<u64, MachineError> {
        let max_steps = self.config.max_steps;
        self.run(max_steps, trace)
    }

    /// Step from the live state, without resetting, until halted
    pub fn resume(&mut self, max_steps: usize, trace: bool) -> Result<u64, MachineError> {
        let mut taken = 0;
        while !self.is_halted() {
            if taken == max_steps {
                warn!(limit = max_steps, depth = self.stack.depth(), "step limit exceeded");
                return Err(MachineError::StepLimitExceeded { limit: max_steps });
            }
            self.step(trace)?;
            taken += 1;
        }

        let output = self.output();
        info!(steps = self.step_count, output, "run complete");
        Ok(output)
    }

    fn advance(&mut self) {
        if let Some(frame) = self.stack.current_frame_mut() {
            frame.advance();
        }
    }

    /// Storage cell for a variable operand of the active frame
    pub(crate) fn resolve_var(&mut self, name: Symbol) -> VarId {
        match self.stack.current_frame() {
            Some(frame) => frame.resolve_var(name, &mut self.var_table),
            None => self.var_table.global(name),
        }
    }

    /// Label name for a label operand of the active frame
    pub(crate) fn resolve_label(&self, label: Symbol) -> Symbol {
        self.stack
            .current_frame()
            .map(|frame| frame.resolve_label(label))
            .unwrap_or(label)
    }

    fn output_var(&mut self) -> VarId {
        let sym = self.symbols.intern(&self.config.output_variable);
        self.var_table.global(sym)
    }

    // ========== History ==========

    /// Independent copy of the live state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            step: self.step_count,
            variables: self.variables.clone(),
            stack: self.stack.clone(),
        }
    }

    /// Restore the live state from history entry `index`.
    ///
    /// Registered macros and the loaded program are untouched. Stepping
    /// afterwards appends a new branch to the history.
    pub fn rewind(&mut self, index: usize) -> Result<(), MachineError> {
        let len = self.snapshot_manager.len();
        if index >= len {
            return Err(MachineError::RewindIndexOutOfRange { index, len });
        }

        self.restore(index);
        self.history_position = index;
        debug!(index, step = self.step_count, "rewound");
        Ok(())
    }

    /// Rewind to the post-reset snapshot
    pub fn rewind_to_start(&mut self) -> Result<(), MachineError> {
        self.rewind(0)
    }

    fn restore(&mut self, index: usize) {
        if let Some(snapshot) = self.snapshot_manager.get(index) {
            self.variables = snapshot.variables.clone();
            self.stack = snapshot.stack.clone();
            self.step_count = snapshot.step;
        }
    }

    /// History entry `index`
    pub fn history(&self, index: usize) -> Option<&Snapshot> {
        self.snapshot_manager.get(index)
    }

    /// Entry that history entry `index` was stepped from
    pub fn history_parent(&self, index: usize) -> Option<usize> {
        self.snapshot_manager.parent(index)
    }

    pub fn history_len(&self) -> usize {
        self.snapshot_manager.len()
    }

    /// Index of the history entry the live state mirrors
    pub fn history_position(&self) -> usize {
        self.history_position
    }

    pub fn snapshot_manager(&self) -> &SnapshotManager {
        &self.snapshot_manager
    }

    // ========== Getter methods ==========

    /// Live variable store, keyed by display name
    pub fn variables(&self) -> BTreeMap<String, u64> {
        self.variables.named(&self.var_table, &self.symbols)
    }

    /// Variables of a snapshot, keyed by display name
    pub fn variables_of(&self, snapshot: &Snapshot) -> BTreeMap<String, u64> {
        snapshot.variables.named(&self.var_table, &self.symbols)
    }

    /// Value of a program-level variable; unset and unknown names read as 0
    pub fn value(&self, name: &str) -> u64 {
        self.symbols
            .get(name)
            .and_then(|sym| self.var_table.lookup_global(sym))
            .map(|id| self.variables.get(id))
            .unwrap_or(0)
    }

    /// Value of the output variable
    pub fn output(&self) -> u64 {
        self.value(&self.config.output_variable)
    }

    pub fn stack(&self) -> &CallStack {
        &self.stack
    }

    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn is_halted(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Activations created over the machine's lifetime
    pub fn activations_issued(&self) -> u64 {
        self.activations.issued()
    }

    pub fn symbols(&self) -> &Interner {
        &self.symbols
    }

    pub fn var_table(&self) -> &VarTable {
        &self.var_table
    }

    /// Display name of a frame: `<program>` or `macro#activation`
    pub fn frame_name(&self, frame: &Frame) -> String {
        match frame.macro_name() {
            Some(name) => format!(
                "{}#{}",
                self.symbols.resolve(name),
                frame.activation().get()
            ),
            None => ROOT_FRAME_NAME.to_string(),
        }
    }

    /// The record the next step would trace, or `None` when halted
    pub fn trace_record(&self) -> Option<TraceRecord> {
        let frame = self.stack.current_frame()?;
        Some(TraceRecord {
            step: self.step_count,
            depth: self.stack.depth(),
            pc: frame.pc(),
            instruction: next_instruction(frame),
            variables: self.variables(),
        })
    }

    /// Multi-line dump of a history entry, or of the live state for `None`
    pub fn describe_state(&self, index: Option<usize>) -> Result<String, MachineError> {
        let live;
        let snapshot = match index {
            Some(index) => self.snapshot_manager.get(index).ok_or(
                MachineError::RewindIndexOutOfRange {
                    index,
                    len: self.snapshot_manager.len(),
                },
            )?,
            None => {
                live = self.snapshot();
                &live
            }
        };

        let status = if snapshot.stack.is_empty() {
            "halted"
        } else {
            "running"
        };
        let mut out = format!(
            "step {} | depth {} | {}",
            snapshot.step,
            snapshot.depth(),
            status
        );
        for (depth, frame) in snapshot.stack.frames().iter().enumerate() {
            out.push_str(&format!(
                "\n  [{}] {} pc={} next: {}",
                depth,
                self.frame_name(frame),
                frame.pc(),
                next_instruction(frame)
            ));
        }
        for (name, value) in self.variables_of(snapshot) {
            out.push_str(&format!("\n  {} = {}", name, value));
        }
        Ok(out)
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

fn next_instruction(frame: &Frame) -> String {
    frame
        .block()
        .source()
        .get(frame.pc())
        .map(|instr| instr.to_string())
        .unwrap_or_else(|| "return".to_string())
}
