// Snapshot management for time-travel execution

use crate::interpreter::errors::MachineError;
use crate::memory::{
    stack::{CallStack, Frame},
    variables::Variables,
};
use std::mem::size_of;

/// Snapshot of total machine state after one step
///
/// Frames share their immutable instruction blocks and alias maps with the
/// live machine by reference. The variable store shares structure too, but
/// copy-on-write: a later step copies what it writes and never touches a
/// stored snapshot. The frame list and program counters are owned copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub step: usize,
    pub variables: Variables,
    pub stack: CallStack,
}

impl Snapshot {
    /// Estimate the memory this snapshot adds to the history, in bytes
    ///
    /// Counts the owned frame list plus the store nodes one step can copy;
    /// the rest of the store is shared with the previous entry.
    pub fn estimated_size(&self) -> usize {
        let frames = self.stack.depth() * size_of::<Frame>();
        size_of::<Snapshot>() + frames + self.variables.write_cost()
    }

    pub fn depth(&self) -> usize {
        self.stack.depth()
    }
}

/// Manages execution history for time travel
///
/// History is append-only. Stepping after a rewind appends a new branch; the
/// parent of every entry is kept so branches can be told apart.
#[derive(Debug)]
pub struct SnapshotManager {
    snapshots: Vec<Snapshot>,
    parents: Vec<Option<usize>>,
    max_memory: usize,
    current_memory: usize,
}

impl SnapshotManager {
    pub fn new(max_memory: usize) -> Self {
        SnapshotManager {
            snapshots: Vec::new(),
            parents: Vec::new(),
            max_memory,
            current_memory: 0,
        }
    }

    /// Add a snapshot to history, returning its index
    pub fn push(
        &mut self,
        snapshot: Snapshot,
        parent: Option<usize>,
    ) -> Result<usize, MachineError> {
        let snapshot_size = snapshot.estimated_size();

        if self.current_memory + snapshot_size > self.max_memory {
            return Err(MachineError::SnapshotLimitExceeded {
                current: self.current_memory,
                requested: snapshot_size,
                limit: self.max_memory,
            });
        }

        self.current_memory += snapshot_size;
        self.snapshots.push(snapshot);
        self.parents.push(parent);
        Ok(self.snapshots.len() - 1)
    }

    /// Get a snapshot by index
    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    /// The entry this one was stepped from; `None` for the post-reset snapshot
    pub fn parent(&self, index: usize) -> Option<usize> {
        self.parents.get(index).copied().flatten()
    }

    /// Drop all history
    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.parents.clear();
        self.current_memory = 0;
    }

    /// Get the number of snapshots
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Get current memory usage
    pub fn memory_usage(&self) -> usize {
        self.current_memory
    }

    /// Get max memory limit
    pub fn memory_limit(&self) -> usize {
        self.max_memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_snapshot(step: usize) -> Snapshot {
        Snapshot {
            step,
            variables: Variables::new(),
            stack: CallStack::new(),
        }
    }

    #[test]
    fn test_push_and_parents() {
        let mut manager = SnapshotManager::new(1024 * 1024);
        assert_eq!(manager.push(empty_snapshot(0), None), Ok(0));
        assert_eq!(manager.push(empty_snapshot(1), Some(0)), Ok(1));
        // a branch stepped from the first entry
        assert_eq!(manager.push(empty_snapshot(1), Some(0)), Ok(2));

        assert_eq!(manager.len(), 3);
        assert_eq!(manager.parent(0), None);
        assert_eq!(manager.parent(2), Some(0));
        assert_eq!(manager.get(2).map(|s| s.step), Some(1));

        manager.clear();
        assert!(manager.is_empty());
        assert_eq!(manager.memory_usage(), 0);
    }

    #[test]
    fn test_memory_limit() {
        let size = empty_snapshot(0).estimated_size();
        let mut manager = SnapshotManager::new(size * 2);

        assert!(manager.push(empty_snapshot(0), None).is_ok());
        assert!(manager.push(empty_snapshot(1), Some(0)).is_ok());
        assert!(matches!(
            manager.push(empty_snapshot(2), Some(1)),
            Err(MachineError::SnapshotLimitExceeded { .. })
        ));
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_estimated_size_does_not_grow_with_store() {
        use crate::memory::stack::ActivationId;
        use crate::memory::variables::VarTable;
        use crate::program::symbols::Interner;

        let mut interner = Interner::new();
        let mut table = VarTable::new();
        let local = interner.intern("_z");
        let mut variables = Variables::new();
        for activation in 1..=20_000 {
            let id = table.fresh_local(local, ActivationId::new(activation));
            variables.set(id, 1);
        }

        let snapshot = Snapshot {
            step: 0,
            variables,
            stack: CallStack::new(),
        };
        assert!(snapshot.estimated_size() < 4096);
    }
}
