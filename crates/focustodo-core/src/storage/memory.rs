use std::cell::RefCell;

use crate::error::Result;
use crate::ports::SnapshotStore;
use crate::timer::TimerSnapshot;

/// Snapshot store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    slot: RefCell<Option<TimerSnapshot>>,
}

impl MemorySnapshotStore {
    pub fn with_snapshot(snapshot: TimerSnapshot) -> Self {
        Self {
            slot: RefCell::new(Some(snapshot)),
        }
    }

    /// Last snapshot written, if any.
    pub fn get(&self) -> Option<TimerSnapshot> {
        self.slot.borrow().clone()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<TimerSnapshot>> {
        Ok(self.get())
    }

    fn save(&self, snapshot: &TimerSnapshot) -> Result<()> {
        *self.slot.borrow_mut() = Some(snapshot.clone());
        Ok(())
    }
}
