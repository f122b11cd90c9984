/*!
 * Slot Storage
 * The word store shared by all procedures; every mutation arrives through
 * an authorized write syscall
 */

use crate::core::types::{Slot, Word, ZERO_WORD};
use dashmap::DashMap;
use std::sync::Arc;

/// Slot-addressed word store. Unwritten slots read as the zero word.
#[derive(Clone, Default)]
pub struct SlotStorage {
    slots: Arc<DashMap<Slot, Word>>,
}

impl SlotStorage {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Arc::new(DashMap::new()),
        }
    }

    pub fn write(&self, slot: Slot, value: Word) {
        self.slots.insert(slot, value);
    }

    #[must_use]
    pub fn read(&self, slot: Slot) -> Word {
        self.slots.get(&slot).map(|v| *v).unwrap_or(ZERO_WORD)
    }

    /// Number of written slots
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
