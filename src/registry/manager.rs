/*!
 * Procedure Registry
 * Key -> executable-handle table with create/lookup/list/delete lifecycle
 */

use super::traits::Executable;
use super::types::{ProcedureEntry, RegistryError, RegistryResult};
use crate::core::types::ProcedureKey;
use dashmap::DashMap;
use log::info;
use parking_lot::RwLock;
use std::sync::Arc;

/// Insertion-ordered table of live procedure registrations.
///
/// The entry map answers lookups; the order vector preserves registration
/// order for listing. Both are updated together under the entry map's
/// shard lock discipline, with the order vector behind its own lock; a
/// miss is an `Option::None`, never a panic.
#[derive(Clone, Default)]
pub struct Registry {
    entries: Arc<DashMap<ProcedureKey, ProcedureEntry>>,
    order: Arc<RwLock<Vec<ProcedureKey>>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        info!("Procedure registry initialized");
        Self {
            entries: Arc::new(DashMap::new()),
            order: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Register a procedure under `key`.
    ///
    /// Fails with `InvalidKey` for the empty key and `DuplicateKey` when the
    /// key is live; no partial effects on failure.
    pub fn register(&self, key: ProcedureKey, handle: Arc<dyn Executable>) -> RegistryResult<()> {
        if key.is_empty() {
            return Err(RegistryError::InvalidKey);
        }
        match self.entries.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(RegistryError::DuplicateKey(key)),
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(ProcedureEntry::new(key, handle));
                self.order.write().push(key);
                info!("Registered procedure {}", key);
                Ok(())
            }
        }
    }

    /// Resolve a key to its executable handle
    #[must_use]
    pub fn lookup(&self, key: &ProcedureKey) -> Option<Arc<dyn Executable>> {
        self.entries.get(key).map(|entry| Arc::clone(&entry.handle))
    }

    #[must_use]
    pub fn contains(&self, key: &ProcedureKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Snapshot of live keys in registration order (not a live view)
    #[must_use]
    pub fn list(&self) -> Vec<ProcedureKey> {
        self.order.read().clone()
    }

    /// Remove a registration and return its handle
    pub fn delete(&self, key: &ProcedureKey) -> RegistryResult<Arc<dyn Executable>> {
        let (_, entry) = self
            .entries
            .remove(key)
            .ok_or(RegistryError::NotFound(*key))?;
        self.order.write().retain(|k| k != key);
        info!("Deleted procedure {}", key);
        Ok(entry.handle)
    }

    /// Number of live registrations
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
