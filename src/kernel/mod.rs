/*!
 * Kernel
 * Single owner of the registry, capability store, and shared state, with
 * the administrative surface and external dispatch
 */

use crate::capability::encoding::decode_list;
use crate::capability::store::CapabilityStore;
use crate::capability::types::{Capability, CapabilityResult};
use crate::core::errors::Result;
use crate::core::types::{ProcedureKey, Slot, Word};
use crate::dispatcher::Dispatcher;
use crate::mediator::executor::SyscallMediator;
use crate::mediator::frame::DEFAULT_MAX_DEPTH;
use crate::registry::manager::Registry;
use crate::registry::traits::{ExecOutcome, Executable};
use crate::registry::types::RegistryError;
use crate::storage::journal::{LogJournal, LogRecord};
use crate::storage::slots::SlotStorage;
use bytes::Bytes;
use log::info;
use std::collections::HashSet;
use std::sync::Arc;

/// The capability kernel.
///
/// All tables live behind shared handles created at construction and torn
/// down with the kernel. Nested calls within one dispatch are synchronous
/// and stack-disciplined; administrative mutations are serialized against
/// dispatch by the tables' own locking, and the API assumes one active
/// external invocation at a time.
#[derive(Clone)]
pub struct Kernel {
    registry: Registry,
    capabilities: CapabilityStore,
    storage: SlotStorage,
    journal: LogJournal,
    dispatcher: Dispatcher,
    entry: ProcedureKey,
    max_depth: usize,
}

/// Builder for [`Kernel`]
pub struct KernelBuilder {
    entry_key: ProcedureKey,
    entry_handle: Arc<dyn Executable>,
    entry_capabilities: Vec<Capability>,
    max_depth: usize,
}

impl KernelBuilder {
    /// Set the frame-depth ceiling for nested calls
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Grant the entry procedure a capability at construction. The entry
    /// procedure holds no kernel bypass; these grants are its only
    /// authority.
    #[must_use]
    pub fn with_entry_capability(mut self, capability: Capability) -> Self {
        self.entry_capabilities.push(capability);
        self
    }

    /// Build the kernel and register the entry procedure
    pub fn build(self) -> Result<Kernel> {
        let registry = Registry::new();
        let capabilities = CapabilityStore::new();
        let storage = SlotStorage::new();
        let journal = LogJournal::new();

        registry.register(self.entry_key, self.entry_handle)?;
        for capability in self.entry_capabilities {
            capabilities.grant(self.entry_key, capability);
        }

        let mediator = SyscallMediator::with_max_depth(
            registry.clone(),
            capabilities.clone(),
            storage.clone(),
            journal.clone(),
            self.max_depth,
        );

        info!(
            "Kernel initialized with entry procedure {} (max depth {})",
            self.entry_key, self.max_depth
        );

        Ok(Kernel {
            registry,
            capabilities,
            storage,
            journal,
            dispatcher: Dispatcher::new(mediator),
            entry: self.entry_key,
            max_depth: self.max_depth,
        })
    }
}

impl Kernel {
    /// Start building a kernel around its entry procedure
    #[must_use]
    pub fn builder(entry_key: ProcedureKey, entry_handle: Arc<dyn Executable>) -> KernelBuilder {
        KernelBuilder {
            entry_key,
            entry_handle,
            entry_capabilities: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    // ------------------------------------------------------------------
    // Administrative surface (outside the dispatch hot path)
    // ------------------------------------------------------------------

    /// Register a procedure with no capabilities
    pub fn create_procedure(&self, key: ProcedureKey, handle: Arc<dyn Executable>) -> Result<()> {
        self.registry.register(key, handle)?;
        Ok(())
    }

    /// Register a procedure together with an encoded capability list.
    ///
    /// All-or-nothing: a malformed encoding registers nothing and grants
    /// nothing.
    pub fn create_procedure_with_capabilities(
        &self,
        key: ProcedureKey,
        handle: Arc<dyn Executable>,
        capability_words: &[Word],
    ) -> Result<()> {
        let capabilities = decode_list(capability_words)?;
        self.registry.register(key, handle)?;
        for capability in capabilities {
            self.capabilities.grant(key, capability);
        }
        Ok(())
    }

    /// Resolve a key to its executable handle
    #[must_use]
    pub fn get_procedure(&self, key: &ProcedureKey) -> Option<Arc<dyn Executable>> {
        self.registry.lookup(key)
    }

    /// Snapshot of live keys in registration order
    #[must_use]
    pub fn list_procedures(&self) -> Vec<ProcedureKey> {
        self.registry.list()
    }

    /// Remove a procedure and purge its capability set.
    ///
    /// The designated entry procedure cannot be deleted.
    pub fn delete_procedure(&self, key: &ProcedureKey) -> Result<Arc<dyn Executable>> {
        if *key == self.entry {
            return Err(RegistryError::EntryProcedure(*key).into());
        }
        let handle = self.registry.delete(key)?;
        self.capabilities.purge(key);
        Ok(handle)
    }

    /// Decode one capability encoding and grant it to a registered key
    pub fn add_capability(&self, key: &ProcedureKey, fields: &[Word]) -> Result<()> {
        let capability = crate::capability::encoding::decode(fields)?;
        if !self.registry.contains(key) {
            return Err(RegistryError::NotFound(*key).into());
        }
        self.capabilities.grant(*key, capability);
        Ok(())
    }

    /// Grant an already-decoded capability to a registered key
    pub fn grant(&self, key: &ProcedureKey, capability: Capability) -> Result<()> {
        if !self.registry.contains(key) {
            return Err(RegistryError::NotFound(*key).into());
        }
        self.capabilities.grant(*key, capability);
        Ok(())
    }

    /// Snapshot of a key's capability set, in grant order
    #[must_use]
    pub fn capabilities(&self, key: &ProcedureKey) -> Vec<Capability> {
        self.capabilities.capabilities(key)
    }

    /// Derive an attenuated call capability for a nested call (see
    /// [`CapabilityStore::delegate`])
    pub fn delegate(
        &self,
        key: &ProcedureKey,
        narrowed_targets: &HashSet<ProcedureKey>,
    ) -> CapabilityResult<Capability> {
        self.capabilities.delegate(key, narrowed_targets)
    }

    // ------------------------------------------------------------------
    // Dispatch and inspection
    // ------------------------------------------------------------------

    /// Key of the designated entry procedure
    #[must_use]
    pub fn entry_procedure(&self) -> ProcedureKey {
        self.entry
    }

    /// Route a raw external call `{key prefix, payload}`
    pub fn dispatch(&self, raw: impl Into<Bytes>) -> ExecOutcome {
        self.dispatcher.dispatch(raw.into())
    }

    /// Route a payload to the entry procedure
    pub fn dispatch_entry(&self, payload: &[u8]) -> ExecOutcome {
        self.dispatcher.dispatch_to(self.entry, payload)
    }

    /// Invoke a specific procedure as a top-level call
    pub fn dispatch_to(&self, target: &ProcedureKey, payload: &[u8]) -> ExecOutcome {
        self.dispatcher.dispatch_to(*target, payload)
    }

    /// Read one storage slot (zero word when unwritten)
    #[must_use]
    pub fn read_slot(&self, slot: Slot) -> Word {
        self.storage.read(slot)
    }

    /// Snapshot of the log journal in emission order
    #[must_use]
    pub fn logs(&self) -> Vec<LogRecord> {
        self.journal.records()
    }

    /// The frame-depth ceiling for nested calls
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}
