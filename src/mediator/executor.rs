/*!
 * Syscall Mediator
 * Authorizes every write/log/call a procedure issues and drives nested
 * invocations over the explicit frame arena
 */

use super::frame::{FrameId, FrameStack, FrameState, DEFAULT_MAX_DEPTH};
use super::traits::Syscalls;
use super::types::{SyscallError, SyscallResult};
use crate::capability::store::CapabilityStore;
use crate::capability::types::AccessRequest;
use crate::core::types::{ProcedureKey, Slot, Word};
use crate::monitoring::span_frame;
use crate::registry::manager::Registry;
use crate::registry::traits::{ExecOutcome, Executable};
use crate::storage::journal::{LogJournal, LogRecord};
use crate::storage::slots::SlotStorage;
use std::sync::Arc;
use tracing::info;

/// Mediates all syscalls issued during dispatch.
///
/// Holds shared handles to the registry, capability store, and shared
/// state; per-dispatch frame arenas are created on entry and torn down on
/// return, so the mediator itself is stateless between dispatches.
#[derive(Clone)]
pub struct SyscallMediator {
    registry: Registry,
    capabilities: CapabilityStore,
    storage: SlotStorage,
    journal: LogJournal,
    max_depth: usize,
}

impl SyscallMediator {
    #[must_use]
    pub fn new(
        registry: Registry,
        capabilities: CapabilityStore,
        storage: SlotStorage,
        journal: LogJournal,
    ) -> Self {
        Self::with_max_depth(registry, capabilities, storage, journal, DEFAULT_MAX_DEPTH)
    }

    #[must_use]
    pub fn with_max_depth(
        registry: Registry,
        capabilities: CapabilityStore,
        storage: SlotStorage,
        journal: LogJournal,
        max_depth: usize,
    ) -> Self {
        Self {
            registry,
            capabilities,
            storage,
            journal,
            max_depth,
        }
    }

    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Run `target` as a top-level call and bubble its outcome.
    ///
    /// An unregistered target yields a `ProcedureNotFound` status rather
    /// than an error: dispatch results are always `(status, bytes)`.
    pub fn dispatch_call(&self, target: ProcedureKey, payload: &[u8]) -> ExecOutcome {
        let handle = match self.registry.lookup(&target) {
            Some(handle) => handle,
            None => {
                let err = SyscallError::ProcedureNotFound { target };
                return ExecOutcome::fail(err.status_code());
            }
        };
        let mut frames = FrameStack::new(self.max_depth);
        let frame = match frames.push(target, None) {
            Ok(frame) => frame,
            Err(err) => return ExecOutcome::fail(err.status_code()),
        };
        self.run_frame(&mut frames, frame, &handle, payload)
    }

    /// Execute one frame to completion and resolve its bubbled outcome.
    ///
    /// A trapped frame's status is the trap's code no matter what the
    /// procedure body returned.
    fn run_frame(
        &self,
        frames: &mut FrameStack,
        frame: FrameId,
        handle: &Arc<dyn Executable>,
        payload: &[u8],
    ) -> ExecOutcome {
        let key = frames.key_of(frame);
        let depth = frames.depth_of(frame);
        let span = span_frame(&key, depth);
        let _guard = span.enter();

        info!(
            procedure = %key,
            depth = depth,
            payload_len = payload.len(),
            "frame executing"
        );

        let outcome = handle.execute(
            &mut SyscallContext {
                mediator: self,
                frames: &mut *frames,
                frame,
            },
            payload,
        );

        let trap = match frames.state(frame) {
            FrameState::Trapped { cause } => Some(cause.clone()),
            _ => None,
        };
        match trap {
            Some(cause) => {
                span.record_trap(&cause);
                ExecOutcome::fail(cause.status_code())
            }
            None => {
                frames.mark_returned(frame);
                span.record_status(outcome.status);
                outcome
            }
        }
    }
}

/// Per-frame syscall context handed to executing procedure code.
///
/// Borrows the dispatch's frame arena; nested calls reborrow it for the
/// callee, which keeps the whole call tree on one strictly
/// stack-disciplined arena.
pub struct SyscallContext<'a> {
    mediator: &'a SyscallMediator,
    frames: &'a mut FrameStack,
    frame: FrameId,
}

impl SyscallContext<'_> {
    /// Reject syscalls on a frame that already trapped
    fn ensure_executing(&self) -> SyscallResult<()> {
        match self.frames.state(self.frame) {
            FrameState::Executing => Ok(()),
            _ => Err(SyscallError::FrameTrapped),
        }
    }

    /// Trap this frame and hand the cause back to the procedure body
    fn deny(&mut self, cause: SyscallError) -> SyscallError {
        self.frames.trap(self.frame, cause.clone());
        cause
    }
}

impl Syscalls for SyscallContext<'_> {
    fn write(&mut self, slot: Slot, value: Word) -> SyscallResult<()> {
        self.ensure_executing()?;
        let key = self.frames.key_of(self.frame);
        if !self
            .mediator
            .capabilities
            .authorize(&key, &AccessRequest::Write(slot))
        {
            return Err(self.deny(SyscallError::WriteDenied { key, slot }));
        }
        self.mediator.storage.write(slot, value);
        Ok(())
    }

    fn read(&mut self, slot: Slot) -> SyscallResult<Word> {
        self.ensure_executing()?;
        Ok(self.mediator.storage.read(slot))
    }

    fn log(&mut self, topics: &[Word], data: &[u8]) -> SyscallResult<()> {
        self.ensure_executing()?;
        let key = self.frames.key_of(self.frame);
        if !self
            .mediator
            .capabilities
            .authorize(&key, &AccessRequest::Log(topics))
        {
            return Err(self.deny(SyscallError::LogDenied { key }));
        }
        self.mediator.journal.append(LogRecord {
            procedure: key,
            topics: topics.to_vec(),
            data: data.to_vec(),
        });
        Ok(())
    }

    fn call(&mut self, target: ProcedureKey, payload: &[u8]) -> SyscallResult<ExecOutcome> {
        self.ensure_executing()?;
        let key = self.frames.key_of(self.frame);
        if !self
            .mediator
            .capabilities
            .authorize(&key, &AccessRequest::Call(target))
        {
            return Err(self.deny(SyscallError::CallDenied { key, target }));
        }
        let handle = match self.mediator.registry.lookup(&target) {
            Some(handle) => handle,
            None => return Err(self.deny(SyscallError::ProcedureNotFound { target })),
        };
        // The callee runs under its own capability set; nothing is
        // inherited from this frame.
        let child = match self.frames.push(target, Some(self.frame)) {
            Ok(child) => child,
            Err(err) => return Err(self.deny(err)),
        };
        Ok(self
            .mediator
            .run_frame(self.frames, child, &handle, payload))
    }

    fn executing_key(&self) -> ProcedureKey {
        self.frames.key_of(self.frame)
    }

    fn depth(&self) -> usize {
        self.frames.depth_of(self.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::types::Capability;
    use crate::core::types::word_from_u64;

    fn key(label: &str) -> ProcedureKey {
        ProcedureKey::from_label(label).unwrap()
    }

    fn mediator() -> SyscallMediator {
        SyscallMediator::new(
            Registry::new(),
            CapabilityStore::new(),
            SlotStorage::new(),
            LogJournal::new(),
        )
    }

    fn register(m: &SyscallMediator, label: &str, handle: Arc<dyn Executable>) -> ProcedureKey {
        let k = key(label);
        m.registry.register(k, handle).unwrap();
        k
    }

    #[test]
    fn test_dispatch_unknown_target() {
        let m = mediator();
        let outcome = m.dispatch_call(key("ghost"), &[]);
        assert_eq!(
            outcome.status,
            SyscallError::ProcedureNotFound { target: key("ghost") }.status_code()
        );
    }

    #[test]
    fn test_authorized_write_commits() {
        let m = mediator();
        let p = register(
            &m,
            "writer",
            Arc::new(|sys: &mut dyn Syscalls, _: &[u8]| match sys.write(3, word_from_u64(9)) {
                Ok(()) => ExecOutcome::empty(),
                Err(e) => ExecOutcome::fail(e.status_code()),
            }),
        );
        m.capabilities.grant(p, Capability::Write { start: 0, size: 8 });
        let outcome = m.dispatch_call(p, &[]);
        assert!(outcome.is_success());
        assert_eq!(m.storage.read(3), word_from_u64(9));
    }

    #[test]
    fn test_denied_write_traps_and_leaves_no_mutation() {
        let m = mediator();
        let p = register(
            &m,
            "writer",
            Arc::new(|sys: &mut dyn Syscalls, _: &[u8]| match sys.write(3, word_from_u64(9)) {
                Ok(()) => ExecOutcome::empty(),
                Err(e) => ExecOutcome::fail(e.status_code()),
            }),
        );
        let outcome = m.dispatch_call(p, &[]);
        assert_eq!(
            outcome.status,
            SyscallError::WriteDenied { key: p, slot: 3 }.status_code()
        );
        assert!(m.storage.is_empty());
    }

    #[test]
    fn test_trap_status_overrides_body_status() {
        // A procedure that swallows the denial and claims success still
        // bubbles the trap's status.
        let m = mediator();
        let p = register(
            &m,
            "liar",
            Arc::new(|sys: &mut dyn Syscalls, _: &[u8]| {
                let _ = sys.write(0, word_from_u64(1));
                ExecOutcome::empty()
            }),
        );
        let outcome = m.dispatch_call(p, &[]);
        assert_eq!(
            outcome.status,
            SyscallError::WriteDenied { key: p, slot: 0 }.status_code()
        );
    }

    #[test]
    fn test_trapped_frame_rejects_further_syscalls() {
        let m = mediator();
        let p = register(
            &m,
            "stubborn",
            Arc::new(|sys: &mut dyn Syscalls, _: &[u8]| {
                // First write is denied and traps the frame
                assert!(matches!(
                    sys.write(0, word_from_u64(1)),
                    Err(SyscallError::WriteDenied { .. })
                ));
                // The frame is dead: even an in-range write is refused
                assert!(matches!(
                    sys.write(100, word_from_u64(1)),
                    Err(SyscallError::FrameTrapped)
                ));
                assert!(matches!(sys.read(0), Err(SyscallError::FrameTrapped)));
                ExecOutcome::empty()
            }),
        );
        m.capabilities
            .grant(p, Capability::Write { start: 100, size: 1 });
        let outcome = m.dispatch_call(p, &[]);
        assert_eq!(
            outcome.status,
            SyscallError::WriteDenied { key: p, slot: 0 }.status_code()
        );
        assert!(m.storage.is_empty());
    }

    #[test]
    fn test_denied_log_emits_nothing() {
        let m = mediator();
        let p = register(
            &m,
            "noisy",
            Arc::new(|sys: &mut dyn Syscalls, _: &[u8]| match sys.log(&[], b"hello") {
                Ok(()) => ExecOutcome::empty(),
                Err(e) => ExecOutcome::fail(e.status_code()),
            }),
        );
        let outcome = m.dispatch_call(p, &[]);
        assert_eq!(
            outcome.status,
            SyscallError::LogDenied { key: p }.status_code()
        );
        assert!(m.journal.is_empty());
    }

    #[test]
    fn test_callee_uses_own_capability_set() {
        // The caller holds a write capability; the callee holds none and
        // must be denied even though its caller could write.
        let m = mediator();
        let callee = register(
            &m,
            "callee",
            Arc::new(|sys: &mut dyn Syscalls, _: &[u8]| match sys.write(5, word_from_u64(1)) {
                Ok(()) => ExecOutcome::empty(),
                Err(e) => ExecOutcome::fail(e.status_code()),
            }),
        );
        let caller = register(
            &m,
            "caller",
            Arc::new(move |sys: &mut dyn Syscalls, _: &[u8]| match sys.call(callee, &[]) {
                Ok(out) => out,
                Err(e) => ExecOutcome::fail(e.status_code()),
            }),
        );
        m.capabilities
            .grant(caller, Capability::Write { start: 0, size: 100 });
        m.capabilities.grant(caller, Capability::call_targets([callee]));

        let outcome = m.dispatch_call(caller, &[]);
        assert_eq!(
            outcome.status,
            SyscallError::WriteDenied {
                key: callee,
                slot: 5
            }
            .status_code()
        );
        assert!(m.storage.is_empty());
    }

    #[test]
    fn test_caller_continues_after_callee_trap() {
        // A callee denial aborts only the callee; the caller observes the
        // nonzero status and carries on with its own authorized work.
        let m = mediator();
        let callee = register(
            &m,
            "callee",
            Arc::new(|sys: &mut dyn Syscalls, _: &[u8]| match sys.write(5, word_from_u64(1)) {
                Ok(()) => ExecOutcome::empty(),
                Err(e) => ExecOutcome::fail(e.status_code()),
            }),
        );
        let caller = register(
            &m,
            "caller",
            Arc::new(move |sys: &mut dyn Syscalls, _: &[u8]| {
                let nested = match sys.call(callee, &[]) {
                    Ok(out) => out,
                    Err(e) => return ExecOutcome::fail(e.status_code()),
                };
                assert!(!nested.is_success());
                match sys.write(0, word_from_u64(7)) {
                    Ok(()) => ExecOutcome::ok(nested.status.to_be_bytes().to_vec()),
                    Err(e) => ExecOutcome::fail(e.status_code()),
                }
            }),
        );
        m.capabilities
            .grant(caller, Capability::Write { start: 0, size: 1 });
        m.capabilities.grant(caller, Capability::call_any());

        let outcome = m.dispatch_call(caller, &[]);
        assert!(outcome.is_success());
        assert_eq!(m.storage.read(0), word_from_u64(7));
        assert_eq!(m.storage.read(5), crate::core::types::ZERO_WORD);
    }

    #[test]
    fn test_call_to_unregistered_target_traps_caller() {
        let m = mediator();
        let caller = register(
            &m,
            "caller",
            Arc::new(|sys: &mut dyn Syscalls, _: &[u8]| {
                match sys.call(key("missing"), &[]) {
                    Ok(out) => out,
                    Err(e) => ExecOutcome::fail(e.status_code()),
                }
            }),
        );
        m.capabilities.grant(caller, Capability::call_any());
        let outcome = m.dispatch_call(caller, &[]);
        assert_eq!(
            outcome.status,
            SyscallError::ProcedureNotFound {
                target: key("missing")
            }
            .status_code()
        );
    }

    #[test]
    fn test_depth_ceiling_traps_caller() {
        let m = SyscallMediator::with_max_depth(
            Registry::new(),
            CapabilityStore::new(),
            SlotStorage::new(),
            LogJournal::new(),
            3,
        );
        let k = key("loop");
        m.registry
            .register(
                k,
                Arc::new(move |sys: &mut dyn Syscalls, _: &[u8]| match sys.call(k, &[]) {
                    Ok(out) => out,
                    Err(e) => ExecOutcome::fail(e.status_code()),
                }),
            )
            .unwrap();
        m.capabilities.grant(k, Capability::call_targets([k]));

        let outcome = m.dispatch_call(k, &[]);
        assert_eq!(
            outcome.status,
            SyscallError::DepthExceeded { limit: 3 }.status_code()
        );
    }
}
