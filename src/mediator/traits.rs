/*!
 * Syscall Traits
 * The interface executing procedure code uses to reach the kernel
 */

use super::types::SyscallResult;
use crate::core::types::{ProcedureKey, Slot, Word};
use crate::registry::traits::ExecOutcome;

/// Mediated syscalls available to an executing procedure.
///
/// Every operation is authorized against the *currently executing*
/// procedure's own capability set; nothing is inherited from callers. A
/// denial traps the issuing frame: the error should be propagated, and any
/// further syscall on the frame fails with `FrameTrapped`.
pub trait Syscalls {
    /// Write one storage slot. Requires a matching write capability.
    fn write(&mut self, slot: Slot, value: Word) -> SyscallResult<()>;

    /// Read one storage slot. Ungated; unwritten slots read as zero.
    fn read(&mut self, slot: Slot) -> SyscallResult<Word>;

    /// Emit a log event. Requires a log capability matching `topics`.
    /// A denial emits nothing.
    fn log(&mut self, topics: &[Word], data: &[u8]) -> SyscallResult<()>;

    /// Invoke another procedure and run it to completion under its own
    /// capability set. Requires a call capability covering `target`.
    ///
    /// `Ok` carries the callee's bubbled outcome — including a nonzero
    /// status when the callee itself trapped; the caller keeps executing
    /// and decides whether to propagate. `Err` means this frame's own
    /// authorization failed and the frame is now trapped.
    fn call(&mut self, target: ProcedureKey, payload: &[u8]) -> SyscallResult<ExecOutcome>;

    /// Key of the procedure this frame is executing
    fn executing_key(&self) -> ProcedureKey;

    /// Depth of this frame within the dispatch (top level = 1)
    fn depth(&self) -> usize;
}
