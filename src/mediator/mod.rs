/*!
 * Syscall Mediator
 * Per-frame authorization state machine over an explicit call-frame arena
 */

pub mod executor;
pub mod frame;
pub mod traits;
pub mod types;

pub use executor::{SyscallContext, SyscallMediator};
pub use frame::{CallFrame, FrameId, FrameStack, FrameState, DEFAULT_MAX_DEPTH};
pub use traits::Syscalls;
pub use types::{SyscallError, SyscallResult};
