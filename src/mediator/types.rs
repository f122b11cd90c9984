/*!
 * Syscall Error Types
 * Frame-local denial and fault classes for the mediated syscall path
 */

use crate::core::types::{ProcedureKey, Slot};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for mediated syscalls
///
/// # Must Use
/// A denied syscall traps the issuing frame; the error must be propagated
#[must_use = "a denied syscall traps the issuing frame and must be propagated"]
pub type SyscallResult<T> = Result<T, SyscallError>;

/// Errors produced on the syscall path. Each maps to one stable nonzero
/// status code (see `core::errors`); all are frame-local and never abort
/// unrelated frames.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "error", content = "details")]
pub enum SyscallError {
    #[error("procedure {key} holds no write capability for slot {slot}")]
    WriteDenied { key: ProcedureKey, slot: Slot },

    #[error("procedure {key} holds no log capability for the requested topics")]
    LogDenied { key: ProcedureKey },

    #[error("procedure {key} holds no call capability for target {target}")]
    CallDenied {
        key: ProcedureKey,
        target: ProcedureKey,
    },

    #[error("call target {target} is not registered")]
    ProcedureNotFound { target: ProcedureKey },

    #[error("call depth limit of {limit} frames exceeded")]
    DepthExceeded { limit: usize },

    #[error("frame already trapped; no further syscalls accepted")]
    FrameTrapped,
}

impl SyscallError {
    /// The published status code for this fault class
    #[must_use]
    pub fn status_code(&self) -> u32 {
        match self {
            SyscallError::WriteDenied { .. } => 5,
            SyscallError::LogDenied { .. } => 6,
            SyscallError::CallDenied { .. } => 7,
            SyscallError::ProcedureNotFound { .. } => 8,
            SyscallError::DepthExceeded { .. } => 9,
            SyscallError::FrameTrapped => 10,
        }
    }
}
