/*!
 * Error Types
 * Crate-level error aggregate and the published status-code table
 *
 * Every rejection class maps to one stable nonzero status code:
 *
 * | code | class |
 * |------|-------|
 * | 0 | success |
 * | 1 | InvalidKey |
 * | 2 | DuplicateKey |
 * | 3 | NotFound |
 * | 4 | InvalidCapabilityEncoding |
 * | 5 | CapabilityDenied (write) |
 * | 6 | CapabilityDenied (log) |
 * | 7 | CapabilityDenied (call) |
 * | 8 | ProcedureNotFound |
 * | 9 | CallDepthExceeded |
 * | 10 | FrameTrapped |
 * | 11 | EntryProcedure |
 * | 12 | AttenuationViolation |
 *
 * Codes 1-15 are reserved for the kernel; procedure-defined statuses
 * should use 16 or above.
 */

use miette::Diagnostic;
use thiserror::Error;

// Re-export per-module error types
pub use crate::capability::types::CapabilityError;
pub use crate::mediator::types::SyscallError;
pub use crate::registry::types::RegistryError;

/// Status code denoting success on every surface
pub const STATUS_SUCCESS: u32 = 0;

/// Highest status code the kernel reserves for its own fault classes
pub const STATUS_KERNEL_MAX: u32 = 15;

/// Unified kernel error type with miette diagnostics
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum KernelError {
    #[error("registry error: {0}")]
    #[diagnostic(
        code(kernel::registry),
        help("Check the procedure key and the registry's live registrations.")
    )]
    Registry(#[from] RegistryError),

    #[error("capability error: {0}")]
    #[diagnostic(
        code(kernel::capability),
        help("Check the capability encoding and the delegator's granted authority.")
    )]
    Capability(#[from] CapabilityError),

    #[error("syscall error: {0}")]
    #[diagnostic(
        code(kernel::syscall),
        help("The denial is frame-local; the issuing frame's status carries the code.")
    )]
    Syscall(#[from] SyscallError),
}

impl KernelError {
    /// The published status code for this error (see module docs)
    #[must_use]
    pub fn status_code(&self) -> u32 {
        match self {
            KernelError::Registry(err) => err.status_code(),
            KernelError::Capability(err) => err.status_code(),
            KernelError::Syscall(err) => err.status_code(),
        }
    }
}

/// Result type for kernel operations
///
/// # Must Use
/// Kernel operations can fail and must be handled
pub type Result<T> = std::result::Result<T, KernelError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ProcedureKey;

    #[test]
    fn test_status_codes_stay_in_kernel_band() {
        let key = ProcedureKey::from_label("k").unwrap();
        let errors: Vec<KernelError> = vec![
            RegistryError::InvalidKey.into(),
            RegistryError::DuplicateKey(key).into(),
            RegistryError::NotFound(key).into(),
            RegistryError::EntryProcedure(key).into(),
            CapabilityError::InvalidEncoding("bad".into()).into(),
            CapabilityError::AttenuationViolation.into(),
            SyscallError::WriteDenied { key, slot: 0 }.into(),
            SyscallError::LogDenied { key }.into(),
            SyscallError::CallDenied { key, target: key }.into(),
            SyscallError::ProcedureNotFound { target: key }.into(),
            SyscallError::DepthExceeded { limit: 1 }.into(),
            SyscallError::FrameTrapped.into(),
        ];
        let mut codes: Vec<u32> = errors.iter().map(KernelError::status_code).collect();
        codes.sort_unstable();
        let deduped = codes.clone();
        codes.dedup();
        assert_eq!(codes, deduped, "status codes must be distinct");
        assert!(codes
            .iter()
            .all(|c| *c != STATUS_SUCCESS && *c <= STATUS_KERNEL_MAX));
    }

    #[test]
    fn test_kernel_error_display() {
        let err: KernelError = RegistryError::InvalidKey.into();
        assert_eq!(err.to_string(), "registry error: invalid procedure key");
    }
}
