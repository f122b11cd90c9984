/*!
 * Core
 * Shared types and the crate-level error aggregate
 */

pub mod errors;
pub mod types;

pub use errors::{KernelError, Result, STATUS_KERNEL_MAX, STATUS_SUCCESS};
pub use types::{word_from_u64, word_to_u64, ProcedureKey, Slot, Word, ZERO_WORD};
