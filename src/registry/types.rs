/*!
 * Registry Types
 */

use super::traits::Executable;
use crate::core::types::ProcedureKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for registry operations
///
/// # Must Use
/// Registry operations can fail and must be handled
#[must_use = "registry operations can fail and must be handled"]
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Registry lifecycle errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "error", content = "details")]
pub enum RegistryError {
    /// The empty (all-zero) key can never be registered
    #[error("invalid procedure key")]
    InvalidKey,

    #[error("procedure {0} is already registered")]
    DuplicateKey(ProcedureKey),

    #[error("procedure {0} not found")]
    NotFound(ProcedureKey),

    /// The designated entry procedure cannot be deleted
    #[error("procedure {0} is the entry procedure")]
    EntryProcedure(ProcedureKey),
}

impl RegistryError {
    /// The published status code for this rejection class
    #[must_use]
    pub fn status_code(&self) -> u32 {
        match self {
            RegistryError::InvalidKey => 1,
            RegistryError::DuplicateKey(_) => 2,
            RegistryError::NotFound(_) => 3,
            RegistryError::EntryProcedure(_) => 11,
        }
    }
}

/// One live registration: a key bound to its immutable executable handle.
/// Owned exclusively by the registry.
#[derive(Clone)]
pub struct ProcedureEntry {
    pub key: ProcedureKey,
    pub handle: Arc<dyn Executable>,
}

impl ProcedureEntry {
    #[must_use]
    pub fn new(key: ProcedureKey, handle: Arc<dyn Executable>) -> Self {
        Self { key, handle }
    }
}

impl fmt::Debug for ProcedureEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcedureEntry")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
