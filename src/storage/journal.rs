/*!
 * Log Journal
 * Append-only journal of authorized log emissions
 */

use crate::core::types::{ProcedureKey, Word};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One committed log event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LogRecord {
    /// Procedure that emitted the event
    pub procedure: ProcedureKey,
    pub topics: Vec<Word>,
    pub data: Vec<u8>,
}

/// Ordered journal of log events. Denied emissions never reach it.
#[derive(Clone, Default)]
pub struct LogJournal {
    records: Arc<RwLock<Vec<LogRecord>>>,
}

impl LogJournal {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn append(&self, record: LogRecord) {
        self.records.write().push(record);
    }

    /// Snapshot of the journal in emission order
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.read().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}
