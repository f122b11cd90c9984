/*!
 * Dispatcher / Entry Router
 * Decodes raw external calls and routes them as top-level invocations
 */

use crate::core::types::ProcedureKey;
use crate::mediator::executor::SyscallMediator;
use crate::registry::traits::ExecOutcome;
use crate::registry::types::RegistryError;
use bytes::Bytes;
use tracing::debug;

/// Routes raw external calls into the mediator.
///
/// A raw call is a fixed-width zero-padded procedure key followed by the
/// payload. The designated entry procedure holds no kernel-level bypass;
/// it is authorized exactly like any other procedure.
#[derive(Clone)]
pub struct Dispatcher {
    mediator: SyscallMediator,
}

impl Dispatcher {
    #[must_use]
    pub fn new(mediator: SyscallMediator) -> Self {
        Self { mediator }
    }

    /// Decode `{key prefix, payload}` and invoke the target as a top-level
    /// call, returning the bubbled `(status, bytes)` unmodified.
    ///
    /// A raw call shorter than the key prefix, or one addressing the empty
    /// key, yields the `InvalidKey` status.
    pub fn dispatch(&self, raw: Bytes) -> ExecOutcome {
        if raw.len() < ProcedureKey::LEN {
            return ExecOutcome::fail(RegistryError::InvalidKey.status_code());
        }
        let target = match ProcedureKey::from_slice(&raw[..ProcedureKey::LEN]) {
            Some(key) if !key.is_empty() => key,
            _ => return ExecOutcome::fail(RegistryError::InvalidKey.status_code()),
        };
        let payload = raw.slice(ProcedureKey::LEN..);
        debug!(target = %target, payload_len = payload.len(), "dispatching external call");
        self.mediator.dispatch_call(target, &payload)
    }

    /// Invoke `target` directly as a top-level call
    pub fn dispatch_to(&self, target: ProcedureKey, payload: &[u8]) -> ExecOutcome {
        self.mediator.dispatch_call(target, payload)
    }
}
