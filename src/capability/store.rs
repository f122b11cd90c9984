/*!
 * Capability Store
 * Per-procedure capability sets with grant / authorize / delegate
 */

use super::types::{AccessRequest, Capability, CapabilityError, CapabilityResult};
use crate::core::types::ProcedureKey;
use dashmap::DashMap;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::Arc;

/// Holds every live procedure's granted capability list.
///
/// Lists are append-only and ordered by grant time; authorization is
/// order-independent (any matching entry authorizes). An unknown key never
/// authorizes anything: there are no implicit grants.
#[derive(Clone, Default)]
pub struct CapabilityStore {
    sets: Arc<DashMap<ProcedureKey, Vec<Capability>>>,
}

impl CapabilityStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sets: Arc::new(DashMap::new()),
        }
    }

    /// Append a capability to a key's set. No deduplication.
    pub fn grant(&self, key: ProcedureKey, capability: Capability) {
        info!("Granted {} to {}", capability, key);
        self.sets.entry(key).or_default().push(capability);
    }

    /// Check whether `key` may perform `request`
    #[must_use]
    pub fn authorize(&self, key: &ProcedureKey, request: &AccessRequest<'_>) -> bool {
        let allowed = self
            .sets
            .get(key)
            .map(|set| set.iter().any(|cap| cap.grants(request)))
            .unwrap_or(false);
        if allowed {
            debug!("{} authorized for {:?}", key, request.kind());
        } else {
            warn!("{} denied {:?} request", key, request.kind());
        }
        allowed
    }

    /// Derive a call capability for a nested call restricted to
    /// `narrowed_targets`.
    ///
    /// The derived grant must be a subset of the delegator's own call
    /// authority; a wider request fails with
    /// [`CapabilityError::AttenuationViolation`]. A wildcard (empty) set can
    /// only be delegated by a holder of the wildcard call capability.
    pub fn delegate(
        &self,
        key: &ProcedureKey,
        narrowed_targets: &HashSet<ProcedureKey>,
    ) -> CapabilityResult<Capability> {
        let derived = Capability::Call {
            targets: narrowed_targets.clone(),
        };
        let covered = self
            .sets
            .get(key)
            .map(|set| {
                set.iter()
                    .filter(|cap| matches!(cap, Capability::Call { .. }))
                    .any(|cap| derived.is_subset_of(cap))
                    || (!narrowed_targets.is_empty()
                        && narrowed_targets
                            .iter()
                            .all(|t| Self::covers_target(set.as_slice(), t)))
            })
            .unwrap_or(false);
        if covered {
            Ok(derived)
        } else {
            warn!("{} attempted to delegate beyond its call authority", key);
            Err(CapabilityError::AttenuationViolation)
        }
    }

    fn covers_target(set: &[Capability], target: &ProcedureKey) -> bool {
        set.iter().any(|cap| cap.grants(&AccessRequest::Call(*target)))
    }

    /// Snapshot of a key's capability set, in grant order
    #[must_use]
    pub fn capabilities(&self, key: &ProcedureKey) -> Vec<Capability> {
        self.sets.get(key).map(|set| set.clone()).unwrap_or_default()
    }

    /// Drop every capability held by `key`. Returns the number removed.
    pub fn purge(&self, key: &ProcedureKey) -> usize {
        match self.sets.remove(key) {
            Some((_, set)) => {
                info!("Purged {} capabilities from {}", set.len(), key);
                set.len()
            }
            None => 0,
        }
    }

    /// Number of keys holding at least one capability
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
