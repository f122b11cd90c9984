/*!
 * Capability Model
 * Capability variants, word-field encoding, and the per-procedure store
 */

pub mod encoding;
pub mod store;
pub mod types;

pub use encoding::{decode, decode_list, encode, encode_list};
pub use store::CapabilityStore;
pub use types::{
    AccessRequest, Capability, CapabilityError, CapabilityKind, CapabilityResult, MAX_LOG_TOPICS,
};
