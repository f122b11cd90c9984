/*!
 * Core Types
 * Common types used across the kernel
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage slot address
pub type Slot = u64;

/// 32-byte value cell: the unit of storage values, log topics, and
/// capability encoding fields
pub type Word = [u8; 32];

/// The all-zero word (value of any unwritten slot)
pub const ZERO_WORD: Word = [0u8; 32];

/// Pack a `u64` into the trailing 8 bytes of a word (big-endian)
#[inline]
#[must_use]
pub fn word_from_u64(value: u64) -> Word {
    let mut word = ZERO_WORD;
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Read a word back as a `u64`. Returns `None` if any of the leading
/// 24 bytes is nonzero (the value does not fit; never truncate).
#[inline]
#[must_use]
pub fn word_to_u64(word: &Word) -> Option<u64> {
    if word[..24].iter().any(|b| *b != 0) {
        return None;
    }
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&word[24..]);
    Some(u64::from_be_bytes(tail))
}

const KEY_LEN: usize = 24;

/// Procedure identifier: 24 bytes, zero-padded, compared byte-exact.
///
/// The all-zero key is representable (lookups with it simply miss) but is
/// rejected at registration time.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ProcedureKey([u8; KEY_LEN]);

impl ProcedureKey {
    /// Fixed key width in bytes
    pub const LEN: usize = KEY_LEN;

    /// The all-zero (empty) key
    pub const EMPTY: Self = Self([0u8; Self::LEN]);

    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// Build a key from a UTF-8 label, zero-padding to the right.
    /// Returns `None` when the label is longer than [`Self::LEN`].
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::from_slice(label.as_bytes())
    }

    /// Build a key from raw bytes, zero-padding to the right.
    /// Returns `None` when the slice is longer than [`Self::LEN`].
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() > Self::LEN {
            return None;
        }
        let mut key = [0u8; Self::LEN];
        key[..bytes.len()].copy_from_slice(bytes);
        Some(Self(key))
    }

    /// True for the all-zero key
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; Self::LEN]
    }

    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// Pack the key into the trailing 24 bytes of a word
    #[must_use]
    pub fn to_word(&self) -> Word {
        let mut word = ZERO_WORD;
        word[32 - Self::LEN..].copy_from_slice(&self.0);
        word
    }

    /// Unpack a key from the trailing 24 bytes of a word. Returns `None`
    /// when any of the leading 8 bytes is nonzero.
    #[must_use]
    pub fn from_word(word: &Word) -> Option<Self> {
        if word[..32 - Self::LEN].iter().any(|b| *b != 0) {
            return None;
        }
        let mut key = [0u8; Self::LEN];
        key.copy_from_slice(&word[32 - Self::LEN..]);
        Some(Self(key))
    }

    /// Human-readable label: the key bytes with trailing zero padding
    /// stripped, lossily decoded as UTF-8
    #[must_use]
    pub fn label(&self) -> String {
        let end = self
            .0
            .iter()
            .rposition(|b| *b != 0)
            .map_or(0, |pos| pos + 1);
        String::from_utf8_lossy(&self.0[..end]).into_owned()
    }
}

impl fmt::Display for ProcedureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "<empty>")
        } else {
            write!(f, "{}", self.label())
        }
    }
}

impl fmt::Debug for ProcedureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProcedureKey({})", self)
    }
}

impl From<[u8; ProcedureKey::LEN]> for ProcedureKey {
    #[inline]
    fn from(bytes: [u8; ProcedureKey::LEN]) -> Self {
        Self(bytes)
    }
}
