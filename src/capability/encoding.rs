/*!
 * Capability Encoding
 * Word-field encoding of capabilities: `[typeTag, field...]`
 *
 * A capability list concatenates entries, each prefixed with a length
 * word counting the tag plus its fields. Published type tags:
 * 1 = Write, 2 = Log, 3 = Call.
 */

use super::types::{Capability, CapabilityError, CapabilityResult, MAX_LOG_TOPICS};
use crate::core::types::{word_from_u64, word_to_u64, ProcedureKey, Word};

/// Type tag for `Capability::Write`
pub const TAG_WRITE: u64 = 1;
/// Type tag for `Capability::Log`
pub const TAG_LOG: u64 = 2;
/// Type tag for `Capability::Call`
pub const TAG_CALL: u64 = 3;

/// Field count of a `Write` entry (start, size)
const WRITE_ARITY: usize = 2;

/// Decode one capability from an ordered field sequence `[typeTag, field...]`.
///
/// Fails with [`CapabilityError::InvalidEncoding`] on an unknown tag or a
/// field count outside the variant's arity; nothing is ever silently
/// truncated.
pub fn decode(fields: &[Word]) -> CapabilityResult<Capability> {
    let (tag_word, rest) = fields
        .split_first()
        .ok_or_else(|| CapabilityError::InvalidEncoding("empty field sequence".into()))?;
    let tag = word_to_u64(tag_word)
        .ok_or_else(|| CapabilityError::InvalidEncoding("type tag exceeds 64 bits".into()))?;

    match tag {
        TAG_WRITE => {
            if rest.len() != WRITE_ARITY {
                return Err(CapabilityError::InvalidEncoding(format!(
                    "write capability takes {} fields, got {}",
                    WRITE_ARITY,
                    rest.len()
                )));
            }
            let start = word_to_u64(&rest[0]).ok_or_else(|| {
                CapabilityError::InvalidEncoding("write start exceeds 64 bits".into())
            })?;
            let size = word_to_u64(&rest[1]).ok_or_else(|| {
                CapabilityError::InvalidEncoding("write size exceeds 64 bits".into())
            })?;
            Ok(Capability::Write { start, size })
        }
        TAG_LOG => {
            if rest.len() > MAX_LOG_TOPICS {
                return Err(CapabilityError::InvalidEncoding(format!(
                    "log capability takes at most {} topics, got {}",
                    MAX_LOG_TOPICS,
                    rest.len()
                )));
            }
            Ok(Capability::Log {
                topics: rest.to_vec(),
            })
        }
        TAG_CALL => {
            let mut targets = std::collections::HashSet::with_capacity(rest.len());
            for field in rest {
                let key = ProcedureKey::from_word(field).ok_or_else(|| {
                    CapabilityError::InvalidEncoding(
                        "call target field carries more than 24 key bytes".into(),
                    )
                })?;
                if key.is_empty() {
                    return Err(CapabilityError::InvalidEncoding(
                        "call target field holds the empty key".into(),
                    ));
                }
                targets.insert(key);
            }
            Ok(Capability::Call { targets })
        }
        unknown => Err(CapabilityError::InvalidEncoding(format!(
            "unknown capability type tag {}",
            unknown
        ))),
    }
}

/// Encode a capability back into its field sequence
#[must_use]
pub fn encode(capability: &Capability) -> Vec<Word> {
    match capability {
        Capability::Write { start, size } => vec![
            word_from_u64(TAG_WRITE),
            word_from_u64(*start),
            word_from_u64(*size),
        ],
        Capability::Log { topics } => {
            let mut fields = Vec::with_capacity(1 + topics.len());
            fields.push(word_from_u64(TAG_LOG));
            fields.extend_from_slice(topics);
            fields
        }
        Capability::Call { targets } => {
            let mut keys: Vec<&ProcedureKey> = targets.iter().collect();
            keys.sort();
            let mut fields = Vec::with_capacity(1 + keys.len());
            fields.push(word_from_u64(TAG_CALL));
            fields.extend(keys.into_iter().map(ProcedureKey::to_word));
            fields
        }
    }
}

/// Decode a length-prefixed capability list: `[count, tag, field...]...`
/// where each `count` covers the tag word plus its fields.
///
/// All-or-nothing: any malformed entry fails the whole list.
pub fn decode_list(words: &[Word]) -> CapabilityResult<Vec<Capability>> {
    let mut capabilities = Vec::new();
    let mut cursor = words;
    while let Some((count_word, rest)) = cursor.split_first() {
        let count = word_to_u64(count_word)
            .and_then(|c| usize::try_from(c).ok())
            .ok_or_else(|| {
                CapabilityError::InvalidEncoding("entry length exceeds usize".into())
            })?;
        if count == 0 {
            return Err(CapabilityError::InvalidEncoding(
                "zero-length capability entry".into(),
            ));
        }
        if count > rest.len() {
            return Err(CapabilityError::InvalidEncoding(format!(
                "entry length {} overruns list of {} remaining words",
                count,
                rest.len()
            )));
        }
        capabilities.push(decode(&rest[..count])?);
        cursor = &rest[count..];
    }
    Ok(capabilities)
}

/// Encode a capability list with per-entry length prefixes
#[must_use]
pub fn encode_list(capabilities: &[Capability]) -> Vec<Word> {
    let mut words = Vec::new();
    for capability in capabilities {
        let fields = encode(capability);
        words.push(word_from_u64(fields.len() as u64));
        words.extend(fields);
    }
    words
}
