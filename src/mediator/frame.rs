/*!
 * Call Frames
 * Explicit arena of nested invocations within one dispatch
 *
 * Frames are arena records rather than host stack slots so that depth is
 * limited explicitly and the active call chain stays inspectable. The
 * arena is append-only for the life of a dispatch; a frame's state moves
 * `Executing -> {Trapped | Returned}` and never back.
 */

use super::types::{SyscallError, SyscallResult};
use crate::core::types::ProcedureKey;
use serde::{Deserialize, Serialize};

/// Index of a frame within its dispatch's arena
pub type FrameId = usize;

/// Default ceiling on nested call depth
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Lifecycle of one frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum FrameState {
    Executing,
    /// The frame hit a denial or fault; `cause` fixes its bubbled status
    Trapped { cause: SyscallError },
    Returned,
}

/// One nested invocation: ephemeral, destroyed with the dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallFrame {
    pub key: ProcedureKey,
    pub parent: Option<FrameId>,
    pub depth: usize,
    pub state: FrameState,
}

/// Arena of call frames for a single dispatch
#[derive(Debug)]
pub struct FrameStack {
    frames: Vec<CallFrame>,
    max_depth: usize,
}

impl FrameStack {
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Open a frame for `key` under `parent`. Fails with `DepthExceeded`
    /// when the chain would grow past the ceiling.
    pub fn push(&mut self, key: ProcedureKey, parent: Option<FrameId>) -> SyscallResult<FrameId> {
        let depth = match parent {
            Some(id) => self.frames[id].depth + 1,
            None => 1,
        };
        if depth > self.max_depth {
            return Err(SyscallError::DepthExceeded {
                limit: self.max_depth,
            });
        }
        let id = self.frames.len();
        self.frames.push(CallFrame {
            key,
            parent,
            depth,
            state: FrameState::Executing,
        });
        Ok(id)
    }

    #[must_use]
    pub fn key_of(&self, id: FrameId) -> ProcedureKey {
        self.frames[id].key
    }

    #[must_use]
    pub fn depth_of(&self, id: FrameId) -> usize {
        self.frames[id].depth
    }

    #[must_use]
    pub fn state(&self, id: FrameId) -> &FrameState {
        &self.frames[id].state
    }

    /// Trap a frame. The first trap wins; later faults on a dead frame do
    /// not overwrite the original cause.
    pub fn trap(&mut self, id: FrameId, cause: SyscallError) {
        let frame = &mut self.frames[id];
        if frame.state == FrameState::Executing {
            frame.state = FrameState::Trapped { cause };
        }
    }

    /// Mark a frame returned; a trapped frame stays trapped
    pub fn mark_returned(&mut self, id: FrameId) {
        let frame = &mut self.frames[id];
        if frame.state == FrameState::Executing {
            frame.state = FrameState::Returned;
        }
    }

    /// All frames opened during this dispatch, in open order
    #[must_use]
    pub fn frames(&self) -> &[CallFrame] {
        &self.frames
    }

    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}
