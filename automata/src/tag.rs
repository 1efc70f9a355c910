//! The tag carried by a single node of a regex-program graph.
//!
//! The disassembled program is not a tree of a handful of closed node
//! kinds: the byte-compiled automaton can, in principle, carry any u16
//! "kind" value, and the rewriter's bypass rule (`KIND_BYPASS`) matches on
//! a kind that the disassembler in this version of the format never
//! itself emits. So `Tag` stays a plain `(kind, payload)` pair rather than
//! a closed Rust enum, mirroring the `(typ, data)` tuples in
//! `examples/original_source/sb2dot/redis.py`.

use std::fmt;

/// `0x2f`: two-way branch. Read a `u16` target; edges to `target` and to
/// the fall-through instruction.
pub const KIND_BRANCH: u16 = 0x2f;
/// `0x0a`: unconditional jump. Read a `u16` target; single edge to it.
pub const KIND_JUMP: u16 = 0x0a;
/// `0x15`: accept. No outgoing edge; removed by the rewriter.
pub const KIND_ACCEPT: u16 = 0x15;
/// `0x100`: synthesized "this node holds a piece of the final pattern"
/// kind. Not an opcode byte value -- produced by the disassembler for
/// anchors/literals/dots/classes, and by the rewriter as it folds nodes
/// together.
pub const KIND_PATTERN: u16 = 0x100;
/// `0x31`: a node kind the rewriter knows how to splice out (every
/// predecessor gets wired directly to every successor), but which this
/// disassembler never produces for a version-3 program. Kept so the
/// rewriter's bypass rule is exercisable and so a future program version
/// that does emit it is handled for free.
pub const KIND_BYPASS: u16 = 0x31;

/// One node's tag: a kind plus an optional reconstructed-pattern payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub kind: u16,
    pub payload: Option<String>,
}

impl Tag {
    pub fn new(kind: u16, payload: Option<String>) -> Tag {
        Tag { kind, payload }
    }

    pub fn pattern(payload: impl Into<String>) -> Tag {
        Tag {
            kind: KIND_PATTERN,
            payload: Some(payload.into()),
        }
    }

    pub fn is_pattern(&self) -> bool {
        self.kind == KIND_PATTERN
    }

    /// the payload string, defaulting to empty -- matches the Python
    /// rewriter treating a `None` payload as `""` when concatenating.
    pub fn payload_or_empty(&self) -> &str {
        self.payload.as_deref().unwrap_or("")
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            Some(p) => write!(f, "(0x{:x}, {:?})", self.kind, p),
            None => write!(f, "(0x{:x}, None)", self.kind),
        }
    }
}
