//! Regex automaton disassembly and reconstruction (spec components C + D).
//!
//! This crate knows nothing about the sandbox profile container format: it
//! takes the raw bytes of one compiled regex program (as found at an
//! `offset*8` in the profile's regex table, length-prefix already stripped
//! by the caller) and produces either a reconstructed `regex`-flavored
//! pattern string or a reason it couldn't.

pub mod charmask;
pub mod disasm;
pub mod graph;
pub mod rewrite;
pub mod tag;

pub use disasm::{disassemble, AutomatonError};
pub use rewrite::reduce;

/// Disassemble and reduce one regex program to its reconstructed pattern
/// string.
///
/// Returns `Ok(None)` when the bytecode disassembles cleanly but the
/// rewriter cannot fold the resulting graph down to a single node --
/// this is the `undecodable` case from spec.md Sec 7, distinguished from
/// an `Err` (an unsupported version or illegal opcode) only by the caller
/// choosing to log the two cases differently.
pub fn decode(bytes: &[u8]) -> Result<Option<String>, AutomatonError> {
    let mut g = disassemble(bytes)?;
    Ok(reduce(&mut g))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(body: &[u8]) -> Vec<u8> {
        let mut v = vec![0u8, 0, 0, 3];
        let mlen = body.len() as u16;
        v.extend_from_slice(&mlen.to_le_bytes());
        v.extend_from_slice(body);
        v
    }

    #[test]
    fn decodes_literal_run() {
        // "abc" then accept
        let bytes = program(&[0x02, b'a', 0x02, b'b', 0x02, b'c', 0x15, 0x00]);
        assert_eq!(decode(&bytes).unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn decodes_anchored_literal() {
        // ^a$ then accept
        let bytes = program(&[0x19, 0x02, b'a', 0x29, 0x15, 0x00]);
        assert_eq!(decode(&bytes).unwrap().as_deref(), Some("^a$"));
    }

    #[test]
    fn decodes_char_class() {
        let bytes = program(&[0x1b, b'a', b'z', 0x15, 0x00]);
        assert_eq!(decode(&bytes).unwrap().as_deref(), Some("[a-z]"));
    }

    #[test]
    fn decodes_optional_literal() {
        // branch at 0 -> accept at 5 directly (skip 'a'), or falls through
        // to the literal 'a' at 3, which itself flows into the same
        // accept at 5. A real-world `a?` program, not a hand-wired graph.
        let bytes = program(&[0x2f, 0x05, 0x00, 0x02, b'a', 0x15, 0x00]);
        assert_eq!(decode(&bytes).unwrap().as_deref(), Some("(a)?"));
    }
}
