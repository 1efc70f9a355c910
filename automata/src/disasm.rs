//! Regex bytecode disassembler (component C): walks a compiled regex
//! program and builds a `Graph` of its opcodes. A direct translation of
//! `reToGraph` in `examples/original_source/sb2dot/redis.py`.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use failure::Fail;

use crate::charmask::{maybe_escape, CharMask};
use crate::graph::Graph;
use crate::tag::{Tag, KIND_ACCEPT, KIND_BRANCH, KIND_JUMP};

const SUPPORTED_VERSION: u32 = 3;

#[derive(Debug, Fail)]
pub enum AutomatonError {
    #[fail(display = "unsupported regex program version: {:#x}", _0)]
    UnsupportedVersion(u32),

    #[fail(display = "illegal opcode 0x{:02x} at offset {:#x}", typ, offset)]
    IllegalOpcode { offset: u16, typ: u8 },

    #[fail(display = "regex program truncated at offset {:#x}", _0)]
    Truncated(usize),
}

/// disassemble a regex program blob (the bytes stored in the regex
/// table, including the leading version/length header) into a `Graph`
/// of its opcodes.
pub fn disassemble(bytes: &[u8]) -> Result<Graph, AutomatonError> {
    if bytes.len() < 6 {
        return Err(AutomatonError::Truncated(bytes.len()));
    }

    let version = BigEndian::read_u32(&bytes[0..4]);
    if version != SUPPORTED_VERSION {
        return Err(AutomatonError::UnsupportedVersion(version));
    }

    let mlen = LittleEndian::read_u16(&bytes[4..6]) as usize;

    let mut g = Graph::new();
    let mut pos: usize = 6;

    loop {
        let idx = pos - 6;
        if mlen == idx {
            break;
        }

        let byte_at = |p: usize| -> Result<u8, AutomatonError> {
            bytes.get(p).copied().ok_or(AutomatonError::Truncated(p))
        };
        let u16_at = |p: usize| -> Result<u16, AutomatonError> {
            if p + 2 > bytes.len() {
                return Err(AutomatonError::Truncated(p));
            }
            Ok(LittleEndian::read_u16(&bytes[p..p + 2]))
        };

        let mut typ = byte_at(pos)?;
        pos += 1;
        if typ & 0xf == 10 {
            typ = 10;
        }

        match typ {
            0x2f => {
                let target = u16_at(pos)?;
                pos += 2;
                let idx = idx as u16;
                g.add_edge(idx, target);
                g.add_edge(idx, idx + 3);
                g.set_tag(idx, Tag::new(KIND_BRANCH, None));
            }
            0x0a => {
                let target = u16_at(pos)?;
                pos += 2;
                let idx = idx as u16;
                g.add_edge(idx, target);
                g.set_tag(idx, Tag::new(KIND_JUMP, None));
            }
            0x15 => {
                // unsure overread, matches the original's unconditional
                // single-byte skip here.
                let _ = byte_at(pos)?;
                pos += 1;
                g.set_tag(idx as u16, Tag::new(KIND_ACCEPT, None));
            }
            0x19 => {
                let idx = idx as u16;
                g.add_edge(idx, idx + 1);
                g.set_tag(idx, Tag::pattern("^"));
            }
            0x29 => {
                let idx = idx as u16;
                g.add_edge(idx, idx + 1);
                g.set_tag(idx, Tag::pattern("$"));
            }
            0x02 => {
                let c = byte_at(pos)?;
                pos += 1;
                let idx = idx as u16;
                g.add_edge(idx, idx + 2);
                g.set_tag(idx, Tag::pattern(maybe_escape(c as char)));
            }
            0x09 => {
                let idx = idx as u16;
                g.add_edge(idx, idx + 1);
                g.set_tag(idx, Tag::pattern("."));
            }
            t if (t & 0xf) == 0xb => {
                let cnt = (t >> 4) as usize;
                let mut cmask = CharMask::new();
                for _ in 0..cnt {
                    let c1 = byte_at(pos)?;
                    let c2 = byte_at(pos + 1)?;
                    pos += 2;
                    cmask.add_from_to(c1, c2);
                }
                let idx = idx as u16;
                g.add_edge(idx, idx + 1 + (cnt as u16) * 2);
                g.set_tag(idx, Tag::pattern(cmask.to_string()));
            }
            t => {
                return Err(AutomatonError::IllegalOpcode {
                    offset: idx as u16,
                    typ: t,
                });
            }
        }
    }

    Ok(g)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::KIND_PATTERN;
    use matches::assert_matches;

    fn program(body: &[u8]) -> Vec<u8> {
        let mut v = vec![0u8, 0, 0, 3];
        let mlen = body.len() as u16;
        v.extend_from_slice(&mlen.to_le_bytes());
        v.extend_from_slice(body);
        v
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut v = vec![0u8, 0, 0, 2];
        v.extend_from_slice(&0u16.to_le_bytes());
        assert_matches!(disassemble(&v), Err(AutomatonError::UnsupportedVersion(2)));
    }

    #[test]
    fn disassembles_single_literal() {
        // 0x02 'a' then accept 0x15 <pad>
        let bytes = program(&[0x02, b'a', 0x15, 0x00]);
        let g = disassemble(&bytes).unwrap();
        assert_eq!(g.get_tag(0).unwrap().kind, KIND_PATTERN);
        assert_eq!(g.get_tag(0).unwrap().payload.as_deref(), Some("a"));
        assert_eq!(g.successors(0), &[2]);
    }

    #[test]
    fn disassembles_any_char() {
        let bytes = program(&[0x09, 0x15, 0x00]);
        let g = disassemble(&bytes).unwrap();
        assert_eq!(g.get_tag(0).unwrap().payload.as_deref(), Some("."));
    }

    #[test]
    fn illegal_opcode_is_reported() {
        let bytes = program(&[0xff]);
        assert_matches!(
            disassemble(&bytes),
            Err(AutomatonError::IllegalOpcode { typ: 0xff, .. })
        );
    }
}
