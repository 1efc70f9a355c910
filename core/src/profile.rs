//! Component F: the profile top-level driver. Parses the header, builds
//! the regex-string table (components C+D via `sb2dot-automata`), detects
//! single-profile vs. profile-collection, and builds the per-operation
//! decision graph(s). A direct translation of the driver body in
//! `examples/original_source/sb2dot/sb2dot.py` (the part below
//! `load_op_names`/`parse_optable`), restructured as a library entry point
//! instead of top-level script code.

use std::collections::HashMap;

use log::{info, warn};

use crate::cursor::Cursor;
use crate::dagparser::{parse_filternode, DecisionGraph};
use crate::error::DecodeError;

/// Byte offset of the operation table in a single (non-collection) profile
/// -- immediately after the 6-byte header (spec.md Sec 3).
const HEADER_LEN: usize = 6;

/// `flags == 0x8000` denotes a profile collection; every other observed
/// value (0, 1, 2) denotes a single profile (spec.md Sec 3).
const COLLECTION_FLAG: u16 = 0x8000;

/// One slot of the reconstructed regex table (spec.md Sec 3): either the
/// disassembler+rewriter produced a pattern string, or it didn't
/// (`undecodable`, spec.md Sec 7) and the driver carries on regardless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegexSlot {
    Decoded(String),
    Undecodable,
}

impl std::fmt::Display for RegexSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegexSlot::Decoded(s) => write!(f, "{}", s),
            RegexSlot::Undecodable => write!(f, "undecodable"),
        }
    }
}

/// The 6-byte container header (spec.md Sec 3).
pub struct Header {
    pub flags: u16,
    pub re_table_offset: u16,
    pub re_table_count: u16,
}

impl Header {
    pub fn read(cursor: &Cursor) -> Result<Header, DecodeError> {
        Ok(Header {
            flags: cursor.read_u16(0)?,
            re_table_offset: cursor.read_u16(2)?,
            re_table_count: cursor.read_u16(4)?,
        })
    }

    pub fn is_collection(&self) -> bool {
        self.flags == COLLECTION_FLAG
    }
}

/// One group of operations that share a decision-tree root (spec.md Sec
/// 4.F step 5). `filename_part` is the space-joined operation names (used
/// to build the output filename); `label` is the same names joined with
/// newlines (used in the DOT label). The op at index 0 is always the
/// "default" group, named accordingly even if no other op shares its
/// offset.
pub struct OperationGroup {
    pub root_offset: u16,
    pub filename_part: String,
    pub label: String,
    pub is_default: bool,
}

/// A fully decoded profile: one shared decision graph (terminals and
/// subtrees shared across operations, per the "Supplemented features" note
/// in SPEC_FULL.md) plus the list of operation groups rooted in it.
pub struct Profile {
    pub name: String,
    pub graph: DecisionGraph,
    pub groups: Vec<OperationGroup>,
}

fn read_op_table(cursor: &Cursor, base: usize, op_table_count: usize) -> Result<Vec<u16>, DecodeError> {
    let mut table = Vec::with_capacity(op_table_count);
    for i in 0..op_table_count {
        table.push(cursor.read_u16(base + i * 2)?);
    }
    Ok(table)
}

/// Component F step 5: group every non-default op index by the offset it
/// shares, in order of first appearance (spec.md Sec 8 property 7).
fn group_op_table(op_table: &[u16], op_names: &[String]) -> Vec<OperationGroup> {
    let default_offset = op_table[0];
    let mut groups = vec![OperationGroup {
        root_offset: default_offset,
        filename_part: "default".to_string(),
        label: "default".to_string(),
        is_default: true,
    }];
    let mut index_of: HashMap<u16, usize> = HashMap::new();

    for (op_idx, &offset) in op_table.iter().enumerate() {
        if offset == default_offset {
            continue;
        }
        let name = op_names.get(op_idx).map(String::as_str).unwrap_or("");
        if let Some(&gi) = index_of.get(&offset) {
            groups[gi].filename_part.push(' ');
            groups[gi].filename_part.push_str(name);
            groups[gi].label.push('\n');
            groups[gi].label.push_str(name);
        } else {
            index_of.insert(offset, groups.len());
            groups.push(OperationGroup {
                root_offset: offset,
                filename_part: name.to_string(),
                label: name.to_string(),
                is_default: false,
            });
        }
    }

    groups
}

/// build the regex-string table (components C+D), tolerating per-entry
/// failures: an unsupported version, an illegal opcode, or a rewriter that
/// can't reduce to one node all fall back to `RegexSlot::Undecodable`
/// rather than aborting the whole profile (spec.md Sec 7).
pub fn read_regex_table(cursor: &Cursor, header: &Header) -> Result<Vec<RegexSlot>, DecodeError> {
    let table_base = Cursor::word_to_byte(header.re_table_offset);
    let mut re_offsets = Vec::with_capacity(header.re_table_count as usize);
    for i in 0..header.re_table_count as usize {
        re_offsets.push(cursor.read_u16(table_base + i * 2)?);
    }

    let mut table = Vec::with_capacity(re_offsets.len());
    for (i, word_off) in re_offsets.into_iter().enumerate() {
        let entry_base = Cursor::word_to_byte(word_off);
        let len = cursor.read_u32(entry_base)? as usize;
        let body = cursor.read(entry_base + 4, len)?;
        match sb2dot_automata::decode(body) {
            Ok(Some(pattern)) => table.push(RegexSlot::Decoded(pattern)),
            Ok(None) => {
                warn!("regex table entry {} did not reduce to a single pattern; marking undecodable", i);
                table.push(RegexSlot::Undecodable);
            }
            Err(e) => {
                warn!("regex table entry {}: {}; marking undecodable", i, e);
                table.push(RegexSlot::Undecodable);
            }
        }
    }
    Ok(table)
}

fn decode_op_table(
    name: String,
    cursor: &Cursor,
    op_table: &[u16],
    op_names: &[String],
    regex_table: &[RegexSlot],
) -> Result<Profile, DecodeError> {
    let mut graph = DecisionGraph::new();
    for &offset in op_table {
        parse_filternode(&mut graph, cursor, offset, regex_table)?;
    }
    let groups = group_op_table(op_table, op_names);
    Ok(Profile { name, graph, groups })
}

fn decode_single(
    name: String,
    cursor: &Cursor,
    op_names: &[String],
    regex_table: &[RegexSlot],
) -> Result<Profile, DecodeError> {
    let op_table = read_op_table(cursor, HEADER_LEN, op_names.len())?;
    decode_op_table(name, cursor, &op_table, op_names, regex_table)
}

/// `flags == 0x8000`: a collection of named profiles sharing one regex
/// table. The collection count lives at bytes 6-7 (`seek(3*2)` in the
/// original, not byte 8 as a literal reading of spec.md Sec 3/4.F would
/// suggest -- spec.md Sec 9's Open Questions resolves this explicitly: 6-7
/// is the count word, entries start at byte 8).
fn decode_collection(
    cursor: &Cursor,
    op_names: &[String],
    regex_table: &[RegexSlot],
) -> Result<Vec<Profile>, DecodeError> {
    let count = cursor.read_u16(6)?;
    let op_table_count = op_names.len();
    let stride = 2 * (2 + op_table_count);

    let mut profiles = Vec::with_capacity(count as usize);
    for i in 0..count as usize {
        let entry_base = 8 + i * stride;
        let profilename_offset = cursor.read_u16(entry_base)?;
        let _innerflags = cursor.read_u16(entry_base + 2)?;
        let op_table = read_op_table(cursor, entry_base + 4, op_table_count)?;

        let raw_name = cursor.read_string_at(profilename_offset)?;
        let name = String::from_utf8_lossy(&raw_name).into_owned();
        info!("decoding profile: {}", name);
        profiles.push(decode_op_table(name, cursor, &op_table, op_names, regex_table)?);
    }
    Ok(profiles)
}

/// Decode a whole profile blob (single or collection) into its list of
/// `Profile`s (component F). `single_profile_name` is used verbatim as the
/// profile's display name when the blob holds a single profile, matching
/// the original's use of the input file's basename (spec.md Sec 4.F step
/// 4); the caller owns basename extraction.
pub fn decode(bytes: &[u8], op_names: &[String], single_profile_name: &str) -> Result<Vec<Profile>, DecodeError> {
    let cursor = Cursor::new(bytes);
    let header = Header::read(&cursor)?;

    info!("loading and decoding regular expressions");
    let regex_table = read_regex_table(&cursor, &header)?;

    if header.is_collection() {
        info!("found: profile collection");
        decode_collection(&cursor, op_names, &regex_table)
    } else {
        info!("found: single profile");
        let profile = decode_single(single_profile_name.to_string(), &cursor, op_names, &regex_table)?;
        Ok(vec![profile])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dagparser::NodeTag;

    fn op_names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("op{}", i)).collect()
    }

    #[test]
    fn e1_single_profile_trivial_allow() {
        // header: flags=0, re_table_offset=6 (word), re_table_count=0
        let mut buf = vec![0x00, 0x00, 0x06, 0x00, 0x00, 0x00];
        // op table: one entry, value 3 (word offset -> byte 24)
        buf.extend_from_slice(&3u16.to_le_bytes());
        // pad up to byte 24
        while buf.len() < 24 {
            buf.push(0);
        }
        // terminal: is_terminal=1, pad=0, result=0 (allow)
        buf.extend_from_slice(&[0x01, 0x00, 0x00, 0x00]);

        let names = op_names(1);
        let profiles = decode(&buf, &names, "profile.bin").unwrap();
        assert_eq!(profiles.len(), 1);
        let p = &profiles[0];
        assert_eq!(p.groups.len(), 1);
        assert!(p.groups[0].is_default);
        match p.graph.tag(24).unwrap() {
            NodeTag::Terminal(t) => assert!(t.allow),
            _ => panic!("expected terminal"),
        }
    }

    #[test]
    fn op_table_grouping_matches_spec_example() {
        // offsets [A, B, A, C, B] with names n0..n4; A is the default.
        let op_table = vec![10u16, 20, 10, 30, 20];
        let names: Vec<String> = (0..5).map(|i| format!("n{}", i)).collect();
        let groups = group_op_table(&op_table, &names);

        assert_eq!(groups.len(), 3);
        assert!(groups[0].is_default);
        assert_eq!(groups[0].root_offset, 10);

        let b = groups.iter().find(|g| g.root_offset == 20).unwrap();
        assert_eq!(b.filename_part, "n1 n4");
        assert_eq!(b.label, "n1\nn4");

        let c = groups.iter().find(|g| g.root_offset == 30).unwrap();
        assert_eq!(c.filename_part, "n3");
        assert_eq!(c.label, "n3");
    }

    #[test]
    fn regex_table_marks_unsupported_version_as_undecodable() {
        // header: flags=0, re_table_offset=1 (word, byte 8), re_table_count=1
        let mut buf = vec![0x00, 0x00, 0x01, 0x00, 0x01, 0x00];
        buf.extend_from_slice(&[0, 0]); // pad to byte 8
        // regex table: one entry pointing at word offset 2 (byte 16)
        buf.extend_from_slice(&2u16.to_le_bytes());
        while buf.len() < 16 {
            buf.push(0);
        }
        // regex blob: len=6, version=2 (unsupported), mlen=0
        buf.extend_from_slice(&6u32.to_le_bytes());
        buf.extend_from_slice(&[0, 0, 0, 2]); // big-endian version 2
        buf.extend_from_slice(&0u16.to_le_bytes());

        let cursor = Cursor::new(&buf);
        let header = Header::read(&cursor).unwrap();
        let table = read_regex_table(&cursor, &header).unwrap();
        assert_eq!(table, vec![RegexSlot::Undecodable]);
    }

    #[test]
    fn collection_count_lives_at_byte_six() {
        // flags=0x8000, re_table_offset=1 (byte 8), re_table_count=0
        let mut buf = vec![0x00, 0x80, 0x01, 0x00, 0x00, 0x00];
        // collection_count at byte 6
        buf.extend_from_slice(&1u16.to_le_bytes());
        // padding to byte 8 (already at 8)
        assert_eq!(buf.len(), 8);
        // entry 0: profilename_offset (word 2, byte 16), innerflags=0
        buf.extend_from_slice(&2u16.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
        // op table: 1 entry, value 5 (word offset -> byte 40)
        buf.extend_from_slice(&5u16.to_le_bytes());
        // pad to byte 16 for the profile name string
        while buf.len() < 16 {
            buf.push(0);
        }
        buf.extend_from_slice(&4u32.to_le_bytes());
        buf.push(0xAA); // padding byte read_string_at skips
        buf.extend_from_slice(b"prof");
        while buf.len() < 40 {
            buf.push(0);
        }
        buf.extend_from_slice(&[0x01, 0x00, 0x00, 0x00]); // allow terminal

        let names = op_names(1);
        let profiles = decode(&buf, &names, "unused.bin").unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].name, "prof");
    }
}
