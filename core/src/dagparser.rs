//! Component E: the filter-node DAG parser. A direct translation of
//! `parse_filternode` in `examples/original_source/sb2dot/sb2dot.py`:
//! recursive, memoized on the same tag map the original uses, so that a
//! node shared by two paths (or, within one profile, by two operations) is
//! visited and materialized exactly once.

use std::collections::HashMap;

use log::warn;

use crate::cursor::Cursor;
use crate::error::DecodeError;
use crate::filter::{Filter, Terminal};
use crate::profile::RegexSlot;

pub type NodeId = usize;

/// A node's tag: either a `Terminal` verdict or a decoded `Filter`
/// predicate. `Display` isn't implemented here -- the DOT emitter picks
/// the right rendering per spec.md Sec 6 ("repr-of-tag").
pub enum NodeTag {
    Terminal(Terminal),
    Filter(Filter),
}

impl std::fmt::Display for NodeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeTag::Terminal(t) => write!(f, "{}", t),
            NodeTag::Filter(flt) => write!(f, "{}", flt),
        }
    }
}

/// The decision graph: one shared structure per profile, built by
/// repeated calls to `parse_filternode` as each operation's root is
/// visited (spec.md Sec 4.F step 5 / the "Supplemented features" note in
/// SPEC_FULL.md about sharing terminals/subtrees across operations).
#[derive(Default)]
pub struct DecisionGraph {
    tags: HashMap<NodeId, NodeTag>,
    /// non-terminals have exactly two outgoing edges, `(match, unmatch)`.
    edges: HashMap<NodeId, (NodeId, NodeId)>,
}

impl DecisionGraph {
    pub fn new() -> DecisionGraph {
        DecisionGraph::default()
    }

    pub fn tag(&self, id: NodeId) -> Option<&NodeTag> {
        self.tags.get(&id)
    }

    /// `(match, unmatch)` successors of a non-terminal node; `None` for a
    /// terminal or an unvisited offset.
    pub fn edges(&self, id: NodeId) -> Option<(NodeId, NodeId)> {
        self.edges.get(&id).copied()
    }
}

/// Walk the decision DAG starting at `offset` (a word offset, scaled by 8
/// to get the byte address used as the node id), materializing every
/// reachable node into `g`. Already-tagged offsets are a no-op, which both
/// preserves DAG sharing and is the only thing standing between this
/// function and infinite recursion on a cyclic input.
pub fn parse_filternode(
    g: &mut DecisionGraph,
    cursor: &Cursor,
    offset: u16,
    regex_table: &[RegexSlot],
) -> Result<(), DecodeError> {
    // every node id is `offset * 8`, so it is 8-aligned by construction
    // (spec.md Sec 8 property 1) -- there is no runtime check to make here.
    let node_id = (offset as usize) * 8;
    if g.tags.contains_key(&node_id) {
        return Ok(());
    }

    let is_terminal = cursor.read_u8(node_id)? == 1;

    if is_terminal {
        let result = cursor.read_u16(node_id + 2)?;
        g.tags.insert(node_id, NodeTag::Terminal(Terminal::from_result(result)));
        return Ok(());
    }

    let filter = cursor.read_u8(node_id + 1)?;
    let filter_arg = cursor.read_u16(node_id + 2)?;
    let match_off = cursor.read_u16(node_id + 4)?;
    let unmatch_off = cursor.read_u16(node_id + 6)?;

    let tag = match Filter::decode(cursor, regex_table, filter, filter_arg) {
        Ok(f) => f,
        Err(e) => {
            warn!("filter node at {:#x}: {}; lowering to generic", node_id, e);
            Filter::Generic(filter, filter_arg)
        }
    };
    g.tags.insert(node_id, NodeTag::Filter(tag));

    let match_id = (match_off as usize) * 8;
    let unmatch_id = (unmatch_off as usize) * 8;
    g.edges.insert(node_id, (match_id, unmatch_id));

    parse_filternode(g, cursor, match_off, regex_table)?;
    parse_filternode(g, cursor, unmatch_off, regex_table)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terminal_node(result: u16) -> Vec<u8> {
        vec![1, 0, (result & 0xff) as u8, (result >> 8) as u8]
    }

    #[test]
    fn decodes_simple_terminal_at_offset_0() {
        let buf = terminal_node(0);
        let cursor = Cursor::new(&buf);
        let mut g = DecisionGraph::new();
        parse_filternode(&mut g, &cursor, 0, &[]).unwrap();
        match g.tag(0).unwrap() {
            NodeTag::Terminal(t) => assert!(t.allow),
            _ => panic!("expected terminal"),
        }
    }

    #[test]
    fn memoizes_shared_subgraphs() {
        // node 0: non-terminal, filter=26 (debug-mode, no arg reads),
        // match -> node 1 (offset word 1, byte 8), unmatch -> node 1 too.
        let mut buf = vec![0u8, 26, 0, 0, 1, 0, 1, 0];
        buf.extend_from_slice(&terminal_node(0)); // shared terminal at byte 8
        let cursor = Cursor::new(&buf);
        let mut g = DecisionGraph::new();
        parse_filternode(&mut g, &cursor, 0, &[]).unwrap();
        assert_eq!(g.edges(0), Some((8, 8)));
        assert!(matches!(g.tag(8).unwrap(), NodeTag::Terminal(_)));
    }

    #[test]
    fn every_materialized_node_id_is_eight_aligned() {
        // node ids are always `offset * 8`, never a raw byte address, so
        // every id a real decode produces is 8-aligned by construction
        // (spec.md Sec 8 property 1).
        let mut buf = vec![0u8, 26, 0, 0, 1, 0, 2, 0];
        buf.extend_from_slice(&terminal_node(0)); // match -> byte 8 (word 1)
        buf.resize(16, 0); // pad so the next node lands on byte 16 (word 2)
        buf.extend_from_slice(&terminal_node(1)); // unmatch -> byte 16 (word 2)
        let cursor = Cursor::new(&buf);
        let mut g = DecisionGraph::new();
        parse_filternode(&mut g, &cursor, 0, &[]).unwrap();

        assert!(!g.tags.is_empty());
        for &id in g.tags.keys() {
            assert_eq!(id % 8, 0, "node id {} is not 8-aligned", id);
        }
    }
}
