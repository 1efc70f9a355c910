//! Graph rewriter (component D): reduces a disassembled regex-program graph
//! down to a single `KIND_PATTERN` node holding the reconstructed pattern
//! string. A direct translation of `redis.py`'s `eliminateDummyEdges` and
//! `graphToRegEx`, restructured as named rule functions instead of one long
//! `while not done` body, but preserving the exact rule order and the
//! restart-the-scan-after-every-rule-application discipline the original
//! relies on (it mutates `g.edges` while iterating it). Critically, the
//! rules are dispatched **per node**: for each `u` in turn, try
//! accept-drop, then star/plus, then alternation/optional, then bypass,
//! and restart the whole scan the moment one fires, rather than draining
//! one rule across every node before moving to the next. A phase-major
//! sweep (e.g. removing every `0x15` accept node before ever trying the
//! optional rule) can delete a node another rule still needed -- a
//! trailing accept is exactly the "other side" the optional rule matches
//! against for `a?`.

use crate::graph::{Graph, NodeId};
use crate::tag::{Tag, KIND_ACCEPT, KIND_BRANCH, KIND_BYPASS, KIND_JUMP, KIND_PATTERN};

/// `0x2f` nodes whose successor is a plain `0x0a` jump are a detour the
/// regex compiler leaves behind: splice the jump's own successors directly
/// onto the branch and drop the jump. Runs once, before the fixed-point
/// loop, exactly as `eliminateDummyEdges`.
fn eliminate_dummy_edges(g: &mut Graph) {
    for u in g.node_ids() {
        let is_branch = matches!(g.get_tag(u), Some(t) if t.kind == KIND_BRANCH);
        if !is_branch {
            continue;
        }
        for v in g.successors(u).to_vec() {
            let is_jump = matches!(g.get_tag(v), Some(t) if t.kind == KIND_JUMP);
            if !is_jump {
                continue;
            }
            for e in g.successors(v).to_vec() {
                g.add_edge(u, e);
            }
            g.remove_node(v);
        }
    }
}

/// Try every merge-adjacent-atoms candidate; returns true if one fired.
fn try_merge_adjacent(g: &mut Graph) -> bool {
    for u in g.node_ids() {
        for v in g.successors(u).to_vec() {
            if g.merge_if_possible(u, v) {
                return true;
            }
        }
    }
    false
}

fn is_pattern(g: &Graph, n: NodeId) -> bool {
    matches!(g.get_tag(n), Some(t) if t.kind == KIND_PATTERN)
}

/// Kleene star/plus over a two-way branch `u`, trying each side `v` in turn.
fn try_star_plus(g: &mut Graph, u: NodeId) -> bool {
    let succs = g.successors(u).to_vec();
    if succs.len() != 2 {
        return false;
    }
    for &v in &succs {
        if !is_pattern(g, v) {
            continue;
        }
        let v_succ = g.successors(v).to_vec();
        let v_pred = g.predecessors(v).to_vec();

        // star: v's only successor and only predecessor is u.
        if v_succ == [u] && v_pred == [u] {
            let payload = g.get_tag(v).unwrap().payload_or_empty().to_string();
            g.remove_edge(u, v);
            g.remove_node(v);
            g.set_tag(u, Tag::pattern(format!("({})*", payload)));
            return true;
        }

        // plus: v loops back to u, and is entered from u plus exactly one
        // other node (`entry`).
        if v_succ.contains(&u) && v_pred.len() == 2 && v_pred.contains(&u) {
            let entry = *v_pred.iter().find(|&&p| p != u).unwrap();
            let payload = g.get_tag(v).unwrap().payload_or_empty().to_string();
            g.remove_edge(entry, v);
            g.remove_edge(u, v);
            g.remove_node(v);
            g.add_edge(entry, u);
            g.set_tag(u, Tag::pattern(format!("({})+", payload)));
            return true;
        }
    }
    false
}

/// Alternation `(L|R)`: a two-way branch whose successors are both pattern
/// nodes sharing the same (<=1-sized) onward successor set.
fn try_alternation(g: &mut Graph, u: NodeId) -> bool {
    let succs = g.successors(u).to_vec();
    if succs.len() != 2 {
        return false;
    }
    let (v_left, v_right) = (succs[0], succs[1]);
    if !is_pattern(g, v_left) || !is_pattern(g, v_right) {
        return false;
    }
    let vl_next = g.successors(v_left).to_vec();
    let vr_next = g.successors(v_right).to_vec();
    if vl_next.len() > 1 || vr_next.len() > 1 || vl_next != vr_next {
        return false;
    }

    let left = g.get_tag(v_left).unwrap().payload_or_empty().to_string();
    let right = g.get_tag(v_right).unwrap().payload_or_empty().to_string();
    g.remove_edge(u, v_left);
    g.remove_edge(u, v_right);
    if let Some(&join) = vl_next.first() {
        g.add_edge(u, join);
    }
    g.remove_node(v_left);
    g.remove_node(v_right);
    g.set_tag(u, Tag::pattern(format!("({}|{})", left, right)));
    true
}

/// Optional `?`: one side is a pattern node whose only onward edge lands
/// on the other side.
fn try_optional(g: &mut Graph, u: NodeId) -> bool {
    let succs = g.successors(u).to_vec();
    if succs.len() != 2 {
        return false;
    }
    let (v_left, v_right) = (succs[0], succs[1]);

    if is_pattern(g, v_left) {
        let vl_next = g.successors(v_left).to_vec();
        if vl_next == [v_right] {
            let payload = g.get_tag(v_left).unwrap().payload_or_empty().to_string();
            g.remove_edge(u, v_left);
            g.remove_edge(u, v_right);
            g.add_edge(u, v_right);
            g.remove_node(v_left);
            g.set_tag(u, Tag::pattern(format!("({})?", payload)));
            return true;
        }
    }

    if is_pattern(g, v_right) {
        let vr_next = g.successors(v_right).to_vec();
        if vr_next == [v_left] {
            let payload = g.get_tag(v_right).unwrap().payload_or_empty().to_string();
            g.remove_edge(u, v_left);
            g.remove_edge(u, v_right);
            g.add_edge(u, v_left);
            g.remove_node(v_right);
            g.set_tag(u, Tag::pattern(format!("({})?", payload)));
            return true;
        }
    }

    false
}

/// Splice out a `KIND_BYPASS` node `u`: every (pred, succ) pair becomes a
/// direct edge.
fn try_bypass_node(g: &mut Graph, u: NodeId) -> bool {
    if !matches!(g.get_tag(u), Some(t) if t.kind == KIND_BYPASS) {
        return false;
    }
    let preds = g.predecessors(u).to_vec();
    let succs = g.successors(u).to_vec();
    for &p in &preds {
        for &s in &succs {
            g.add_edge(p, s);
        }
    }
    g.remove_node(u);
    true
}

/// Try every rule against a single node `u`, in the original's per-node
/// order: accept-drop, then star/plus, then alternation/optional, then
/// bypass. Returns true the moment one fires.
fn try_node(g: &mut Graph, u: NodeId) -> bool {
    if matches!(g.get_tag(u), Some(t) if t.kind == KIND_ACCEPT) {
        g.remove_node(u);
        return true;
    }
    if try_star_plus(g, u) || try_alternation(g, u) || try_optional(g, u) {
        return true;
    }
    try_bypass_node(g, u)
}

/// Reduce `g` to a single pattern node, returning its payload, or `None`
/// (`undecodable`) if the graph does not collapse to exactly one node.
pub fn reduce(g: &mut Graph) -> Option<String> {
    eliminate_dummy_edges(g);

    // first fixed point: fold every adjacent-atom run together, mirroring
    // the original's first standalone merge loop.
    while try_merge_adjacent(g) {}

    // second fixed point: for each node in turn, try accept-drop,
    // star/plus, alternation/optional, then bypass, restarting the whole
    // scan on the first rule that fires; fall back to a merge-adjacent
    // pass once no per-node rule makes progress, until nothing fires.
    loop {
        let mut progressed = false;
        for u in g.node_ids() {
            if try_node(g, u) {
                progressed = true;
                break;
            }
        }
        if progressed {
            continue;
        }
        if try_merge_adjacent(g) {
            continue;
        }
        break;
    }

    if g.len() == 1 {
        let only = g.node_ids()[0];
        g.get_tag(only).and_then(|t| t.payload.clone())
    } else {
        None
    }
}
