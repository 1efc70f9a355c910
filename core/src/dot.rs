//! Component 4.H (ambient): the DOT emitter. Out of scope for the core
//! decode logic (spec.md Sec 1), but specified as an external contract in
//! spec.md Sec 6 and grounded on
//! `examples/original_source/sb2dot/outputdot.py` for the exact output
//! shape.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::dagparser::{DecisionGraph, NodeId};
use crate::profile::OperationGroup;

/// Escape a label for embedding in a DOT string literal: backslashes and
/// quotes are escaped, NULs are stripped outright. Mirrors
/// `dump_node_to_dot`/`dump_to_dot`'s three `.replace()` calls.
fn escape_label(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\0', "")
}

/// Sanitize the space-joined group name into a filename-safe fragment
/// (spec.md Sec 6): truncate to 128 chars, strip `*`, replace spaces with
/// underscores.
fn sanitize_filename_part(s: &str) -> String {
    let truncated: String = s.chars().take(128).collect();
    truncated.replace('*', "").replace(' ', "_")
}

/// depth-first emit of every node reachable from `start`, each visited
/// exactly once (mirrors `dump_node_to_dot`'s `visited` dict).
fn render_nodes(g: &DecisionGraph, start: NodeId, visited: &mut HashSet<NodeId>, out: &mut String) {
    let mut stack = vec![start];
    while let Some(u) = stack.pop() {
        if !visited.insert(u) {
            continue;
        }
        let tag = match g.tag(u) {
            Some(t) => t,
            None => continue,
        };
        out.push_str(&format!("n{} [label=\"{}\"];\n", u, escape_label(&tag.to_string())));

        if let Some((m, um)) = g.edges(u) {
            out.push_str(&format!("n{} -> n{} [color=\"green\"];\n", u, m));
            out.push_str(&format!("n{} -> n{} [color=\"red\"];\n", u, um));
            // push in reverse so `m` (the match edge) is visited first,
            // matching the original's depth-first-on-edges[0]-then-[1] order.
            stack.push(um);
            stack.push(m);
        }
    }
}

/// Render one operation group's decision graph to a DOT document (spec.md
/// Sec 6's emitter contract).
pub fn render(graph: &DecisionGraph, profile_name: &str, group: &OperationGroup) -> String {
    let root = (group.root_offset as usize) * 8;
    let label = escape_label(&group.label);
    let profile = escape_label(profile_name);

    let mut text = String::new();
    text.push_str("digraph sandbox_decision { rankdir=HR; labelloc=\"t\";label=\"sandbox decision graph for\n\n");
    text.push_str(&label);
    text.push_str("\n\nextracted from ");
    text.push_str(&profile);
    text.push_str("\n\n\n\"; \n");
    text.push_str(&format!("n0 [label=\"{}\";shape=\"doubleoctagon\"];\n", label));
    text.push_str(&format!("n0 -> n{} [color=\"black\"];\n", root));
    render_nodes(graph, root, &mut HashSet::new(), &mut text);
    text.push_str("} \n");
    text
}

/// The output filename for one group: `<basename(profile)>_<sanitized
/// group>.dot` (spec.md Sec 6).
pub fn filename(profile_name: &str, group: &OperationGroup) -> String {
    format!("{}_{}.dot", profile_name, sanitize_filename_part(&group.filename_part))
}

/// Render and write one operation group's `.dot` file under `out_dir`,
/// returning the path written.
pub fn write(graph: &DecisionGraph, profile_name: &str, group: &OperationGroup, out_dir: &Path) -> io::Result<PathBuf> {
    let path = out_dir.join(filename(profile_name, group));
    fs::write(&path, render(graph, profile_name, group))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::Cursor;
    use crate::dagparser::parse_filternode;

    fn group(root_offset: u16, label: &str) -> OperationGroup {
        OperationGroup {
            root_offset,
            filename_part: label.replace('\n', " "),
            label: label.to_string(),
            is_default: root_offset == 0,
        }
    }

    #[test]
    fn renders_header_root_and_terminal() {
        // single terminal node at word offset 0 (byte 0): allow.
        let buf = vec![1u8, 0, 0, 0];
        let cursor = Cursor::new(&buf);
        let mut g = DecisionGraph::new();
        parse_filternode(&mut g, &cursor, 0, &[]).unwrap();

        let grp = group(0, "default");
        let dot = render(&g, "profile.bin", &grp);

        assert!(dot.starts_with("digraph sandbox_decision { rankdir=HR;"));
        assert!(dot.contains("extracted from profile.bin"));
        assert!(dot.contains("n0 [label=\"default\";shape=\"doubleoctagon\"];"));
        assert!(dot.contains("n0 -> n0 [color=\"black\"];"));
        assert!(dot.contains("n0 [label=\"allow\"];"));
    }

    #[test]
    fn filename_sanitizes_spaces_and_stars() {
        let grp = OperationGroup {
            root_offset: 1,
            filename_part: "file-read* file-write".to_string(),
            label: "file-read*\nfile-write".to_string(),
            is_default: false,
        };
        assert_eq!(filename("sandbox.profile", &grp), "sandbox.profile_file-read_file-write.dot");
    }

    #[test]
    fn filename_truncates_to_128_chars() {
        let long = "x".repeat(200);
        let grp = OperationGroup {
            root_offset: 1,
            filename_part: long,
            label: "x".to_string(),
            is_default: false,
        };
        let f = filename("p", &grp);
        // "p_" + 128 x's + ".dot"
        assert_eq!(f.len(), 2 + 128 + 4);
    }

    #[test]
    fn escapes_quotes_and_backslashes_and_strips_nul() {
        assert_eq!(escape_label("a\"b\\c\0d"), "a\\\"b\\\\cd");
    }
}
