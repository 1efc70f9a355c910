//! sb2dot: decode a compiled sandbox policy profile into a per-operation
//! decision graph, rendered as Graphviz DOT.
//!
//! Crate split (SPEC_FULL.md Sec 2): this crate owns components A
//! (`cursor`), B (`filter`), E (`dagparser`), and F (`profile`), plus the
//! ambient operation-names loader (`opnames`), DOT emitter (`dot`),
//! logging (`logging`), and CLI configuration (`config`). Components C and
//! D (regex bytecode disassembly and graph rewriting) live in the
//! `sb2dot-automata` crate, which knows nothing of this container format.

pub mod config;
pub mod cursor;
pub mod dagparser;
pub mod dot;
pub mod error;
pub mod filter;
pub mod logging;
pub mod opnames;
pub mod profile;
