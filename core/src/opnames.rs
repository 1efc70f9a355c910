//! Component 4.G (ambient): the operation-names text-file loader. Out of
//! scope for the core decode logic (spec.md Sec 1 lists it as an external
//! collaborator), implemented here as straightforward ambient plumbing --
//! a direct translation of `load_op_names` in
//! `examples/original_source/sb2dot/sb2dot.py`.

use std::fs;
use std::path::Path;

use failure::Error;

/// Load one operation name per line, UTF-8, trailing blank line (if any)
/// dropped. The list's length becomes `OP_TABLE_COUNT` for the rest of the
/// decode (spec.md Sec 3/6).
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<String>, Error> {
    let text = fs::read_to_string(path)?;
    Ok(parse(&text))
}

fn parse(text: &str) -> Vec<String> {
    let mut names: Vec<String> = text.lines().map(|line| line.trim().to_string()).collect();
    if names.last().map(String::is_empty).unwrap_or(false) {
        names.pop();
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_one_name_per_line() {
        let names = parse("file-read\nfile-write\nnetwork-outbound\n");
        assert_eq!(names, vec!["file-read", "file-write", "network-outbound"]);
    }

    #[test]
    fn drops_trailing_blank_line_only() {
        let names = parse("a\nb\n\n");
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn without_trailing_newline_keeps_last_name() {
        let names = parse("a\nb");
        assert_eq!(names, vec!["a", "b"]);
    }
}
