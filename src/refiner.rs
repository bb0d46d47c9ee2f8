use std::collections::HashSet;

use tree_sitter::{Node, Parser};

use crate::facade::{Commit, RepositoryFacade};

/// Node kinds that never contribute a difference record on their own, even
/// when their text changed: comments, imports and the package declaration.
/// This is what makes the refiner filter out comment-only and import-only
/// edits, on top of the whitespace normalization that filters reformatting.
const NEVER_INTERESTING_KINDS: &[&str] = &["comment", "import_declaration", "package_declaration"];

/// For a file pair in a structured language, the set of zero-based line
/// numbers that a structural (AST-level) diff considers semantically
/// affected. Parse or read failures resolve to an empty set; the
/// caller is expected to log the warning, since this function only has a
/// `&slog::Logger` at the tracer boundary, not here.
pub struct StructuralDiffRefiner;

impl StructuralDiffRefiner {
    pub fn new() -> Self {
        StructuralDiffRefiner
    }

    pub fn refine(
        &self,
        facade: &RepositoryFacade,
        path: &str,
        commit: &Commit,
        parent: &Commit,
    ) -> Result<HashSet<i64>, RefinerFailure> {
        let new_bytes = facade.read_file(commit, path).ok().flatten();
        let old_bytes = facade.read_file(parent, path).ok().flatten();
        let (Some(new_bytes), Some(old_bytes)) = (new_bytes, old_bytes) else {
            return Ok(HashSet::new());
        };

        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .map_err(|_| RefinerFailure)?;

        let new_tree = parser.parse(&new_bytes, None).ok_or(RefinerFailure)?;
        let old_tree = parser.parse(&old_bytes, None).ok_or(RefinerFailure)?;
        if new_tree.root_node().has_error() || old_tree.root_node().has_error() {
            return Err(RefinerFailure);
        }

        let mut records = Vec::new();
        diff_nodes(
            old_tree.root_node(),
            new_tree.root_node(),
            &old_bytes,
            &new_bytes,
            &mut records,
        );

        // Union of start/end line *numbers*, not full ranges -- see the
        // "Index base" design note: the source mixes one- and zero-based
        // indices at this exact seam, and this is where the conversion
        // happens for this implementation.
        let mut lines = HashSet::new();
        for (start, end) in records {
            lines.insert(start as i64 - 1);
            lines.insert(end as i64 - 1);
        }
        Ok(lines)
    }
}

impl Default for StructuralDiffRefiner {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct RefinerFailure;

fn normalized_text<'a>(node: Node, source: &'a [u8]) -> Vec<u8> {
    let text = node.utf8_text(source).unwrap_or("");
    text.bytes().filter(|b| !b.is_ascii_whitespace()).collect()
}

/// Walk `old` and `new` in lockstep, pairing same-index named children of
/// same-kind nodes, and record a (one-based) start/end line for the
/// smallest subtree whose normalized text differs from its counterpart.
/// Stopping at the smallest differing node is what keeps a one-token
/// change inside a large method from reporting the whole method as
/// affected.
fn diff_nodes(old: Node, new: Node, old_src: &[u8], new_src: &[u8], out: &mut Vec<(usize, usize)>) {
    if old.kind() != new.kind() {
        out.push((new.start_position().row + 1, new.end_position().row + 1));
        return;
    }
    if normalized_text(old, old_src) == normalized_text(new, new_src) {
        return;
    }
    if NEVER_INTERESTING_KINDS.contains(&new.kind()) {
        return;
    }

    let old_children: Vec<Node> = named_children(old);
    let new_children: Vec<Node> = named_children(new);

    if old_children.is_empty() || new_children.is_empty() {
        out.push((new.start_position().row + 1, new.end_position().row + 1));
        return;
    }

    let shared = old_children.len().min(new_children.len());
    for i in 0..shared {
        diff_nodes(old_children[i], new_children[i], old_src, new_src, out);
    }
    // Children added beyond what the old side had are themselves new
    // material in the newer file.
    for extra in new_children.iter().skip(shared) {
        out.push((extra.start_position().row + 1, extra.end_position().row + 1));
    }
}

fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}
