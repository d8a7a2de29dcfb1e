//! Shared tree-sitter traversal helpers used by the generic language plugin.

use tree_sitter::Node;

use super::errors::{Result, SemError};

/// Walk an AST tree iteratively in pre-order, calling `callback` on each
/// node before its children. Uses an explicit stack so deeply nested trees
/// never risk a native stack overflow.
pub fn walk_tree<F>(node: Node, callback: &mut F)
where
    F: FnMut(Node),
{
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        callback(current);
        let mut cursor = current.walk();
        let children: Vec<_> = current.children(&mut cursor).collect();
        for child in children.into_iter().rev() {
            stack.push(child);
        }
    }
}

/// Count every node (named and anonymous) beneath `node`, inclusive.
pub fn count_all_nodes(node: &Node) -> usize {
    let mut count = 0usize;
    walk_tree(*node, &mut |_| count += 1);
    count
}

/// Extract a node's raw UTF-8 text.
pub fn node_text<'a>(node: &Node, source: &'a str) -> Option<&'a str> {
    node.utf8_text(source.as_bytes()).ok()
}

/// Marks one byte of a node's text as belonging to a comment (dropped
/// entirely), a string literal (copied verbatim), or neither (whitespace
/// collapsed as usual).
#[derive(Clone, Copy, PartialEq, Eq)]
enum ByteKind {
    Normal,
    StringLiteral,
    Comment,
}

fn classify_kind(kind: &str) -> Option<ByteKind> {
    if kind.contains("comment") {
        Some(ByteKind::Comment)
    } else if kind.contains("string") || kind == "char_literal" || kind == "rune_literal" {
        Some(ByteKind::StringLiteral)
    } else {
        None
    }
}

/// Mark every byte covered by a comment or string-literal descendant of
/// `node` (but never `node` itself). Classified nodes are not descended
/// into further, so a string's internal quote/fragment children don't
/// fragment its span.
fn mark_spans(node: Node, base: usize, mask: &mut [ByteKind]) {
    let root_id = node.id();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if current.id() != root_id {
            if let Some(kind) = classify_kind(current.kind()) {
                let start = current.start_byte().saturating_sub(base);
                let end = (current.end_byte().saturating_sub(base)).min(mask.len());
                if start < end {
                    mask[start..end].fill(kind);
                }
                continue;
            }
        }
        let mut cursor = current.walk();
        for child in current.children(&mut cursor) {
            stack.push(child);
        }
    }
}

/// Extract a node's text normalised for structural hashing: comments are
/// stripped, runs of whitespace outside string-literal spans collapse to a
/// single space, and string-literal contents are copied verbatim so that
/// `"a  b"` and `"a b"` hash differently (spec §4.2 excludes them from
/// whitespace collapsing).
pub fn node_text_normalized(node: &Node, source: &str) -> Result<String> {
    let bytes = source.as_bytes();
    node.utf8_text(bytes)
        .map_err(|e| SemError::internal(format!("invalid utf-8 in AST node: {e}")))?;

    let start = node.start_byte();
    let end = node.end_byte();
    let mut mask = vec![ByteKind::Normal; end - start];
    mark_spans(*node, start, &mut mask);

    let mut out = String::with_capacity(end - start);
    let mut pending_space = false;
    let mut i = 0;
    while i < mask.len() {
        match mask[i] {
            ByteKind::Comment => {
                pending_space = true;
                i += 1;
            }
            ByteKind::StringLiteral => {
                if pending_space && !out.is_empty() {
                    out.push(' ');
                }
                pending_space = false;
                let run_start = i;
                while i < mask.len() && mask[i] == ByteKind::StringLiteral {
                    i += 1;
                }
                out.push_str(&source[start + run_start..start + i]);
            }
            ByteKind::Normal => {
                if bytes[start + i].is_ascii_whitespace() {
                    pending_space = true;
                    i += 1;
                } else {
                    if pending_space && !out.is_empty() {
                        out.push(' ');
                    }
                    pending_space = false;
                    let run_start = i;
                    while i < mask.len()
                        && mask[i] == ByteKind::Normal
                        && !bytes[start + i].is_ascii_whitespace()
                    {
                        i += 1;
                    }
                    out.push_str(&source[start + run_start..start + i]);
                }
            }
        }
    }

    Ok(out)
}

/// Find the first immediate child of `node` whose kind matches `kind`.
pub fn find_child_by_kind<'a>(node: &Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).find(|child| child.kind() == kind)
}

/// Find the first immediate child of `node` whose kind is one of `kinds`
/// and return its text.
pub fn find_child_text(node: &Node, source: &str, kinds: &[&str]) -> Result<Option<String>> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if kinds.contains(&child.kind()) {
            return Ok(Some(child.utf8_text(source.as_bytes())?.to_string()));
        }
    }
    Ok(None)
}

/// Recursively search descendants of `node` for the first node of `kind`,
/// used by the name-extraction fallback chain when a language puts the
/// identifier more than one level deep (e.g. Go's `function_declaration` ->
/// `identifier`, but C++'s `function_definition` -> `function_declarator` ->
/// `identifier`).
pub fn find_descendant_by_kind<'a>(node: &Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut stack = vec![*node];
    while let Some(current) = stack.pop() {
        if current.kind() == kind {
            return Some(current);
        }
        let mut cursor = current.walk();
        for child in current.children(&mut cursor) {
            stack.push(child);
        }
    }
    None
}

/// Convert a tree-sitter 0-based row to the 1-based line numbers used
/// throughout the entity model.
pub fn to_line_number(row: usize) -> usize {
    row + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn parse_rust(source: &str) -> tree_sitter::Tree {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_rust::LANGUAGE.into())
            .unwrap();
        parser.parse(source, None).unwrap()
    }

    #[test]
    fn walk_tree_visits_every_node() {
        let tree = parse_rust("fn a() {}\nfn b() {}");
        let root = tree.root_node();
        let mut visited = 0usize;
        walk_tree(root, &mut |_| visited += 1);
        assert_eq!(visited, count_all_nodes(&root));
        assert!(visited > 2);
    }

    #[test]
    fn node_text_normalized_collapses_whitespace() {
        let tree = parse_rust("fn   a(  )   {}");
        let root = tree.root_node();
        let text = node_text_normalized(&root, "fn   a(  )   {}").unwrap();
        assert!(!text.contains("  "));
    }

    #[test]
    fn node_text_normalized_preserves_whitespace_inside_string_literals() {
        let source = r#"fn a() { let s = "a  b"; }"#;
        let tree = parse_rust(source);
        let root = tree.root_node();
        let text = node_text_normalized(&root, source).unwrap();
        assert!(text.contains("\"a  b\""));
    }

    #[test]
    fn node_text_normalized_distinguishes_string_whitespace_variants() {
        let a = r#"fn a() { let s = "a  b"; }"#;
        let b = r#"fn a() { let s = "a b"; }"#;
        let tree_a = parse_rust(a);
        let tree_b = parse_rust(b);
        let text_a = node_text_normalized(&tree_a.root_node(), a).unwrap();
        let text_b = node_text_normalized(&tree_b.root_node(), b).unwrap();
        assert_ne!(text_a, text_b);
    }

    #[test]
    fn node_text_normalized_strips_comments() {
        let source = "fn a() {\n    // explanatory note\n    1\n}";
        let tree = parse_rust(source);
        let root = tree.root_node();
        let text = node_text_normalized(&root, source).unwrap();
        assert!(!text.contains("explanatory"));
    }

    #[test]
    fn find_descendant_locates_nested_identifier() {
        let source = "fn greet() {}";
        let tree = parse_rust(source);
        let root = tree.root_node();
        let ident = find_descendant_by_kind(&root, "identifier").unwrap();
        assert_eq!(node_text(&ident, source), Some("greet"));
    }

    #[test]
    fn to_line_number_is_one_based() {
        assert_eq!(to_line_number(0), 1);
        assert_eq!(to_line_number(9), 10);
    }
}
