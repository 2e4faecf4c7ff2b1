//! Canonical pretty-printer for node trees.
//!
//! Collections keep their delimiters. Children of lists, vectors and sets are
//! separated by a newline followed by `indent` spaces; map entries are
//! separated by a comma, a newline and the same indentation, with one space
//! between key and value. Each nesting level indents by one more space.

use super::chars::{self, CharClass};
use super::node::{Document, Node, NodeKind, NodeRef};

/// Render a whole document, starting at indentation level one.
///
/// # Examples
///
/// ```
/// use aa::eden::{pprint, read};
///
/// let doc = read("(a (b))").expect("valid notation");
/// assert_eq!(pprint(&doc), "[(a\n  (b))]");
/// ```
#[must_use]
pub fn pprint(doc: &Document) -> String {
    print(doc.root(), 1)
}

/// Render `node` with its children indented by `indent` spaces.
#[must_use]
pub fn print(node: NodeRef<'_>, indent: usize) -> String {
    let mut out = String::new();
    write_node(&mut out, node, indent);
    out
}

fn write_node(out: &mut String, node: NodeRef<'_>, indent: usize) {
    match node.node() {
        Node::Nil => out.push_str("nil"),
        Node::Bool(value) => out.push_str(if *value { "true" } else { "false" }),
        Node::Char(c) => write_char(out, *c),
        Node::Int(value) => out.push_str(&value.to_string()),
        Node::Float(value) => out.push_str(&format!("{value:?}")),
        Node::String(text) => write_string(out, text),
        Node::Symbol(text) => out.push_str(text),
        Node::Keyword(text) => {
            out.push(':');
            out.push_str(text);
        }
        Node::List(_) | Node::Vector(_) | Node::Map(_) | Node::Set(_) => {
            write_collection(out, node, indent);
        }
    }
}

fn write_collection(out: &mut String, node: NodeRef<'_>, indent: usize) {
    let (open, close) = node.kind().delimiters().unwrap_or(("(", ")"));
    let separator = if node.kind() == NodeKind::Map {
        format!(",\n{}", " ".repeat(indent))
    } else {
        format!("\n{}", " ".repeat(indent))
    };
    out.push_str(open);
    if node.kind() == NodeKind::Map {
        for (index, (key, value)) in node.pairs().enumerate() {
            if index > 0 {
                out.push_str(&separator);
            }
            write_node(out, key, indent + 1);
            if let Some(value) = value {
                out.push(' ');
                write_node(out, value, indent + 1);
            }
        }
    } else {
        for (index, child) in node.children().enumerate() {
            if index > 0 {
                out.push_str(&separator);
            }
            write_node(out, child, indent + 1);
        }
    }
    out.push_str(close);
}

fn write_string(out: &mut String, text: &str) {
    out.push('"');
    for c in text.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}

fn write_char(out: &mut String, c: char) {
    out.push('\\');
    if let Some(name) = chars::name_of(c) {
        out.push_str(name);
    } else if chars::classify(c) == CharClass::Token {
        out.push(c);
    } else {
        out.push_str(&format!("u{:04X}", u32::from(c)));
    }
}
