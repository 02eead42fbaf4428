//! Visualization of search trees in the DOT format
//!
//! Every node is rendered as a record with the label reason, the incoming
//! actions and the canonical words. Nodes labeled `Top` are drawn green,
//! nodes labeled `Bottom` red.

use std::fmt;
use std::sync::Arc;

use mtlsyn_display_utils::{indent_lines, join_displayed};

use crate::canonical_word::word_to_string;
use crate::search_tree::{NodeLabel, SearchTreeNode};

/// Escape characters that delimit fields in a DOT record label
fn escape_record(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '{' | '}' | '|' | '<' | '>' | '"') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn node_color<L>(node: &SearchTreeNode<L>) -> Option<&'static str> {
    match node.label() {
        NodeLabel::Top => Some("green"),
        NodeLabel::Bottom => Some("red"),
        NodeLabel::Unlabeled | NodeLabel::Canceled => None,
    }
}

fn add_node<L: fmt::Display>(
    node: &Arc<SearchTreeNode<L>>,
    next_id: &mut usize,
    body: &mut String,
) -> usize {
    let id = *next_id;
    *next_id += 1;
    let actions = join_displayed(
        node.incoming_actions
            .iter()
            .map(|(step, action)| format!("({step}, {action})")),
        ", ",
    );
    let words = join_displayed(
        node.words
            .iter()
            .map(|word| escape_record(&word_to_string(word))),
        "|",
    );
    let color = node_color(node)
        .map(|color| format!(", color = {color}"))
        .unwrap_or_default();
    body.push_str(&format!(
        "node_{id} [shape = record, label = \"{{{}|{}|{}}}\"{color}];\n",
        escape_record(&node.label_reason().to_string()),
        escape_record(&actions),
        words,
    ));
    for child in node.children.read().unwrap().iter() {
        let child_id = add_node(child, next_id, body);
        body.push_str(&format!("node_{id} -> node_{child_id};\n"));
    }
    id
}

/// Render the search tree rooted at `root` in the DOT format
pub fn search_tree_to_dot<L: fmt::Display>(root: &Arc<SearchTreeNode<L>>) -> String {
    let mut body = String::from("rankdir=TB;\n");
    let mut next_id = 0;
    add_node(root, &mut next_id, &mut body);
    format!("digraph search_tree {{\n{}}}\n", indent_lines(&body))
}
