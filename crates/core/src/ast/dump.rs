use serde_json::{json, Value};
use std::fmt::Write as _;

use super::{Ast, NodeId, NodeKind};

impl Ast {
    /// Indented tree dump, one descriptor line per node.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        if let Some(root) = self.root {
            self.dump_node(root, 0, &mut out);
        }
        out
    }

    pub fn print(&self) {
        print!("{}", self.dump());
    }

    fn dump_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = self.node(id);
        let _ = write!(out, "{:indent$}{}", "", node.kind().describe(), indent = depth * 2);
        if let Some(flags) = node.flags() {
            let _ = write!(out, " @[{}]", flags.join(", "));
        }
        out.push('\n');
        for comment in node.comments() {
            self.dump_node(*comment, depth + 1, out);
        }
        for child in node.children() {
            self.dump_node(child, depth + 1, out);
        }
    }

    /// Nested JSON rendering of the tree, `null` when there is no root.
    pub fn to_json(&self) -> Value {
        match self.root {
            Some(root) => self.node_json(root),
            None => Value::Null,
        }
    }

    fn node_json(&self, id: NodeId) -> Value {
        let node = self.node(id);
        let mut value = serde_json::to_value(node.kind()).unwrap_or_else(|_| json!({}));
        if let Value::Object(map) = &mut value {
            map.insert("line".into(), json!(node.location().line));
            map.insert("column".into(), json!(node.location().column));
            if let Some(flags) = node.flags() {
                map.insert("flags".into(), json!(flags));
            }
            let comments: Vec<Value> = node
                .comments()
                .iter()
                .filter_map(|c| match self.kind(*c) {
                    NodeKind::Comment { text } => Some(json!(text)),
                    _ => None,
                })
                .collect();
            if !comments.is_empty() {
                map.insert("comments".into(), Value::Array(comments));
            }
            if let NodeKind::Message {
                return_value: Some(ret),
                ..
            } = node.kind()
            {
                map.insert("return_value".into(), self.node_json(*ret));
            }
            let children: Vec<Value> = node
                .children
                .iter()
                .map(|c| self.node_json(*c))
                .collect();
            if !children.is_empty() {
                map.insert("children".into(), Value::Array(children));
            }
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Ast, NodeKind};
    use crate::token::Location;

    fn sample() -> Ast {
        let mut ast = Ast::new("d.cour");
        let at = Location {
            line: 1,
            column: 1,
            offset: 0,
        };
        let fragment = ast.alloc(NodeKind::CodeFragmentBlock, at);
        ast.set_flags(fragment, vec!["inline".into()]);
        let block = ast.alloc(NodeKind::StatementsBlock, at);
        let var = ast.alloc(
            NodeKind::Variable {
                name: "x".into(),
                type_name: Some("int32".into()),
            },
            at,
        );
        let note = ast.alloc(NodeKind::Comment { text: "# note".into() }, at);
        ast.attach(block, var);
        ast.attach_comment(block, note);
        ast.attach(fragment, block);
        ast.set_root(fragment);
        ast
    }

    #[test]
    fn dump_indents_by_depth_and_lists_comments_first() {
        assert_eq!(
            sample().dump(),
            "CodeFragmentBlock @[inline]\n  StatementsBlock\n    Comment # note\n    Variable x : int32\n"
        );
    }

    #[test]
    fn json_nests_children() {
        let json = sample().to_json();
        assert_eq!(json["kind"], "CodeFragmentBlock");
        assert_eq!(json["flags"][0], "inline");
        let block = &json["children"][0];
        assert_eq!(block["comments"][0], "# note");
        assert_eq!(block["children"][0]["kind"], "Variable");
        assert_eq!(block["children"][0]["type_name"], "int32");
    }

    #[test]
    fn empty_tree_dumps_nothing() {
        let ast = Ast::new("e.cour");
        assert_eq!(ast.dump(), "");
        assert!(ast.to_json().is_null());
    }
}
