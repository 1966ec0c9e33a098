//! Conversion of a [`CallTree`] into the nested `{name, value, children}`
//! payload consumed by flame graph visualizations.
//!
//! Both entry points walk the arena without recursion, so stack depth of
//! the profiled program never limits what can be serialized. Children are
//! emitted in name order.

use std::io::Write;

use pprof_flame_protocol::FlameNode;
use thiserror::Error;

use crate::model::{CallTree, NodeId};

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("failed to encode node name: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write payload: {0}")]
    Io(#[from] std::io::Error),
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Owned nested copy of the tree.
pub fn to_flame_node(tree: &CallTree) -> FlameNode {
    let nodes = tree.nodes();
    let mut built: Vec<Option<FlameNode>> = vec![None; nodes.len()];
    // Children are stored after their parents, so walking the arena
    // backwards finishes every subtree before its parent needs it.
    for (id, node) in nodes.iter().enumerate().rev() {
        let children = node
            .children
            .values()
            .filter_map(|&child| built[child].take())
            .collect();
        built[id] = Some(FlameNode {
            name: node.name.clone(),
            value: node.value,
            children,
        });
    }
    built
        .into_iter()
        .next()
        .flatten()
        .unwrap_or_else(|| FlameNode::new(crate::model::ROOT_NAME, 0))
}

enum Step {
    Open { id: NodeId, comma: bool },
    Close,
}

/// Write the tree as JSON into `out`.
pub fn write_json<W: Write>(tree: &CallTree, mut out: W) -> Result<(), SerializationError> {
    let mut stack = vec![Step::Open {
        id: CallTree::ROOT,
        comma: false,
    }];
    while let Some(step) = stack.pop() {
        let (id, comma) = match step {
            Step::Close => {
                out.write_all(b"]}")?;
                continue;
            }
            Step::Open { id, comma } => (id, comma),
        };
        let Some(node) = tree.node(id) else {
            continue;
        };
        if comma {
            out.write_all(b",")?;
        }
        out.write_all(b"{\"name\":")?;
        serde_json::to_writer(&mut out, &node.name)?;
        write!(out, ",\"value\":{},\"children\":[", node.value)?;

        stack.push(Step::Close);
        let first = node.children.values().next().copied();
        stack.extend(node.children.values().rev().map(|&child| Step::Open {
            id: child,
            comma: Some(child) != first,
        }));
    }
    Ok(())
}

/// The tree as a JSON string.
pub fn to_json(tree: &CallTree) -> Result<String, SerializationError> {
    let mut buf = Vec::with_capacity(tree.len() * 48);
    write_json(tree, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}

/// JSON that is safe to place verbatim inside an HTML `<script>` element.
///
/// `<` only ever appears inside string literals, where the `\u003c`
/// escape decodes to the same character, so the payload cannot close the
/// element early.
pub fn to_script_json(tree: &CallTree) -> Result<String, SerializationError> {
    Ok(to_json(tree)?.replace('<', "\\u003c"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> CallTree {
        CallTree::from_stacks([
            (vec!["main", "foo"], 10),
            (vec!["main", "bar"], 5),
            (vec!["main", "foo"], 3),
        ])
    }

    #[test]
    fn empty_tree_serializes_to_bare_root() {
        let json = to_json(&CallTree::new()).unwrap();
        assert_eq!(json, r#"{"name":"root","value":0,"children":[]}"#);
    }

    #[test]
    fn children_are_sorted_by_name() {
        let json = to_json(&scenario()).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"name":"root","value":18,"children":["#,
                r#"{"name":"main","value":18,"children":["#,
                r#"{"name":"bar","value":5,"children":[]},"#,
                r#"{"name":"foo","value":13,"children":[]}]}]}"#,
            )
        );
    }

    #[test]
    fn json_matches_flame_node_shape() {
        let tree = scenario();
        let parsed: FlameNode = serde_json::from_str(&to_json(&tree).unwrap()).unwrap();
        assert_eq!(parsed, to_flame_node(&tree));
    }

    #[test]
    fn serialization_is_repeatable() {
        let tree = scenario();
        assert_eq!(to_json(&tree).unwrap(), to_json(&tree).unwrap());
        assert_eq!(to_flame_node(&tree), to_flame_node(&tree));
    }

    #[test]
    fn flame_node_keeps_values() {
        let node = to_flame_node(&scenario());
        assert_eq!(node.name, "root");
        assert_eq!(node.value, 18);
        let main = node.child("main").unwrap();
        assert_eq!(main.value, 18);
        let names: Vec<_> = main.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["bar", "foo"]);
        assert_eq!(main.child("foo").unwrap().value, 13);
    }

    #[test]
    fn escapes_names() {
        let tree = CallTree::from_stacks([(vec!["say \"hi\"\n"], 1)]);
        let parsed: FlameNode = serde_json::from_str(&to_json(&tree).unwrap()).unwrap();
        assert_eq!(parsed.children[0].name, "say \"hi\"\n");
    }

    #[test]
    fn script_json_cannot_close_the_element() {
        let tree = CallTree::from_stacks([(vec!["</script><script>alert(1)"], 1)]);
        let json = to_script_json(&tree).unwrap();
        assert!(!json.contains("</script>"));
        let parsed: FlameNode = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.children[0].name, "</script><script>alert(1)");
    }

    #[test]
    fn deep_trees_serialize_iteratively() {
        let frames: Vec<String> = (0..50_000).map(|i| format!("f{i}")).collect();
        let mut tree = CallTree::new();
        tree.add_stack(&frames, 1);
        let json = to_json(&tree).unwrap();
        assert!(json.starts_with(r#"{"name":"root","value":1,"children":[{"name":"f0""#));
        assert!(json.ends_with(&"]}".repeat(50_001)));
    }
}
