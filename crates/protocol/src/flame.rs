use serde::{Deserialize, Serialize};

/// One node of the nested flame graph payload.
///
/// This is the shape handed to client-side visualizations: every node
/// carries its name, its cumulative value and its children. Children order
/// carries no meaning; producers sort them by name so output is
/// reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlameNode {
    pub name: String,
    pub value: i64,
    #[serde(default)]
    pub children: Vec<FlameNode>,
}

impl FlameNode {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
            children: Vec::new(),
        }
    }

    /// Direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&FlameNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Follow a chain of child names from this node.
    pub fn descend(&self, path: &[&str]) -> Option<&FlameNode> {
        path.iter().try_fold(self, |node, name| node.child(name))
    }

    /// Depth of the deepest node below `self` (0 for a leaf).
    pub fn max_depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            max = max.max(depth);
            stack.extend(node.children.iter().map(|c| (c, depth + 1)));
        }
        max
    }
}

impl Drop for FlameNode {
    fn drop(&mut self) {
        // Unlink descendants one level at a time so dropping a very deep
        // tree does not recurse once per level.
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}
