use std::collections::BTreeMap;

use tracing::debug;

use super::profile::Profile;

/// Name of the synthetic node every stack hangs from.
pub const ROOT_NAME: &str = "root";

/// Index of a node inside its [`CallTree`].
pub type NodeId = usize;

/// Aggregated call tree node. Every stack that passes through this node at
/// this depth contributes its full value to `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallTreeNode {
    pub name: String,
    pub value: i64,
    /// Children keyed by function name.
    pub children: BTreeMap<String, NodeId>,
}

impl CallTreeNode {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            value: 0,
            children: BTreeMap::new(),
        }
    }
}

/// Weighted call tree folded from (stack, value) pairs.
///
/// Nodes live in an arena; node 0 is the root. A child is always stored
/// after its parent, so ids grow with depth along any path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallTree {
    nodes: Vec<CallTreeNode>,
}

impl CallTree {
    pub const ROOT: NodeId = 0;

    /// A tree holding only an empty root.
    pub fn new() -> Self {
        Self {
            nodes: vec![CallTreeNode::new(ROOT_NAME)],
        }
    }

    /// Fold one stack into the tree.
    ///
    /// `frames` are ordered root to leaf: the outermost caller comes first,
    /// the point of capture last. `value` is added to the root and to every
    /// node along the path; missing nodes are created, existing ones with
    /// the same name are reused.
    pub fn add_stack<I, S>(&mut self, frames: I, value: i64)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut current = Self::ROOT;
        self.add_value(current, value);
        for frame in frames {
            let name = frame.as_ref();
            current = match self.nodes[current].children.get(name) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(CallTreeNode::new(name));
                    self.nodes[current].children.insert(name.to_string(), child);
                    child
                }
            };
            self.add_value(current, value);
        }
    }

    fn add_value(&mut self, id: NodeId, value: i64) {
        let node = &mut self.nodes[id];
        node.value = node.value.saturating_add(value);
    }

    /// Build a tree from stacks that are already resolved to names.
    pub fn from_stacks<I, F, S>(stacks: I) -> Self
    where
        I: IntoIterator<Item = (F, i64)>,
        F: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tree = Self::new();
        for (frames, value) in stacks {
            tree.add_stack(frames, value);
        }
        tree
    }

    /// Build a tree over every sample of `profile`, weighting each stack
    /// by its value in series `series`.
    pub fn from_profile(profile: &Profile, series: usize) -> Self {
        let mut tree = Self::new();
        for sample in &profile.samples {
            tree.add_stack(profile.stack_names(sample), sample.value(series));
        }
        debug!(
            samples = profile.samples.len(),
            nodes = tree.len(),
            total = tree.total(),
            series,
            "built call tree"
        );
        tree
    }

    pub fn root(&self) -> &CallTreeNode {
        &self.nodes[Self::ROOT]
    }

    pub fn node(&self, id: NodeId) -> Option<&CallTreeNode> {
        self.nodes.get(id)
    }

    /// All nodes in arena order (root first, parents before children).
    pub fn nodes(&self) -> &[CallTreeNode] {
        &self.nodes
    }

    pub fn child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.node(id)?.children.get(name).copied()
    }

    /// Node reached by following `path` from the root.
    pub fn find_path(&self, path: &[&str]) -> Option<&CallTreeNode> {
        let id = path
            .iter()
            .try_fold(Self::ROOT, |id, name| self.child(id, name))?;
        self.node(id)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no stack has created any node below the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Sum of all folded values.
    pub fn total(&self) -> i64 {
        self.root().value
    }

    /// Length of the longest root-to-leaf chain, not counting the root.
    pub fn depth(&self) -> usize {
        let mut depths = vec![0usize; self.nodes.len()];
        for (id, node) in self.nodes.iter().enumerate() {
            for &child in node.children.values() {
                depths[child] = depths[id] + 1;
            }
        }
        depths.into_iter().max().unwrap_or(0)
    }
}

impl Default for CallTree {
    fn default() -> Self {
        Self::new()
    }
}
