//! Debug utilities for ART troubleshooting.

use std::fmt::Debug;

use crate::arena::{Link, Ptr};
use crate::map::ArtMap;
use crate::node::NodeKind;
use crate::tree::RawTree;
use crate::{NODE16_SHRINK_THRESHOLD, NODE256_SHRINK_THRESHOLD, NODE48_SHRINK_THRESHOLD, PREFIX_LIMIT};

/// Node counts per class, as reachable from the root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeStats {
    pub leaves: usize,
    pub node4: usize,
    pub node16: usize,
    pub node48: usize,
    pub node256: usize,
}

impl NodeStats {
    pub fn inner_nodes(&self) -> usize {
        self.node4 + self.node16 + self.node48 + self.node256
    }
}

impl<K, V, E> ArtMap<K, V, E> {
    pub fn stats(&self) -> NodeStats {
        let mut stats = NodeStats::default();
        if !self.tree.root.is_null() {
            self.tree.count_nodes(self.tree.root, &mut stats);
        }
        stats
    }

    /// Renders the tree structure, one node or leaf per line.
    pub fn dump(&self) -> String
    where
        K: Debug,
    {
        let mut out = format!("=== ART ({} entries) ===\n", self.len());
        if self.tree.root.is_null() {
            out.push_str("(empty)\n");
        } else {
            self.tree.dump_node(self.tree.root, 0, &mut out);
        }
        out
    }

    /// Verify tree integrity - returns list of issues found.
    pub fn verify_integrity(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let mut leaves = 0;
        if !self.tree.root.is_null() {
            self.tree
                .verify_node(self.tree.root, Vec::new(), false, &mut leaves, &mut issues);
        }
        if leaves != self.len() {
            issues.push(format!("reachable leaves {leaves} != len {}", self.len()));
        }
        // Anything allocated but unreachable was leaked by a restructure.
        let reachable = self.stats().inner_nodes();
        if self.tree.nodes.len() != reachable {
            issues.push(format!(
                "{} inner nodes allocated, {reachable} reachable",
                self.tree.nodes.len()
            ));
        }
        if self.tree.leaves.len() != self.len() {
            issues.push(format!(
                "{} leaves allocated, len {}",
                self.tree.leaves.len(),
                self.len()
            ));
        }
        issues
    }
}

impl<K, V> RawTree<K, V> {
    fn count_nodes(&self, ptr: Ptr, stats: &mut NodeStats) {
        let id = match ptr.resolve() {
            Link::Leaf(_) => {
                stats.leaves += 1;
                return;
            }
            Link::Inner(id) => id,
        };
        let inner = &self.nodes[id];
        match inner.kind() {
            NodeKind::Node4 => stats.node4 += 1,
            NodeKind::Node16 => stats.node16 += 1,
            NodeKind::Node48 => stats.node48 += 1,
            NodeKind::Node256 => stats.node256 += 1,
        }
        if inner.has_leaf() {
            stats.leaves += 1;
        }
        for (_, child) in inner.entries() {
            self.count_nodes(child, stats);
        }
    }

    fn dump_node(&self, ptr: Ptr, depth: usize, out: &mut String)
    where
        K: Debug,
    {
        let indent = "  ".repeat(depth);
        let id = match ptr.resolve() {
            Link::Leaf(leaf) => {
                out.push_str(&format!("{indent}Leaf {:?}\n", self.leaves[leaf].key));
                return;
            }
            Link::Inner(id) => id,
        };
        let inner = &self.nodes[id];
        out.push_str(&format!(
            "{indent}{:?} (prefix=\"{}\"{}, children={})\n",
            inner.kind(),
            inner.stored_prefix().escape_ascii(),
            if inner.is_optimistic() {
                format!("+{}", inner.prefix_len() - PREFIX_LIMIT)
            } else {
                String::new()
            },
            inner.len()
        ));
        if inner.has_leaf() {
            out.push_str(&format!("{indent}  [leaf] ->\n"));
            self.dump_node(inner.leaf, depth + 2, out);
        }
        for (byte, child) in inner.entries() {
            out.push_str(&format!("{indent}  [{}] ->\n", [byte].escape_ascii()));
            self.dump_node(child, depth + 2, out);
        }
    }

    /// `path` is the full key prefix leading to `ptr`; `ends_here` is set for
    /// embedded leaves, whose key must equal it exactly.
    fn verify_node(
        &self,
        ptr: Ptr,
        path: Vec<u8>,
        ends_here: bool,
        leaves: &mut usize,
        issues: &mut Vec<String>,
    ) {
        let id = match ptr.resolve() {
            Link::Leaf(leaf) => {
                *leaves += 1;
                let bytes = &self.leaves[leaf].bytes;
                if !bytes.starts_with(&path) || (ends_here && bytes.len() != path.len()) {
                    issues.push(format!(
                        "Leaf \"{}\" misplaced under path \"{}\"",
                        bytes.escape_ascii(),
                        path.escape_ascii()
                    ));
                }
                return;
            }
            Link::Inner(id) => id,
        };
        let inner = &self.nodes[id];
        let kind = inner.kind();

        let entries = inner.len() + usize::from(inner.has_leaf());
        if entries < 2 {
            issues.push(format!("{kind:?} at \"{}\" has {entries} entries", path.escape_ascii()));
        }
        let minimum = match kind {
            NodeKind::Node4 => 0,
            NodeKind::Node16 => NODE16_SHRINK_THRESHOLD + 1,
            NodeKind::Node48 => NODE48_SHRINK_THRESHOLD + 1,
            NodeKind::Node256 => NODE256_SHRINK_THRESHOLD + 1,
        };
        if inner.len() < minimum {
            issues.push(format!("{kind:?} has {} children (min {minimum})", inner.len()));
        }

        // The compressed path is whatever the leftmost leaf has at this depth;
        // every leaf below re-checks it through `starts_with`.
        let depth = path.len();
        let representative = &self.leaves[self.first_leaf(ptr)].bytes;
        let Some(claimed) = representative.get(depth..depth + inner.prefix_len()) else {
            issues.push(format!(
                "{kind:?} at \"{}\" claims a {}-byte path its leftmost leaf lacks",
                path.escape_ascii(),
                inner.prefix_len()
            ));
            return;
        };
        if !claimed.starts_with(inner.stored_prefix()) {
            issues.push(format!(
                "{kind:?} stored prefix \"{}\" disagrees with leaf path \"{}\"",
                inner.stored_prefix().escape_ascii(),
                claimed.escape_ascii()
            ));
        }
        let mut node_path = path;
        node_path.extend_from_slice(claimed);

        if inner.has_leaf() {
            self.verify_node(inner.leaf, node_path.clone(), true, leaves, issues);
        }
        let children = inner.entries();
        if children.windows(2).any(|w| w[0].0 >= w[1].0) {
            issues.push(format!("{kind:?} children out of order"));
        }
        for (byte, child) in children {
            let mut child_path = node_path.clone();
            child_path.push(byte);
            self.verify_node(child, child_path, false, leaves, issues);
        }
    }
}
