//! The radix tree engine: lookup, insertion and deletion over encoded keys.
//!
//! Based on "The Adaptive Radix Tree: ARTful Indexing for Main-Memory
//! Databases" (Leis et al., 2013), with lazy leaf expansion and hybrid
//! (pessimistic + optimistic) path compression.

use smallvec::SmallVec;
use tracing::trace;

use crate::arena::{Arena, InnerId, LeafId, Link, Ptr};
use crate::node::{Cursor, InnerNode, Leaf, Slot};
use crate::path::Path;
use crate::PREFIX_LIMIT;

/// Outcome of matching a node's compressed path during insertion.
enum PrefixMatch {
    /// The whole path matched; the key continues at this depth.
    Full(usize),
    /// The key diverges `lcp` bytes into the path. `representative` is set
    /// when the divergence lies in the optimistic (unstored) remainder.
    Diverged {
        lcp: usize,
        representative: Option<LeafId>,
    },
}

/// Arena-backed adaptive radix tree keyed by encoded bytes.
///
/// Each leaf also carries the application key it was encoded from; the tree
/// itself only ever looks at the bytes.
#[derive(Clone)]
pub(crate) struct RawTree<K, V> {
    pub(crate) nodes: Arena<InnerNode, InnerId>,
    pub(crate) leaves: Arena<Leaf<K, V>, LeafId>,
    pub(crate) root: Ptr,
    len: usize,
    /// Bumped on every structural change (key added or removed).
    mod_count: u64,
}

impl<K, V> RawTree<K, V> {
    pub(crate) fn new() -> Self {
        Self::with_capacity(0)
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::new(),
            leaves: Arena::with_capacity(capacity),
            root: Ptr::NULL,
            len: 0,
            mod_count: 0,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn mod_count(&self) -> u64 {
        self.mod_count
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.leaves.clear();
        self.root = Ptr::NULL;
        self.len = 0;
        self.mod_count += 1;
    }

    #[inline]
    pub(crate) fn leaf(&self, id: LeafId) -> &Leaf<K, V> {
        &self.leaves[id]
    }

    #[inline]
    pub(crate) fn leaf_mut(&mut self, id: LeafId) -> &mut Leaf<K, V> {
        &mut self.leaves[id]
    }

    /// Leftmost leaf under `from`. This is the representative used to
    /// recover the unstored part of a compressed path.
    pub(crate) fn first_leaf(&self, from: Ptr) -> LeafId {
        let mut node = from;
        loop {
            match node.resolve() {
                Link::Leaf(leaf) => return leaf,
                Link::Inner(id) => {
                    let inner = &self.nodes[id];
                    node = if inner.has_leaf() {
                        inner.leaf
                    } else {
                        inner.first_child().expect("inner node with no entries").1
                    };
                }
            }
        }
    }

    /// Stores `ptr` where `link` points: a parent slot, or the root.
    fn set_link(&mut self, link: Option<Cursor>, ptr: Ptr) {
        match link {
            None => self.root = ptr,
            Some(cursor) => cursor.replace(&mut self.nodes, ptr),
        }
    }

    fn alloc_leaf(&mut self, bytes: Box<[u8]>, key: K, value: V) -> Ptr {
        Ptr::leaf(self.leaves.alloc(Leaf { bytes, key, value }))
    }

    fn key_added(&mut self) {
        self.len += 1;
        self.mod_count += 1;
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Point lookup. Optimistic path remainders are skipped on the way down;
    /// the final full-key comparison against the leaf settles them.
    pub(crate) fn get(&self, key: &[u8]) -> Option<LeafId> {
        if self.root.is_null() {
            return None;
        }
        let mut node = self.root;
        let mut depth = 0;
        loop {
            let id = match node.resolve() {
                Link::Leaf(leaf) => return (*self.leaves[leaf].bytes == *key).then_some(leaf),
                Link::Inner(id) => id,
            };
            let inner = &self.nodes[id];
            if key.len() < depth + inner.prefix_len() {
                return None;
            }
            let stored = inner.stored_prefix();
            if key[depth..depth + stored.len()] != *stored {
                return None;
            }
            depth += inner.prefix_len();
            if depth == key.len() {
                if !inner.has_leaf() {
                    return None;
                }
                node = inner.leaf;
                continue;
            }
            node = inner.find_child(key[depth])?;
            depth += 1;
        }
    }

    /// Like [`get`](Self::get) but records the uplink chain to the leaf.
    pub(crate) fn find_path(&self, key: &[u8]) -> Option<Path> {
        if self.root.is_null() {
            return None;
        }
        let mut path = Path::new();
        let mut node = self.root;
        let mut depth = 0;
        loop {
            let id = match node.resolve() {
                Link::Leaf(leaf) => {
                    if *self.leaves[leaf].bytes != *key {
                        return None;
                    }
                    path.to = Some(leaf);
                    return Some(path);
                }
                Link::Inner(id) => id,
            };
            let inner = &self.nodes[id];
            if key.len() < depth + inner.prefix_len() {
                return None;
            }
            let stored = inner.stored_prefix();
            if key[depth..depth + stored.len()] != *stored {
                return None;
            }
            depth += inner.prefix_len();
            let cursor = if depth == key.len() {
                Cursor::new(id, inner.leaf_slot()?)
            } else {
                let byte = key[depth];
                inner.find_child(byte)?;
                depth += 1;
                Cursor::new(id, Slot::Byte(byte))
            };
            path.steps.push(cursor);
            node = cursor.current(&self.nodes);
        }
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Inserts `bytes -> (key, value)`. If the bytes are already present the
    /// value is replaced (the stored key is kept) and the old value returned.
    pub(crate) fn insert(&mut self, bytes: Box<[u8]>, key: K, value: V) -> Option<V> {
        if self.root.is_null() {
            self.root = self.alloc_leaf(bytes, key, value);
            self.key_added();
            return None;
        }

        let mut link: Option<Cursor> = None;
        let mut node = self.root;
        let mut depth = 0;
        loop {
            let id = match node.resolve() {
                Link::Leaf(leaf) => return self.expand_leaf(link, leaf, depth, bytes, key, value),
                Link::Inner(id) => id,
            };

            let depth_after = match self.match_prefix(id, &bytes, depth) {
                PrefixMatch::Full(d) => d,
                PrefixMatch::Diverged {
                    lcp,
                    representative,
                } => {
                    self.branch_out(link, id, depth, lcp, representative, bytes, key, value);
                    return None;
                }
            };

            if depth_after == bytes.len() {
                let existing = self.nodes[id].leaf;
                if !existing.is_null() {
                    let leaf = &mut self.leaves[existing.leaf_id()];
                    return Some(std::mem::replace(&mut leaf.value, value));
                }
                let leaf = self.alloc_leaf(bytes, key, value);
                self.nodes[id].leaf = leaf;
                self.key_added();
                return None;
            }

            let byte = bytes[depth_after];
            if let Some(child) = self.nodes[id].find_child(byte) {
                link = Some(Cursor::new(id, Slot::Byte(byte)));
                node = child;
                depth = depth_after + 1;
                continue;
            }

            let target = if self.nodes[id].is_full() {
                self.grow(link, id)
            } else {
                id
            };
            let leaf = self.alloc_leaf(bytes, key, value);
            let added = self.nodes[target].add_child(byte, leaf);
            debug_assert!(added, "node has room after growth");
            self.key_added();
            return None;
        }
    }

    /// Lazy expansion: a leaf sits where the new key needs to go, so both
    /// keys get a fresh Node4 compressed over their common bytes.
    fn expand_leaf(
        &mut self,
        link: Option<Cursor>,
        existing: LeafId,
        depth: usize,
        bytes: Box<[u8]>,
        key: K,
        value: V,
    ) -> Option<V> {
        let old_bytes = &self.leaves[existing].bytes;
        let lcp = old_bytes[depth..]
            .iter()
            .zip(&bytes[depth..])
            .take_while(|(a, b)| a == b)
            .count();
        let split_at = depth + lcp;
        let old_byte = old_bytes.get(split_at).copied();
        let new_byte = bytes.get(split_at).copied();

        if old_byte.is_none() && new_byte.is_none() {
            let leaf = &mut self.leaves[existing];
            return Some(std::mem::replace(&mut leaf.value, value));
        }

        let mut node = InnerNode::new();
        node.set_prefix(lcp, &bytes[depth..]);
        let old_leaf = Ptr::leaf(existing);
        let new_leaf = self.alloc_leaf(bytes, key, value);
        match (old_byte, new_byte) {
            (Some(o), Some(n)) => {
                node.add_child(o, old_leaf);
                node.add_child(n, new_leaf);
            }
            (Some(o), None) => {
                node.leaf = new_leaf;
                node.add_child(o, old_leaf);
            }
            (None, Some(n)) => {
                node.leaf = old_leaf;
                node.add_child(n, new_leaf);
            }
            (None, None) => unreachable!("identical keys are handled above"),
        }

        let id = self.nodes.alloc(node);
        self.set_link(link, Ptr::inner(id));
        self.key_added();
        trace!(target: "art_map::tree", depth, lcp, "expanded leaf into Node4");
        None
    }

    /// Matches the compressed path of `id` against `key[depth..]`.
    ///
    /// Stored bytes are compared directly; only when all of them match and
    /// the path is longer than what is stored is the remainder checked
    /// against the leftmost leaf.
    fn match_prefix(&self, id: InnerId, key: &[u8], depth: usize) -> PrefixMatch {
        let inner = &self.nodes[id];
        let prefix_len = inner.prefix_len();
        let stored = inner.stored_prefix();
        let end = stored.len().min(key.len() - depth);
        let mut lcp = 0;
        while lcp < end && key[depth + lcp] == stored[lcp] {
            lcp += 1;
        }
        if lcp == prefix_len {
            return PrefixMatch::Full(depth + lcp);
        }
        if lcp < stored.len() {
            return PrefixMatch::Diverged {
                lcp,
                representative: None,
            };
        }

        let representative = self.first_leaf(Ptr::inner(id));
        let leaf = &self.leaves[representative].bytes;
        let end = key.len().min(depth + prefix_len);
        let mut at = depth + lcp;
        while at < end && key[at] == leaf[at] {
            at += 1;
        }
        let lcp = at - depth;
        if lcp == prefix_len {
            PrefixMatch::Full(at)
        } else {
            PrefixMatch::Diverged {
                lcp,
                representative: Some(representative),
            }
        }
    }

    /// Splits the compressed path of `id` at `lcp`: a new Node4 takes the
    /// matched part and adopts both the old node and the new key.
    #[allow(clippy::too_many_arguments)]
    fn branch_out(
        &mut self,
        link: Option<Cursor>,
        id: InnerId,
        depth: usize,
        lcp: usize,
        representative: Option<LeafId>,
        bytes: Box<[u8]>,
        key: K,
        value: V,
    ) {
        let split_at = depth + lcp;
        let mut branch = InnerNode::new();
        branch.set_prefix(lcp, &bytes[depth..]);
        let new_byte = bytes.get(split_at).copied();

        let old = &self.nodes[id];
        let remaining = old.prefix_len() - lcp - 1;
        let old_byte = match representative {
            // Diverged inside the stored bytes.
            None if !old.is_optimistic() => {
                let byte = old.prefix[lcp];
                let tail = old.prefix;
                self.nodes[id].set_prefix(remaining, &tail[lcp + 1..]);
                byte
            }
            // Diverged inside the stored bytes, but the path continues past
            // them: refill what can be stored from the leftmost leaf.
            None => {
                let byte = old.prefix[lcp];
                let rep = self.first_leaf(Ptr::inner(id));
                let leaf = &self.leaves[rep].bytes;
                self.nodes[id].set_prefix(remaining, &leaf[split_at + 1..]);
                byte
            }
            Some(rep) => {
                let leaf = &self.leaves[rep].bytes;
                let byte = leaf[split_at];
                self.nodes[id].set_prefix(remaining, &leaf[split_at + 1..]);
                byte
            }
        };

        let new_leaf = self.alloc_leaf(bytes, key, value);
        branch.add_child(old_byte, Ptr::inner(id));
        match new_byte {
            Some(b) => {
                branch.add_child(b, new_leaf);
            }
            None => branch.leaf = new_leaf,
        }

        let branch_id = self.nodes.alloc(branch);
        self.set_link(link, Ptr::inner(branch_id));
        self.key_added();
        trace!(
            target: "art_map::tree",
            depth,
            lcp,
            optimistic = representative.is_some(),
            "branched out compressed path"
        );
    }

    /// Replaces a full node with the next larger class. Returns the new id.
    fn grow(&mut self, link: Option<Cursor>, id: InnerId) -> InnerId {
        let grown = self.nodes[id].grow();
        let (from, to) = (self.nodes[id].kind(), grown.kind());
        let new_id = self.nodes.alloc(grown);
        self.nodes.take(id);
        self.set_link(link, Ptr::inner(new_id));
        trace!(target: "art_map::node", ?from, ?to, "grew inner node");
        new_id
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    pub(crate) fn remove(&mut self, key: &[u8]) -> Option<Leaf<K, V>> {
        let path = self.find_path(key)?;
        Some(self.remove_at(&path))
    }

    /// Unlinks the leaf `path` leads to, then repairs the parent using only
    /// the parent and grandparent cursors of the chain.
    ///
    /// `path` must be current: no structural change since it was built.
    pub(crate) fn remove_at(&mut self, path: &Path) -> Leaf<K, V> {
        let leaf = path.to.expect("path does not lead to a leaf");
        self.len -= 1;
        self.mod_count += 1;

        let Some(parent) = path.parent() else {
            self.root = Ptr::NULL;
            return self.leaves.take(leaf);
        };
        let grandparent = path.grandparent();

        let removed = parent.remove(&mut self.nodes);
        debug_assert_eq!(removed, Ptr::leaf(leaf));

        let node = &self.nodes[parent.node];
        if node.should_shrink() {
            let shrunk = node.shrink();
            let (from, to) = (node.kind(), shrunk.kind());
            let new_id = self.nodes.alloc(shrunk);
            self.nodes.take(parent.node);
            self.set_link(grandparent, Ptr::inner(new_id));
            trace!(target: "art_map::node", ?from, ?to, "shrank inner node");
        } else if node.len() == 1 && !node.has_leaf() {
            let (byte, child) = node.first_child().expect("one child remains");
            self.collapse(grandparent, parent.node, byte, child);
        } else if node.len() == 0 {
            let promoted = node.leaf;
            debug_assert!(!promoted.is_null(), "inner node left with no entries");
            self.nodes.take(parent.node);
            self.set_link(grandparent, promoted);
            trace!(target: "art_map::node", "promoted embedded leaf");
        }

        self.leaves.take(leaf)
    }

    /// Splices the only child of `parent` into the grandparent's slot,
    /// folding `parent path + byte` into the child's compressed path.
    fn collapse(&mut self, link: Option<Cursor>, parent: InnerId, byte: u8, child: Ptr) {
        let removed = self.nodes.take(parent);
        if let Link::Inner(child_id) = child.resolve() {
            let only = &mut self.nodes[child_id];
            let merged_len = removed.prefix_len() + 1 + only.prefix_len();
            // The stored bytes of each part are a prefix of that part, so
            // their concatenation starts with the merged path.
            let mut merged: SmallVec<[u8; 2 * PREFIX_LIMIT + 1]> = SmallVec::new();
            merged.extend_from_slice(removed.stored_prefix());
            if !removed.is_optimistic() {
                merged.push(byte);
                merged.extend_from_slice(only.stored_prefix());
            }
            only.set_prefix(merged_len, &merged);
            trace!(target: "art_map::node", merged_len, "collapsed single-child node");
        }
        self.set_link(link, child);
    }
}
