//! Uplink chains and predecessor / successor stepping.
//!
//! Nodes keep no parent pointers. A traversal instead records every
//! `(ancestor, slot)` it passes through in a [`Path`]; the recorded chain is
//! enough to step to the neighbouring leaf and to fix up the parent and
//! grandparent after a deletion without searching from the root again.

use smallvec::SmallVec;

use crate::arena::{LeafId, Link, Ptr};
use crate::node::Cursor;
use crate::tree::RawTree;

/// Cursors kept inline before spilling to the heap.
const INLINE_DEPTH: usize = 16;

/// Root-to-leaf chain of cursors plus the leaf it leads to.
#[derive(Debug, Clone, Default)]
pub(crate) struct Path {
    pub(crate) steps: SmallVec<[Cursor; INLINE_DEPTH]>,
    /// `None` once stepping has run off either end of the tree.
    pub(crate) to: Option<LeafId>,
}

impl Path {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The cursor into the leaf's immediate parent.
    #[inline]
    pub(crate) fn parent(&self) -> Option<Cursor> {
        self.steps.last().copied()
    }

    /// The cursor into the parent's parent.
    #[inline]
    pub(crate) fn grandparent(&self) -> Option<Cursor> {
        let n = self.steps.len();
        (n >= 2).then(|| self.steps[n - 2])
    }
}

impl<K, V> RawTree<K, V> {
    /// Extends `path` down the leftmost edge of `from`.
    pub(crate) fn descend_first(&self, path: &mut Path, from: Ptr) {
        let mut node = from;
        loop {
            match node.resolve() {
                Link::Leaf(leaf) => {
                    path.to = Some(leaf);
                    return;
                }
                Link::Inner(id) => {
                    let slot = self.nodes[id]
                        .front()
                        .expect("inner node with no entries");
                    let cursor = Cursor::new(id, slot);
                    path.steps.push(cursor);
                    node = cursor.current(&self.nodes);
                }
            }
        }
    }

    /// Extends `path` down the rightmost edge of `from`.
    pub(crate) fn descend_last(&self, path: &mut Path, from: Ptr) {
        let mut node = from;
        loop {
            match node.resolve() {
                Link::Leaf(leaf) => {
                    path.to = Some(leaf);
                    return;
                }
                Link::Inner(id) => {
                    let slot = self.nodes[id]
                        .rear()
                        .expect("inner node with no entries");
                    let cursor = Cursor::new(id, slot);
                    path.steps.push(cursor);
                    node = cursor.current(&self.nodes);
                }
            }
        }
    }

    /// Moves `path` to the in-order successor of the subtree its deepest
    /// cursor points at. Returns `false` (leaving `path.to` empty) when there
    /// is none.
    pub(crate) fn step_forward(&self, path: &mut Path) -> bool {
        path.to = None;
        while let Some(cursor) = path.steps.pop() {
            if let Some(next) = cursor.next(&self.nodes) {
                path.steps.push(next);
                self.descend_first(path, next.current(&self.nodes));
                return true;
            }
        }
        false
    }

    /// Mirror of [`step_forward`](Self::step_forward).
    pub(crate) fn step_back(&self, path: &mut Path) -> bool {
        path.to = None;
        while let Some(cursor) = path.steps.pop() {
            if let Some(prev) = cursor.prev(&self.nodes) {
                path.steps.push(prev);
                self.descend_last(path, prev.current(&self.nodes));
                return true;
            }
        }
        false
    }

    pub(crate) fn first_path(&self) -> Option<Path> {
        if self.root.is_null() {
            return None;
        }
        let mut path = Path::new();
        self.descend_first(&mut path, self.root);
        Some(path)
    }

    pub(crate) fn last_path(&self) -> Option<Path> {
        if self.root.is_null() {
            return None;
        }
        let mut path = Path::new();
        self.descend_last(&mut path, self.root);
        Some(path)
    }
}
