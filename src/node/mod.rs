//! ART node types with adaptive sizing.
//!
//! An inner node picks one of four layouts based on how many children it
//! actually has:
//!
//! - Node4: up to 4 children (linear scan over sorted keys)
//! - Node16: up to 16 children (binary search over sorted keys)
//! - Node48: up to 48 children (256-byte index + 48 child slots)
//! - Node256: up to 256 children (direct array indexing)
//!
//! Crossing a capacity boundary never resizes a node in place: `grow` and
//! `shrink` build a fresh [`InnerNode`] which the tree swaps into the
//! parent's slot.

mod node16;
mod node256;
mod node4;
mod node48;

use crate::arena::{Arena, InnerId, Ptr};
use crate::{
    NODE16_SHRINK_THRESHOLD, NODE256_SHRINK_THRESHOLD, NODE48_SHRINK_THRESHOLD, PREFIX_LIMIT,
};

pub(crate) use node16::Node16;
pub(crate) use node256::Node256;
pub(crate) use node4::Node4;
pub(crate) use node48::Node48;

/// Child-set capabilities shared by every capacity class.
///
/// Bytes are compared as unsigned values throughout.
pub(crate) trait Fanout {
    const CAPACITY: usize;

    fn len(&self) -> usize;

    #[inline]
    fn is_full(&self) -> bool {
        self.len() == Self::CAPACITY
    }

    fn find(&self, byte: u8) -> Option<Ptr>;

    /// Adds a child; returns `false` iff the node is full. Panics if `byte`
    /// already has a child.
    fn insert(&mut self, byte: u8, child: Ptr) -> bool;

    /// Panics if `byte` has no child.
    fn replace(&mut self, byte: u8, child: Ptr);

    /// Panics if `byte` has no child.
    fn remove(&mut self, byte: u8) -> Ptr;

    fn first(&self) -> Option<(u8, Ptr)>;

    fn last(&self) -> Option<(u8, Ptr)>;

    /// Greatest occupied byte `<= byte`.
    fn floor(&self, byte: u8) -> Option<(u8, Ptr)>;

    /// Least occupied byte `>= byte`.
    fn ceil(&self, byte: u8) -> Option<(u8, Ptr)>;

    /// Occupied slots in ascending byte order.
    fn entries(&self) -> impl Iterator<Item = (u8, Ptr)> + '_;
}

/// The capacity class of an inner node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Node4,
    Node16,
    Node48,
    Node256,
}

#[derive(Clone)]
pub(crate) enum Children {
    Node4(Node4),
    Node16(Node16),
    Node48(Node48),
    Node256(Node256),
}

macro_rules! dispatch {
    ($children:expr, $n:ident => $body:expr) => {
        match $children {
            Children::Node4($n) => $body,
            Children::Node16($n) => $body,
            Children::Node48($n) => $body,
            Children::Node256($n) => $body,
        }
    };
}

/// A key stored in the tree.
#[derive(Clone)]
pub(crate) struct Leaf<K, V> {
    /// Encoded key; the tree orders leaves by these bytes.
    pub(crate) bytes: Box<[u8]>,
    pub(crate) key: K,
    pub(crate) value: V,
}

/// An inner node: compressed path, optional embedded leaf and children.
#[derive(Clone)]
pub(crate) struct InnerNode {
    /// Total length of the compressed path. Only the first
    /// `min(prefix_len, PREFIX_LIMIT)` bytes are stored; the rest is
    /// optimistic and checked against the leftmost leaf when needed.
    pub(crate) prefix_len: u32,
    pub(crate) prefix: [u8; PREFIX_LIMIT],
    /// Leaf whose key ends exactly after this node's compressed path.
    pub(crate) leaf: Ptr,
    pub(crate) children: Children,
}

impl InnerNode {
    pub(crate) fn new() -> Self {
        Self {
            prefix_len: 0,
            prefix: [0; PREFIX_LIMIT],
            leaf: Ptr::NULL,
            children: Children::Node4(Node4::new()),
        }
    }

    /// Same compressed path and embedded leaf, different children.
    fn with_children(&self, children: Children) -> Self {
        Self {
            prefix_len: self.prefix_len,
            prefix: self.prefix,
            leaf: self.leaf,
            children,
        }
    }

    pub(crate) fn kind(&self) -> NodeKind {
        match self.children {
            Children::Node4(_) => NodeKind::Node4,
            Children::Node16(_) => NodeKind::Node16,
            Children::Node48(_) => NodeKind::Node48,
            Children::Node256(_) => NodeKind::Node256,
        }
    }

    // -------------------------------------------------------------------------
    // Compressed path
    // -------------------------------------------------------------------------

    #[inline]
    pub(crate) fn prefix_len(&self) -> usize {
        self.prefix_len as usize
    }

    /// The pessimistic (stored) part of the compressed path.
    #[inline]
    pub(crate) fn stored_prefix(&self) -> &[u8] {
        &self.prefix[..self.prefix_len().min(PREFIX_LIMIT)]
    }

    #[inline]
    pub(crate) fn is_optimistic(&self) -> bool {
        self.prefix_len() > PREFIX_LIMIT
    }

    /// Sets the compressed path to `len` bytes whose leading bytes are
    /// `source[..]`; `source` must hold at least `min(len, PREFIX_LIMIT)`
    /// bytes.
    pub(crate) fn set_prefix(&mut self, len: usize, source: &[u8]) {
        let stored = len.min(PREFIX_LIMIT);
        self.prefix[..stored].copy_from_slice(&source[..stored]);
        self.prefix_len = u32::try_from(len).expect("compressed path longer than u32::MAX");
    }

    // -------------------------------------------------------------------------
    // Embedded leaf
    // -------------------------------------------------------------------------

    #[inline]
    pub(crate) fn has_leaf(&self) -> bool {
        !self.leaf.is_null()
    }

    // -------------------------------------------------------------------------
    // Children
    // -------------------------------------------------------------------------

    /// Number of byte-indexed children (the embedded leaf is not counted).
    #[inline]
    pub(crate) fn len(&self) -> usize {
        dispatch!(&self.children, n => n.len())
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        dispatch!(&self.children, n => n.is_full())
    }

    #[inline]
    pub(crate) fn find_child(&self, byte: u8) -> Option<Ptr> {
        dispatch!(&self.children, n => n.find(byte))
    }

    /// Returns `false` iff the node is full; the caller grows it first.
    pub(crate) fn add_child(&mut self, byte: u8, child: Ptr) -> bool {
        dispatch!(&mut self.children, n => n.insert(byte, child))
    }

    pub(crate) fn replace_child(&mut self, byte: u8, child: Ptr) {
        dispatch!(&mut self.children, n => n.replace(byte, child))
    }

    pub(crate) fn remove_child(&mut self, byte: u8) -> Ptr {
        dispatch!(&mut self.children, n => n.remove(byte))
    }

    pub(crate) fn first_child(&self) -> Option<(u8, Ptr)> {
        dispatch!(&self.children, n => n.first())
    }

    pub(crate) fn last_child(&self) -> Option<(u8, Ptr)> {
        dispatch!(&self.children, n => n.last())
    }

    pub(crate) fn floor_child(&self, byte: u8) -> Option<(u8, Ptr)> {
        dispatch!(&self.children, n => n.floor(byte))
    }

    pub(crate) fn ceil_child(&self, byte: u8) -> Option<(u8, Ptr)> {
        dispatch!(&self.children, n => n.ceil(byte))
    }

    pub(crate) fn entries(&self) -> Vec<(u8, Ptr)> {
        dispatch!(&self.children, n => n.entries().collect())
    }

    /// Whether occupancy has dropped to the point where the next smaller
    /// class should take over.
    pub(crate) fn should_shrink(&self) -> bool {
        match &self.children {
            Children::Node4(_) => false,
            Children::Node16(n) => n.len() <= NODE16_SHRINK_THRESHOLD,
            Children::Node48(n) => n.len() <= NODE48_SHRINK_THRESHOLD,
            Children::Node256(n) => n.len() <= NODE256_SHRINK_THRESHOLD,
        }
    }

    /// Builds the next larger class. Panics unless this node is full.
    pub(crate) fn grow(&self) -> InnerNode {
        let children = match &self.children {
            Children::Node4(n) => Children::Node16(Node16::grown_from(n)),
            Children::Node16(n) => Children::Node48(Node48::grown_from(n)),
            Children::Node48(n) => Children::Node256(Node256::grown_from(n)),
            Children::Node256(_) => panic!("Node256 cannot grow"),
        };
        self.with_children(children)
    }

    /// Builds the next smaller class. Panics unless occupancy is at or below
    /// the shrink threshold.
    pub(crate) fn shrink(&self) -> InnerNode {
        let children = match &self.children {
            Children::Node4(_) => panic!("Node4 cannot shrink"),
            Children::Node16(n) => Children::Node4(Node4::shrunk_from(n)),
            Children::Node48(n) => Children::Node16(Node16::shrunk_from(n)),
            Children::Node256(n) => Children::Node48(Node48::shrunk_from(n)),
        };
        self.with_children(children)
    }

    // -------------------------------------------------------------------------
    // Slots (embedded leaf + byte children, in key order)
    // -------------------------------------------------------------------------

    /// The embedded leaf as a virtual slot, if present.
    #[inline]
    pub(crate) fn leaf_slot(&self) -> Option<Slot> {
        self.has_leaf().then_some(Slot::Leaf)
    }

    /// First occupied slot in key order.
    pub(crate) fn front(&self) -> Option<Slot> {
        self.leaf_slot()
            .or_else(|| self.first_child().map(|(b, _)| Slot::Byte(b)))
    }

    /// Last occupied slot in key order.
    pub(crate) fn rear(&self) -> Option<Slot> {
        self.last_child()
            .map(|(b, _)| Slot::Byte(b))
            .or_else(|| self.leaf_slot())
    }

    pub(crate) fn child_at(&self, slot: Slot) -> Ptr {
        match slot {
            Slot::Leaf => {
                assert!(self.has_leaf(), "no embedded leaf at this node");
                self.leaf
            }
            Slot::Byte(b) => self
                .find_child(b)
                .unwrap_or_else(|| panic!("partial key {b:#04x} not present")),
        }
    }

    /// Next occupied slot after `slot` in key order.
    pub(crate) fn slot_after(&self, slot: Slot) -> Option<Slot> {
        let next = match slot {
            Slot::Leaf => self.first_child(),
            Slot::Byte(u8::MAX) => None,
            Slot::Byte(b) => self.ceil_child(b + 1),
        };
        next.map(|(b, _)| Slot::Byte(b))
    }

    /// Previous occupied slot before `slot` in key order.
    pub(crate) fn slot_before(&self, slot: Slot) -> Option<Slot> {
        match slot {
            Slot::Leaf => None,
            Slot::Byte(0) => self.leaf_slot(),
            Slot::Byte(b) => self
                .floor_child(b - 1)
                .map(|(b, _)| Slot::Byte(b))
                .or_else(|| self.leaf_slot()),
        }
    }

    /// Unlinks whatever occupies `slot` and returns it.
    pub(crate) fn remove_slot(&mut self, slot: Slot) -> Ptr {
        match slot {
            Slot::Leaf => {
                assert!(self.has_leaf(), "no embedded leaf at this node");
                std::mem::replace(&mut self.leaf, Ptr::NULL)
            }
            Slot::Byte(b) => self.remove_child(b),
        }
    }

    pub(crate) fn set_slot(&mut self, slot: Slot, child: Ptr) {
        match slot {
            Slot::Leaf => {
                assert!(self.has_leaf(), "no embedded leaf at this node");
                self.leaf = child;
            }
            Slot::Byte(b) => self.replace_child(b, child),
        }
    }
}

/// A position within an inner node. The embedded leaf sorts before every
/// byte-indexed child, which the derived ordering encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Slot {
    Leaf,
    Byte(u8),
}

/// Handle to an occupied slot of one specific inner node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cursor {
    pub(crate) node: InnerId,
    pub(crate) slot: Slot,
}

impl Cursor {
    #[inline]
    pub(crate) fn new(node: InnerId, slot: Slot) -> Self {
        Self { node, slot }
    }

    #[inline]
    pub(crate) fn current(self, nodes: &Arena<InnerNode, InnerId>) -> Ptr {
        nodes[self.node].child_at(self.slot)
    }

    pub(crate) fn next(self, nodes: &Arena<InnerNode, InnerId>) -> Option<Cursor> {
        nodes[self.node]
            .slot_after(self.slot)
            .map(|slot| Cursor::new(self.node, slot))
    }

    pub(crate) fn prev(self, nodes: &Arena<InnerNode, InnerId>) -> Option<Cursor> {
        nodes[self.node]
            .slot_before(self.slot)
            .map(|slot| Cursor::new(self.node, slot))
    }

    pub(crate) fn remove(self, nodes: &mut Arena<InnerNode, InnerId>) -> Ptr {
        nodes[self.node].remove_slot(self.slot)
    }

    pub(crate) fn replace(self, nodes: &mut Arena<InnerNode, InnerId>, child: Ptr) {
        nodes[self.node].set_slot(self.slot, child)
    }
}
