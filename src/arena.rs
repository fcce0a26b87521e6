//! Slot arenas backing inner nodes and leaves.
//!
//! Nodes never point at their parents. Every link is a [`Ptr`] stored in
//! exactly one place (a parent's child slot, a parent's embedded-leaf slot,
//! or the tree root), so replacing a node is a single store of a new `Ptr`.

use std::ops::{Index, IndexMut};

// =============================================================================
// Pointer type
// =============================================================================

/// Tagged 32-bit link.
///
/// - Bit 31 = 1: leaf (index into the leaf arena)
/// - Bit 31 = 0: inner node (index into the inner arena)
/// - Special: `u32::MAX` = NULL
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Ptr(u32);

impl Ptr {
    const LEAF_BIT: u32 = 1u32 << 31;
    const INDEX_MASK: u32 = Self::LEAF_BIT - 1;
    pub(crate) const NULL: Ptr = Ptr(u32::MAX);

    #[inline]
    pub(crate) fn leaf(id: LeafId) -> Self {
        Self(id.0 | Self::LEAF_BIT)
    }

    #[inline]
    pub(crate) fn inner(id: InnerId) -> Self {
        Self(id.0)
    }

    #[inline]
    pub(crate) fn is_null(self) -> bool {
        self.0 == Self::NULL.0
    }

    #[inline]
    pub(crate) fn is_leaf(self) -> bool {
        !self.is_null() && (self.0 & Self::LEAF_BIT) != 0
    }

    #[inline]
    pub(crate) fn leaf_id(self) -> LeafId {
        debug_assert!(self.is_leaf());
        LeafId(self.0 & Self::INDEX_MASK)
    }

    #[inline]
    pub(crate) fn inner_id(self) -> InnerId {
        debug_assert!(!self.is_null() && !self.is_leaf());
        InnerId(self.0)
    }

    /// Splits a non-null link into its leaf or inner handle.
    #[inline]
    pub(crate) fn resolve(self) -> Link {
        if self.is_leaf() {
            Link::Leaf(self.leaf_id())
        } else {
            Link::Inner(self.inner_id())
        }
    }
}

impl std::fmt::Debug for Ptr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            f.write_str("Ptr(NULL)")
        } else if self.is_leaf() {
            write!(f, "Ptr(leaf {})", self.0 & Self::INDEX_MASK)
        } else {
            write!(f, "Ptr(inner {})", self.0)
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum Link {
    Leaf(LeafId),
    Inner(InnerId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct LeafId(u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct InnerId(u32);

/// Conversion between an arena index and its typed handle.
pub(crate) trait Handle: Copy {
    fn from_index(index: u32) -> Self;
    fn index(self) -> usize;
}

impl Handle for LeafId {
    #[inline]
    fn from_index(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl Handle for InnerId {
    #[inline]
    fn from_index(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

// =============================================================================
// Arena
// =============================================================================

/// Slot arena with a free list of vacated slots.
#[derive(Clone)]
pub(crate) struct Arena<T, H> {
    slots: Vec<Option<T>>,
    free: Vec<u32>,
    _handle: std::marker::PhantomData<H>,
}

impl<T, H: Handle> Arena<T, H> {
    /// Highest index a `Ptr` can address.
    const MAX_INDEX: usize = (Ptr::INDEX_MASK - 1) as usize;

    pub(crate) fn new() -> Self {
        Self::with_capacity(0)
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            _handle: std::marker::PhantomData,
        }
    }

    /// Number of occupied slots.
    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn alloc(&mut self, value: T) -> H {
        if let Some(index) = self.free.pop() {
            self.slots[index as usize] = Some(value);
            return H::from_index(index);
        }
        assert!(
            self.slots.len() <= Self::MAX_INDEX,
            "arena is at maximum capacity ({})",
            Self::MAX_INDEX + 1
        );
        self.slots.push(Some(value));
        H::from_index((self.slots.len() - 1) as u32)
    }

    /// Vacates a slot and returns what it held.
    pub(crate) fn take(&mut self, handle: H) -> T {
        let value = self.slots[handle.index()]
            .take()
            .expect("arena handle refers to a vacant slot");
        self.free.push(handle.index() as u32);
        value
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

impl<T, H: Handle> Index<H> for Arena<T, H> {
    type Output = T;

    #[inline]
    fn index(&self, handle: H) -> &T {
        self.slots[handle.index()]
            .as_ref()
            .expect("arena handle refers to a vacant slot")
    }
}

impl<T, H: Handle> IndexMut<H> for Arena<T, H> {
    #[inline]
    fn index_mut(&mut self, handle: H) -> &mut T {
        self.slots[handle.index()]
            .as_mut()
            .expect("arena handle refers to a vacant slot")
    }
}
