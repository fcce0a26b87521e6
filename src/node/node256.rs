use super::{Fanout, Node48};
use crate::arena::Ptr;
use crate::NODE256_CAPACITY;

/// Up to 256 children; direct indexing by byte.
#[derive(Clone)]
pub(crate) struct Node256 {
    len: u16,
    children: Box<[Ptr; NODE256_CAPACITY]>,
}

impl Node256 {
    pub(crate) fn grown_from(node: &Node48) -> Self {
        assert!(node.is_full(), "Node48 still has capacity, cannot grow into Node256");
        let mut children = Box::new([Ptr::NULL; NODE256_CAPACITY]);
        for (byte, child) in node.entries() {
            children[byte as usize] = child;
        }
        Self {
            len: node.len() as u16,
            children,
        }
    }

    #[inline]
    fn at(&self, byte: u8) -> Option<(u8, Ptr)> {
        let child = self.children[byte as usize];
        (!child.is_null()).then_some((byte, child))
    }
}

impl Fanout for Node256 {
    const CAPACITY: usize = NODE256_CAPACITY;

    #[inline]
    fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    fn find(&self, byte: u8) -> Option<Ptr> {
        self.at(byte).map(|(_, child)| child)
    }

    fn insert(&mut self, byte: u8, child: Ptr) -> bool {
        assert!(
            self.children[byte as usize].is_null(),
            "partial key {byte:#04x} already present in Node256"
        );
        self.children[byte as usize] = child;
        self.len += 1;
        true
    }

    fn replace(&mut self, byte: u8, child: Ptr) {
        let slot = &mut self.children[byte as usize];
        assert!(!slot.is_null(), "partial key {byte:#04x} not present in Node256");
        *slot = child;
    }

    fn remove(&mut self, byte: u8) -> Ptr {
        let removed = std::mem::replace(&mut self.children[byte as usize], Ptr::NULL);
        assert!(!removed.is_null(), "partial key {byte:#04x} not present in Node256");
        self.len -= 1;
        removed
    }

    fn first(&self) -> Option<(u8, Ptr)> {
        (0..=u8::MAX).find_map(|b| self.at(b))
    }

    fn last(&self) -> Option<(u8, Ptr)> {
        (0..=u8::MAX).rev().find_map(|b| self.at(b))
    }

    fn floor(&self, byte: u8) -> Option<(u8, Ptr)> {
        (0..=byte).rev().find_map(|b| self.at(b))
    }

    fn ceil(&self, byte: u8) -> Option<(u8, Ptr)> {
        (byte..=u8::MAX).find_map(|b| self.at(b))
    }

    fn entries(&self) -> impl Iterator<Item = (u8, Ptr)> + '_ {
        (0..=u8::MAX).filter_map(|b| self.at(b))
    }
}
