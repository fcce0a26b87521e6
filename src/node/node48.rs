use super::{Fanout, Node16, Node256};
use crate::arena::Ptr;
use crate::{NODE256_SHRINK_THRESHOLD, NODE48_CAPACITY};

const ABSENT: u8 = u8::MAX;

/// Up to 48 children; a 256-entry byte index points into the child slots.
#[derive(Clone)]
pub(crate) struct Node48 {
    len: u8,
    /// Index mapping bytes to child positions (`ABSENT` = empty).
    index: Box<[u8; 256]>,
    /// Child slots in no particular order; vacant slots hold `Ptr::NULL`.
    children: [Ptr; NODE48_CAPACITY],
}

impl Node48 {
    pub(crate) fn new() -> Self {
        Self {
            len: 0,
            index: Box::new([ABSENT; 256]),
            children: [Ptr::NULL; NODE48_CAPACITY],
        }
    }

    pub(crate) fn grown_from(node: &Node16) -> Self {
        assert!(node.is_full(), "Node16 still has capacity, cannot grow into Node48");
        let mut out = Self::new();
        for (i, (byte, child)) in node.entries().enumerate() {
            out.index[byte as usize] = i as u8;
            out.children[i] = child;
        }
        out.len = node.len() as u8;
        out
    }

    pub(crate) fn shrunk_from(node: &Node256) -> Self {
        assert!(
            node.len() <= NODE256_SHRINK_THRESHOLD,
            "Node256 with {} children has not crossed its shrink threshold",
            node.len()
        );
        let mut out = Self::new();
        for (i, (byte, child)) in node.entries().enumerate() {
            out.index[byte as usize] = i as u8;
            out.children[i] = child;
        }
        out.len = node.len() as u8;
        out
    }

    #[inline]
    fn slot(&self, byte: u8) -> Option<usize> {
        let i = self.index[byte as usize];
        (i != ABSENT).then_some(i as usize)
    }

    #[inline]
    fn at(&self, byte: u8) -> Option<(u8, Ptr)> {
        self.slot(byte).map(|i| (byte, self.children[i]))
    }
}

impl Fanout for Node48 {
    const CAPACITY: usize = NODE48_CAPACITY;

    #[inline]
    fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    fn find(&self, byte: u8) -> Option<Ptr> {
        self.slot(byte).map(|i| self.children[i])
    }

    fn insert(&mut self, byte: u8, child: Ptr) -> bool {
        if self.is_full() {
            return false;
        }
        assert!(
            self.slot(byte).is_none(),
            "partial key {byte:#04x} already present in Node48"
        );
        let free = self
            .children
            .iter()
            .position(|p| p.is_null())
            .expect("Node48 below capacity must have a vacant slot");
        self.children[free] = child;
        self.index[byte as usize] = free as u8;
        self.len += 1;
        true
    }

    fn replace(&mut self, byte: u8, child: Ptr) {
        match self.slot(byte) {
            Some(i) => self.children[i] = child,
            None => panic!("partial key {byte:#04x} not present in Node48"),
        }
    }

    fn remove(&mut self, byte: u8) -> Ptr {
        let i = match self.slot(byte) {
            Some(i) => i,
            None => panic!("partial key {byte:#04x} not present in Node48"),
        };
        let removed = std::mem::replace(&mut self.children[i], Ptr::NULL);
        self.index[byte as usize] = ABSENT;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::{Handle, LeafId};

    fn leaf(i: u32) -> Ptr {
        Ptr::leaf(LeafId::from_index(i))
    }

    fn full_node16(offset: u8) -> Node16 {
        let mut n = Node16::new();
        for b in 0..16u8 {
            n.insert(offset + b * 2, leaf(b as u32));
        }
        n
    }

    #[test]
    fn grows_from_node16_and_keeps_order() {
        let n = Node48::grown_from(&full_node16(100));
        assert_eq!(n.len(), 16);
        let bytes: Vec<u8> = n.entries().map(|(b, _)| b).collect();
        let expected: Vec<u8> = (0..16u8).map(|b| 100 + b * 2).collect();
        assert_eq!(bytes, expected);
        assert_eq!(n.floor(101), Some((100, leaf(0))));
        assert_eq!(n.ceil(101), Some((102, leaf(1))));
        assert_eq!(n.floor(99), None);
        assert_eq!(n.ceil(131), None);
    }

    #[test]
    fn removal_frees_slot_for_reuse() {
        let mut n = Node48::new();
        for b in 0..48u8 {
            assert!(n.insert(b, leaf(b as u32)));
        }
        assert!(!n.insert(200, leaf(200)));
        assert_eq!(n.remove(10), leaf(10));
        assert!(n.insert(200, leaf(200)));
        assert_eq!(n.find(200), Some(leaf(200)));
        assert_eq!(n.find(10), None);
        assert_eq!(n.last(), Some((200, leaf(200))));
    }

    #[test]
    fn shrinks_into_sorted_node16() {
        let mut n = Node48::new();
        for b in [250u8, 3, 128, 64, 7] {
            n.insert(b, leaf(b as u32));
        }
        let small = Node16::shrunk_from(&n);
        let bytes: Vec<u8> = small.entries().map(|(b, _)| b).collect();
        assert_eq!(bytes, vec![3, 7, 64, 128, 250]);
    }

    #[test]
    #[should_panic(expected = "shrink threshold")]
    fn shrinking_above_threshold_panics() {
        let n = Node48::grown_from(&full_node16(0));
        let _ = Node16::shrunk_from(&n);
    }
}
