use super::{Fanout, Node16};
use crate::arena::Ptr;
use crate::{NODE16_SHRINK_THRESHOLD, NODE4_CAPACITY};

/// Up to 4 children; parallel key / child arrays kept sorted, scanned linearly.
#[derive(Clone)]
pub(crate) struct Node4 {
    len: u8,
    keys: [u8; NODE4_CAPACITY],
    children: [Ptr; NODE4_CAPACITY],
}

impl Node4 {
    pub(crate) fn new() -> Self {
        Self {
            len: 0,
            keys: [0; NODE4_CAPACITY],
            children: [Ptr::NULL; NODE4_CAPACITY],
        }
    }

    /// Builds a Node4 from a Node16 that dropped to its shrink threshold.
    pub(crate) fn shrunk_from(node: &Node16) -> Self {
        assert!(
            node.len() <= NODE16_SHRINK_THRESHOLD,
            "Node16 with {} children has not crossed its shrink threshold",
            node.len()
        );
        let mut out = Self::new();
        for (i, (byte, child)) in node.entries().enumerate() {
            out.keys[i] = byte;
            out.children[i] = child;
        }
        out.len = node.len() as u8;
        out
    }

    pub(crate) fn keys(&self) -> &[u8] {
        &self.keys[..self.len as usize]
    }

    pub(crate) fn children(&self) -> &[Ptr] {
        &self.children[..self.len as usize]
    }

    /// `Ok(i)` if `byte` sits at `i`, otherwise `Err(insertion point)`.
    #[inline]
    fn position(&self, byte: u8) -> Result<usize, usize> {
        for (i, &k) in self.keys().iter().enumerate() {
            if k == byte {
                return Ok(i);
            }
            if k > byte {
                return Err(i);
            }
        }
        Err(self.len as usize)
    }
}

impl Fanout for Node4 {
    const CAPACITY: usize = NODE4_CAPACITY;

    #[inline]
    fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    fn find(&self, byte: u8) -> Option<Ptr> {
        self.position(byte).ok().map(|i| self.children[i])
    }

    fn insert(&mut self, byte: u8, child: Ptr) -> bool {
        if self.is_full() {
            return false;
        }
        let at = match self.position(byte) {
            Ok(_) => panic!("partial key {byte:#04x} already present in Node4"),
            Err(at) => at,
        };
        let n = self.len as usize;
        self.keys.copy_within(at..n, at + 1);
        self.children.copy_within(at..n, at + 1);
        self.keys[at] = byte;
        self.children[at] = child;
        self.len += 1;
        true
    }

    fn replace(&mut self, byte: u8, child: Ptr) {
        match self.position(byte) {
            Ok(i) => self.children[i] = child,
            Err(_) => panic!("partial key {byte:#04x} not present in Node4"),
        }
    }

    fn remove(&mut self, byte: u8) -> Ptr {
        let at = match self.position(byte) {
            Ok(i) => i,
            Err(_) => panic!("partial key {byte:#04x} not present in Node4"),
        };
        let removed = self.children[at];
        let n = self.len as usize;
        self.keys.copy_within(at + 1..n, at);
        self.children.copy_within(at + 1..n, at);
        self.children[n - 1] = Ptr::NULL;
        self.len -= 1;
        removed
    }

    fn first(&self) -> Option<(u8, Ptr)> {
        (self.len > 0).then(|| (self.keys[0], self.children[0]))
    }

    fn last(&self) -> Option<(u8, Ptr)> {
        let n = self.len as usize;
        (n > 0).then(|| (self.keys[n - 1], self.children[n - 1]))
    }

    fn floor(&self, byte: u8) -> Option<(u8, Ptr)> {
        let i = match self.position(byte) {
            Ok(i) => i,
            Err(0) => return None,
            Err(at) => at - 1,
        };
        Some((self.keys[i], self.children[i]))
    }

    fn ceil(&self, byte: u8) -> Option<(u8, Ptr)> {
        let i = match self.position(byte) {
            Ok(i) | Err(i) => i,
        };
        (i < self.len as usize).then(|| (self.keys[i], self.children[i]))
    }

    fn entries(&self) -> impl Iterator<Item = (u8, Ptr)> + '_ {
        self.keys().iter().copied().zip(self.children().iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::{Handle, LeafId};

    fn leaf(i: u32) -> Ptr {
        Ptr::leaf(LeafId::from_index(i))
    }

    #[test]
    fn insert_keeps_unsigned_order() {
        let mut n = Node4::new();
        assert!(n.insert(0xFF, leaf(0)));
        assert!(n.insert(0x01, leaf(1)));
        assert!(n.insert(0x80, leaf(2)));
        assert!(n.insert(0x7F, leaf(3)));
        assert!(!n.insert(0x02, leaf(4)), "full node must refuse");
        assert_eq!(n.keys(), &[0x01, 0x7F, 0x80, 0xFF]);
        assert_eq!(n.find(0x80), Some(leaf(2)));
        assert_eq!(n.find(0x02), None);
    }

    #[test]
    fn floor_and_ceil() {
        let mut n = Node4::new();
        n.insert(10, leaf(0));
        n.insert(20, leaf(1));
        assert_eq!(n.floor(9), None);
        assert_eq!(n.floor(10), Some((10, leaf(0))));
        assert_eq!(n.floor(15), Some((10, leaf(0))));
        assert_eq!(n.floor(255), Some((20, leaf(1))));
        assert_eq!(n.ceil(0), Some((10, leaf(0))));
        assert_eq!(n.ceil(11), Some((20, leaf(1))));
        assert_eq!(n.ceil(21), None);
    }

    #[test]
    fn remove_compacts() {
        let mut n = Node4::new();
        n.insert(1, leaf(1));
        n.insert(2, leaf(2));
        n.insert(3, leaf(3));
        assert_eq!(n.remove(2), leaf(2));
        assert_eq!(n.keys(), &[1, 3]);
        assert_eq!(n.children(), &[leaf(1), leaf(3)]);
        assert_eq!(n.first(), Some((1, leaf(1))));
        assert_eq!(n.last(), Some((3, leaf(3))));
    }

    #[test]
    #[should_panic(expected = "not present")]
    fn remove_absent_panics() {
        let mut n = Node4::new();
        n.insert(1, leaf(1));
        n.remove(2);
    }

    #[test]
    #[should_panic(expected = "already present")]
    fn duplicate_insert_panics() {
        let mut n = Node4::new();
        n.insert(1, leaf(1));
        n.insert(1, leaf(2));
    }
}
