use super::{Fanout, Node4, Node48};
use crate::arena::Ptr;
use crate::{NODE16_CAPACITY, NODE48_SHRINK_THRESHOLD};

/// Up to 16 children; sorted keys, binary searched.
#[derive(Clone)]
pub(crate) struct Node16 {
    len: u8,
    keys: [u8; NODE16_CAPACITY],
    children: [Ptr; NODE16_CAPACITY],
}

impl Node16 {
    pub(crate) fn new() -> Self {
        Self {
            len: 0,
            keys: [0; NODE16_CAPACITY],
            children: [Ptr::NULL; NODE16_CAPACITY],
        }
    }

    pub(crate) fn grown_from(node: &Node4) -> Self {
        assert!(node.is_full(), "Node4 still has capacity, cannot grow into Node16");
        let mut out = Self::new();
        let n = node.len();
        out.keys[..n].copy_from_slice(node.keys());
        out.children[..n].copy_from_slice(node.children());
        out.len = n as u8;
        out
    }

    /// The byte index of a Node48 is already ordered, so children are
    /// emitted in a single pass.
    pub(crate) fn shrunk_from(node: &Node48) -> Self {
        assert!(
            node.len() <= NODE48_SHRINK_THRESHOLD,
            "Node48 with {} children has not crossed its shrink threshold",
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

    fn keys(&self) -> &[u8] {
        &self.keys[..self.len as usize]
    }

    #[inline]
    fn position(&self, byte: u8) -> Result<usize, usize> {
        self.keys().binary_search(&byte)
    }
}

impl Fanout for Node16 {
    const CAPACITY: usize = NODE16_CAPACITY;

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
            Ok(_) => panic!(
                "partial key {byte:#04x} already present in Node16; use replace to swap the child"
            ),
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
            Err(_) => panic!("partial key {byte:#04x} not present in Node16"),
        }
    }

    fn remove(&mut self, byte: u8) -> Ptr {
        let at = match self.position(byte) {
            Ok(i) => i,
            Err(_) => panic!("partial key {byte:#04x} not present in Node16"),
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
        let n = self.len as usize;
        self.keys[..n]
            .iter()
            .copied()
            .zip(self.children[..n].iter().copied())
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
    fn binary_search_over_high_bytes() {
        let mut n = Node16::new();
        for b in [0x90u8, 0x10, 0xF0, 0x00, 0x7F, 0x80] {
            assert!(n.insert(b, leaf(b as u32)));
        }
        let order: Vec<u8> = n.entries().map(|(b, _)| b).collect();
        assert_eq!(order, vec![0x00, 0x10, 0x7F, 0x80, 0x90, 0xF0]);
        assert_eq!(n.find(0x80), Some(leaf(0x80)));
        assert_eq!(n.floor(0x81), Some((0x80, leaf(0x80))));
        assert_eq!(n.ceil(0x81), Some((0x90, leaf(0x90))));
        assert_eq!(n.ceil(0xF1), None);
    }

    #[test]
    fn grows_from_full_node4() {
        let mut small = Node4::new();
        for b in [4u8, 3, 2, 1] {
            small.insert(b, leaf(b as u32));
        }
        let n = Node16::grown_from(&small);
        assert_eq!(n.len(), 4);
        assert_eq!(n.keys(), &[1, 2, 3, 4]);
    }

    #[test]
    #[should_panic(expected = "still has capacity")]
    fn growing_non_full_node4_panics() {
        let mut small = Node4::new();
        small.insert(1, leaf(1));
        let _ = Node16::grown_from(&small);
    }

    #[test]
    fn fills_to_capacity() {
        let mut n = Node16::new();
        for b in 0..16u8 {
            assert!(n.insert(b * 3, leaf(b as u32)));
        }
        assert!(n.is_full());
        assert!(!n.insert(200, leaf(99)));
        assert_eq!(n.remove(0), leaf(0));
        assert_eq!(n.first(), Some((3, leaf(1))));
        assert_eq!(n.last(), Some((45, leaf(15))));
    }
}
