//! Ordered navigation: floor / lower / ceiling / higher.
//!
//! Each search walks down the tree recording the uplink chain. On the first
//! node that cannot contain the query exactly it either descends to the
//! nearest extreme of a neighbouring subtree, or steps the chain to the
//! predecessor / successor of everything it has visited.

use std::cmp::Ordering;

use crate::arena::{InnerId, Link, Ptr};
use crate::node::{Cursor, Slot};
use crate::path::Path;
use crate::tree::RawTree;
use crate::PREFIX_LIMIT;

impl<K, V> RawTree<K, V> {
    /// Orders the compressed path of `id` against the key bytes at `depth`.
    ///
    /// `Equal` means the key continues past the whole path. A key that runs
    /// out inside the path sorts before it, giving `Greater`.
    pub(crate) fn compare_path(&self, id: InnerId, key: &[u8], depth: usize) -> Ordering {
        let inner = &self.nodes[id];
        let stored = inner.stored_prefix();
        let end = key.len().min(depth + stored.len());
        let ord = stored.cmp(&key[depth..end]);
        if ord != Ordering::Equal || !inner.is_optimistic() {
            return ord;
        }
        let leaf = &self.leaves[self.first_leaf(Ptr::inner(id))].bytes;
        let (lo, hi) = (depth + PREFIX_LIMIT, depth + inner.prefix_len());
        leaf[lo..hi].cmp(&key[lo..key.len().min(hi)])
    }

    /// Greatest key `<= key` (`inclusive`) or `< key`.
    pub(crate) fn floor_path(&self, key: &[u8], inclusive: bool) -> Option<Path> {
        if self.root.is_null() {
            return None;
        }
        let mut path = Path::new();
        let mut node = self.root;
        let mut depth = 0;
        loop {
            let id = match node.resolve() {
                Link::Leaf(leaf) => {
                    let ord = key.cmp(&self.leaves[leaf].bytes);
                    if ord == Ordering::Greater || (inclusive && ord == Ordering::Equal) {
                        path.to = Some(leaf);
                        return Some(path);
                    }
                    return self.step_back(&mut path).then_some(path);
                }
                Link::Inner(id) => id,
            };

            match self.compare_path(id, key, depth) {
                Ordering::Less => {
                    self.descend_last(&mut path, node);
                    return Some(path);
                }
                Ordering::Greater => return self.step_back(&mut path).then_some(path),
                Ordering::Equal => {}
            }

            let inner = &self.nodes[id];
            depth += inner.prefix_len();
            if depth == key.len() {
                if inclusive && inner.has_leaf() {
                    path.steps.push(Cursor::new(id, Slot::Leaf));
                    path.to = Some(inner.leaf.leaf_id());
                    return Some(path);
                }
                return self.step_back(&mut path).then_some(path);
            }

            let byte = key[depth];
            match inner.floor_child(byte) {
                Some((found, child)) => {
                    path.steps.push(Cursor::new(id, Slot::Byte(found)));
                    if found != byte {
                        self.descend_last(&mut path, child);
                        return Some(path);
                    }
                    node = child;
                    depth += 1;
                }
                // Everything below this node is greater except the leaf
                // that ends here.
                None if inner.has_leaf() => {
                    path.steps.push(Cursor::new(id, Slot::Leaf));
                    path.to = Some(inner.leaf.leaf_id());
                    return Some(path);
                }
                None => return self.step_back(&mut path).then_some(path),
            }
        }
    }

    /// Least key `>= key` (`inclusive`) or `> key`.
    pub(crate) fn ceiling_path(&self, key: &[u8], inclusive: bool) -> Option<Path> {
        if self.root.is_null() {
            return None;
        }
        let mut path = Path::new();
        let mut node = self.root;
        let mut depth = 0;
        loop {
            let id = match node.resolve() {
                Link::Leaf(leaf) => {
                    let ord = key.cmp(&self.leaves[leaf].bytes);
                    if ord == Ordering::Less || (inclusive && ord == Ordering::Equal) {
                        path.to = Some(leaf);
                        return Some(path);
                    }
                    return self.step_forward(&mut path).then_some(path);
                }
                Link::Inner(id) => id,
            };

            match self.compare_path(id, key, depth) {
                Ordering::Greater => {
                    self.descend_first(&mut path, node);
                    return Some(path);
                }
                Ordering::Less => return self.step_forward(&mut path).then_some(path),
                Ordering::Equal => {}
            }

            let inner = &self.nodes[id];
            depth += inner.prefix_len();
            if depth == key.len() {
                // The embedded leaf equals the key; byte children exceed it.
                if inclusive {
                    self.descend_first(&mut path, node);
                    return Some(path);
                }
                return match inner.first_child() {
                    Some((found, child)) => {
                        path.steps.push(Cursor::new(id, Slot::Byte(found)));
                        self.descend_first(&mut path, child);
                        Some(path)
                    }
                    None => self.step_forward(&mut path).then_some(path),
                };
            }

            let byte = key[depth];
            match inner.ceil_child(byte) {
                Some((found, child)) => {
                    path.steps.push(Cursor::new(id, Slot::Byte(found)));
                    if found != byte {
                        self.descend_first(&mut path, child);
                        return Some(path);
                    }
                    node = child;
                    depth += 1;
                }
                None => return self.step_forward(&mut path).then_some(path),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::tree::RawTree;

    fn tree<T: AsRef<[u8]>>(keys: &[T]) -> RawTree<Vec<u8>, ()> {
        let mut t = RawTree::new();
        for k in keys {
            let k = k.as_ref();
            t.insert(k.into(), k.to_vec(), ());
        }
        t
    }

    fn floor(t: &RawTree<Vec<u8>, ()>, key: &[u8], inclusive: bool) -> Option<Vec<u8>> {
        t.floor_path(key, inclusive)
            .and_then(|p| p.to)
            .map(|id| t.leaf(id).key.clone())
    }

    fn ceiling(t: &RawTree<Vec<u8>, ()>, key: &[u8], inclusive: bool) -> Option<Vec<u8>> {
        t.ceiling_path(key, inclusive)
            .and_then(|p| p.to)
            .map(|id| t.leaf(id).key.clone())
    }

    fn s(v: &str) -> Option<Vec<u8>> {
        Some(v.as_bytes().to_vec())
    }

    #[test]
    fn navigation_around_embedded_leaves() {
        let t = tree(&["BAR", "BARCA", "BARCALONA", "BAZ"]);
        assert_eq!(floor(&t, b"BARC", true), s("BAR"));
        assert_eq!(floor(&t, b"BARCA", true), s("BARCA"));
        assert_eq!(floor(&t, b"BARCA", false), s("BAR"));
        assert_eq!(floor(&t, b"BARCAZ", true), s("BARCALONA"));
        assert_eq!(floor(&t, b"BA", true), None);
        assert_eq!(floor(&t, b"ZZZ", false), s("BAZ"));

        assert_eq!(ceiling(&t, b"BARC", true), s("BARCA"));
        assert_eq!(ceiling(&t, b"BARCA", true), s("BARCA"));
        assert_eq!(ceiling(&t, b"BARCA", false), s("BARCALONA"));
        assert_eq!(ceiling(&t, b"BARCALONA", false), s("BAZ"));
        assert_eq!(ceiling(&t, b"BAZ", false), None);
        assert_eq!(ceiling(&t, b"", false), s("BAR"));
        assert_eq!(ceiling(&t, b"BB", true), None);
    }

    #[test]
    fn key_ending_inside_a_compressed_path() {
        let t = tree(&["prefix-a", "prefix-b", "zzz"]);
        assert_eq!(ceiling(&t, b"pre", true), s("prefix-a"));
        assert_eq!(floor(&t, b"pre", true), None);
        assert_eq!(floor(&t, b"prefiy", true), s("prefix-b"));
        assert_eq!(ceiling(&t, b"prefiw", false), s("prefix-a"));
        assert_eq!(floor(&t, b"q", false), s("prefix-b"));
        assert_eq!(ceiling(&t, b"q", false), s("zzz"));
    }

    #[test]
    fn divergence_in_the_optimistic_remainder() {
        let mut a = vec![b'm'; 30];
        let mut b = a.clone();
        a.push(b'1');
        b.push(b'2');
        let t = tree(&[a.clone(), b.clone(), b"a".to_vec(), b"z".to_vec()]);

        let mut low = vec![b'm'; 30];
        low[20] = b'a';
        assert_eq!(floor(&t, &low, true), s("a"));
        assert_eq!(ceiling(&t, &low, true), Some(a.clone()));

        let mut high = vec![b'm'; 30];
        high[20] = b'q';
        assert_eq!(floor(&t, &high, true), Some(b.clone()));
        assert_eq!(ceiling(&t, &high, true), s("z"));

        let short = vec![b'm'; 25];
        assert_eq!(floor(&t, &short, true), s("a"));
        assert_eq!(ceiling(&t, &short, true), Some(a.clone()));
    }

    #[test]
    fn exact_and_strict_on_leaf_keys() {
        let t = tree(&["a", "b", "c"]);
        assert_eq!(floor(&t, b"b", true), s("b"));
        assert_eq!(floor(&t, b"b", false), s("a"));
        assert_eq!(ceiling(&t, b"b", true), s("b"));
        assert_eq!(ceiling(&t, b"b", false), s("c"));
        assert_eq!(floor(&t, b"a", false), None);
        assert_eq!(ceiling(&t, b"c", false), None);
        assert_eq!(floor(&t, b"bb", false), s("b"));
        assert_eq!(ceiling(&t, b"aa", true), s("b"));
    }

    #[test]
    fn empty_tree_has_no_neighbours() {
        let t = tree::<&str>(&[]);
        assert_eq!(floor(&t, b"x", true), None);
        assert_eq!(ceiling(&t, b"x", true), None);
    }

    #[test]
    fn single_leaf_root() {
        let t = tree(&["m"]);
        assert_eq!(floor(&t, b"n", false), s("m"));
        assert_eq!(floor(&t, b"l", true), None);
        assert_eq!(ceiling(&t, b"l", false), s("m"));
        assert_eq!(ceiling(&t, b"m", false), None);
    }
}
