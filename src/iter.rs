//! Iteration over an [`ArtMap`](crate::ArtMap).
//!
//! The borrowing iterators hold a shared borrow of the map, so nothing can
//! restructure the tree under them. [`Walker`] is the detached alternative:
//! it owns its position, takes the map on every call, and detects structural
//! changes made behind its back through the map's modification counter.

use std::iter::FusedIterator;

use crate::error::{Error, Result};
use crate::map::ArtMap;
use crate::node::Leaf;
use crate::path::Path;
use crate::tree::RawTree;

// =============================================================================
// Span
// =============================================================================

/// Front and back positions of a double-ended walk. Both ends are inclusive;
/// the walk is over once they meet.
#[derive(Clone)]
struct Span {
    front: Option<Path>,
    back: Option<Path>,
}

impl Span {
    const EMPTY: Span = Span {
        front: None,
        back: None,
    };

    fn new<K, V>(tree: &RawTree<K, V>, front: Option<Path>, back: Option<Path>) -> Self {
        let (Some(front), Some(back)) = (front, back) else {
            return Self::EMPTY;
        };
        match (front.to, back.to) {
            (Some(lo), Some(hi)) if tree.leaf(lo).bytes <= tree.leaf(hi).bytes => Span {
                front: Some(front),
                back: Some(back),
            },
            _ => Self::EMPTY,
        }
    }

    fn whole<K, V>(tree: &RawTree<K, V>) -> Self {
        Self::new(tree, tree.first_path(), tree.last_path())
    }

    fn next_front<'a, K, V>(&mut self, tree: &'a RawTree<K, V>) -> Option<&'a Leaf<K, V>> {
        let front = self.front.as_mut()?;
        let id = front.to?;
        let met = self.back.as_ref().and_then(|b| b.to) == Some(id);
        if met || !tree.step_forward(front) {
            *self = Self::EMPTY;
        }
        Some(tree.leaf(id))
    }

    fn next_back<'a, K, V>(&mut self, tree: &'a RawTree<K, V>) -> Option<&'a Leaf<K, V>> {
        let back = self.back.as_mut()?;
        let id = back.to?;
        let met = self.front.as_ref().and_then(|f| f.to) == Some(id);
        if met || !tree.step_back(back) {
            *self = Self::EMPTY;
        }
        Some(tree.leaf(id))
    }
}

// =============================================================================
// Borrowing iterators
// =============================================================================

/// Entries in ascending key order. Created by [`ArtMap::iter`].
#[derive(Clone)]
pub struct Iter<'a, K, V> {
    tree: &'a RawTree<K, V>,
    span: Span,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(tree: &'a RawTree<K, V>) -> Self {
        Self {
            tree,
            span: Span::whole(tree),
            remaining: tree.len(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let leaf = self.span.next_front(self.tree)?;
        self.remaining -= 1;
        Some((&leaf.key, &leaf.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let leaf = self.span.next_back(self.tree)?;
        self.remaining -= 1;
        Some((&leaf.key, &leaf.value))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Keys in ascending order. Created by [`ArtMap::keys`].
#[derive(Clone)]
pub struct Keys<'a, K, V>(pub(crate) Iter<'a, K, V>);

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.0.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// Values in ascending key order. Created by [`ArtMap::values`].
#[derive(Clone)]
pub struct Values<'a, K, V>(pub(crate) Iter<'a, K, V>);

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.0.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

/// Entries within a key interval. Created by [`ArtMap::range`].
#[derive(Clone)]
pub struct Range<'a, K, V> {
    tree: &'a RawTree<K, V>,
    span: Span,
}

impl<'a, K, V> Range<'a, K, V> {
    /// `front` / `back` are the first and last entries inside the interval.
    pub(crate) fn new(tree: &'a RawTree<K, V>, front: Option<Path>, back: Option<Path>) -> Self {
        Self {
            tree,
            span: Span::new(tree, front, back),
        }
    }
}

impl<'a, K, V> Iterator for Range<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let leaf = self.span.next_front(self.tree)?;
        Some((&leaf.key, &leaf.value))
    }
}

impl<K, V> DoubleEndedIterator for Range<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let leaf = self.span.next_back(self.tree)?;
        Some((&leaf.key, &leaf.value))
    }
}

impl<K, V> FusedIterator for Range<'_, K, V> {}

// =============================================================================
// Walker
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Ascending,
    Descending,
}

/// Detached cursor over a map that tolerates its own removals.
///
/// A `Walker` does not borrow the map between calls. Any structural change
/// (insertion of a new key, removal, `clear`) made other than through
/// [`Walker::remove`] makes every later call fail with
/// [`Error::ConcurrentModification`]. Replacing the value of an existing key
/// is not structural.
///
/// ```
/// use art_map::{ArtMap, BigEndian};
///
/// let mut map = ArtMap::new(BigEndian);
/// for i in 0..10u32 {
///     map.insert(i, i * i)?;
/// }
/// let mut walker = map.walker();
/// while let Some((k, _)) = walker.next(&map)? {
///     if k % 2 == 1 {
///         walker.remove(&mut map)?;
///     }
/// }
/// assert_eq!(map.keys().copied().collect::<Vec<_>>(), [0, 2, 4, 6, 8]);
/// # Ok::<(), art_map::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Walker {
    upcoming: Option<Path>,
    direction: Direction,
    expected_mod_count: u64,
    /// Encoded key of the entry last returned by `next`.
    current: Option<Box<[u8]>>,
}

impl Walker {
    pub(crate) fn ascending<K, V>(tree: &RawTree<K, V>) -> Self {
        Self::starting_at(tree, tree.first_path(), Direction::Ascending)
    }

    pub(crate) fn descending<K, V>(tree: &RawTree<K, V>) -> Self {
        Self::starting_at(tree, tree.last_path(), Direction::Descending)
    }

    fn starting_at<K, V>(tree: &RawTree<K, V>, upcoming: Option<Path>, direction: Direction) -> Self {
        Self {
            upcoming,
            direction,
            expected_mod_count: tree.mod_count(),
            current: None,
        }
    }

    fn check<K, V>(&self, tree: &RawTree<K, V>) -> Result<()> {
        if tree.mod_count() != self.expected_mod_count {
            return Err(Error::ConcurrentModification);
        }
        Ok(())
    }

    /// Advances to the next entry in the walker's direction.
    pub fn next<'a, K, V, E>(&mut self, map: &'a ArtMap<K, V, E>) -> Result<Option<(&'a K, &'a V)>> {
        let tree = &map.tree;
        self.check(tree)?;
        let Some(path) = self.upcoming.as_mut() else {
            return Ok(None);
        };
        let id = path.to.expect("walker path leads to a leaf");
        let more = match self.direction {
            Direction::Ascending => tree.step_forward(path),
            Direction::Descending => tree.step_back(path),
        };
        if !more {
            self.upcoming = None;
        }
        let leaf = tree.leaf(id);
        self.current = Some(leaf.bytes.clone());
        Ok(Some((&leaf.key, &leaf.value)))
    }

    /// Removes the entry most recently returned by [`next`](Self::next).
    ///
    /// The walker stays valid and continues with the entry after the
    /// removed one.
    pub fn remove<K, V, E>(&mut self, map: &mut ArtMap<K, V, E>) -> Result<(K, V)> {
        let tree = &mut map.tree;
        self.check(tree)?;
        let current = self.current.take().ok_or_else(|| {
            Error::InvalidArgument("walker has no current entry to remove".to_string())
        })?;
        let upcoming = self
            .upcoming
            .as_ref()
            .and_then(|p| p.to)
            .map(|id| tree.leaf(id).bytes.clone());
        let removed = tree
            .remove(&current)
            .expect("current entry is present while the map is unmodified");
        // The removal may have rebuilt nodes on the upcoming entry's path.
        self.upcoming = upcoming.and_then(|bytes| tree.find_path(&bytes));
        self.expected_mod_count = tree.mod_count();
        Ok((removed.key, removed.value))
    }
}
