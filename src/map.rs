use std::fmt;
use std::ops::{Bound, RangeBounds};

use crate::encoding::KeyEncoder;
use crate::error::{Error, Result};
use crate::iter::{Iter, Keys, Range, Values, Walker};
use crate::path::Path;
use crate::tree::RawTree;

/// An ordered map backed by an adaptive radix tree.
///
/// Keys are turned into bytes by the encoder `E`; entries are ordered by the
/// unsigned lexicographic order of those bytes, so the encoder decides what
/// "ordered" means (see [`KeyEncoder`]). Every operation that takes a key
/// returns a [`Result`] because encoding may fail.
///
/// Lookups are generic over the query type `Q`: any type the encoder can
/// encode works, e.g. `&str` against a `String`-keyed map with
/// [`Bytes`](crate::Bytes).
#[derive(Clone)]
pub struct ArtMap<K, V, E> {
    pub(crate) tree: RawTree<K, V>,
    encoder: E,
}

impl<K, V, E> ArtMap<K, V, E> {
    pub fn new(encoder: E) -> Self {
        Self {
            tree: RawTree::new(),
            encoder,
        }
    }

    /// Pre-sizes storage for `capacity` entries.
    pub fn with_capacity(encoder: E, capacity: usize) -> Self {
        Self {
            tree: RawTree::with_capacity(capacity),
            encoder,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.len() == 0
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    fn encode<Q: ?Sized>(&self, key: &Q) -> Result<Vec<u8>>
    where
        E: KeyEncoder<Q>,
    {
        self.encoder.encode(key)
    }

    fn entry_at(&self, path: Option<Path>) -> Option<(&K, &V)> {
        let leaf = self.tree.leaf(path?.to?);
        Some((&leaf.key, &leaf.value))
    }

    // =========================================================================
    // Point operations
    // =========================================================================

    /// Inserts a key-value pair, returning the previous value if the key was
    /// present. An existing entry keeps its original key object.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>>
    where
        E: KeyEncoder<K>,
    {
        let bytes = self.encode(&key)?;
        Ok(self.tree.insert(bytes.into_boxed_slice(), key, value))
    }

    pub fn get<Q: ?Sized>(&self, key: &Q) -> Result<Option<&V>>
    where
        E: KeyEncoder<Q>,
    {
        Ok(self.get_key_value(key)?.map(|(_, v)| v))
    }

    pub fn get_key_value<Q: ?Sized>(&self, key: &Q) -> Result<Option<(&K, &V)>>
    where
        E: KeyEncoder<Q>,
    {
        let bytes = self.encode(key)?;
        Ok(self.tree.get(&bytes).map(|id| {
            let leaf = self.tree.leaf(id);
            (&leaf.key, &leaf.value)
        }))
    }

    pub fn get_mut<Q: ?Sized>(&mut self, key: &Q) -> Result<Option<&mut V>>
    where
        E: KeyEncoder<Q>,
    {
        let bytes = self.encode(key)?;
        Ok(match self.tree.get(&bytes) {
            Some(id) => Some(&mut self.tree.leaf_mut(id).value),
            None => None,
        })
    }

    pub fn contains_key<Q: ?Sized>(&self, key: &Q) -> Result<bool>
    where
        E: KeyEncoder<Q>,
    {
        let bytes = self.encode(key)?;
        Ok(self.tree.get(&bytes).is_some())
    }

    /// Linear scan over all values.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.values().any(|v| v == value)
    }

    pub fn remove<Q: ?Sized>(&mut self, key: &Q) -> Result<Option<V>>
    where
        E: KeyEncoder<Q>,
    {
        Ok(self.remove_entry(key)?.map(|(_, v)| v))
    }

    pub fn remove_entry<Q: ?Sized>(&mut self, key: &Q) -> Result<Option<(K, V)>>
    where
        E: KeyEncoder<Q>,
    {
        let bytes = self.encode(key)?;
        Ok(self.tree.remove(&bytes).map(|leaf| (leaf.key, leaf.value)))
    }

    // =========================================================================
    // Extremes
    // =========================================================================

    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.entry_at(self.tree.first_path())
    }

    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.entry_at(self.tree.last_path())
    }

    pub fn first_key(&self) -> Option<&K> {
        self.first_key_value().map(|(k, _)| k)
    }

    pub fn last_key(&self) -> Option<&K> {
        self.last_key_value().map(|(k, _)| k)
    }

    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let path = self.tree.first_path()?;
        let leaf = self.tree.remove_at(&path);
        Some((leaf.key, leaf.value))
    }

    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let path = self.tree.last_path()?;
        let leaf = self.tree.remove_at(&path);
        Some((leaf.key, leaf.value))
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Greatest entry strictly less than `key`.
    pub fn lower_key_value<Q: ?Sized>(&self, key: &Q) -> Result<Option<(&K, &V)>>
    where
        E: KeyEncoder<Q>,
    {
        let bytes = self.encode(key)?;
        Ok(self.entry_at(self.tree.floor_path(&bytes, false)))
    }

    /// Greatest entry less than or equal to `key`.
    pub fn floor_key_value<Q: ?Sized>(&self, key: &Q) -> Result<Option<(&K, &V)>>
    where
        E: KeyEncoder<Q>,
    {
        let bytes = self.encode(key)?;
        Ok(self.entry_at(self.tree.floor_path(&bytes, true)))
    }

    /// Least entry greater than or equal to `key`.
    pub fn ceiling_key_value<Q: ?Sized>(&self, key: &Q) -> Result<Option<(&K, &V)>>
    where
        E: KeyEncoder<Q>,
    {
        let bytes = self.encode(key)?;
        Ok(self.entry_at(self.tree.ceiling_path(&bytes, true)))
    }

    /// Least entry strictly greater than `key`.
    pub fn higher_key_value<Q: ?Sized>(&self, key: &Q) -> Result<Option<(&K, &V)>>
    where
        E: KeyEncoder<Q>,
    {
        let bytes = self.encode(key)?;
        Ok(self.entry_at(self.tree.ceiling_path(&bytes, false)))
    }

    pub fn lower_key<Q: ?Sized>(&self, key: &Q) -> Result<Option<&K>>
    where
        E: KeyEncoder<Q>,
    {
        Ok(self.lower_key_value(key)?.map(|(k, _)| k))
    }

    pub fn floor_key<Q: ?Sized>(&self, key: &Q) -> Result<Option<&K>>
    where
        E: KeyEncoder<Q>,
    {
        Ok(self.floor_key_value(key)?.map(|(k, _)| k))
    }

    pub fn ceiling_key<Q: ?Sized>(&self, key: &Q) -> Result<Option<&K>>
    where
        E: KeyEncoder<Q>,
    {
        Ok(self.ceiling_key_value(key)?.map(|(k, _)| k))
    }

    pub fn higher_key<Q: ?Sized>(&self, key: &Q) -> Result<Option<&K>>
    where
        E: KeyEncoder<Q>,
    {
        Ok(self.higher_key_value(key)?.map(|(k, _)| k))
    }

    // =========================================================================
    // Iteration
    // =========================================================================

    /// Entries in ascending key order; `.rev()` for descending.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.tree)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys(self.iter())
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values(self.iter())
    }

    /// Entries whose keys fall within `range`, in ascending order.
    ///
    /// Fails with [`Error::InvalidArgument`] if the start bound lies after
    /// the end bound. Bounds that meet without overlapping (e.g. `a..a`)
    /// yield an empty range.
    ///
    /// ```
    /// use std::ops::Bound;
    /// use art_map::{ArtMap, Bytes};
    ///
    /// let mut map = ArtMap::new(Bytes);
    /// for k in ["apple", "banana", "cherry", "date"] {
    ///     map.insert(k.to_string(), k.len())?;
    /// }
    /// let mid: Vec<_> = map
    ///     .range::<str, _>((Bound::Included("b"), Bound::Excluded("d")))?
    ///     .map(|(k, _)| k.as_str())
    ///     .collect();
    /// assert_eq!(mid, ["banana", "cherry"]);
    ///
    /// let tail: Vec<_> = map
    ///     .range::<str, _>((Bound::Excluded("banana"), Bound::Unbounded))?
    ///     .rev()
    ///     .map(|(k, _)| k.as_str())
    ///     .collect();
    /// assert_eq!(tail, ["date", "cherry"]);
    /// assert!(map.range::<str, _>((Bound::Included("z"), Bound::Included("a"))).is_err());
    /// # Ok::<(), art_map::Error>(())
    /// ```
    pub fn range<Q, R>(&self, range: R) -> Result<Range<'_, K, V>>
    where
        Q: ?Sized,
        R: RangeBounds<Q>,
        E: KeyEncoder<Q>,
    {
        let start = self.encode_bound(range.start_bound())?;
        let end = self.encode_bound(range.end_bound())?;
        if let (Bound::Included(s) | Bound::Excluded(s), Bound::Included(e) | Bound::Excluded(e)) =
            (&start, &end)
        {
            if s > e {
                return Err(Error::InvalidArgument(
                    "range start is greater than range end".to_string(),
                ));
            }
        }

        let front = match &start {
            Bound::Included(s) => self.tree.ceiling_path(s, true),
            Bound::Excluded(s) => self.tree.ceiling_path(s, false),
            Bound::Unbounded => self.tree.first_path(),
        };
        let back = match &end {
            Bound::Included(e) => self.tree.floor_path(e, true),
            Bound::Excluded(e) => self.tree.floor_path(e, false),
            Bound::Unbounded => self.tree.last_path(),
        };
        Ok(Range::new(&self.tree, front, back))
    }

    fn encode_bound<Q: ?Sized>(&self, bound: Bound<&Q>) -> Result<Bound<Vec<u8>>>
    where
        E: KeyEncoder<Q>,
    {
        Ok(match bound {
            Bound::Included(k) => Bound::Included(self.encode(k)?),
            Bound::Excluded(k) => Bound::Excluded(self.encode(k)?),
            Bound::Unbounded => Bound::Unbounded,
        })
    }

    /// A detached ascending cursor; see [`Walker`].
    pub fn walker(&self) -> Walker {
        Walker::ascending(&self.tree)
    }

    /// A detached descending cursor; see [`Walker`].
    pub fn walker_rev(&self) -> Walker {
        Walker::descending(&self.tree)
    }
}

impl<K, V, E: Default> Default for ArtMap<K, V, E> {
    fn default() -> Self {
        Self::new(E::default())
    }
}

impl<K: fmt::Debug, V: fmt::Debug, E> fmt::Debug for ArtMap<K, V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, E> IntoIterator for &'a ArtMap<K, V, E> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}
