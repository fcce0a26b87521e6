//! # art-map
//!
//! An ordered map over byte-comparable keys using an Adaptive Radix Tree (ART).
//!
//! Based on "The Adaptive Radix Tree: ARTful Indexing for Main-Memory
//! Databases" (ICDE 2013, Leis et al.)
//!
//! Keys are encoded to bytes by a [`KeyEncoder`] and the map is ordered by the
//! unsigned lexicographic order of those bytes. Inner nodes adapt between four
//! capacity classes, compress single-child chains into a (partly optimistic)
//! prefix, and hold the entry for a key that ends exactly at the node as an
//! embedded leaf, so keys may be byte prefixes of one another.
//!
//! ## Example
//!
//! ```rust
//! use art_map::{ArtMap, Bytes};
//!
//! let mut map = ArtMap::new(Bytes);
//! map.insert("BARCALONA".to_string(), 3)?;
//! map.insert("BAR".to_string(), 1)?;
//! map.insert("BARCA".to_string(), 2)?;
//!
//! assert_eq!(map.get("BARCA")?, Some(&2));
//! assert_eq!(map.floor_key("BARC")?.map(String::as_str), Some("BAR"));
//! assert_eq!(map.higher_key("BARCA")?.map(String::as_str), Some("BARCALONA"));
//!
//! let keys: Vec<&str> = map.keys().rev().map(String::as_str).collect();
//! assert_eq!(keys, ["BARCALONA", "BARCA", "BAR"]);
//! # Ok::<(), art_map::Error>(())
//! ```

mod arena;
mod debug;
mod encoding;
mod error;
mod iter;
mod map;
mod navigate;
mod node;
mod path;
mod tree;

pub use debug::NodeStats;
pub use encoding::{BigEndian, Bytes, Float, KeyEncoder};
pub use error::{Error, Result};
pub use iter::{Iter, Keys, Range, Values, Walker};
pub use map::ArtMap;

// =============================================================================
// Configuration
// =============================================================================

/// Compressed-path bytes stored inline in an inner node. Longer paths keep
/// only their length for the rest and are verified against a leaf.
pub(crate) const PREFIX_LIMIT: usize = 8;

pub(crate) const NODE4_CAPACITY: usize = 4;
pub(crate) const NODE16_CAPACITY: usize = 16;
pub(crate) const NODE48_CAPACITY: usize = 48;
pub(crate) const NODE256_CAPACITY: usize = 256;

// A node shrinks into the next smaller class once its child count drops to
// the threshold, leaving slack so that alternating insert/remove at a
// boundary does not rebuild the node every time.
pub(crate) const NODE16_SHRINK_THRESHOLD: usize = 3;
pub(crate) const NODE48_SHRINK_THRESHOLD: usize = 12;
pub(crate) const NODE256_SHRINK_THRESHOLD: usize = 37;


#[cfg(test)]
mod proptests;
