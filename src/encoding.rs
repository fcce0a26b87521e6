//! Byte-comparable key encodings.
//!
//! The tree orders entries by the unsigned lexicographic order of encoded
//! bytes, so an encoder must be injective and order-preserving for the map
//! to behave like an ordered map over the application keys.

use crate::error::{Error, Result};

/// Converts application keys to bytes whose lexicographic order matches the
/// keys' order.
///
/// `Q` is the type looked up with; a map's encoder usually implements this
/// for the stored key type and for any borrowed forms of it (e.g. both
/// `String` and `str`).
///
/// Any `Fn(&Q) -> Result<Vec<u8>>` closure is an encoder:
///
/// ```
/// use art_map::{ArtMap, Error};
///
/// // Shorter strings first, then by bytes.
/// let by_len = |s: &String| -> art_map::Result<Vec<u8>> {
///     let len = u8::try_from(s.len()).map_err(|_| Error::Encoding("too long".into()))?;
///     let mut out = vec![len];
///     out.extend_from_slice(s.as_bytes());
///     Ok(out)
/// };
/// let mut map = ArtMap::new(by_len);
/// map.insert("ccc".to_string(), 3)?;
/// map.insert("a".to_string(), 1)?;
/// map.insert("zz".to_string(), 2)?;
/// let keys: Vec<_> = map.keys().collect();
/// assert_eq!(keys, ["a", "zz", "ccc"]);
/// assert!(map.insert("x".repeat(300), 0).is_err());
/// # Ok::<(), Error>(())
/// ```
pub trait KeyEncoder<Q: ?Sized> {
    fn encode(&self, key: &Q) -> Result<Vec<u8>>;
}

impl<Q: ?Sized, F> KeyEncoder<Q> for F
where
    F: Fn(&Q) -> Result<Vec<u8>>,
{
    #[inline]
    fn encode(&self, key: &Q) -> Result<Vec<u8>> {
        self(key)
    }
}

/// Keys that already are bytes: `Vec<u8>`, `[u8]`, `String`, `str`, ...
///
/// Strings order by their UTF-8 bytes, which matches `str`'s `Ord`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bytes;

impl<T: AsRef<[u8]> + ?Sized> KeyEncoder<T> for Bytes {
    #[inline]
    fn encode(&self, key: &T) -> Result<Vec<u8>> {
        Ok(key.as_ref().to_vec())
    }
}

/// Fixed-width big-endian encoding for integers. Signed values have their
/// sign bit flipped so negatives sort first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BigEndian;

macro_rules! big_endian_unsigned {
    ($($t:ty),*) => {
        $(
            impl KeyEncoder<$t> for BigEndian {
                #[inline]
                fn encode(&self, key: &$t) -> Result<Vec<u8>> {
                    Ok(key.to_be_bytes().to_vec())
                }
            }
        )*
    };
}

macro_rules! big_endian_signed {
    ($($t:ty => $u:ty),*) => {
        $(
            impl KeyEncoder<$t> for BigEndian {
                #[inline]
                fn encode(&self, key: &$t) -> Result<Vec<u8>> {
                    let flipped = (*key as $u) ^ (1 << (<$u>::BITS - 1));
                    Ok(flipped.to_be_bytes().to_vec())
                }
            }
        )*
    };
}

big_endian_unsigned!(u8, u16, u32, u64, u128, usize);
big_endian_signed!(i8 => u8, i16 => u16, i32 => u32, i64 => u64, i128 => u128, isize => usize);

/// Floats in IEEE total order (`-0.0` sorts before `0.0`). NaN has no place
/// in that order for an ordered map and is rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Float;

macro_rules! float_encoding {
    ($($t:ty => $u:ty),*) => {
        $(
            impl KeyEncoder<$t> for Float {
                fn encode(&self, key: &$t) -> Result<Vec<u8>> {
                    if key.is_nan() {
                        return Err(Error::Encoding(format!("NaN {} cannot be ordered", stringify!($t))));
                    }
                    let bits = key.to_bits();
                    let sign = 1 << (<$u>::BITS - 1);
                    let ordered = if bits & sign == 0 { bits ^ sign } else { !bits };
                    Ok(ordered.to_be_bytes().to_vec())
                }
            }
        )*
    };
}

float_encoding!(f32 => u32, f64 => u64);

#[cfg(test)]
mod tests {
    use super::*;

    fn ordered<T, E>(encoder: &E, values: &[T]) -> bool
    where
        E: KeyEncoder<T>,
    {
        let encoded: Vec<_> = values.iter().map(|v| encoder.encode(v).unwrap()).collect();
        encoded.windows(2).all(|w| w[0] < w[1])
    }

    #[test]
    fn signed_integers_sort_negatives_first() {
        assert!(ordered(&BigEndian, &[i32::MIN, -256, -1, 0, 1, 255, i32::MAX]));
        assert!(ordered(&BigEndian, &[i8::MIN, -1i8, 0, i8::MAX]));
        assert!(ordered(&BigEndian, &[i64::MIN, -1i64, 0, 1 << 40]));
        assert_eq!(BigEndian.encode(&0i16).unwrap(), vec![0x80, 0x00]);
    }

    #[test]
    fn unsigned_integers_are_plain_big_endian() {
        assert!(ordered(&BigEndian, &[0u32, 1, 255, 256, u32::MAX]));
        assert_eq!(BigEndian.encode(&0x0102u16).unwrap(), vec![1, 2]);
    }

    #[test]
    fn floats_follow_total_order() {
        assert!(ordered(
            &Float,
            &[f64::NEG_INFINITY, -1.5, -0.0, 0.0, f64::MIN_POSITIVE, 2.5, f64::INFINITY]
        ));
        assert!(ordered(&Float, &[-3.0f32, -1.0, 1.0, 3.0]));
        assert!(matches!(Float.encode(&f64::NAN), Err(Error::Encoding(_))));
    }

    #[test]
    fn bytes_and_strings_pass_through() {
        assert_eq!(Bytes.encode("héllo").unwrap(), "héllo".as_bytes());
        assert_eq!(Bytes.encode(&vec![0u8, 255]).unwrap(), vec![0, 255]);
        assert!(ordered(&Bytes, &["", "a", "ab", "b"]));
    }

    #[test]
    fn closures_are_encoders() {
        let reversed = |k: &u8| -> Result<Vec<u8>> { Ok(vec![!*k]) };
        assert!(ordered(&reversed, &[3u8, 2, 1]));
        let failing = |_: &u8| -> Result<Vec<u8>> { Err(Error::Encoding("nope".into())) };
        assert!(failing.encode(&1u8).is_err());
    }
}
