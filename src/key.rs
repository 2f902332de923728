use alloc::string::{String, ToString};

/// A value usable as a map key.
///
/// Keys are coerced to strings before hashing: `str` and `String` are used
/// as-is, and the primitive integer types coerce through their decimal form
/// (so `&42` and `"42"` address the same entry). Lookups never fail on the
/// key type; coercion is total.
pub trait Key {
    /// The case-folded form of the key, used as its lookup identity.
    ///
    /// Folding is Unicode lowercasing and a no-op for digits.
    fn fold(&self) -> String;

    /// The key exactly as supplied, preserved on writes for reporting.
    fn original(&self) -> String;
}

impl Key for str {
    #[inline]
    fn fold(&self) -> String {
        self.to_lowercase()
    }

    #[inline]
    fn original(&self) -> String {
        String::from(self)
    }
}

impl Key for String {
    #[inline]
    fn fold(&self) -> String {
        self.as_str().to_lowercase()
    }

    #[inline]
    fn original(&self) -> String {
        self.clone()
    }
}

impl<K> Key for &K
where
    K: Key + ?Sized,
{
    #[inline]
    fn fold(&self) -> String {
        (**self).fold()
    }

    #[inline]
    fn original(&self) -> String {
        (**self).original()
    }
}

macro_rules! integer_key {
    ($($t:ty)*) => {$(
        impl Key for $t {
            #[inline]
            fn fold(&self) -> String {
                self.to_string()
            }

            #[inline]
            fn original(&self) -> String {
                self.to_string()
            }
        }
    )*};
}

integer_key!(u8 u16 u32 u64 u128 usize i8 i16 i32 i64 i128 isize);

/// Parses a folded key as a canonical non-negative decimal integer.
///
/// Only the exact decimal form counts: `"0"`, or digits without a leading
/// zero or sign. Anything else (`"042"`, `"+1"`, `"-1"`, `"1e3"`) is a plain
/// string key and does not influence the append counter.
pub(crate) fn auto_index_value(folded: &str) -> Option<u64> {
    if folded.is_empty() || !folded.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if folded.len() > 1 && folded.starts_with('0') {
        return None;
    }
    folded.parse().ok()
}
