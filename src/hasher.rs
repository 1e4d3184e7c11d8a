//! Slot placement hashing.
//!
//! The default hash is a djb2 variant: multiplier 33, seeded at 0 instead of
//! the usual 5381, folded over the key's bytes. The accumulator is a `u64`
//! and wraps on overflow.

/// Hashes a string key to the integer used for slot placement.
///
/// Implementations must be deterministic: a table computes the slot for a key
/// on every operation and never stores the hash.
pub trait KeyHasher {
    fn hash_key(&self, key: &str) -> u64;
}

/// The default [`KeyHasher`], see [`djb2`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Djb2;

impl KeyHasher for Djb2 {
    #[inline]
    fn hash_key(&self, key: &str) -> u64 {
        djb2(key)
    }
}

/// `value = value * 33 + byte` for each byte left to right, starting at 0.
#[inline]
pub fn djb2(key: &str) -> u64 {
    key.bytes()
        .fold(0u64, |acc, b| acc.wrapping_mul(33).wrapping_add(u64::from(b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_hashes_to_seed() {
        assert_eq!(djb2(""), 0);
    }

    #[test]
    fn reference_values() {
        assert_eq!(djb2("a"), 97);
        assert_eq!(djb2("ab"), 97 * 33 + 98);
        assert_eq!(djb2("abc"), (97 * 33 + 98) * 33 + 99);
    }

    /// Long keys overflow 64 bits; the result must still be deterministic.
    #[test]
    fn long_keys_wrap_deterministically() {
        let key = "x".repeat(512);
        assert_eq!(djb2(&key), djb2(&key.clone()));
        assert_ne!(djb2(&key), djb2(&key[1..]));
    }

    #[test]
    fn non_ascii_bytes_are_unsigned() {
        // "é" is 0xC3 0xA9 in UTF-8.
        assert_eq!(djb2("é"), 0xC3 * 33 + 0xA9);
        assert_eq!(Djb2.hash_key("é"), djb2("é"));
    }
}
