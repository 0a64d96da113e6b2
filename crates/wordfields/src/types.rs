//! # Common Types

/// The integer type of numericalized indices.
///
/// Matches the `i64` ("long") dtype of the composed tensors.
pub type IndexType = i64;

cfg_if::cfg_if! {
    if #[cfg(feature = "ahash")] {
        /// Type Alias for hash maps in this crate.
        pub type WFHashMap<K, V> = ahash::AHashMap<K, V>;

        /// Create a new empty hash map.
        pub fn hash_map_new<K, V>() -> WFHashMap<K, V> {
            WFHashMap::new()
        }

        /// Create a new hash map with the given capacity.
        pub fn hash_map_with_capacity<K, V>(capacity: usize) -> WFHashMap<K, V> {
            WFHashMap::with_capacity(capacity)
        }

        /// Type Alias for hash sets in this crate.
        pub type WFHashSet<V> = ahash::AHashSet<V>;
    } else {
        /// Type Alias for hash maps in this crate.
        pub type WFHashMap<K, V> = std::collections::HashMap<K, V>;

        /// Create a new empty hash map.
        pub fn hash_map_new<K, V>() -> WFHashMap<K, V> {
            WFHashMap::new()
        }

        /// Create a new hash map with the given capacity.
        pub fn hash_map_with_capacity<K, V>(capacity: usize) -> WFHashMap<K, V> {
            WFHashMap::with_capacity(capacity)
        }

        /// Type Alias for hash sets in this crate.
        pub type WFHashSet<V> = std::collections::HashSet<V>;
    }
}

/// Convert a vocab position into an [`IndexType`].
///
/// Vocab sizes are bounded by memory, so this never truncates in practice.
#[inline(always)]
pub fn to_index(position: usize) -> IndexType {
    position as IndexType
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_map_aliases() {
        let mut map: WFHashMap<&str, usize> = hash_map_with_capacity(4);
        map.insert("a", 1);
        assert_eq!(map.get("a"), Some(&1));

        let empty: WFHashMap<u8, u8> = hash_map_new();
        assert!(empty.is_empty());

        let set: WFHashSet<u32> = [1, 2, 2].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_to_index() {
        assert_eq!(to_index(0), 0);
        assert_eq!(to_index(42), 42);
    }
}
