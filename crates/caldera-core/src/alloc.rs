//! Optimized collection types for Caldera.
//!
//! Hash collections are re-exported with the AHash hasher, which is what
//! every engine crate should reach for instead of `std::collections`.

pub use ahash::{AHashMap as HashMap, AHashSet as HashSet, RandomState};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashmap_ahash() {
        let mut map = HashMap::new();
        map.insert("key", "value");
        assert_eq!(map.get("key"), Some(&"value"));
    }
}
