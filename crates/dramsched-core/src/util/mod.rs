//! Utility functions and types used throughout dramsched.
//!
//! This module provides various helper types and traits including:
//! - [`GroupBy`] trait for order-preserving grouping of collections
//! - Constants for batch handling ([`DEFAULT_BATCH_SIZE`])
//! - Random number generation ([`Rng`])

mod constants;
mod rng;

pub use self::constants::*;
pub use self::rng::Rng;

use std::collections::HashMap;

/// Trait for grouping collection elements by a key function.
///
/// Similar to SQL's GROUP BY, but the groups come out in the order their keys were
/// first seen, and each group keeps its elements in their original order.
pub trait GroupBy<V> {
    /// Groups elements by the result of applying a function to each element.
    ///
    /// # Arguments
    ///
    /// * `f` - Function that extracts a grouping key from each element
    ///
    /// # Returns
    ///
    /// Returns `(key, elements)` pairs ordered by first occurrence of the key.
    fn group_by<K: std::hash::Hash + std::cmp::Eq + Clone, F: Fn(&V) -> K>(
        self,
        f: F,
    ) -> Vec<(K, Vec<V>)>;
}

impl<T, I: IntoIterator<Item = T>> GroupBy<T> for I {
    fn group_by<K: std::hash::Hash + std::cmp::Eq + Clone, F: Fn(&T) -> K>(
        self,
        f: F,
    ) -> Vec<(K, Vec<T>)> {
        let mut index = HashMap::new();
        let mut out: Vec<(K, Vec<T>)> = vec![];
        for elem in self {
            let k = f(&elem);
            let slot = *index.entry(k.clone()).or_insert_with(|| {
                out.push((k, vec![]));
                out.len() - 1
            });
            out[slot].1.push(elem);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::GroupBy;

    #[test]
    fn test_group_mod2() {
        let addrs = vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9];
        let groups = addrs.group_by(|x| x % 2);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], (0, vec![0, 2, 4, 6, 8]));
        assert_eq!(groups[1], (1, vec![1, 3, 5, 7, 9]));
    }

    #[test]
    fn test_group_first_seen_order() {
        let addrs = vec![3, 1, 3, 2, 1];
        let keys = addrs
            .group_by(|x| *x)
            .into_iter()
            .map(|(k, _)| k)
            .collect::<Vec<_>>();
        assert_eq!(keys, vec![3, 1, 2]);
    }

    #[test]
    fn test_group_prefix() {
        let addrs = vec!["banana", "apple", "blueberry", "apricot"];
        let groups = addrs.group_by(|x| &x[0..1]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], ("b", vec!["banana", "blueberry"]));
        assert_eq!(groups[1], ("a", vec!["apple", "apricot"]));
    }

    #[test]
    fn test_group_empty() {
        let groups = Vec::<u8>::new().group_by(|x| *x);
        assert!(groups.is_empty());
    }
}
