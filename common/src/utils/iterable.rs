//! Sequence helpers.

use std::collections::HashSet;
use std::hash::Hash;

use crate::errors::{AppError, AppResult};

/// Removes duplicates, keeping the first occurrence of each item in order.
pub fn dedupe<T, I>(items: I) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    T: Eq + Hash + Clone,
{
    dedupe_by_key(items, T::clone)
}

/// Removes items whose key has already been seen, keeping order.
///
/// `dedupe_by_key(["three", "four", "apple", "moon"], |s| s.len())` keeps
/// `["three", "four"]`.
pub fn dedupe_by_key<T, K, I, F>(items: I, mut key: F) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key(item)))
        .collect()
}

/// Splits items into consecutive groups of `size`; the last group may be shorter.
///
/// # Errors
/// Returns `AppError::InvalidValue` if `size` is zero.
pub fn chunk<T, I>(items: I, size: usize) -> AppResult<Vec<Vec<T>>>
where
    I: IntoIterator<Item = T>,
{
    if size == 0 {
        return Err(AppError::InvalidValue("chunk size must be positive".into()));
    }
    let mut chunks = Vec::new();
    let mut current = Vec::with_capacity(size);
    for item in items {
        current.push(item);
        if current.len() == size {
            chunks.push(std::mem::replace(&mut current, Vec::with_capacity(size)));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    Ok(chunks)
}

/// Deals items round-robin into at most `k` groups.
///
/// Fewer than `k` items yield one group per item.
///
/// # Errors
/// Returns `AppError::InvalidValue` if `k` is zero.
pub fn partition<T, I>(items: I, k: usize) -> AppResult<Vec<Vec<T>>>
where
    I: IntoIterator<Item = T>,
{
    if k == 0 {
        return Err(AppError::InvalidValue("partition count must be positive".into()));
    }
    let mut groups: Vec<Vec<T>> = Vec::new();
    for (i, item) in items.into_iter().enumerate() {
        match groups.get_mut(i % k) {
            Some(group) => group.push(item),
            None => groups.push(vec![item]),
        }
    }
    Ok(groups)
}

/// Flattens one level of nesting.
pub fn flatten<T, I, J>(nested: I) -> Vec<T>
where
    I: IntoIterator<Item = J>,
    J: IntoIterator<Item = T>,
{
    nested.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_by_length() {
        let strings = ["three", "four", "apple", "moon"];
        assert_eq!(dedupe_by_key(strings, |s| s.len()), vec!["three", "four"]);
    }

    #[test]
    fn test_dedupe_defaults_to_identity() {
        let strings = vec!["three", "four", "three", "moon"];
        assert_eq!(dedupe(strings), vec!["three", "four", "moon"]);
    }

    #[test]
    fn test_dedupe_accepts_iterators() {
        let evens = (0..10).map(|n| n % 3);
        assert_eq!(dedupe(evens), vec![0, 1, 2]);
    }

    #[test]
    fn test_partition_4_into_2() {
        let strings = ["three", "four", "three", "moon"];
        assert_eq!(
            partition(strings, 2).unwrap(),
            vec![vec!["three", "three"], vec!["four", "moon"]]
        );
    }

    #[test]
    fn test_partition_7_into_3() {
        let strings = ["three", "four", "three", "moon", "apple", "gas", "rose"];
        assert_eq!(
            partition(strings, 3).unwrap(),
            vec![
                vec!["three", "moon", "rose"],
                vec!["four", "apple"],
                vec!["three", "gas"],
            ]
        );
    }

    #[test]
    fn test_partition_fewer_items_than_groups() {
        assert_eq!(partition([1, 2], 5).unwrap(), vec![vec![1], vec![2]]);
        assert!(partition([1], 0).is_err());
    }

    #[test]
    fn test_chunk_with_remainder() {
        let strings = ["three", "four", "three", "moon", "rose"];
        assert_eq!(
            chunk(strings, 3).unwrap(),
            vec![vec!["three", "four", "three"], vec!["moon", "rose"]]
        );
    }

    #[test]
    fn test_chunk_edge_cases() {
        assert!(chunk(Vec::<u8>::new(), 2).unwrap().is_empty());
        assert_eq!(chunk([1, 2], 2).unwrap(), vec![vec![1, 2]]);
        assert!(chunk([1], 0).is_err());
    }

    #[test]
    fn test_flatten_one_level() {
        let nested = vec![vec![1, 2], vec![], vec![3]];
        assert_eq!(flatten(nested), vec![1, 2, 3]);
    }
}
