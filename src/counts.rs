//! Measurement counts from the sampling stage.
//!
//! Bitstring ordering: the rightmost character corresponds to bit 0
//! (OpenQASM 3 convention). For `2 * norb` bits, the right half of the
//! string is sector A and the left half is sector B.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::bits::{BitMatrix, BitRow};
use crate::error::SqdResult;

/// Maps sampled bitstrings to occurrence counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Counts {
    counts: FxHashMap<String, u64>,
}

impl Counts {
    /// Create empty counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create counts from (bitstring, count) pairs. Duplicates are summed.
    pub fn from_pairs(iter: impl IntoIterator<Item = (impl Into<String>, u64)>) -> Self {
        let mut counts = Self::new();
        for (k, v) in iter {
            counts.insert(k, v);
        }
        counts
    }

    /// Add `count` observations of `bitstring`.
    pub fn insert(&mut self, bitstring: impl Into<String>, count: u64) {
        *self.counts.entry(bitstring.into()).or_default() += count;
    }

    /// Count for a bitstring, zero if never observed.
    pub fn get(&self, bitstring: &str) -> u64 {
        self.counts.get(bitstring).copied().unwrap_or(0)
    }

    /// Total number of shots.
    pub fn total_shots(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Pairs sorted by count descending, ties broken by bitstring ascending.
    pub fn sorted(&self) -> Vec<(&String, &u64)> {
        let mut items: Vec<_> = self.counts.iter().collect();
        items.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        items
    }

    /// The `k` most frequent bitstrings, in [`sorted`](Self::sorted) order.
    pub fn most_frequent(&self, k: usize) -> Vec<&str> {
        self.sorted()
            .into_iter()
            .take(k)
            .map(|(s, _)| s.as_str())
            .collect()
    }

    /// Number of distinct bitstrings.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check if counts are empty.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// One row per distinct bitstring, most frequent first.
    pub fn to_bit_matrix(&self) -> SqdResult<BitMatrix> {
        self.to_bit_matrix_capped(usize::MAX)
    }

    /// Like [`to_bit_matrix`](Self::to_bit_matrix), keeping at most `cap` rows.
    pub fn to_bit_matrix_capped(&self, cap: usize) -> SqdResult<BitMatrix> {
        let rows = self
            .most_frequent(cap)
            .into_iter()
            .map(BitRow::from_bitstring)
            .collect::<SqdResult<Vec<_>>>()?;
        BitMatrix::new(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SqdError;

    #[test]
    fn test_counts_basic() {
        let mut counts = Counts::new();
        counts.insert("0011", 500);
        counts.insert("1100", 400);
        counts.insert("0011", 100);

        assert_eq!(counts.get("0011"), 600);
        assert_eq!(counts.get("1100"), 400);
        assert_eq!(counts.get("0101"), 0);
        assert_eq!(counts.total_shots(), 1000);
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_most_frequent_ties_are_stable() {
        let counts = Counts::from_pairs([("10", 5), ("01", 5), ("11", 9), ("00", 1)]);
        assert_eq!(counts.most_frequent(3), vec!["11", "01", "10"]);
        assert_eq!(counts.most_frequent(10).len(), 4);
    }

    #[test]
    fn test_to_bit_matrix() {
        let counts = Counts::from_pairs([("0110", 3), ("1001", 7)]);
        let matrix = counts.to_bit_matrix().unwrap();
        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix.norb(), 2);
        let first = matrix.rows().next().unwrap();
        assert_eq!(first.to_bitstring(), "1001");
    }

    #[test]
    fn test_to_bit_matrix_capped() {
        let counts = Counts::from_pairs([("0110", 3), ("1001", 7), ("0000", 1)]);
        assert_eq!(counts.to_bit_matrix_capped(2).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_counts_is_shape_error() {
        assert!(matches!(
            Counts::new().to_bit_matrix(),
            Err(SqdError::Shape(_))
        ));
    }
}
