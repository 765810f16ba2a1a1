//! Property-based tests for decoding, unification and truncation.

use std::collections::BTreeSet;

use proptest::prelude::*;
use sqd_bridge::{
    BitMatrix, BitMatrixDecoder, BitRow, ConfigurationUnifier, ShellMode, TruncationPolicy,
};

/// Generate a bit matrix with 1-64 orbitals per sector and 1-40 rows.
fn arb_matrix() -> impl Strategy<Value = BitMatrix> {
    (1_usize..=64).prop_flat_map(|norb| {
        prop::collection::vec(prop::collection::vec(any::<bool>(), 2 * norb), 1..=40).prop_map(
            |rows| BitMatrix::new(rows.into_iter().map(BitRow::from_bits).collect()).unwrap(),
        )
    })
}

proptest! {
    #[test]
    fn decoded_values_fit_norb(matrix in arb_matrix()) {
        let strings = BitMatrixDecoder.decode(&matrix).unwrap();
        prop_assert_eq!(strings.len(), matrix.len());
        let norb = matrix.norb();
        for &ci in strings.sector_a.iter().chain(&strings.sector_b) {
            prop_assert!(norb == 64 || ci >> norb == 0);
        }
    }

    #[test]
    fn unified_sets_are_strictly_ascending(matrix in arb_matrix(), open in any::<bool>()) {
        let mode = if open { ShellMode::Open } else { ShellMode::Closed };
        let strings = BitMatrixDecoder.decode(&matrix).unwrap();
        let unified = ConfigurationUnifier::new(mode).unify(&strings).unwrap();
        prop_assert!(unified.sector_a().windows(2).all(|w| w[0] < w[1]));
        prop_assert!(unified.sector_b().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn closed_shell_is_union_of_sectors(matrix in arb_matrix()) {
        let strings = BitMatrixDecoder.decode(&matrix).unwrap();
        let unified = ConfigurationUnifier::new(ShellMode::Closed).unify(&strings).unwrap();

        let expected: BTreeSet<u64> = strings
            .sector_a
            .iter()
            .chain(&strings.sector_b)
            .copied()
            .collect();
        let expected: Vec<u64> = expected.into_iter().collect();
        prop_assert_eq!(unified.sector_a(), expected.as_slice());
        prop_assert_eq!(unified.sector_b(), expected.as_slice());
    }

    #[test]
    fn truncation_is_sorted_prefix(
        values in prop::collection::btree_set(any::<u64>(), 0..60),
        max_configs in 0_usize..80,
    ) {
        let sorted: Vec<u64> = values.into_iter().collect();
        let out = TruncationPolicy::new(max_configs).apply(sorted.clone());
        let kept = sorted.len().min(max_configs);
        prop_assert_eq!(&out.configs[..], &sorted[..kept]);
        prop_assert_eq!(out.discarded, sorted.len() - kept);
    }
}
