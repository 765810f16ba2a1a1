//! Deduplication, sector merging and Hartree–Fock seeding.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::decoder::{MAX_ORBITALS, SectorStrings};
use crate::error::{SqdError, SqdResult};

/// Whether both sectors share one determinant alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShellMode {
    /// Sectors are unioned into a single set.
    #[default]
    Closed,
    /// Each sector keeps its own set.
    Open,
}

/// The Hartree–Fock reference `(1 << num_elec) - 1`.
pub fn hartree_fock_reference(num_elec: usize) -> SqdResult<u64> {
    match num_elec {
        n if n < MAX_ORBITALS => Ok((1u64 << n) - 1),
        MAX_ORBITALS => Ok(u64::MAX),
        n => Err(SqdError::RangeViolation(format!(
            "num_elec = {n} exceeds the {MAX_ORBITALS}-bit identifier width"
        ))),
    }
}

/// Sorted, duplicate-free configuration sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnifiedConfigurations {
    /// One set shared by both sectors.
    Closed(Vec<u64>),
    /// One set per sector.
    Open {
        /// Sector-A identifiers.
        sector_a: Vec<u64>,
        /// Sector-B identifiers.
        sector_b: Vec<u64>,
    },
}

impl UnifiedConfigurations {
    /// Sector-A set (the shared set in closed-shell mode).
    pub fn sector_a(&self) -> &[u64] {
        match self {
            Self::Closed(set) => set,
            Self::Open { sector_a, .. } => sector_a,
        }
    }

    /// Sector-B set (the shared set in closed-shell mode).
    pub fn sector_b(&self) -> &[u64] {
        match self {
            Self::Closed(set) => set,
            Self::Open { sector_b, .. } => sector_b,
        }
    }

    /// Shell mode that produced these sets.
    pub fn mode(&self) -> ShellMode {
        match self {
            Self::Closed(_) => ShellMode::Closed,
            Self::Open { .. } => ShellMode::Open,
        }
    }
}

/// Turns per-row identifiers into unique configuration sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigurationUnifier {
    mode: ShellMode,
    hf_electrons: Option<usize>,
}

impl ConfigurationUnifier {
    /// Create a unifier for the given shell mode, without seeding.
    pub fn new(mode: ShellMode) -> Self {
        Self {
            mode,
            hf_electrons: None,
        }
    }

    /// Seed every output set with the reference for `num_elec` electrons.
    ///
    /// [`unify`](Self::unify) fails with [`SqdError::RangeViolation`] if
    /// `num_elec` exceeds the sector's `norb` (the reference would set bits
    /// outside the sector) or 64.
    pub fn with_hartree_fock(mut self, num_elec: usize) -> Self {
        self.hf_electrons = Some(num_elec);
        self
    }

    /// Deduplicate, merge and seed.
    pub fn unify(&self, strings: &SectorStrings) -> SqdResult<UnifiedConfigurations> {
        let reference = self
            .hf_electrons
            .map(|num_elec| {
                if num_elec > strings.norb {
                    return Err(SqdError::RangeViolation(format!(
                        "num_elec = {num_elec} exceeds norb = {}",
                        strings.norb
                    )));
                }
                hartree_fock_reference(num_elec)
            })
            .transpose()?;

        let mut sector_a: BTreeSet<u64> = strings.sector_a.iter().copied().collect();
        let mut sector_b: BTreeSet<u64> = strings.sector_b.iter().copied().collect();

        if self.mode == ShellMode::Closed {
            sector_a.append(&mut sector_b);
            sector_a.extend(reference);
            return Ok(UnifiedConfigurations::Closed(sector_a.into_iter().collect()));
        }

        sector_a.extend(reference);
        sector_b.extend(reference);
        Ok(UnifiedConfigurations::Open {
            sector_a: sector_a.into_iter().collect(),
            sector_b: sector_b.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(norb: usize, a: &[u64], b: &[u64]) -> SectorStrings {
        SectorStrings {
            norb,
            sector_a: a.to_vec(),
            sector_b: b.to_vec(),
        }
    }

    #[test]
    fn test_reference_values() {
        assert_eq!(hartree_fock_reference(0).unwrap(), 0);
        assert_eq!(hartree_fock_reference(4).unwrap(), 15);
        assert_eq!(hartree_fock_reference(63).unwrap(), u64::MAX >> 1);
        assert_eq!(hartree_fock_reference(64).unwrap(), u64::MAX);
        assert!(matches!(
            hartree_fock_reference(65),
            Err(SqdError::RangeViolation(_))
        ));
    }

    #[test]
    fn test_closed_shell_union() {
        let unified = ConfigurationUnifier::new(ShellMode::Closed)
            .unify(&strings(2, &[3, 1, 3], &[3, 2, 2]))
            .unwrap();
        assert_eq!(unified, UnifiedConfigurations::Closed(vec![1, 2, 3]));
        assert_eq!(unified.sector_a(), unified.sector_b());
    }

    #[test]
    fn test_open_shell_keeps_sectors_apart() {
        let unified = ConfigurationUnifier::new(ShellMode::Open)
            .unify(&strings(2, &[3, 1, 3], &[2, 2]))
            .unwrap();
        assert_eq!(unified.sector_a(), &[1, 3]);
        assert_eq!(unified.sector_b(), &[2]);
        assert_eq!(unified.mode(), ShellMode::Open);
    }

    #[test]
    fn test_hartree_fock_seeding() {
        let unified = ConfigurationUnifier::new(ShellMode::Closed)
            .with_hartree_fock(4)
            .unify(&strings(6, &[48, 3], &[5]))
            .unwrap();
        assert_eq!(unified.sector_a(), &[3, 5, 15, 48]);
    }

    #[test]
    fn test_hartree_fock_seeding_open_shell() {
        let unified = ConfigurationUnifier::new(ShellMode::Open)
            .with_hartree_fock(2)
            .unify(&strings(4, &[5], &[9, 3]))
            .unwrap();
        assert_eq!(unified.sector_a(), &[3, 5]);
        assert_eq!(unified.sector_b(), &[3, 9]);
    }

    #[test]
    fn test_seeding_rejects_too_many_electrons() {
        let err = ConfigurationUnifier::new(ShellMode::Closed)
            .with_hartree_fock(5)
            .unify(&strings(4, &[1], &[1]))
            .unwrap_err();
        assert!(matches!(err, SqdError::RangeViolation(_)));
    }
}
