//! Bit matrix → CI strings.
//!
//! Each row yields one identifier per sector: bit `i` of sector A sets bit
//! `i` of the sector-A identifier, bit `i + norb` sets bit `i` of the
//! sector-B identifier. Accumulation uses integer shifts so every `norb`
//! up to 64 is exact.

use crate::bits::{BitMatrix, BitRow};
use crate::error::{SqdError, SqdResult};

/// Largest orbital count a 64-bit identifier can hold.
pub const MAX_ORBITALS: usize = u64::BITS as usize;

/// Per-row identifiers of both sectors, before deduplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorStrings {
    /// Orbitals per sector.
    pub norb: usize,
    /// Identifiers from bit indices `[0, norb)`, one per row.
    pub sector_a: Vec<u64>,
    /// Identifiers from bit indices `[norb, 2 * norb)`, one per row.
    pub sector_b: Vec<u64>,
}

impl SectorStrings {
    /// Number of decoded rows.
    pub fn len(&self) -> usize {
        self.sector_a.len()
    }

    /// Check if no rows were decoded.
    pub fn is_empty(&self) -> bool {
        self.sector_a.is_empty()
    }
}

/// Decodes sampled rows into CI strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitMatrixDecoder;

impl BitMatrixDecoder {
    /// Decode every row of `matrix`.
    ///
    /// Fails with [`SqdError::RangeViolation`] if a sector is wider than 64 bits.
    pub fn decode(&self, matrix: &BitMatrix) -> SqdResult<SectorStrings> {
        let norb = matrix.norb();
        if norb > MAX_ORBITALS {
            return Err(SqdError::RangeViolation(format!(
                "norb = {norb} exceeds the {MAX_ORBITALS}-bit identifier width"
            )));
        }

        let (sector_a, sector_b): (Vec<u64>, Vec<u64>) = matrix
            .rows()
            .map(|row| (sector_value(row, 0, norb), sector_value(row, norb, norb)))
            .unzip();

        Ok(SectorStrings {
            norb,
            sector_a,
            sector_b,
        })
    }
}

fn sector_value(row: &BitRow, offset: usize, norb: usize) -> u64 {
    (0..norb)
        .filter(|&i| row.get(offset + i))
        .fold(0u64, |acc, i| acc | (1u64 << i))
}
