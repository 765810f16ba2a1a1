//! Fixed-width big-endian determinant records.
//!
//! A record is `ceil(norb / 8)` bytes, most significant byte first:
//!
//! ```text
//!   norb = 16, ci = 200  →  [0x00, 0xC8]
//!   norb = 10, ci = 513  →  [0x02, 0x01]
//! ```

use crate::decoder::MAX_ORBITALS;
use crate::error::{SqdError, SqdResult};

/// Encoder/decoder for one orbital count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeterminantCodec {
    norb: usize,
    width: usize,
}

impl DeterminantCodec {
    /// Create a codec for `norb` orbitals (1..=64).
    pub fn new(norb: usize) -> SqdResult<Self> {
        if norb == 0 || norb > MAX_ORBITALS {
            return Err(SqdError::RangeViolation(format!(
                "norb = {norb} outside 1..={MAX_ORBITALS}"
            )));
        }
        Ok(Self {
            norb,
            width: norb.div_ceil(8),
        })
    }

    /// Orbital count.
    pub fn norb(&self) -> usize {
        self.norb
    }

    /// Bytes per record.
    pub fn record_width(&self) -> usize {
        self.width
    }

    /// Encode one CI string.
    ///
    /// Fails with [`SqdError::RangeViolation`] if `ci` needs more than
    /// `8 * record_width()` bits.
    pub fn encode(&self, ci: u64) -> SqdResult<Vec<u8>> {
        let mut record = Vec::with_capacity(self.width);
        self.encode_into(ci, &mut record)?;
        Ok(record)
    }

    /// Append the record for `ci` to `out`.
    pub fn encode_into(&self, ci: u64, out: &mut Vec<u8>) -> SqdResult<()> {
        let bits = self.width * 8;
        if bits < 64 && ci >> bits != 0 {
            return Err(SqdError::RangeViolation(format!(
                "CI string {ci} does not fit in {} byte(s)",
                self.width
            )));
        }
        out.extend_from_slice(&ci.to_be_bytes()[8 - self.width..]);
        Ok(())
    }

    /// Encode a sequence, preserving its order.
    pub fn encode_all(&self, cis: &[u64]) -> SqdResult<Vec<Vec<u8>>> {
        cis.iter().map(|&ci| self.encode(ci)).collect()
    }

    /// Parse one record.
    pub fn decode(&self, record: &[u8]) -> SqdResult<u64> {
        if record.len() != self.width {
            return Err(SqdError::Shape(format!(
                "record has {} byte(s), expected {}",
                record.len(),
                self.width
            )));
        }
        Ok(record
            .iter()
            .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte)))
    }
}
