//! Sampled bit vectors.
//!
//! A [`BitRow`] holds `2 * norb` bits: sector A at indices `[0, norb)` and
//! sector B at `[norb, 2 * norb)`. Textual bitstrings follow the OpenQASM 3
//! convention, so the rightmost character is bit 0:
//!
//! ```text
//!   "1001"  →  bit 0 = 1, bit 1 = 0, bit 2 = 0, bit 3 = 1
//!   norb = 2:  sector A = "01" (right half), sector B = "10" (left half)
//! ```

use crate::error::{SqdError, SqdResult};

/// One sampled configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BitRow {
    bits: Vec<bool>,
}

impl BitRow {
    /// Build a row from bits in index order (element 0 is bit 0).
    pub fn from_bits(bits: impl IntoIterator<Item = bool>) -> Self {
        Self {
            bits: bits.into_iter().collect(),
        }
    }

    /// Build a row with the given bit indices set.
    pub fn with_set_bits(len: usize, set: &[usize]) -> SqdResult<Self> {
        let mut bits = vec![false; len];
        for &i in set {
            let bit = bits.get_mut(i).ok_or_else(|| {
                SqdError::Shape(format!("bit index {i} outside row of length {len}"))
            })?;
            *bit = true;
        }
        Ok(Self { bits })
    }

    /// Parse a `0`/`1` string, rightmost character first.
    pub fn from_bitstring(s: &str) -> SqdResult<Self> {
        s.chars()
            .rev()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(SqdError::Shape(format!(
                    "invalid character {other:?} in bitstring {s:?}"
                ))),
            })
            .collect::<SqdResult<Vec<_>>>()
            .map(|bits| Self { bits })
    }

    /// Render back to OpenQASM order.
    pub fn to_bitstring(&self) -> String {
        self.bits
            .iter()
            .rev()
            .map(|&b| if b { '1' } else { '0' })
            .collect()
    }

    /// Number of bits.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Check if the row has no bits.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Value of bit `i`; out-of-range bits read as unset.
    pub fn get(&self, i: usize) -> bool {
        self.bits.get(i).copied().unwrap_or(false)
    }
}

/// Rows of identical width from one sampling batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMatrix {
    rows: Vec<BitRow>,
    width: usize,
}

impl BitMatrix {
    /// Validate and wrap a set of rows.
    ///
    /// Fails with [`SqdError::Shape`] if there are no rows, if the rows
    /// differ in length, or if the width is zero or odd.
    pub fn new(rows: Vec<BitRow>) -> SqdResult<Self> {
        let width = rows
            .first()
            .map(BitRow::len)
            .ok_or_else(|| SqdError::Shape("bit matrix has no rows".into()))?;

        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(SqdError::Shape(format!(
                "row {idx} has {} bits, expected {width}",
                row.len()
            )));
        }
        if width == 0 || width % 2 != 0 {
            return Err(SqdError::Shape(format!(
                "row width {width} cannot be split into two equal sectors"
            )));
        }

        Ok(Self { rows, width })
    }

    /// Parse every string as a row.
    pub fn from_bitstrings<S: AsRef<str>>(strings: impl IntoIterator<Item = S>) -> SqdResult<Self> {
        let rows = strings
            .into_iter()
            .map(|s| BitRow::from_bitstring(s.as_ref()))
            .collect::<SqdResult<Vec<_>>>()?;
        Self::new(rows)
    }

    /// Orbitals per sector.
    pub fn norb(&self) -> usize {
        self.width / 2
    }

    /// Bits per row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always `false` for a constructed matrix.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over the rows.
    pub fn rows(&self) -> impl Iterator<Item = &BitRow> {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitstring_is_read_right_to_left() {
        let row = BitRow::from_bitstring("1001").unwrap();
        assert!(row.get(0));
        assert!(!row.get(1));
        assert!(!row.get(2));
        assert!(row.get(3));
        assert_eq!(row.to_bitstring(), "1001");
    }

    #[test]
    fn test_invalid_character() {
        let err = BitRow::from_bitstring("10x1").unwrap_err();
        assert!(matches!(err, SqdError::Shape(_)));
    }

    #[test]
    fn test_with_set_bits() {
        let row = BitRow::with_set_bits(6, &[0, 2, 4]).unwrap();
        assert_eq!(row.to_bitstring(), "010101");
        assert!(BitRow::with_set_bits(4, &[4]).is_err());
    }

    #[test]
    fn test_matrix_rejects_empty() {
        assert!(matches!(BitMatrix::new(vec![]), Err(SqdError::Shape(_))));
    }

    #[test]
    fn test_matrix_rejects_ragged_rows() {
        let err = BitMatrix::from_bitstrings(["0101", "011"]).unwrap_err();
        assert_eq!(err.to_string(), "Shape error: row 1 has 3 bits, expected 4");
    }

    #[test]
    fn test_matrix_rejects_odd_width() {
        assert!(BitMatrix::from_bitstrings(["011"]).is_err());
        assert!(BitMatrix::new(vec![BitRow::from_bits(Vec::new())]).is_err());
    }

    #[test]
    fn test_matrix_norb() {
        let m = BitMatrix::from_bitstrings(["000111", "111000"]).unwrap();
        assert_eq!(m.norb(), 3);
        assert_eq!(m.width(), 6);
        assert_eq!(m.len(), 2);
    }
}
