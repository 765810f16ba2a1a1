//! Flat determinant files.
//!
//! The file is a plain concatenation of fixed-width records with no header,
//! count or delimiter. Readers must know the record width (from `norb`).

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::codec::DeterminantCodec;
use crate::error::{SqdError, SqdResult};

/// Writes and reads determinant files.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinarySink;

impl BinarySink {
    /// Create or truncate `path` and write every record in order.
    ///
    /// Returns the number of bytes written.
    pub fn write<R: AsRef<[u8]>>(&self, path: &Path, records: &[R]) -> SqdResult<u64> {
        let file = File::create(path).map_err(|e| SqdError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        let mut written = 0u64;

        for record in records {
            let bytes = record.as_ref();
            writer
                .write_all(bytes)
                .map_err(|e| SqdError::io(path, e))?;
            written += bytes.len() as u64;
        }

        writer.flush().map_err(|e| SqdError::io(path, e))?;
        tracing::debug!(path = %path.display(), bytes = written, "determinant file written");
        Ok(written)
    }

    /// Read `path` back into CI strings.
    pub fn read(&self, path: &Path, codec: &DeterminantCodec) -> SqdResult<Vec<u64>> {
        let mut buf = Vec::new();
        File::open(path)
            .and_then(|mut f| f.read_to_end(&mut buf))
            .map_err(|e| SqdError::io(path, e))?;

        let width = codec.record_width();
        if buf.len() % width != 0 {
            return Err(SqdError::Shape(format!(
                "{} holds {} bytes, not a multiple of the {width}-byte record",
                path.display(),
                buf.len()
            )));
        }

        buf.chunks_exact(width)
            .map(|record| codec.decode(record))
            .collect()
    }
}
