//! SQD Bridge — Classical Post-Processing for Configuration Recovery
//!
//! This crate turns sampled measurement bitstrings into the deduplicated,
//! encoded configuration sets ("CI strings") consumed by an external
//! eigensolver in sample-based quantum diagonalization, once per
//! configuration recovery iteration.
//!
//! # Overview
//!
//! - [`Counts`] / [`BitMatrix`] hold the sampled configurations
//! - [`BitMatrixDecoder`] turns each row into one CI string per sector
//! - [`ConfigurationUnifier`] deduplicates, merges closed-shell sectors and
//!   seeds the Hartree–Fock reference
//! - [`TruncationPolicy`] caps the ascending set at `max_configs`
//! - [`DeterminantCodec`] / [`BinarySink`] produce the flat big-endian file
//! - [`Pipeline`] runs one iteration; [`RecoveryLoop`] runs all of them
//! - [`RunContext`] carries run-scoped configuration explicitly
//! - [`SqdError`] categorizes shape, range and I/O failures
//!
//! # Pipeline
//!
//! ```text
//!   Counts ──→ BitMatrix ──→ decode ──→ unify ──→ truncate ──→ encode ──→ <prefix>_<run_id>_<i>.bin
//! ```
//!
//! ```no_run
//! use sqd_bridge::{BitMatrix, Pipeline, RunContext, SystemParams};
//!
//! let ctx = RunContext::new().with_run_id("h2o");
//! let batch = BitMatrix::from_bitstrings(["00110011", "01010011"])?;
//! let output = Pipeline::new(&ctx)?.run(&batch, &SystemParams::new(4, 2, 1000), 0)?;
//! let alpha = &output.alpha;
//! println!("{} configurations in {}", alpha.configurations.len(), alpha.path.display());
//! # Ok::<(), sqd_bridge::SqdError>(())
//! ```

pub mod bits;
pub mod codec;
pub mod context;
pub mod counts;
pub mod decoder;
pub mod error;
pub mod pipeline;
pub mod recovery;
pub mod sink;
pub mod truncation;
pub mod unifier;

pub use bits::{BitMatrix, BitRow};
pub use codec::DeterminantCodec;
pub use context::{ProcessRank, RunContext};
pub use counts::Counts;
pub use decoder::{BitMatrixDecoder, SectorStrings};
pub use error::{SqdError, SqdResult};
pub use pipeline::{IterationOutput, IterationReport, Pipeline, SectorArtifact, SystemParams};
pub use recovery::{RecoveryLoop, RecoveryState, SampleSource};
pub use sink::BinarySink;
pub use truncation::{Truncated, TruncationPolicy};
pub use unifier::{ConfigurationUnifier, ShellMode, UnifiedConfigurations, hartree_fock_reference};
