//! One configuration recovery iteration.
//!
//! ```text
//!   BitMatrix ──→ decode ──→ unify ──→ truncate ──→ encode ──→ write
//!                 (rows)     (sets)    (cap)        (records)  (.bin)
//! ```
//!
//! Closed-shell runs write one artifact under the context's prefix. Open-shell
//! runs also write the sector-B set under [`BETA_PREFIX`](crate::context::BETA_PREFIX).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::bits::BitMatrix;
use crate::codec::DeterminantCodec;
use crate::context::RunContext;
use crate::decoder::BitMatrixDecoder;
use crate::error::{SqdError, SqdResult};
use crate::sink::BinarySink;
use crate::truncation::{Truncated, TruncationPolicy};
use crate::unifier::{
    ConfigurationUnifier, ShellMode, UnifiedConfigurations, hartree_fock_reference,
};

/// Stage-size lines go to `info` for verbose runs and `debug` otherwise.
macro_rules! stage {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+)
        } else {
            tracing::debug!($($arg)+)
        }
    };
}

/// Problem parameters that stay fixed across iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemParams {
    /// Orbitals per sector.
    pub norb: usize,
    /// Electrons per sector, used for the Hartree–Fock reference.
    pub num_elec: usize,
    /// Maximum number of configurations written per sector.
    pub max_configs: usize,
    /// Closed- or open-shell treatment.
    pub shell: ShellMode,
}

impl SystemParams {
    /// Closed-shell parameters.
    pub fn new(norb: usize, num_elec: usize, max_configs: usize) -> Self {
        Self {
            norb,
            num_elec,
            max_configs,
            shell: ShellMode::Closed,
        }
    }

    /// Set the shell mode.
    pub fn with_shell(mut self, shell: ShellMode) -> Self {
        self.shell = shell;
        self
    }
}

/// A written determinant file and the configurations it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorArtifact {
    /// Location of the file.
    pub path: PathBuf,
    /// Identifiers in file order (ascending).
    pub configurations: Vec<u64>,
}

/// Sizes observed at each stage of one iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationReport {
    /// Recovery iteration index.
    pub iteration: usize,
    /// Rows in the input batch.
    pub batch_rows: usize,
    /// Sector-A identifiers decoded, duplicates included.
    pub decoded_a: usize,
    /// Sector-B identifiers decoded, duplicates included.
    pub decoded_b: usize,
    /// Unique sector-A identifiers before truncation.
    pub unique_a: usize,
    /// Unique sector-B identifiers before truncation.
    pub unique_b: usize,
    /// Sector-A identifiers removed by truncation.
    pub discarded_a: usize,
    /// Sector-B identifiers removed by truncation.
    pub discarded_b: usize,
    /// Records written over all artifacts.
    pub records_written: usize,
    /// Bytes written over all artifacts.
    pub bytes_written: u64,
    /// Files written, sector A first.
    pub artifacts: Vec<PathBuf>,
}

/// Result of one iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationOutput {
    /// Sector-A artifact (the shared set in closed-shell mode).
    pub alpha: SectorArtifact,
    /// Sector-B artifact, open-shell only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<SectorArtifact>,
    /// Stage sizes.
    pub report: IterationReport,
}

/// Runs decode → unify → truncate → encode → write for one batch.
#[derive(Debug)]
pub struct Pipeline<'a> {
    ctx: &'a RunContext,
    decoder: BitMatrixDecoder,
    sink: BinarySink,
}

impl<'a> Pipeline<'a> {
    /// Bind a pipeline to a validated run context.
    pub fn new(ctx: &'a RunContext) -> SqdResult<Self> {
        ctx.validate()?;
        Ok(Self {
            ctx,
            decoder: BitMatrixDecoder,
            sink: BinarySink,
        })
    }

    /// Process one batch and write its artifact(s).
    pub fn run(
        &self,
        batch: &BitMatrix,
        params: &SystemParams,
        iteration: usize,
    ) -> SqdResult<IterationOutput> {
        let span = tracing::info_span!(
            "sqd_iteration",
            run_id = %self.ctx.run_id,
            iteration,
            rank = self.ctx.process.rank
        );
        let _guard = span.enter();
        let verbose = self.ctx.verbose;

        if batch.norb() != params.norb {
            return Err(SqdError::Shape(format!(
                "batch rows encode {} orbitals per sector, expected {}",
                batch.norb(),
                params.norb
            )));
        }
        let codec = DeterminantCodec::new(params.norb)?;
        stage!(verbose, batch = batch.len(), "number of items in batch");

        let strings = self.decoder.decode(batch)?;
        stage!(
            verbose,
            sector_a = strings.sector_a.len(),
            sector_b = strings.sector_b.len(),
            "decoded ci strings"
        );

        let mut unifier = ConfigurationUnifier::new(params.shell);
        if self.ctx.with_hf {
            unifier = unifier.with_hartree_fock(params.num_elec);
        }
        let unified = unifier.unify(&strings)?;

        let mut policy = TruncationPolicy::new(params.max_configs);
        if self.ctx.with_hf && self.ctx.reserve_reference {
            policy = policy.reserving(hartree_fock_reference(params.num_elec)?);
        }

        let mut report = IterationReport {
            iteration,
            batch_rows: batch.len(),
            decoded_a: strings.sector_a.len(),
            decoded_b: strings.sector_b.len(),
            unique_a: unified.sector_a().len(),
            unique_b: unified.sector_b().len(),
            ..IterationReport::default()
        };

        let (alpha_set, beta_set) = match unified {
            UnifiedConfigurations::Closed(set) => (set, None),
            UnifiedConfigurations::Open { sector_a, sector_b } => (sector_a, Some(sector_b)),
        };

        let alpha = policy.apply(alpha_set);
        report.discarded_a = alpha.discarded;
        log_truncation(verbose, "a", &alpha);
        let alpha = Encoded::new(&codec, alpha, self.ctx.artifact_path(iteration))?;

        let beta = match beta_set {
            Some(set) => {
                let beta = policy.apply(set);
                report.discarded_b = beta.discarded;
                log_truncation(verbose, "b", &beta);
                Some(Encoded::new(&codec, beta, self.ctx.beta_artifact_path(iteration))?)
            }
            None => {
                report.discarded_b = report.discarded_a;
                None
            }
        };

        // Every record is encoded before the first file is touched.
        let alpha = self.write_sector(alpha, &mut report)?;
        let beta = match beta {
            Some(beta) => match self.write_sector(beta, &mut report) {
                Ok(artifact) => Some(artifact),
                Err(err) => {
                    // Failed iterations leave no artifact behind.
                    if let Err(cleanup) = std::fs::remove_file(&alpha.path) {
                        tracing::warn!(
                            path = %alpha.path.display(),
                            error = %cleanup,
                            "could not remove sector-A file of failed iteration"
                        );
                    }
                    return Err(err);
                }
            },
            None => None,
        };

        report.artifacts = std::iter::once(alpha.path.clone())
            .chain(beta.as_ref().map(|b| b.path.clone()))
            .collect();

        Ok(IterationOutput {
            alpha,
            beta,
            report,
        })
    }

    fn write_sector(
        &self,
        encoded: Encoded,
        report: &mut IterationReport,
    ) -> SqdResult<SectorArtifact> {
        let Encoded {
            path,
            configs,
            records,
        } = encoded;
        let bytes = self.sink.write(&path, &records)?;

        report.records_written += records.len();
        report.bytes_written += bytes;
        stage!(
            self.ctx.verbose,
            path = %path.display(),
            records = records.len(),
            bytes,
            "wrote determinant file"
        );

        Ok(SectorArtifact {
            path,
            configurations: configs,
        })
    }
}

/// A truncated sector with its records, not yet on disk.
struct Encoded {
    path: PathBuf,
    configs: Vec<u64>,
    records: Vec<Vec<u8>>,
}

impl Encoded {
    fn new(codec: &DeterminantCodec, truncated: Truncated, path: PathBuf) -> SqdResult<Self> {
        let records = codec.encode_all(&truncated.configs)?;
        Ok(Self {
            path,
            configs: truncated.configs,
            records,
        })
    }
}

fn log_truncation(verbose: bool, sector: &str, truncated: &Truncated) {
    let unique = truncated.configs.len();
    if truncated.discarded > 0 {
        stage!(
            verbose,
            sector,
            unique,
            truncated = truncated.discarded,
            "number of unique ci strings"
        );
    } else {
        stage!(verbose, sector, unique, "number of unique ci strings");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::BitRow;

    fn ctx(dir: &std::path::Path) -> RunContext {
        RunContext::new()
            .with_run_id("test")
            .with_hf(false)
            .with_output_dir(dir)
    }

    #[test]
    fn test_two_row_closed_shell() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx(dir.path());
        let batch = BitMatrix::new(vec![
            BitRow::with_set_bits(4, &[0, 1, 2, 3]).unwrap(),
            BitRow::with_set_bits(4, &[0, 3]).unwrap(),
        ])
        .unwrap();

        let out = Pipeline::new(&ctx)
            .unwrap()
            .run(&batch, &SystemParams::new(2, 1, 10), 0)
            .unwrap();

        assert_eq!(out.alpha.configurations, vec![1, 2, 3]);
        assert_eq!(out.alpha.path, dir.path().join("AlphaDets_test_0.bin"));
        assert!(out.beta.is_none());
        assert_eq!(std::fs::read(&out.alpha.path).unwrap(), vec![1, 2, 3]);
        assert_eq!(out.report.batch_rows, 2);
        assert_eq!(out.report.decoded_a, 2);
        assert_eq!(out.report.decoded_b, 2);
        assert_eq!(out.report.artifacts, vec![out.alpha.path.clone()]);
        assert_eq!(out.report.unique_a, 3);
        assert_eq!(out.report.bytes_written, 3);
    }

    #[test]
    fn test_norb_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx(dir.path());
        let batch = BitMatrix::from_bitstrings(["0011"]).unwrap();
        let err = Pipeline::new(&ctx)
            .unwrap()
            .run(&batch, &SystemParams::new(3, 1, 10), 0)
            .unwrap_err();
        assert!(matches!(err, SqdError::Shape(_)));
    }

    #[test]
    fn test_invalid_context_is_rejected() {
        let ctx = RunContext::new().with_rank(2, 2);
        assert!(Pipeline::new(&ctx).is_err());
    }

    #[test]
    fn test_open_shell_writes_two_files() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx(dir.path());
        // Sector A = {1, 2}, sector B = {2}.
        let batch = BitMatrix::from_bitstrings(["1001", "1010"]).unwrap();
        let params = SystemParams::new(2, 1, 10).with_shell(ShellMode::Open);

        let out = Pipeline::new(&ctx).unwrap().run(&batch, &params, 1).unwrap();

        assert_eq!(out.alpha.configurations, vec![1, 2]);
        let beta = out.beta.unwrap();
        assert_eq!(beta.configurations, vec![2]);
        assert_eq!(beta.path, dir.path().join("BetaDets_test_1.bin"));
        assert_eq!(std::fs::read(&beta.path).unwrap(), vec![2]);
        assert_eq!(out.report.records_written, 3);
        assert_eq!(out.report.artifacts, vec![out.alpha.path.clone(), beta.path]);
    }

    #[test]
    fn test_failed_beta_write_removes_alpha_file() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx(dir.path()).with_run_id("p");
        // A directory where the sector-B file should go makes its creation fail.
        std::fs::create_dir(dir.path().join("BetaDets_p_0.bin")).unwrap();
        let batch = BitMatrix::from_bitstrings(["0101"]).unwrap();
        let params = SystemParams::new(2, 1, 10).with_shell(ShellMode::Open);

        let err = Pipeline::new(&ctx).unwrap().run(&batch, &params, 0).unwrap_err();

        assert!(err.is_io());
        assert!(!dir.path().join("AlphaDets_p_0.bin").exists());
    }

    #[test]
    fn test_reserved_reference() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx(dir.path()).with_hf(true).with_reserved_reference(true);
        let batch = BitMatrix::from_bitstrings(["00010001", "00100010"]).unwrap();

        let out = Pipeline::new(&ctx)
            .unwrap()
            .run(&batch, &SystemParams::new(4, 4, 2), 0)
            .unwrap();

        assert_eq!(out.alpha.configurations, vec![1, 15]);
        assert_eq!(out.report.discarded_a, 1);
    }
}
