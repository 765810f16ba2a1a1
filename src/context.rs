//! Run-scoped configuration.
//!
//! A [`RunContext`] is built once at process start and then only read. Every
//! pipeline stage receives it explicitly; there is no global run state.
//!
//! # Artifact naming
//!
//! ```text
//!   size == 1:  <prefix>_<run_id>_<iteration>.bin
//!   size  > 1:  <prefix>_<run_id>_<iteration>_rank<rank>.bin
//! ```
//!
//! The rank suffix keeps concurrent writers of one iteration on distinct paths.

use std::path::PathBuf;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{SqdError, SqdResult};

/// Default artifact prefix for sector A (and for the unified closed-shell set).
pub const ALPHA_PREFIX: &str = "AlphaDets";

/// Artifact prefix used for sector B in open-shell runs.
pub const BETA_PREFIX: &str = "BetaDets";

/// Position of this process inside the distributed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRank {
    /// Rank of this process.
    pub rank: u32,
    /// Total number of processes.
    pub size: u32,
}

impl ProcessRank {
    /// A job made of this process only.
    pub fn single() -> Self {
        Self { rank: 0, size: 1 }
    }

    /// Returns `true` if more than one process participates.
    pub fn is_distributed(&self) -> bool {
        self.size > 1
    }
}

impl Default for ProcessRank {
    fn default() -> Self {
        Self::single()
    }
}

impl std::fmt::Display for ProcessRank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.rank, self.size)
    }
}

/// Read-mostly configuration of one recovery run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunContext {
    /// Local start time, `YYYYMMDDHHMMSS`.
    pub date_str: String,
    /// Run identifier used in artifact names. Defaults to `date_str`.
    pub run_id: String,
    /// UTC start instant.
    pub started_at: DateTime<Utc>,
    /// Number of configuration recovery iterations.
    pub n_recovery: usize,
    /// Maximum number of distinct bitstrings taken from one batch.
    pub samples_per_batch: usize,
    /// Emit stage-size diagnostics at `info` instead of `debug`.
    pub verbose: bool,
    /// Seed the configuration set with the Hartree–Fock reference.
    pub with_hf: bool,
    /// Keep the reference through truncation (see [`crate::TruncationPolicy::reserving`]).
    #[serde(default)]
    pub reserve_reference: bool,
    /// Name of the sampling backend (informational).
    pub backend_name: String,
    /// Shots requested per sampling job.
    pub num_shots: u64,
    /// Rank of this process in the owning job.
    pub process: ProcessRank,
    /// Directory that receives determinant files.
    pub output_dir: PathBuf,
    /// Prefix of the sector-A artifact name.
    pub artifact_prefix: String,
}

impl RunContext {
    /// Create a context stamped with the current time and default parameters.
    pub fn new() -> Self {
        let date_str = Local::now().format("%Y%m%d%H%M%S").to_string();
        Self {
            run_id: date_str.clone(),
            date_str,
            started_at: Utc::now(),
            n_recovery: 3,
            samples_per_batch: 1000,
            verbose: false,
            with_hf: true,
            reserve_reference: false,
            backend_name: String::new(),
            num_shots: 10_000,
            process: ProcessRank::single(),
            output_dir: PathBuf::from("."),
            artifact_prefix: ALPHA_PREFIX.into(),
        }
    }

    /// Override the run identifier.
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    /// Set the number of recovery iterations.
    pub fn with_recovery_iterations(mut self, n_recovery: usize) -> Self {
        self.n_recovery = n_recovery;
        self
    }

    /// Set the per-batch sample cap.
    pub fn with_samples_per_batch(mut self, samples_per_batch: usize) -> Self {
        self.samples_per_batch = samples_per_batch;
        self
    }

    /// Enable or disable verbose diagnostics.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Enable or disable Hartree–Fock seeding.
    pub fn with_hf(mut self, with_hf: bool) -> Self {
        self.with_hf = with_hf;
        self
    }

    /// Keep the Hartree–Fock reference through truncation.
    pub fn with_reserved_reference(mut self, reserve: bool) -> Self {
        self.reserve_reference = reserve;
        self
    }

    /// Record the sampling backend name.
    pub fn with_backend(mut self, backend_name: impl Into<String>) -> Self {
        self.backend_name = backend_name.into();
        self
    }

    /// Set the shot count.
    pub fn with_num_shots(mut self, num_shots: u64) -> Self {
        self.num_shots = num_shots;
        self
    }

    /// Set the rank of this process.
    pub fn with_rank(mut self, rank: u32, size: u32) -> Self {
        self.process = ProcessRank { rank, size };
        self
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the sector-A artifact prefix.
    pub fn with_artifact_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.artifact_prefix = prefix.into();
        self
    }

    /// Check that the context describes a runnable job.
    pub fn validate(&self) -> SqdResult<()> {
        if self.process.size == 0 {
            return Err(SqdError::Configuration("process count must be positive".into()));
        }
        if self.process.rank >= self.process.size {
            return Err(SqdError::Configuration(format!(
                "rank {} out of range for {} processes",
                self.process.rank, self.process.size
            )));
        }
        if self.n_recovery == 0 {
            return Err(SqdError::Configuration(
                "at least one recovery iteration is required".into(),
            ));
        }
        if self.samples_per_batch == 0 {
            return Err(SqdError::Configuration(
                "samples_per_batch must be positive".into(),
            ));
        }
        if self.artifact_prefix.is_empty() {
            return Err(SqdError::Configuration("artifact prefix is empty".into()));
        }
        Ok(())
    }

    /// File name of the artifact for `iteration` under `prefix`.
    pub fn artifact_name(&self, prefix: &str, iteration: usize) -> String {
        if self.process.is_distributed() {
            format!(
                "{prefix}_{}_{iteration}_rank{}.bin",
                self.run_id, self.process.rank
            )
        } else {
            format!("{prefix}_{}_{iteration}.bin", self.run_id)
        }
    }

    /// Full path of the sector-A artifact for `iteration`.
    pub fn artifact_path(&self, iteration: usize) -> PathBuf {
        self.output_dir
            .join(self.artifact_name(&self.artifact_prefix, iteration))
    }

    /// Full path of the sector-B artifact for `iteration` (open-shell runs).
    pub fn beta_artifact_path(&self, iteration: usize) -> PathBuf {
        self.output_dir
            .join(self.artifact_name(BETA_PREFIX, iteration))
    }

    /// Header block describing the run.
    pub fn summary(&self) -> String {
        format!(
            "# date: {}\n# run_id: {}\n# n_recovery: {}\n# samples_per_batch: {}\n# backend_name: {}\n# num_shots: {}\n",
            self.date_str,
            self.run_id,
            self.n_recovery,
            self.samples_per_batch,
            self.backend_name,
            self.num_shots
        )
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
