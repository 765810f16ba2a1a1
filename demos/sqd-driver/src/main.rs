//! Configuration recovery driver with a mock sampler.
//!
//! Builds a [`RunContext`] from the command line, samples random
//! configurations with a fixed electron count per sector (plus bit-flip
//! noise), and runs every recovery iteration through the pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use sqd_bridge::{
    BitRow, Counts, RecoveryLoop, RunContext, SampleSource, ShellMode, SqdError, SqdResult,
    SystemParams,
};

/// SQD configuration recovery driver
#[derive(Parser, Debug)]
#[command(name = "sqd-driver")]
#[command(about = "Decode, deduplicate and encode sampled configurations per recovery iteration")]
struct Args {
    /// Number of configuration recovery iterations
    #[arg(long = "recovery", default_value = "3")]
    recovery: usize,

    /// Maximum number of distinct samples per batch
    #[arg(long = "number_of_samples", default_value = "1000")]
    number_of_samples: usize,

    /// Name of the sampling backend
    #[arg(long = "backend_name", default_value = "mock")]
    backend_name: String,

    /// Shots per sampling job
    #[arg(long = "num_shots", default_value = "10000")]
    num_shots: u64,

    /// Orbitals per sector
    #[arg(long, default_value = "16")]
    norb: usize,

    /// Electrons per sector
    #[arg(long, default_value = "5")]
    num_elec: usize,

    /// Maximum number of configurations written per iteration
    #[arg(long, default_value = "1000")]
    max_configs: usize,

    /// Keep separate sector alphabets
    #[arg(long)]
    open_shell: bool,

    /// Do not seed the Hartree-Fock reference
    #[arg(long)]
    no_hf: bool,

    /// Keep the Hartree-Fock reference through truncation
    #[arg(long)]
    reserve_hf: bool,

    /// Run identifier (defaults to the start timestamp)
    #[arg(long)]
    run_id: Option<String>,

    /// Output directory for determinant files
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Rank of this process
    #[arg(long, env = "SQD_RANK", default_value = "0")]
    rank: u32,

    /// Number of processes in the job
    #[arg(long, env = "SQD_SIZE", default_value = "1")]
    size: u32,

    /// Sampler seed
    #[arg(long, default_value = "7")]
    seed: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn run_context(&self) -> RunContext {
        let mut ctx = RunContext::new()
            .with_recovery_iterations(self.recovery)
            .with_samples_per_batch(self.number_of_samples)
            .with_backend(self.backend_name.clone())
            .with_num_shots(self.num_shots)
            .with_hf(!self.no_hf)
            .with_reserved_reference(self.reserve_hf)
            .with_rank(self.rank, self.size)
            .with_output_dir(self.output.clone())
            .with_verbose(self.verbose);
        if let Some(run_id) = &self.run_id {
            ctx = ctx.with_run_id(run_id.clone());
        }
        ctx
    }

    fn system_params(&self) -> SystemParams {
        let shell = if self.open_shell {
            ShellMode::Open
        } else {
            ShellMode::Closed
        };
        SystemParams::new(self.norb, self.num_elec, self.max_configs).with_shell(shell)
    }
}

/// Random configurations with `num_elec` electrons per sector.
struct MockSampler {
    norb: usize,
    num_elec: usize,
    noise: f64,
    seed: u64,
}

impl MockSampler {
    fn sector(&self, rng: &mut SmallRng) -> Vec<bool> {
        let mut bits = vec![false; self.norb];
        for i in rand::seq::index::sample(rng, self.norb, self.num_elec) {
            bits[i] = true;
        }
        for bit in &mut bits {
            if rng.gen_bool(self.noise) {
                *bit = !*bit;
            }
        }
        bits
    }
}

#[async_trait]
impl SampleSource for MockSampler {
    async fn sample(&self, iteration: usize, ctx: &RunContext) -> SqdResult<Counts> {
        if self.num_elec > self.norb {
            return Err(SqdError::Sampling(format!(
                "cannot place {} electrons in {} orbitals",
                self.num_elec, self.norb
            )));
        }

        let mut rng = SmallRng::seed_from_u64(self.seed.wrapping_add(iteration as u64));
        let mut counts = Counts::new();
        for _ in 0..ctx.num_shots {
            let mut bits = self.sector(&mut rng);
            bits.extend(self.sector(&mut rng));
            counts.insert(BitRow::from_bits(bits).to_bitstring(), 1);
        }
        Ok(counts)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let ctx = Arc::new(args.run_context());
    std::fs::create_dir_all(&ctx.output_dir)?;
    for line in ctx.summary().lines() {
        info!("{line}");
    }

    let sampler = MockSampler {
        norb: args.norb,
        num_elec: args.num_elec,
        noise: 0.05,
        seed: args.seed,
    };
    let mut recovery = RecoveryLoop::new(Arc::clone(&ctx), sampler, args.system_params())?;

    let mut reports = Vec::new();
    while let Some(output) = recovery.step().await? {
        let report = &output.report;
        info!(
            "iteration {}: {} rows, {} unique, {} truncated, {} bytes → {}",
            report.iteration,
            report.batch_rows,
            report.unique_a,
            report.discarded_a,
            report.bytes_written,
            output.alpha.path.display()
        );
        if let Some(beta) = &output.beta {
            info!(
                "  sector B: {} configurations → {}",
                beta.configurations.len(),
                beta.path.display()
            );
        }
        reports.push(output.report);
    }

    let summary_path = ctx.output_dir.join(format!("{}_summary.json", ctx.run_id));
    let summary = serde_json::json!({
        "context": ctx.as_ref(),
        "iterations": reports,
    });
    std::fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;
    info!("Summary saved to: {}", summary_path.display());

    Ok(())
}
