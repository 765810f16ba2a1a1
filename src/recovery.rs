//! Recovery loop driver.
//!
//! The loop is a small state machine over the configured number of
//! iterations:
//!
//! ```text
//!   Ready(0) ──→ Ready(1) ──→ … ──→ Ready(n_recovery - 1) ──→ Finished
//! ```
//!
//! Each transition pulls one batch from a [`SampleSource`], runs the
//! [`Pipeline`] on a blocking worker and hands the [`IterationOutput`] back to
//! the caller. A failed step leaves the state where it was; deciding whether to
//! retry belongs to the caller.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::RunContext;
use crate::counts::Counts;
use crate::error::{SqdError, SqdResult};
use crate::pipeline::{IterationOutput, Pipeline, SystemParams};

/// External sampling stage.
///
/// Implementations wrap whatever produces measurement counts (a backend job,
/// a replayed file, a mock). Circuit construction and execution stay on the
/// implementor's side.
#[async_trait]
pub trait SampleSource: Send + Sync {
    /// Produce the measurement counts for `iteration`.
    async fn sample(&self, iteration: usize, ctx: &RunContext) -> SqdResult<Counts>;
}

/// Position of a [`RecoveryLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryState {
    /// The next iteration to run.
    Ready(usize),
    /// All iterations have completed.
    Finished,
}

impl RecoveryState {
    /// Check if no more iterations will run.
    pub fn is_finished(&self) -> bool {
        matches!(self, RecoveryState::Finished)
    }
}

/// Drives `ctx.n_recovery` pipeline iterations.
pub struct RecoveryLoop<S> {
    ctx: Arc<RunContext>,
    source: S,
    params: SystemParams,
    state: RecoveryState,
}

impl<S: SampleSource> RecoveryLoop<S> {
    /// Create a loop positioned at iteration 0.
    pub fn new(ctx: Arc<RunContext>, source: S, params: SystemParams) -> SqdResult<Self> {
        ctx.validate()?;
        Ok(Self {
            ctx,
            source,
            params,
            state: RecoveryState::Ready(0),
        })
    }

    /// Current state.
    pub fn state(&self) -> RecoveryState {
        self.state
    }

    /// Run the next iteration.
    ///
    /// Returns `Ok(None)` once every iteration has completed.
    pub async fn step(&mut self) -> SqdResult<Option<IterationOutput>> {
        let RecoveryState::Ready(iteration) = self.state else {
            return Ok(None);
        };

        let counts = self.source.sample(iteration, &self.ctx).await?;
        tracing::debug!(
            iteration,
            distinct = counts.len(),
            shots = counts.total_shots(),
            "received counts"
        );
        let batch = counts.to_bit_matrix_capped(self.ctx.samples_per_batch)?;

        let ctx = Arc::clone(&self.ctx);
        let params = self.params;
        let output = tokio::task::spawn_blocking(move || {
            Pipeline::new(&ctx)?.run(&batch, &params, iteration)
        })
        .await
        .map_err(|e| SqdError::Task(e.to_string()))??;

        self.state = if iteration + 1 >= self.ctx.n_recovery {
            RecoveryState::Finished
        } else {
            RecoveryState::Ready(iteration + 1)
        };
        Ok(Some(output))
    }

    /// Run every remaining iteration and collect the outputs.
    pub async fn run_to_end(&mut self) -> SqdResult<Vec<IterationOutput>> {
        let mut outputs = Vec::new();
        while let Some(output) = self.step().await? {
            outputs.push(output);
        }
        tracing::info!(
            run_id = %self.ctx.run_id,
            iterations = outputs.len(),
            "recovery loop finished"
        );
        Ok(outputs)
    }
}
