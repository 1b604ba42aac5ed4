//! Wiring and lifecycle of a full run.
//!
//! ```text
//! source -> shared input -> [worker 0..N] -> N outputs -> [merger 0..N] -> results -> aggregate
//! ```
//!
//! A run moves through [`Phase`]s in order. The deadline only cancels the
//! source; every other stage stops because its input closed, so a run can
//! only reach [`Phase::Verifying`] once every channel has been drained.

use crate::{
    aggregate::{self, ObserverTotals, Totals},
    config::PipelineConfig,
    deadline,
    error::{PipelineError, Result},
    merge::{self, FanIn},
    report::Reporter,
    source, verify,
    worker::WorkerPool,
};
use core::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Running,
    CancellationPending,
    Draining,
    Verifying,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Running => "running",
            Self::CancellationPending => "cancellation pending",
            Self::Draining => "draining",
            Self::Verifying => "verifying",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Totals observed at both ends of a drained run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// What the source's emit callback counted.
    pub generated: Totals,
    /// What reached the end of the result stream.
    pub verified: Totals,
    /// How many values each merger forwarded, by worker index.
    pub tallies: Vec<u64>,
}

impl RunSummary {
    pub fn verify(&self) -> core::result::Result<(), crate::IntegrityError> {
        verify::check(self)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "count: generated {} verified {}",
            self.generated.count, self.verified.count
        )?;
        writeln!(
            f,
            "sum: generated {} verified {}",
            self.generated.sum, self.verified.sum
        )?;
        write!(f, "per-channel tally: {:?}", self.tallies)
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    phase: Phase,
    transitions: broadcast::Sender<Phase>,
}

/// Enough room for every transition of a run, so a subscriber that only
/// reads after `run` returns still sees all of them.
const TRANSITION_BUFFER: usize = 16;

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let (transitions, _) = broadcast::channel(TRANSITION_BUFFER);
        Self {
            config,
            phase: Phase::Running,
            transitions,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Receives every phase entered from now on, in order.
    pub fn subscribe(&self) -> broadcast::Receiver<Phase> {
        self.transitions.subscribe()
    }

    fn enter(&mut self, phase: Phase) {
        tracing::info!("Pipeline {phase}");
        self.phase = phase;
        // No subscribers is fine.
        let _ = self.transitions.send(phase);
    }

    /// Runs the pipeline until `cancel` fires or the configured deadline
    /// elapses, drains every stage, reports, then verifies.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Integrity`] if the drained totals break a
    /// conservation check, or [`PipelineError::Task`] if a stage panicked.
    pub async fn run<R>(&mut self, cancel: CancellationToken, reporter: &R) -> Result<RunSummary>
    where
        R: Reporter + ?Sized,
    {
        let result = self.run_inner(cancel, reporter).await;
        match &result {
            Ok(_) => self.enter(Phase::Done),
            Err(e) => {
                tracing::error!("Pipeline failed: {e}");
                self.enter(Phase::Failed);
            }
        }
        result
    }

    async fn run_inner<R>(&mut self, cancel: CancellationToken, reporter: &R) -> Result<RunSummary>
    where
        R: Reporter + ?Sized,
    {
        self.enter(Phase::Running);
        tracing::info!(
            "Starting pipeline with {} workers, {:?} delay, {:?} deadline",
            self.config.workers(),
            self.config.delay(),
            self.config.deadline()
        );

        let timer = deadline::arm(cancel.clone(), self.config.deadline());

        let observed = Arc::new(ObserverTotals::default());
        let (input_tx, input_rx) = async_channel::bounded(1);

        let on_emit = {
            let observed = observed.clone();
            move |value| observed.record(value)
        };
        let source = tokio::spawn(source::generate(cancel.clone(), input_tx, on_emit));

        let pool = WorkerPool::spawn(self.config.workers(), input_rx, self.config.delay());
        let (outputs, workers) = pool.into_parts();

        let FanIn {
            results,
            tally,
            coordinator,
        } = merge::fan_in(outputs);

        let aggregator = tokio::spawn(aggregate::aggregate(results));

        cancel.cancelled().await;
        self.enter(Phase::CancellationPending);

        source.await.map_err(PipelineError::task("source"))?;
        self.enter(Phase::Draining);

        let verified = aggregator
            .await
            .map_err(PipelineError::task("aggregator"))?;
        coordinator
            .await
            .map_err(PipelineError::task("coordinator"))??;
        futures::future::try_join_all(workers)
            .await
            .map_err(PipelineError::task("worker"))?;
        timer.await.map_err(PipelineError::task("deadline"))?;

        let summary = RunSummary {
            generated: observed.load(),
            verified,
            tallies: tally.snapshot(),
        };
        tracing::info!(
            generated_count = summary.generated.count,
            verified_count = summary.verified.count,
            generated_sum = summary.generated.sum,
            verified_sum = summary.verified.sum,
            tallies = ?summary.tallies,
            "Pipeline drained"
        );
        reporter.report(&summary);

        self.enter(Phase::Verifying);
        summary.verify()?;

        Ok(summary)
    }
}
