//! Error types for the pipeline.
//!
//! Individual items never fail, so the only runtime failures are a broken
//! integrity check after the pipeline drained, or a stage task that
//! panicked. Bad configuration is rejected before anything is spawned.

pub type Result<T> = core::result::Result<T, PipelineError>;

/// A conservation check that did not hold after a completed run.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityError {
    /// Fewer or more values reached the result stream than were generated.
    #[error("count mismatch: generated {generated} != verified {verified}")]
    CountMismatch { generated: i64, verified: i64 },

    /// The values reaching the result stream do not add up to what was
    /// generated.
    #[error("sum mismatch: generated {generated} != verified {verified}")]
    SumMismatch { generated: i64, verified: i64 },

    /// The per-channel tallies do not partition the generated count.
    #[error("partition mismatch: generated {generated} != sum of tallies {tallied} ({tallies:?})")]
    PartitionMismatch {
        generated: i64,
        tallied: i64,
        tallies: Vec<u64>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("deadline must be greater than zero")]
    ZeroDeadline,

    #[error("per-item worker delay must be greater than zero")]
    ZeroDelay,

    #[error("worker pool needs at least one worker")]
    ZeroWorkers,
}

/// Unified error type returned by [`Pipeline`](crate::Pipeline).
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("integrity check failed: {0}")]
    Integrity(#[from] IntegrityError),

    /// A stage task panicked or was aborted before draining.
    #[error("{stage} task failed: {source}")]
    Task {
        stage: &'static str,
        #[source]
        source: tokio::task::JoinError,
    },
}

impl PipelineError {
    pub(crate) fn task(stage: &'static str) -> impl FnOnce(tokio::task::JoinError) -> Self {
        move |source| Self::Task { stage, source }
    }
}
