//! Run configuration.
//!
//! The worker count is fixed at [`NUM_WORKERS`] for the binary. The field on
//! [`PipelineConfig`] exists so the library can be driven with other pool
//! sizes, e.g. a single worker when ordering has to be deterministic.

use crate::error::ConfigError;
use clap::Parser;
use core::time::Duration;

/// Number of workers, and therefore of worker output channels and mergers.
pub const NUM_WORKERS: usize = 5;

/// Pause a worker takes after relaying each value.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(1);

/// How long the source generates before it is cancelled.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(1);

/// Validated run parameters. Only constructible through [`PipelineConfig::new`],
/// [`Default`] or a parsed [`CliArgs`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    workers: usize,
    delay: Duration,
    deadline: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: NUM_WORKERS,
            delay: DEFAULT_DELAY,
            deadline: DEFAULT_DEADLINE,
        }
    }
}

impl PipelineConfig {
    pub fn new(workers: usize, delay: Duration, deadline: Duration) -> Result<Self, ConfigError> {
        if workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        // Without the pause one worker can drain the shared input on its own.
        if delay.is_zero() {
            return Err(ConfigError::ZeroDelay);
        }
        if deadline.is_zero() {
            return Err(ConfigError::ZeroDeadline);
        }
        Ok(Self {
            workers,
            delay,
            deadline,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

/// Command line arguments for the `pipeline` binary.
///
/// Each flag can also be supplied through its environment variable or a
/// `.env` file.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Fan-out/fan-in numeric pipeline with conservation checks")]
pub struct CliArgs {
    /// How long the source generates values, in milliseconds.
    #[arg(long, env = "PIPELINE_DEADLINE_MS", default_value_t = 1000)]
    pub deadline_ms: u64,

    /// Pause each worker takes after relaying a value, in milliseconds.
    #[arg(long, env = "PIPELINE_DELAY_MS", default_value_t = 1)]
    pub delay_ms: u64,
}

impl TryFrom<CliArgs> for PipelineConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        Self::new(
            NUM_WORKERS,
            Duration::from_millis(args.delay_ms),
            Duration::from_millis(args.deadline_ms),
        )
    }
}
