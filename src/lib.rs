//! A cancellable fan-out/fan-in numeric pipeline.
//!
//! A single source emits `1, 2, 3, ...` onto a shared channel until its
//! [`CancellationToken`](tokio_util::sync::CancellationToken) fires. A fixed
//! pool of workers races on that channel, each relaying into a private
//! output channel, and one merger per output fans everything back into a
//! single result channel. Once every stage has drained, the totals seen at
//! the end of the pipeline are checked against the totals seen at the
//! source.
//!
//! Shutdown only ever reaches the source directly. Every later stage learns
//! about it by its input closing, and closes its own output once that input
//! is drained.

pub mod aggregate;
pub mod config;
pub mod deadline;
pub mod error;
pub mod merge;
pub mod pipeline;
pub mod report;
pub mod source;
pub mod telemetry;
pub mod verify;
pub mod worker;

pub use aggregate::{ObserverTotals, Totals};
pub use config::{CliArgs, PipelineConfig, NUM_WORKERS};
pub use error::{ConfigError, IntegrityError, PipelineError, Result};
pub use merge::Tally;
pub use pipeline::{Phase, Pipeline, RunSummary};
pub use report::{Reporter, StdoutReporter};
