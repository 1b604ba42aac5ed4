//! Final statistics output.

use crate::pipeline::RunSummary;

/// Receives the drained totals of a run before they are verified.
pub trait Reporter {
    fn report(&self, summary: &RunSummary);
}

/// Prints the three summary lines to stdout.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutReporter;

impl Reporter for StdoutReporter {
    fn report(&self, summary: &RunSummary) {
        println!("{summary}");
    }
}
