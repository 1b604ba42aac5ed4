//! Conservation checks run once the pipeline has fully drained.

use crate::{error::IntegrityError, pipeline::RunSummary};

/// Checks, in order, that the result stream saw as many values as were
/// generated, that they add up to the same sum, and that the per-channel
/// tallies partition the generated count. Returns the first violation.
pub fn check(summary: &RunSummary) -> Result<(), IntegrityError> {
    let RunSummary {
        generated,
        verified,
        tallies,
    } = summary;

    if generated.count != verified.count {
        return Err(IntegrityError::CountMismatch {
            generated: generated.count,
            verified: verified.count,
        });
    }

    if generated.sum != verified.sum {
        return Err(IntegrityError::SumMismatch {
            generated: generated.sum,
            verified: verified.sum,
        });
    }

    let tallied = i64::try_from(tallies.iter().sum::<u64>()).unwrap_or(i64::MAX);
    if tallied != generated.count {
        return Err(IntegrityError::PartitionMismatch {
            generated: generated.count,
            tallied,
            tallies: tallies.clone(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Totals;

    fn summary(generated: (i64, i64), verified: (i64, i64), tallies: &[u64]) -> RunSummary {
        RunSummary {
            generated: Totals {
                count: generated.0,
                sum: generated.1,
            },
            verified: Totals {
                count: verified.0,
                sum: verified.1,
            },
            tallies: tallies.to_vec(),
        }
    }

    #[test]
    fn consistent_run_passes() {
        let run = summary((998, 498_501), (998, 498_501), &[200, 199, 200, 199, 200]);
        assert_eq!(check(&run), Ok(()));
    }

    #[test]
    fn empty_run_passes() {
        assert_eq!(check(&summary((0, 0), (0, 0), &[0, 0, 0, 0, 0])), Ok(()));
    }

    #[test]
    fn count_mismatch_is_reported_first() {
        let err = check(&summary((10, 55), (9, 45), &[1])).unwrap_err();
        assert_eq!(
            err,
            IntegrityError::CountMismatch {
                generated: 10,
                verified: 9
            }
        );
        assert_eq!(err.to_string(), "count mismatch: generated 10 != verified 9");
    }

    #[test]
    fn sum_mismatch() {
        let err = check(&summary((3, 6), (3, 7), &[3])).unwrap_err();
        assert_eq!(
            err,
            IntegrityError::SumMismatch {
                generated: 6,
                verified: 7
            }
        );
    }

    #[test]
    fn tallies_must_partition_the_count() {
        let err = check(&summary((3, 6), (3, 6), &[1, 1])).unwrap_err();
        assert_eq!(
            err,
            IntegrityError::PartitionMismatch {
                generated: 3,
                tallied: 2,
                tallies: vec![1, 1],
            }
        );
    }
}
