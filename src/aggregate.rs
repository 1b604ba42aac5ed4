//! Running totals at both ends of the pipeline.

use async_channel::Receiver;
use futures::StreamExt;
use std::sync::atomic::{AtomicI64, Ordering};

/// A count and a sum over some set of values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Totals {
    pub count: i64,
    pub sum: i64,
}

impl Totals {
    pub fn add(&mut self, value: i64) {
        self.count += 1;
        self.sum += value;
    }
}

/// Totals recorded by the source's emit callback.
///
/// The source task writes while the driver may read concurrently, so both
/// counters are atomics. Only the value read after the source has stopped
/// is meaningful.
#[derive(Debug, Default)]
pub struct ObserverTotals {
    count: AtomicI64,
    sum: AtomicI64,
}

impl ObserverTotals {
    pub fn record(&self, value: i64) {
        self.sum.fetch_add(value, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn load(&self) -> Totals {
        Totals {
            count: self.count.load(Ordering::Relaxed),
            sum: self.sum.load(Ordering::Relaxed),
        }
    }
}

/// Drains `results` to exhaustion and returns what passed through.
pub async fn aggregate(results: Receiver<i64>) -> Totals {
    let stream = async_stream::stream! {
        while let Ok(value) = results.recv().await {
            yield value;
        }
    };
    futures::pin_mut!(stream);

    let mut totals = Totals::default();
    while let Some(value) = stream.next().await {
        totals.add(value);
    }

    tracing::debug!(count = totals.count, sum = totals.sum, "Result stream drained");
    totals
}
