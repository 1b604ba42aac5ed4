//! Fan-in stage: one merger per worker output, all feeding one result
//! channel.
//!
//! The result channel is closed by a single coordinator task that holds the
//! original sender and drops it only after every merger has been joined.
//! Mergers hold clones, so the channel cannot close while any of them is
//! still forwarding, and there is exactly one owner of the final close.

use crate::error::{PipelineError, Result};
use async_channel::{Receiver, Sender};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::task::JoinHandle;

/// Per-channel forward counts, one slot per merger.
///
/// Each slot is written only by the merger with that index and read once
/// all mergers have been joined.
#[derive(Debug)]
pub struct Tally {
    slots: Box<[AtomicU64]>,
}

impl Tally {
    pub fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    pub fn record(&self, index: usize) {
        self.slots[index].fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> Vec<u64> {
        self.slots
            .iter()
            .map(|slot| slot.load(Ordering::Relaxed))
            .collect()
    }
}

/// Drains `input`, counting each value in `tally[index]` before forwarding
/// it to the shared `output`.
pub async fn forward(index: usize, input: Receiver<i64>, tally: Arc<Tally>, output: Sender<i64>) {
    tracing::trace!("Merger {index} started");

    while let Ok(value) = input.recv().await {
        tally.record(index);
        if output.send(value).await.is_err() {
            tracing::warn!("Merger {index} result channel closed early");
            return;
        }
    }

    tracing::trace!("Merger {index} drained");
}

/// Handles to a running fan-in stage.
pub struct FanIn {
    /// The merged result stream. Closes once every input has drained.
    pub results: Receiver<i64>,
    /// Shared per-channel counters, indexed like the inputs.
    pub tally: Arc<Tally>,
    /// Resolves after every merger finished and the result sender was
    /// dropped.
    pub coordinator: JoinHandle<Result<()>>,
}

/// Spawns one merger per input plus the coordinator that closes the result
/// stream.
///
/// The result channel is buffered to the number of inputs.
pub fn fan_in(inputs: Vec<Receiver<i64>>) -> FanIn {
    let (results_tx, results) = async_channel::bounded(inputs.len().max(1));
    let tally = Arc::new(Tally::new(inputs.len()));

    let mergers: Vec<_> = inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| {
            tokio::spawn(forward(index, input, tally.clone(), results_tx.clone()))
        })
        .collect();

    let coordinator = tokio::spawn(async move {
        let joined = futures::future::try_join_all(mergers).await;

        // All mergers have returned and dropped their clones, so dropping this
        // last sender closes the result channel.
        drop(results_tx);
        tracing::debug!("All mergers finished, result channel closed");

        joined.map(|_| ()).map_err(PipelineError::task("merger"))
    });

    FanIn {
        results,
        tally,
        coordinator,
    }
}
