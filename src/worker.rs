//! Fan-out stage: a fixed pool of relays racing on one shared input.
//!
//! Every worker holds a clone of the same [`Receiver`]; the channel hands each
//! value to exactly one of them. Which worker wins is up to the channel, so
//! no particular distribution across workers should be assumed.

use async_channel::{Receiver, Sender};
use core::time::Duration;
use tokio::task::JoinHandle;

/// Relays every value from `input` to `output`, pausing `delay` after each.
///
/// Returns once `input` is closed and drained. `output` is dropped on
/// return, which closes it for the merger reading it.
pub async fn relay(
    worker_id: usize,
    input: Receiver<i64>,
    output: Sender<i64>,
    delay: Duration,
) {
    tracing::trace!("Worker {worker_id} started");

    let mut relayed: u64 = 0;
    loop {
        match input.recv().await {
            Ok(value) => {
                if output.send(value).await.is_err() {
                    tracing::warn!("Worker {worker_id} output closed early");
                    return;
                }
                relayed += 1;
                tokio::time::sleep(delay).await;
            }
            Err(_) => {
                tracing::debug!("Worker {worker_id} drained after {relayed} values");
                return;
            }
        }
    }
}

/// The set of spawned workers together with their private output channels.
pub struct WorkerPool {
    outputs: Vec<Receiver<i64>>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `workers` relays that all read from `input`.
    ///
    /// Each worker gets its own capacity-1 output channel.
    pub fn spawn(workers: usize, input: Receiver<i64>, delay: Duration) -> Self {
        let mut outputs = Vec::with_capacity(workers);
        let mut handles = Vec::with_capacity(workers);

        for worker_id in 0..workers {
            let (tx, rx) = async_channel::bounded(1);
            handles.push(tokio::spawn(relay(worker_id, input.clone(), tx, delay)));
            outputs.push(rx);
        }

        Self { outputs, handles }
    }

    /// Splits the pool into the output receivers, in worker order, and the
    /// worker task handles.
    pub fn into_parts(self) -> (Vec<Receiver<i64>>, Vec<JoinHandle<()>>) {
        (self.outputs, self.handles)
    }
}
