//! The sequence source at the head of the pipeline.

use async_channel::Sender;
use tokio_util::sync::CancellationToken;

/// Emits `1, 2, 3, ...` onto `output` until `cancel` fires.
///
/// `on_emit` runs once per value, only after the value has been accepted by
/// the channel. A send that is still pending when cancellation wins the
/// race is dropped and never observed. Dropping `output` on return is what
/// closes the stream for every downstream stage.
pub async fn generate<F>(cancel: CancellationToken, output: Sender<i64>, mut on_emit: F)
where
    F: FnMut(i64),
{
    tracing::trace!("Source started");

    let mut next: i64 = 1;
    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                tracing::debug!("Source cancelled after {} values", next - 1);
                break;
            }
            sent = output.send(next) => {
                if sent.is_err() {
                    // Nobody is left to read; nothing downstream can drain.
                    tracing::warn!("Source output has no receivers, stopping at {next}");
                    break;
                }
                on_emit(next);
                next += 1;
            }
        }
    }

    drop(output);
    tracing::trace!("Source stopped");
}
