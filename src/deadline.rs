//! Deadline-driven cancellation of the source.

use core::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cancels `cancel` once `after` has elapsed.
///
/// The timer task exits early if the token is cancelled by someone else
/// first.
pub fn arm(cancel: CancellationToken, after: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            () = tokio::time::sleep(after) => {
                tracing::info!("Deadline of {after:?} elapsed, cancelling source");
                cancel.cancel();
            }
            () = cancel.cancelled() => {
                tracing::debug!("Cancelled before the {after:?} deadline");
            }
        }
    })
}
