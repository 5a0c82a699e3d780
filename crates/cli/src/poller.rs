//! Cancellable periodic task.
//!
//! A [`Poller`] runs one async job per period on a background task. The job
//! is awaited before the next tick is taken, so at most one poll is in flight
//! and late ticks are delayed instead of bunched up. Cancelling the token, or
//! dropping the `Poller`, stops the task at the next await point, including
//! in the middle of a poll.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Handle to a running periodic task. Dropping it cancels the task.
pub struct Poller {
    token: CancellationToken,
    handle: JoinHandle<()>,
    _guard: DropGuard,
}

impl Poller {
    /// Start polling: `job` runs immediately, then once per `period`, until
    /// `token` is cancelled.
    pub fn spawn<F, Fut>(token: CancellationToken, period: Duration, mut job: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancelled = token.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = cancelled.cancelled() => break,
                    _ = interval.tick() => {}
                }
                tokio::select! {
                    () = cancelled.cancelled() => break,
                    () = job() => {}
                }
            }

            tracing::debug!("Poller stopped");
        });

        Self {
            _guard: token.clone().drop_guard(),
            token,
            handle,
        }
    }

    /// Cancel the task and wait for it to finish.
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "Poller task failed");
        }
    }
}
