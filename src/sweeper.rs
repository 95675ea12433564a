use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, interval_at};

use crate::metrics::{RATE_LIMIT_ENTRIES, SWEEP_REMOVED};
use crate::rate_limit::{MAX_DURATION, RateLimiter};

// Handle to the background sweep task.
// Dropping it detaches the task, which keeps sweeping; call `shutdown` to stop it.
pub struct SweeperHandle {
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub async fn shutdown(self) -> Result<(), tokio::task::JoinError> {
        // the task may already be gone if the runtime aborted it
        let _ = self.stop_tx.send(());
        self.task.await
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

// Sweep expired entries every `period`, first run one period after start
pub fn spawn_sweeper(limiter: RateLimiter, period: Duration) -> SweeperHandle {
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    // interval panics on zero and Instant + huge overflows
    let period = period.clamp(Duration::from_millis(1), MAX_DURATION);

    let task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        let mut detached = false;
        tracing::info!(interval = ?period, "Rate limit sweeper started");

        loop {
            tokio::select! {
                stop = &mut stop_rx, if !detached => match stop {
                    Ok(()) => break,
                    Err(_) => {
                        detached = true;
                        tracing::debug!("Sweeper handle dropped, sweeping until runtime shutdown");
                    }
                },
                _ = ticker.tick() => {
                    let removed = limiter.sweep();
                    let remaining = limiter.len();
                    SWEEP_REMOVED.inc_by(removed as f64);
                    RATE_LIMIT_ENTRIES.set(remaining as f64);

                    if removed > 0 {
                        tracing::debug!(removed, remaining, "Swept expired rate limit entries");
                    }
                }
            }
        }

        tracing::info!("Rate limit sweeper stopped");
    });

    SweeperHandle { stop_tx, task }
}
