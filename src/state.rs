use tokio::sync::mpsc;
use crate::models::QueuedSubmission;
use crate::rate_limit::RateLimiter;
// app's shared state

pub struct AppState {
    pub rate_limiter: RateLimiter,
    pub submit_tx: mpsc::Sender<QueuedSubmission>,
    pub trust_forwarded_for: bool, // honour proxy headers when deriving the client key
}
