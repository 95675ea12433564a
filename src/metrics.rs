use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("contact_requests_total", "Total number of contact submissions").unwrap();
    pub static ref RATE_LIMITED: Counter =
        register_counter!("contact_rate_limited_total", "Submissions rejected by the rate limiter").unwrap();
    pub static ref RATE_LIMIT_ENTRIES: Gauge =
        register_gauge!("contact_rate_limit_entries", "Identifiers currently tracked by the rate limiter").unwrap();
    pub static ref SWEEP_REMOVED: Counter =
        register_counter!("contact_sweep_removed_total", "Expired rate limit entries removed by the sweeper").unwrap();
    pub static ref DELIVERY_FAILURES: Counter =
        register_counter!("contact_delivery_failures_total", "Submissions the worker failed to deliver").unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "contact_request_latency_seconds",
        "Accepted submission latency in seconds"
    )
    .unwrap();
}
