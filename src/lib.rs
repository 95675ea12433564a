// Contact form backend with an in-memory fixed-window rate limiter

pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod observability;
pub mod rate_limit;
pub mod routes;
pub mod state;
pub mod sweeper;
pub mod worker;

pub use error::{AppError, ConfigError, Result};
pub use rate_limit::{RateLimitConfig, RateLimitResult, RateLimiter};
pub use sweeper::{SweeperHandle, spawn_sweeper};
