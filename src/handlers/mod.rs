mod health;
mod metrics;
mod contact;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use contact::{client_identifier, contact_handler};
