use clap::{Parser, ValueEnum};
use std::time::Duration;

use crate::error::ConfigError;
use crate::rate_limit::RateLimitConfig;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "contact-gateway")]
#[command(about = "Rate limited contact form backend")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // Rate limit max requests per window
    #[arg(long, default_value_t = 3)]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, default_value_t = 3600)]
    pub rate_window: u64,

    // How often expired rate limit entries are swept, in seconds
    #[arg(long, default_value_t = 3600)]
    pub sweep_interval: u64,

    // Where accepted submissions are POSTed; logged only when unset
    #[arg(short, long)]
    pub webhook_url: Option<String>,

    // Key clients by X-Forwarded-For / X-Real-IP (only behind a trusted proxy)
    #[arg(long)]
    pub trust_forwarded_for: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl Args {
    pub fn rate_limit_config(&self) -> Result<RateLimitConfig, ConfigError> {
        RateLimitConfig::new(self.rate_limit, Duration::from_secs(self.rate_window))?
            .with_sweep_interval(Duration::from_secs(self.sweep_interval))
    }
}
