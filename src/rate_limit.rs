use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::clock::{Clock, SystemClock};
use crate::error::ConfigError;

pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_MAX_REQUESTS: u32 = 3;
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

// Rate limit entry - tracks requests per IP/key
#[derive(Debug, Clone, Copy)]
pub struct RateLimitEntry {
    pub count: u32,
    pub reset_time: Instant,
}

impl RateLimitEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.reset_time
    }
}

// Upper bound for window and sweep interval; keeps `Instant + Duration` from overflowing
pub const MAX_DURATION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

// Limiter settings, only constructible through validated paths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    max_requests: u32,
    window: Duration,
    sweep_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window: DEFAULT_WINDOW,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl RateLimitConfig {
    // Build a config with the default sweep interval
    pub fn new(max_requests: u32, window: Duration) -> Result<Self, ConfigError> {
        if max_requests == 0 {
            return Err(ConfigError::ZeroMaxRequests);
        }
        if window.is_zero() {
            return Err(ConfigError::ZeroWindow);
        }
        if window > MAX_DURATION {
            return Err(ConfigError::WindowTooLarge(MAX_DURATION.as_secs()));
        }
        Ok(Self {
            max_requests,
            window,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        })
    }

    pub fn with_sweep_interval(mut self, sweep_interval: Duration) -> Result<Self, ConfigError> {
        if sweep_interval.is_zero() {
            return Err(ConfigError::ZeroSweepInterval);
        }
        if sweep_interval > MAX_DURATION {
            return Err(ConfigError::SweepIntervalTooLarge(MAX_DURATION.as_secs()));
        }
        self.sweep_interval = sweep_interval;
        Ok(self)
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }
}

// Outcome of a single `check`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_time: Option<Instant>, // only set on denial
}

impl RateLimitResult {
    // Time left until a denied caller may retry
    pub fn retry_after(&self, now: Instant) -> Option<Duration> {
        if self.allowed {
            return None;
        }
        self.reset_time
            .map(|reset| reset.saturating_duration_since(now))
    }
}

// In-memory fixed-window rate limiter.
// Clones share the same store, so one limiter serves the handlers and the sweeper.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

struct Inner {
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    entries: DashMap<String, RateLimitEntry>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                clock,
                entries: DashMap::new(),
            }),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.inner.config
    }

    pub fn now(&self) -> Instant {
        self.inner.clock.now()
    }

    // The entry stays locked across the read-modify-write, so concurrent
    // callers on one identifier can never push `count` past the limit
    pub fn check(&self, identifier: &str) -> RateLimitResult {
        debug_assert!(!identifier.is_empty(), "rate limit identifier must not be empty");

        let now = self.now();
        let max = self.inner.config.max_requests;
        let window = self.inner.config.window;

        let mut entry = self
            .inner
            .entries
            .entry(identifier.to_string())
            .or_insert(RateLimitEntry {
                count: 0,
                reset_time: now + window,
            });

        // fresh entry or window expired? start a new one
        if entry.count == 0 || entry.is_expired(now) {
            entry.count = 1;
            entry.reset_time = now + window;
            return RateLimitResult {
                allowed: true,
                limit: max,
                remaining: max - 1,
                reset_time: None,
            };
        }

        if entry.count >= max {
            return RateLimitResult {
                allowed: false,
                limit: max,
                remaining: 0,
                reset_time: Some(entry.reset_time),
            };
        }

        entry.count += 1;
        RateLimitResult {
            allowed: true,
            limit: max,
            remaining: max - entry.count,
            reset_time: None,
        }
    }

    // Drop every entry whose window has passed, returns how many went away
    pub fn sweep(&self) -> usize {
        let now = self.now();
        let mut removed = 0;
        self.inner.entries.retain(|_, entry| {
            let keep = !entry.is_expired(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    pub fn reset(&self, identifier: &str) -> bool {
        let removed = self.inner.entries.remove(identifier).is_some();
        if removed {
            tracing::info!(identifier = %identifier, "Rate limit reset");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;

    const HOUR: Duration = Duration::from_secs(3600);

    fn limiter(max: u32) -> (RateLimiter, MockClock) {
        let clock = MockClock::default();
        let config = RateLimitConfig::new(max, HOUR).unwrap();
        (RateLimiter::with_clock(config, Arc::new(clock.clone())), clock)
    }

    #[test]
    fn fresh_identifier_is_allowed() {
        let (limiter, _) = limiter(3);

        let result = limiter.check("1.2.3.4");

        assert!(result.allowed);
        assert_eq!(result.remaining, 2);
        assert_eq!(result.limit, 3);
        assert_eq!(result.reset_time, None);
    }

    #[test]
    fn remaining_counts_down_to_zero() {
        let (limiter, _) = limiter(5);

        for expected in (0..5).rev() {
            let result = limiter.check("user-42");
            assert!(result.allowed);
            assert_eq!(result.remaining, expected);
        }
    }

    #[test]
    fn request_past_limit_is_denied_until_reset() {
        let (limiter, clock) = limiter(3);
        for _ in 0..3 {
            limiter.check("1.2.3.4");
        }

        let denied = limiter.check("1.2.3.4");
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        let reset = denied.reset_time.expect("denial carries reset time");
        assert!(reset > clock.now());
        assert_eq!(denied.retry_after(clock.now()), Some(HOUR));

        // still denied, and the count does not creep past the limit
        clock.advance(Duration::from_secs(1800));
        let again = limiter.check("1.2.3.4");
        assert!(!again.allowed);
        assert_eq!(again.reset_time, Some(reset));
        assert_eq!(limiter.inner.entries.get("1.2.3.4").unwrap().count, 3);
    }

    #[test]
    fn contact_form_scenario() {
        let (limiter, clock) = limiter(3);
        let ip = "1.2.3.4";

        let remaining: Vec<u32> = (0..3).map(|_| limiter.check(ip).remaining).collect();
        assert_eq!(remaining, vec![2, 1, 0]);

        let fourth = limiter.check(ip);
        assert!(!fourth.allowed);
        assert_eq!(fourth.remaining, 0);

        clock.advance(HOUR + Duration::from_secs(1));

        let fifth = limiter.check(ip);
        assert!(fifth.allowed);
        assert_eq!(fifth.remaining, 2);
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let (limiter, clock) = limiter(1);
        limiter.check("a");

        clock.advance(HOUR);
        assert!(!limiter.check("a").allowed);

        clock.advance(Duration::from_millis(1));
        assert!(limiter.check("a").allowed);
    }

    #[test]
    fn identifiers_are_independent() {
        let (limiter, _) = limiter(2);
        limiter.check("a");
        limiter.check("a");
        assert!(!limiter.check("a").allowed);

        let other = limiter.check("b");
        assert!(other.allowed);
        assert_eq!(other.remaining, 1);
    }

    #[test]
    fn sweep_only_removes_expired_entries() {
        let (limiter, clock) = limiter(3);
        limiter.check("old");
        clock.advance(Duration::from_secs(1800));
        limiter.check("new");

        // nothing has expired yet, repeated sweeps are no-ops
        for _ in 0..5 {
            assert_eq!(limiter.sweep(), 0);
        }
        assert_eq!(limiter.len(), 2);

        clock.advance(Duration::from_secs(1801));
        assert_eq!(limiter.sweep(), 1);
        assert_eq!(limiter.len(), 1);
        assert!(limiter.inner.entries.contains_key("new"));
    }

    #[test]
    fn sweep_does_not_change_decisions() {
        let (limiter, clock) = limiter(1);
        limiter.check("a");
        clock.advance(HOUR * 2);

        limiter.sweep();

        let result = limiter.check("a");
        assert!(result.allowed);
        assert_eq!(result.remaining, 0);
    }

    #[test]
    fn reset_forgets_identifier() {
        let (limiter, _) = limiter(1);
        limiter.check("a");
        assert!(!limiter.check("a").allowed);

        assert!(limiter.reset("a"));
        assert!(!limiter.reset("a"));
        assert!(limiter.check("a").allowed);
    }

    #[test]
    fn concurrent_checks_never_exceed_limit() {
        let (limiter, _) = limiter(10);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    (0..50).filter(|_| limiter.check("shared").allowed).count()
                })
            })
            .collect();

        let allowed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(allowed, 10);
    }

    #[test]
    fn config_rejects_zero_values() {
        assert_eq!(RateLimitConfig::new(0, HOUR), Err(ConfigError::ZeroMaxRequests));
        assert_eq!(
            RateLimitConfig::new(3, Duration::ZERO),
            Err(ConfigError::ZeroWindow)
        );
        assert_eq!(
            RateLimitConfig::default().with_sweep_interval(Duration::ZERO),
            Err(ConfigError::ZeroSweepInterval)
        );
    }

    #[test]
    fn config_rejects_durations_that_overflow_instants() {
        let huge = Duration::from_secs(u64::MAX);
        assert_eq!(
            RateLimitConfig::new(3, huge),
            Err(ConfigError::WindowTooLarge(MAX_DURATION.as_secs()))
        );
        assert_eq!(
            RateLimitConfig::default().with_sweep_interval(huge),
            Err(ConfigError::SweepIntervalTooLarge(MAX_DURATION.as_secs()))
        );
        assert!(RateLimitConfig::new(3, MAX_DURATION + Duration::from_nanos(1)).is_err());
    }

    #[test]
    fn longest_allowed_window_checks_without_panicking() {
        let clock = MockClock::default();
        let config = RateLimitConfig::new(1, MAX_DURATION)
            .and_then(|c| c.with_sweep_interval(MAX_DURATION))
            .unwrap();
        let limiter = RateLimiter::with_clock(config, Arc::new(clock.clone()));

        assert!(limiter.check("a").allowed);
        let denied = limiter.check("a");
        assert!(!denied.allowed);
        assert_eq!(denied.retry_after(clock.now()), Some(MAX_DURATION));
    }

    #[test]
    fn single_request_limit_never_underflows() {
        // smallest limit any constructor accepts
        let (limiter, clock) = limiter(1);

        let first = limiter.check("a");
        assert!(first.allowed);
        assert_eq!(first.remaining, 0);
        assert_eq!(limiter.check("a").remaining, 0);

        clock.advance(HOUR * 2);
        assert_eq!(limiter.check("a").remaining, 0);
    }

    #[test]
    fn default_config_matches_contact_form_limits() {
        let config = RateLimitConfig::default();
        assert_eq!(config.max_requests(), 3);
        assert_eq!(config.window(), HOUR);
        assert_eq!(config.sweep_interval(), HOUR);
    }
}
