//! Engine configuration: timeouts, polling and stale-retry policy.
//!
//! Loaded from YAML (every field optional) and optionally overridden from
//! the environment:
//!
//! ```yaml
//! poll_interval_ms: 250
//! timeouts:
//!   default_ms: 15000
//! stale_retry:
//!   max_retries: 5
//!   backoff:
//!     kind: exponential
//!     initial_ms: 25
//!     max_ms: 400
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::result::{LocusError, LocusResult};

/// Env var overriding [`Timeouts::default_ms`]
pub const ENV_DEFAULT_TIMEOUT_MS: &str = "LOCUS_DEFAULT_TIMEOUT_MS";
/// Env var overriding [`LocusConfig::poll_interval_ms`]
pub const ENV_POLL_INTERVAL_MS: &str = "LOCUS_POLL_INTERVAL_MS";
/// Env var overriding [`StaleRetryPolicy::max_retries`]
pub const ENV_STALE_MAX_RETRIES: &str = "LOCUS_STALE_MAX_RETRIES";

/// Named timeouts used by element operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Short probes
    pub low_ms: u64,
    /// Waits called without an explicit timeout
    pub default_ms: u64,
    /// Disappearance check between click attempts
    pub minimum_element_ms: u64,
    /// Whole scroll-search run
    pub scroll_search_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            low_ms: 2_000,
            default_ms: 10_000,
            minimum_element_ms: 2_000,
            scroll_search_ms: 100_000,
        }
    }
}

impl Timeouts {
    /// Short probe timeout
    #[must_use]
    pub const fn low(&self) -> Duration {
        Duration::from_millis(self.low_ms)
    }

    /// Default wait timeout
    #[must_use]
    pub const fn default_wait(&self) -> Duration {
        Duration::from_millis(self.default_ms)
    }

    /// Minimum element wait
    #[must_use]
    pub const fn minimum_element(&self) -> Duration {
        Duration::from_millis(self.minimum_element_ms)
    }

    /// Scroll-search timeout
    #[must_use]
    pub const fn scroll_search(&self) -> Duration {
        Duration::from_millis(self.scroll_search_ms)
    }
}

/// Delay between stale-element re-resolutions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backoff {
    /// Same delay before every retry
    Fixed {
        /// Delay in milliseconds
        delay_ms: u64,
    },
    /// Delay doubles on each retry, capped at `max_ms`
    Exponential {
        /// First delay in milliseconds
        initial_ms: u64,
        /// Upper bound in milliseconds
        max_ms: u64,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Fixed { delay_ms: 50 }
    }
}

impl Backoff {
    /// Delay before retry number `retry` (1-based)
    #[must_use]
    pub fn delay(&self, retry: u32) -> Duration {
        match *self {
            Self::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            Self::Exponential { initial_ms, max_ms } => {
                let shift = retry.saturating_sub(1).min(32);
                let ms = initial_ms.saturating_mul(1u64 << shift).min(max_ms);
                Duration::from_millis(ms)
            }
        }
    }
}

/// Bound on re-resolution after a stale element reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaleRetryPolicy {
    /// Re-resolutions allowed after the first attempt
    pub max_retries: u32,
    /// Delay between attempts
    pub backoff: Backoff,
}

impl Default for StaleRetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 10,
            backoff: Backoff::default(),
        }
    }
}

impl StaleRetryPolicy {
    /// Policy with `max_retries` and the default backoff
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Never retry
    #[must_use]
    pub fn no_retry() -> Self {
        Self::new(0)
    }

    /// Set the backoff
    #[must_use]
    pub const fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Total attempts, counting the first
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocusConfig {
    /// Named timeouts
    pub timeouts: Timeouts,
    /// Delay between predicate evaluations
    pub poll_interval_ms: u64,
    /// Stale-element recovery bound
    pub stale_retry: StaleRetryPolicy,
}

impl Default for LocusConfig {
    fn default() -> Self {
        Self {
            timeouts: Timeouts::default(),
            poll_interval_ms: 500,
            stale_retry: StaleRetryPolicy::default(),
        }
    }
}

impl LocusConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the poll interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the default wait timeout
    #[must_use]
    pub const fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.default_ms = timeout.as_millis() as u64;
        self
    }

    /// Set all named timeouts
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set the stale-retry policy
    #[must_use]
    pub const fn with_stale_retry(mut self, policy: StaleRetryPolicy) -> Self {
        self.stale_retry = policy;
        self
    }

    /// Poll interval as a duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Parse YAML; missing fields take their defaults
    pub fn from_yaml_str(yaml: &str) -> LocusResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file
    pub fn from_path(path: impl AsRef<Path>) -> LocusResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> LocusResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Apply `LOCUS_*` environment overrides
    pub fn with_env_overrides(self) -> LocusResult<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn with_overrides_from<F>(mut self, lookup: F) -> LocusResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_DEFAULT_TIMEOUT_MS) {
            self.timeouts.default_ms = parse_number(ENV_DEFAULT_TIMEOUT_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_POLL_INTERVAL_MS) {
            self.poll_interval_ms = parse_number(ENV_POLL_INTERVAL_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_STALE_MAX_RETRIES) {
            self.stale_retry.max_retries = parse_number(ENV_STALE_MAX_RETRIES, &v)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject values the poller cannot work with
    pub fn validate(&self) -> LocusResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(LocusError::Config {
                message: "poll_interval_ms must be greater than zero".to_string(),
            });
        }
        if let Backoff::Exponential { initial_ms, max_ms } = self.stale_retry.backoff {
            if initial_ms > max_ms {
                return Err(LocusError::Config {
                    message: format!(
                        "stale_retry.backoff.initial_ms ({initial_ms}) exceeds max_ms ({max_ms})"
                    ),
                });
            }
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> LocusResult<T> {
    value.trim().parse().map_err(|_| LocusError::Config {
        message: format!("{key} must be a non-negative integer, got {value:?}"),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    mod defaults_tests {
        use super::*;

        #[test]
        fn test_default_timeouts() {
            let config = LocusConfig::default();
            assert_eq!(config.timeouts.low(), Duration::from_secs(2));
            assert_eq!(config.timeouts.default_wait(), Duration::from_secs(10));
            assert_eq!(config.timeouts.minimum_element(), Duration::from_secs(2));
            assert_eq!(config.timeouts.scroll_search(), Duration::from_secs(100));
            assert_eq!(config.poll_interval(), Duration::from_millis(500));
        }

        #[test]
        fn test_builder() {
            let config = LocusConfig::new()
                .with_poll_interval(Duration::from_millis(20))
                .with_default_timeout(Duration::from_secs(1))
                .with_stale_retry(StaleRetryPolicy::no_retry());
            assert_eq!(config.poll_interval_ms, 20);
            assert_eq!(config.timeouts.default_ms, 1000);
            assert_eq!(config.stale_retry.max_attempts(), 1);
        }
    }

    mod backoff_tests {
        use super::*;

        #[test]
        fn test_fixed() {
            let backoff = Backoff::Fixed { delay_ms: 30 };
            assert_eq!(backoff.delay(1), Duration::from_millis(30));
            assert_eq!(backoff.delay(7), Duration::from_millis(30));
        }

        #[test]
        fn test_exponential_is_capped() {
            let backoff = Backoff::Exponential {
                initial_ms: 10,
                max_ms: 50,
            };
            assert_eq!(backoff.delay(1), Duration::from_millis(10));
            assert_eq!(backoff.delay(2), Duration::from_millis(20));
            assert_eq!(backoff.delay(3), Duration::from_millis(40));
            assert_eq!(backoff.delay(4), Duration::from_millis(50));
            assert_eq!(backoff.delay(60), Duration::from_millis(50));
        }
    }

    mod yaml_tests {
        use super::*;

        #[test]
        fn test_partial_yaml_keeps_defaults() {
            let config = LocusConfig::from_yaml_str(
                "poll_interval_ms: 250\ntimeouts:\n  default_ms: 15000\n",
            )
            .unwrap();
            assert_eq!(config.poll_interval_ms, 250);
            assert_eq!(config.timeouts.default_ms, 15_000);
            assert_eq!(config.timeouts.low_ms, 2_000);
            assert_eq!(config.stale_retry, StaleRetryPolicy::default());
        }

        #[test]
        fn test_backoff_yaml() {
            let config = LocusConfig::from_yaml_str(
                "stale_retry:\n  max_retries: 3\n  backoff:\n    kind: exponential\n    initial_ms: 25\n    max_ms: 400\n",
            )
            .unwrap();
            assert_eq!(config.stale_retry.max_retries, 3);
            assert_eq!(
                config.stale_retry.backoff,
                Backoff::Exponential {
                    initial_ms: 25,
                    max_ms: 400
                }
            );
        }

        #[test]
        fn test_yaml_round_trip() {
            let config = LocusConfig::new().with_poll_interval(Duration::from_millis(75));
            let yaml = config.to_yaml().unwrap();
            assert_eq!(LocusConfig::from_yaml_str(&yaml).unwrap(), config);
        }

        #[test]
        fn test_zero_poll_interval_rejected() {
            let err = LocusConfig::from_yaml_str("poll_interval_ms: 0").unwrap_err();
            assert!(matches!(err, LocusError::Config { .. }));
        }

        #[test]
        fn test_inverted_backoff_rejected() {
            let err = LocusConfig::from_yaml_str(
                "stale_retry:\n  backoff:\n    kind: exponential\n    initial_ms: 500\n    max_ms: 10\n",
            )
            .unwrap_err();
            assert!(matches!(err, LocusError::Config { .. }));
        }

        #[test]
        fn test_from_path() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "timeouts:\n  scroll_search_ms: 30000").unwrap();
            let config = LocusConfig::from_path(file.path()).unwrap();
            assert_eq!(config.timeouts.scroll_search_ms, 30_000);
        }

        #[test]
        fn test_missing_file_is_io_error() {
            let dir = tempfile::tempdir().unwrap();
            let err = LocusConfig::from_path(dir.path().join("absent.yaml")).unwrap_err();
            assert!(matches!(err, LocusError::Io(_)));
        }
    }

    mod env_tests {
        use super::*;

        #[test]
        fn test_overrides_applied() {
            let vars: HashMap<&str, &str> = [
                (ENV_DEFAULT_TIMEOUT_MS, "3000"),
                (ENV_POLL_INTERVAL_MS, " 40 "),
                (ENV_STALE_MAX_RETRIES, "2"),
            ]
            .into_iter()
            .collect();
            let config = LocusConfig::new()
                .with_overrides_from(|k| vars.get(k).map(|v| (*v).to_string()))
                .unwrap();
            assert_eq!(config.timeouts.default_ms, 3000);
            assert_eq!(config.poll_interval_ms, 40);
            assert_eq!(config.stale_retry.max_retries, 2);
        }

        #[test]
        fn test_bad_override_rejected() {
            let err = LocusConfig::new()
                .with_overrides_from(|k| (k == ENV_POLL_INTERVAL_MS).then(|| "fast".to_string()))
                .unwrap_err();
            assert!(err.to_string().contains(ENV_POLL_INTERVAL_MS));
        }
    }
}
