//! Session controller timing configuration.
//!
//! # Environment Variables
//!
//! - `AUTH_IDLE_TIMEOUT_SECS`: Inactivity period before a forced sign-out (default: 900)
//! - `AUTH_RESOLUTION_TIMEOUT_SECS`: Upper bound for the role/profile lookup (default: 10)

use std::env;
use std::time::Duration;

const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 15 * 60;
const DEFAULT_RESOLUTION_TIMEOUT_SECS: u64 = 10;
/// Upper bound for either timeout: one week.
pub const MAX_TIMEOUT_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthConfig {
    /// Forced sign-out after this long without an activity signal.
    pub idle_timeout: Duration,
    /// Bound on the combined role and profile lookup.
    pub resolution_timeout: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            resolution_timeout: Duration::from_secs(DEFAULT_RESOLUTION_TIMEOUT_SECS),
        }
    }
}

impl AuthConfig {
    /// Falls back to the defaults when a variable is unset, unparsable or zero.
    /// Values above [`MAX_TIMEOUT_SECS`] are clamped to it.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            idle_timeout: Duration::from_secs(secs_from_env(
                "AUTH_IDLE_TIMEOUT_SECS",
                DEFAULT_IDLE_TIMEOUT_SECS,
            )),
            resolution_timeout: Duration::from_secs(secs_from_env(
                "AUTH_RESOLUTION_TIMEOUT_SECS",
                DEFAULT_RESOLUTION_TIMEOUT_SECS,
            )),
        }
    }
}

fn secs_from_env(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|secs| *secs > 0)
        .map(|secs: u64| secs.min(MAX_TIMEOUT_SECS))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AuthConfig::default();
        assert_eq!(config.idle_timeout, Duration::from_secs(900));
        assert_eq!(config.resolution_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_secs_from_env_falls_back() {
        assert_eq!(secs_from_env("CAMPUS_TEST_UNSET_TIMEOUT_VAR", 42), 42);
    }

    #[test]
    fn test_secs_from_env_clamps_huge_values() {
        // SAFETY: the variable name is unique to this test.
        unsafe { env::set_var("CAMPUS_TEST_HUGE_TIMEOUT_VAR", u64::MAX.to_string()) };
        assert_eq!(
            secs_from_env("CAMPUS_TEST_HUGE_TIMEOUT_VAR", 42),
            MAX_TIMEOUT_SECS
        );
        unsafe { env::remove_var("CAMPUS_TEST_HUGE_TIMEOUT_VAR") };
    }
}
