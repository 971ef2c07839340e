//! Runtime configuration and the controller authorization seam.

use std::env;

use tracing::warn;

/// Environment variable holding the shared controller credential.
pub const ADMIN_KEY_ENV: &str = "ADMIN_KEY";
/// Environment variable overriding the base award for a correct answer.
const BASE_AWARD_ENV: &str = "QUIZ_BASE_AWARD";
/// Environment variable overriding the maximum time bonus.
const MAX_TIME_BONUS_ENV: &str = "QUIZ_MAX_TIME_BONUS";

/// Decides whether a presented controller credential is accepted.
///
/// The coordinator only ever sees this predicate; how the credential is
/// checked (shared secret today) stays at the boundary.
pub trait Authorizer: Send + Sync {
    /// Return `true` when the credential grants controller access.
    fn allows(&self, credential: &str) -> bool;
}

/// Authorizer comparing the presented credential against a configured secret.
pub struct SharedSecret {
    key: String,
}

impl SharedSecret {
    /// Wrap a configured secret. An empty secret denies every credential.
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Read the secret from [`ADMIN_KEY_ENV`], warning when it is missing.
    pub fn from_env() -> Self {
        match env::var(ADMIN_KEY_ENV) {
            Ok(key) if !key.is_empty() => Self::new(key),
            _ => {
                warn!(
                    "{ADMIN_KEY_ENV} is not set; all controller commands will be rejected"
                );
                Self::new(String::new())
            }
        }
    }
}

impl Authorizer for SharedSecret {
    fn allows(&self, credential: &str) -> bool {
        !self.key.is_empty() && self.key == credential
    }
}

/// Point values used when scoring an accepted answer.
///
/// These are policy constants, not invariants: tests rely only on the time
/// bonus being monotonic in the remaining window fraction.
#[derive(Debug, Clone)]
pub struct ScoringPolicy {
    /// Flat award for a correct answer.
    pub base_award: u32,
    /// Bonus granted for an instantaneous correct answer, scaled down
    /// linearly to zero at window expiry.
    pub max_time_bonus: u32,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            base_award: 1000,
            max_time_bonus: 5000,
        }
    }
}

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Scoring constants applied by the answer processor.
    pub scoring: ScoringPolicy,
    /// Number of rows included in a leaderboard snapshot.
    pub leaderboard_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringPolicy::default(),
            leaderboard_size: 10,
        }
    }
}

impl AppConfig {
    /// Load the configuration, applying environment overrides on top of the
    /// built-in defaults.
    pub fn load() -> Self {
        let mut config = Self::default();
        if let Some(value) = env_u32(BASE_AWARD_ENV) {
            config.scoring.base_award = value;
        }
        if let Some(value) = env_u32(MAX_TIME_BONUS_ENV) {
            config.scoring.max_time_bonus = value;
        }
        config
    }
}

fn env_u32(name: &str) -> Option<u32> {
    let raw = env::var(name).ok()?;
    match raw.parse::<u32>() {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(variable = name, value = %raw, error = %err, "ignoring unparsable override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_secret_matches_exact_key() {
        let auth = SharedSecret::new("sekret");
        assert!(auth.allows("sekret"));
        assert!(!auth.allows("Sekret"));
        assert!(!auth.allows(""));
    }

    #[test]
    fn empty_secret_denies_everything() {
        let auth = SharedSecret::new("");
        assert!(!auth.allows(""));
        assert!(!auth.allows("anything"));
    }
}
