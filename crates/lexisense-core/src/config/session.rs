use super::env::{EnvLookup, read_env_u64};

const ENV_SESSION_IDLE_TIMEOUT_MINUTES: &str = "LEXISENSE_SESSION_IDLE_TIMEOUT_MINUTES";

pub const DEFAULT_SESSION_IDLE_TIMEOUT_MINUTES: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub idle_timeout_minutes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_minutes: DEFAULT_SESSION_IDLE_TIMEOUT_MINUTES,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub(super) fn from_lookup(lookup: EnvLookup<'_>) -> Self {
        Self {
            idle_timeout_minutes: read_env_u64(
                lookup,
                ENV_SESSION_IDLE_TIMEOUT_MINUTES,
                DEFAULT_SESSION_IDLE_TIMEOUT_MINUTES,
            ),
        }
    }
}
