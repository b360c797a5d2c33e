#![forbid(unsafe_code)]

//! Registry configuration (deterministic, env-overridable).
//!
//! # Environment Variables
//! - `OBSERVER_LIST_ABSENT_POLICY` = key|observer
//! - `OBSERVER_LIST_PRUNE_EMPTY` (bool)
//!
//! Invalid values never abort: they are reported through
//! [`ObserverListConfigParse::errors`] and the default is kept.

use std::env;
use std::fmt;

const ENV_ABSENT_POLICY: &str = "OBSERVER_LIST_ABSENT_POLICY";
const ENV_PRUNE_EMPTY: &str = "OBSERVER_LIST_PRUNE_EMPTY";

/// What "absent" means for [`ObserverList::add_if_absent`](crate::ObserverList::add_if_absent).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AbsentPolicy {
    /// The call is a no-op once the key has an entry, whatever it holds.
    #[default]
    Key,
    /// The call appends unless this exact observer is already under the key.
    Observer,
}

impl AbsentPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "key" => Some(Self::Key),
            "observer" => Some(Self::Observer),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Key => "key",
            Self::Observer => "observer",
        }
    }
}

impl fmt::Display for AbsentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Behavior switches for an [`ObserverList`](crate::ObserverList).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObserverListConfig {
    /// Dedup granularity of `add_if_absent`.
    pub absent_policy: AbsentPolicy,
    /// Also drop live entries with no observers during a traversal.
    pub prune_empty: bool,
}

impl ObserverListConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            absent_policy: AbsentPolicy::Key,
            prune_empty: false,
        }
    }

    #[must_use]
    pub const fn with_absent_policy(mut self, policy: AbsentPolicy) -> Self {
        self.absent_policy = policy;
        self
    }

    #[must_use]
    pub const fn with_prune_empty(mut self, prune_empty: bool) -> Self {
        self.prune_empty = prune_empty;
        self
    }

    /// Parse config from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with_diagnostics().config
    }

    /// Parse config from environment variables and return diagnostics.
    #[must_use]
    pub fn from_env_with_diagnostics() -> ObserverListConfigParse {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Parse config from an arbitrary variable lookup.
    pub fn from_env_with<F>(mut get: F) -> ObserverListConfigParse
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let mut errors = Vec::new();

        if let Some(value) = get(ENV_ABSENT_POLICY) {
            match AbsentPolicy::parse(&value) {
                Some(parsed) => config.absent_policy = parsed,
                None => errors.push(ConfigError::new(
                    "absent_policy",
                    value,
                    "expected key|observer",
                )),
            }
        }

        if let Some(value) = get(ENV_PRUNE_EMPTY) {
            match parse_bool(&value) {
                Some(parsed) => config.prune_empty = parsed,
                None => errors.push(ConfigError::new(
                    "prune_empty",
                    value,
                    "expected bool (1/0/true/false)",
                )),
            }
        }

        ObserverListConfigParse { config, errors }
    }
}

/// Configuration parse result with diagnostics.
#[derive(Debug, Clone)]
pub struct ObserverListConfigParse {
    pub config: ObserverListConfig,
    pub errors: Vec<ConfigError>,
}

impl ObserverListConfigParse {
    /// The parsed config, or every rejected value.
    pub fn into_result(self) -> Result<ObserverListConfig, Vec<ConfigError>> {
        if self.errors.is_empty() {
            Ok(self.config)
        } else {
            Err(self.errors)
        }
    }
}

/// Rejected configuration value with field context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl ConfigError {
    fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for ConfigError {}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
