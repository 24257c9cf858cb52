pub mod tracing;

use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),
}

/// Application environment (dev = local/kind, prod = full k8s)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development, // Local dev, pretty logs
    Production,  // JSON logs for aggregation
}

impl Environment {
    pub fn from_env() -> Self {
        Self::from_source(&ProcessEnv)
    }

    /// Resolve the environment from an arbitrary variable source (`APP_ENV`).
    pub fn from_source(source: &dyn EnvSource) -> Self {
        let app_env = source
            .var("APP_ENV")
            .unwrap_or_else(|| "development".to_string());

        if app_env.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Narrow read-only view over environment variables.
///
/// Configuration resolution goes through this trait instead of `std::env`
/// so that tests can substitute a fixed set of variables.
#[cfg_attr(test, mockall::automock)]
pub trait EnvSource: Send + Sync {
    /// Returns the value of `key`, or `None` when it is unset or empty.
    fn var(&self, key: &str) -> Option<String>;
}

/// [`EnvSource`] backed by the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.is_empty())
    }
}

/// In-memory [`EnvSource`], mostly for tests.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl EnvSource for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).filter(|v| !v.is_empty()).cloned()
    }
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Helper to load environment variable with a default value
pub fn env_or_default(key: &str, default: &str) -> String {
    ProcessEnv
        .var(key)
        .unwrap_or_else(|| default.to_string())
}

/// Helper to load environment variable from `source` or return error
pub fn env_required_in(source: &dyn EnvSource, key: &str) -> Result<String, ConfigError> {
    source
        .var(key)
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Explicit value first, then `key` from `source`. Empty explicit values count as unset.
pub fn explicit_or_env(
    explicit: Option<String>,
    source: &dyn EnvSource,
    key: &str,
) -> Result<String, ConfigError> {
    match explicit.filter(|v| !v.is_empty()) {
        Some(value) => Ok(value),
        None => env_required_in(source, key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[test]
    fn test_environment_defaults_to_development() {
        temp_env::with_var_unset("APP_ENV", || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Development);
            assert!(env.is_development());
            assert!(!env.is_production());
        });
    }

    #[test]
    fn test_environment_production_case_insensitive() {
        temp_env::with_var("APP_ENV", Some("PRODUCTION"), || {
            assert_eq!(Environment::from_env(), Environment::Production);
        });

        let source = MapEnv::new().with_var("APP_ENV", "Production");
        assert_eq!(Environment::from_source(&source), Environment::Production);
    }

    #[test]
    fn test_environment_unknown_defaults_to_development() {
        let source = MapEnv::new().with_var("APP_ENV", "staging");
        assert_eq!(Environment::from_source(&source), Environment::Development);
    }

    #[test]
    fn test_env_or_default() {
        temp_env::with_var("TEST_VAR", Some("test_value"), || {
            assert_eq!(env_or_default("TEST_VAR", "default"), "test_value");
        });
        temp_env::with_var_unset("MISSING_VAR", || {
            assert_eq!(env_or_default("MISSING_VAR", "default_value"), "default_value");
        });
    }

    #[test]
    fn test_process_env_treats_empty_as_unset() {
        temp_env::with_var("EMPTY_VAR", Some(""), || {
            assert_eq!(ProcessEnv.var("EMPTY_VAR"), None);
            assert!(env_required_in(&ProcessEnv, "EMPTY_VAR").is_err());
        });
    }

    #[test]
    fn test_env_required_missing() {
        temp_env::with_var_unset("MISSING_REQUIRED", || {
            let err = env_required_in(&ProcessEnv, "MISSING_REQUIRED").unwrap_err();
            assert_eq!(err, ConfigError::MissingEnvVar("MISSING_REQUIRED".to_string()));
            assert!(err.to_string().contains("MISSING_REQUIRED"));
            assert!(err.to_string().contains("required"));
        });
    }

    #[test]
    fn test_map_env_from_iter() {
        let source: MapEnv = [("A", "1"), ("B", "")].into_iter().collect();
        assert_eq!(source.var("A").as_deref(), Some("1"));
        assert_eq!(source.var("B"), None);
        assert_eq!(source.var("C"), None);
    }

    #[test]
    fn test_explicit_value_wins_without_reading_env() {
        let mut source = MockEnvSource::new();
        source.expect_var().never();

        let value = explicit_or_env(Some("explicit".to_string()), &source, "KEY").unwrap();
        assert_eq!(value, "explicit");
    }

    #[test]
    fn test_empty_explicit_value_falls_back_to_env() {
        let mut source = MockEnvSource::new();
        source
            .expect_var()
            .with(eq("KEY"))
            .times(1)
            .returning(|_| Some("from-env".to_string()));

        let value = explicit_or_env(Some(String::new()), &source, "KEY").unwrap();
        assert_eq!(value, "from-env");
    }

    #[test]
    fn test_missing_everywhere_is_config_error() {
        let mut source = MockEnvSource::new();
        source.expect_var().returning(|_| None);

        let err = explicit_or_env(None, &source, "KEY").unwrap_err();
        assert_eq!(err, ConfigError::MissingEnvVar("KEY".to_string()));
    }
}
