//! Runtime configuration
//!
//! Loading order: defaults, then a TOML or JSON file (chosen by extension),
//! then `SCHAT_*` environment variables, then validation. A configuration
//! that fails validation must abort startup.

use crate::errors::ErrorKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("failed to read config file {}: {reason}", path.display())]
    Read {
        /// File that was requested
        path: PathBuf,
        /// I/O error text
        reason: String,
    },

    /// The file or an environment value did not parse
    #[error("invalid config format: {0}")]
    Format(String),

    /// A setting parsed but is out of range
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// Name of the offending setting
        key: String,
        /// Why it was rejected
        reason: String,
    },
}

impl ConfigError {
    /// Kind-level category of this error
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ConfigurationError
    }

    fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Settings for token issuance, signing and refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchatConfig {
    /// Access-token lifetime in seconds
    pub access_token_ttl_secs: u64,
    /// Refresh-token lifetime in seconds
    pub refresh_token_ttl_secs: u64,
    /// Deadline for gathering a signing quorum, in milliseconds
    pub quorum_timeout_ms: u64,
    /// Quorum threshold `t`
    pub threshold: u16,
    /// Total number of signing parties `n`
    pub parties: u16,
    /// Issue a fresh refresh token on every redemption
    pub rotate_refresh_on_redeem: bool,
    /// How long a party keeps unused round-one nonces, in seconds
    pub nonce_ttl_secs: u64,
    /// Key-material file used by the operator CLI
    pub key_material_path: Option<PathBuf>,
}

impl Default for SchatConfig {
    fn default() -> Self {
        Self {
            access_token_ttl_secs: 86_400,
            refresh_token_ttl_secs: 604_800,
            quorum_timeout_ms: 5_000,
            threshold: 2,
            parties: 3,
            rotate_refresh_on_redeem: false,
            nonce_ttl_secs: 60,
            key_material_path: None,
        }
    }
}

impl SchatConfig {
    /// Prefix for environment overrides
    pub const ENV_PREFIX: &'static str = "SCHAT_";

    /// Load from an optional file, merge the process environment, validate
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.merge_with_vars(std::env::vars())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a `.toml` or `.json` file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&content)
                .map_err(|e| ConfigError::Format(format!("invalid TOML: {e}"))),
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| ConfigError::Format(format!("invalid JSON: {e}"))),
            other => Err(ConfigError::Format(format!(
                "unsupported config file extension: {other:?}"
            ))),
        }
    }

    /// Apply `SCHAT_*` overrides from the given variables
    pub fn merge_with_vars<I>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(Self::ENV_PREFIX) else {
                continue;
            };
            match name {
                "ACCESS_TOKEN_TTL_SECS" => self.access_token_ttl_secs = parse(&key, &value)?,
                "REFRESH_TOKEN_TTL_SECS" => self.refresh_token_ttl_secs = parse(&key, &value)?,
                "QUORUM_TIMEOUT_MS" => self.quorum_timeout_ms = parse(&key, &value)?,
                "THRESHOLD" => self.threshold = parse(&key, &value)?,
                "PARTIES" => self.parties = parse(&key, &value)?,
                "ROTATE_REFRESH_ON_REDEEM" => self.rotate_refresh_on_redeem = parse(&key, &value)?,
                "NONCE_TTL_SECS" => self.nonce_ttl_secs = parse(&key, &value)?,
                "KEY_MATERIAL_PATH" => self.key_material_path = Some(PathBuf::from(value)),
                _ => tracing::debug!(variable = %key, "ignoring unknown configuration variable"),
            }
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threshold == 0 {
            return Err(ConfigError::invalid("threshold", "must be at least 1"));
        }
        if self.threshold > self.parties {
            return Err(ConfigError::invalid(
                "threshold",
                format!("{} exceeds party count {}", self.threshold, self.parties),
            ));
        }
        if self.access_token_ttl_secs == 0 {
            return Err(ConfigError::invalid("access_token_ttl_secs", "must be positive"));
        }
        if self.refresh_token_ttl_secs < self.access_token_ttl_secs {
            return Err(ConfigError::invalid(
                "refresh_token_ttl_secs",
                "must not be shorter than the access-token lifetime",
            ));
        }
        if self.quorum_timeout_ms == 0 {
            return Err(ConfigError::invalid("quorum_timeout_ms", "must be positive"));
        }
        if self.nonce_ttl_secs == 0 {
            return Err(ConfigError::invalid("nonce_ttl_secs", "must be positive"));
        }
        Ok(())
    }

    /// Access-token lifetime
    pub fn access_token_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_ttl_secs)
    }

    /// Refresh-token lifetime
    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_ttl_secs)
    }

    /// Signing deadline
    pub fn quorum_timeout(&self) -> Duration {
        Duration::from_millis(self.quorum_timeout_ms)
    }

    /// Lifetime of unused round-one nonces
    pub fn nonce_ttl(&self) -> Duration {
        Duration::from_secs(self.nonce_ttl_secs)
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(key, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = SchatConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.threshold, 2);
        assert_eq!(config.parties, 3);
    }

    #[test]
    fn threshold_bounds_are_enforced() {
        let config = SchatConfig {
            threshold: 4,
            ..SchatConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationError);

        let config = SchatConfig {
            threshold: 0,
            ..SchatConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn refresh_must_outlive_access() {
        let config = SchatConfig {
            access_token_ttl_secs: 100,
            refresh_token_ttl_secs: 50,
            ..SchatConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_overrides_apply_and_unknown_keys_are_ignored() {
        let mut config = SchatConfig::default();
        config
            .merge_with_vars(vec![
                ("SCHAT_THRESHOLD".to_string(), "3".to_string()),
                ("SCHAT_PARTIES".to_string(), "5".to_string()),
                ("SCHAT_ROTATE_REFRESH_ON_REDEEM".to_string(), "true".to_string()),
                ("SCHAT_SOMETHING_ELSE".to_string(), "x".to_string()),
                ("HOME".to_string(), "/root".to_string()),
            ])
            .unwrap();
        assert_eq!(config.threshold, 3);
        assert_eq!(config.parties, 5);
        assert!(config.rotate_refresh_on_redeem);
    }

    #[test]
    fn bad_env_value_is_rejected() {
        let mut config = SchatConfig::default();
        let err = config
            .merge_with_vars(vec![("SCHAT_THRESHOLD".to_string(), "two".to_string())])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn loads_partial_toml_over_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "threshold = 3\nparties = 4\nquorum_timeout_ms = 250").unwrap();

        let config = SchatConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.threshold, 3);
        assert_eq!(config.parties, 4);
        assert_eq!(config.quorum_timeout(), Duration::from_millis(250));
        assert_eq!(config.access_token_ttl_secs, 86_400);
    }

    #[test]
    fn loads_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"access_token_ttl_secs": 60, "refresh_token_ttl_secs": 120}}"#).unwrap();

        let config = SchatConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.access_token_ttl(), Duration::from_secs(60));
        assert_eq!(config.refresh_token_ttl(), Duration::from_secs(120));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        assert!(matches!(
            SchatConfig::load_from_file(file.path()),
            Err(ConfigError::Format(_))
        ));
    }
}
