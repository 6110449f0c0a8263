//! Configuration types for Sigil.
//!
//! Configuration is loaded from a YAML file (`sigil.yaml`) and completed from
//! the environment. Secrets are never required in the file: the app certificate
//! is normally read from `APP_CERTIFICATE` (or a profile-suffixed variant).
//!
//! # Example
//!
//! ```yaml
//! profile: STAGING
//! credentials:
//!   app_id_env: APP_ID
//!   app_certificate_env: APP_CERTIFICATE
//! expiry:
//!   token_expire_secs: 900
//!   privilege_expire_secs: 86400
//! participants:
//!   agent_uid: 100
//!   user_uid: 101
//!   agent_video_uid: 102
//! ```

pub mod credentials;
pub mod session;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use credentials::{CredentialsConfig, ResolvedCredentials, env_lookup, lookup_with_profile};
pub use session::{ExpiryConfig, ParticipantConfig};

/// Complete Sigil configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SigilConfig {
    /// Suffix for profile-specific environment variables (`APP_ID_<profile>`).
    #[serde(default)]
    pub profile: Option<String>,

    #[serde(default)]
    pub credentials: CredentialsConfig,

    #[serde(default)]
    pub expiry: ExpiryConfig,

    #[serde(default)]
    pub participants: ParticipantConfig,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("app id not configured: set {env} or credentials.app_id")]
    MissingAppId { env: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SigilConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Reject participant layouts where two roles share a uid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.participants;
        if p.user_uid == p.agent_uid
            || p.user_uid == p.agent_video_uid
            || p.agent_uid == p.agent_video_uid
        {
            return Err(ConfigError::Config(
                "participants.agent_uid, user_uid and agent_video_uid must be distinct".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve credentials with the configured profile.
    pub fn resolve_credentials<F>(&self, lookup: F) -> Result<ResolvedCredentials, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.credentials.resolve(self.profile.as_deref(), lookup)
    }

    /// Resolve credentials from the process environment.
    pub fn resolve_credentials_from_env(&self) -> Result<ResolvedCredentials, ConfigError> {
        self.resolve_credentials(env_lookup)
    }
}
