//! App credential configuration.

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Where to find the app id and app certificate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Environment variable containing the app id.
    #[serde(default = "default_app_id_env")]
    pub app_id_env: String,

    /// Environment variable containing the app certificate.
    #[serde(default = "default_app_certificate_env")]
    pub app_certificate_env: String,

    /// Inline app id, used when the environment variable is unset.
    #[serde(default)]
    pub app_id: Option<String>,

    /// Path to a file holding the app certificate.
    #[serde(default)]
    pub app_certificate_file: Option<PathBuf>,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            app_id_env: default_app_id_env(),
            app_certificate_env: default_app_certificate_env(),
            app_id: None,
            app_certificate_file: None,
        }
    }
}

/// Credentials after environment and file resolution.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedCredentials {
    pub app_id: String,
    /// `None` means open mode: tokens are not signed.
    pub app_certificate: Option<String>,
}

impl fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field("app_id", &self.app_id)
            .field(
                "app_certificate",
                &self.app_certificate.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl CredentialsConfig {
    /// Resolve credentials. The environment wins over inline values and files;
    /// with a profile, `NAME_PROFILE` is consulted before `NAME`.
    pub fn resolve<F>(&self, profile: Option<&str>, lookup: F) -> Result<ResolvedCredentials, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_id = lookup_with_profile(&lookup, &self.app_id_env, profile)
            .or_else(|| self.app_id.clone())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingAppId {
                env: self.app_id_env.clone(),
            })?;

        let app_certificate = match lookup_with_profile(&lookup, &self.app_certificate_env, profile) {
            Some(cert) => Some(cert),
            None => self.read_certificate_file()?,
        }
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

        Ok(ResolvedCredentials {
            app_id,
            app_certificate,
        })
    }

    fn read_certificate_file(&self) -> Result<Option<String>, ConfigError> {
        if let Some(path) = &self.app_certificate_file {
            if path.exists() {
                return Ok(Some(std::fs::read_to_string(path)?));
            }
        }
        Ok(None)
    }
}

/// Look up `name`, preferring `{name}_{profile}` when a profile is given.
pub fn lookup_with_profile<F>(lookup: &F, name: &str, profile: Option<&str>) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(profile) = profile.filter(|p| !p.is_empty()) {
        if let Some(value) = lookup(&format!("{name}_{profile}")) {
            return Some(value);
        }
    }
    lookup(name)
}

/// Process environment lookup.
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn default_app_id_env() -> String {
    "APP_ID".to_string()
}

fn default_app_certificate_env() -> String {
    "APP_CERTIFICATE".to_string()
}
