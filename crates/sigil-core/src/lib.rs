// Configuration types shared across all Sigil crates
pub mod config;

pub use config::{
    ConfigError, CredentialsConfig, ExpiryConfig, ParticipantConfig, ResolvedCredentials,
    SigilConfig, env_lookup, lookup_with_profile,
};
