//! Token lifetimes and fixed participant ids.

use serde::{Deserialize, Serialize};

/// Lifetimes of issued tokens, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiryConfig {
    /// Validity window of the token itself.
    #[serde(default = "default_token_expire_secs")]
    pub token_expire_secs: u64,

    /// Expiry offset attached to every privilege.
    #[serde(default = "default_expire_secs")]
    pub privilege_expire_secs: u64,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            token_expire_secs: default_token_expire_secs(),
            privilege_expire_secs: default_expire_secs(),
        }
    }
}

/// Participant ids used when issuing session tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantConfig {
    #[serde(default = "default_agent_uid")]
    pub agent_uid: u32,

    #[serde(default = "default_user_uid")]
    pub user_uid: u32,

    /// Uid the agent publishes its avatar video under.
    #[serde(default = "default_agent_video_uid")]
    pub agent_video_uid: u32,
}

impl Default for ParticipantConfig {
    fn default() -> Self {
        Self {
            agent_uid: default_agent_uid(),
            user_uid: default_user_uid(),
            agent_video_uid: default_agent_video_uid(),
        }
    }
}

fn default_token_expire_secs() -> u64 {
    900
}

// 24 hours
fn default_expire_secs() -> u64 {
    24 * 3600
}

fn default_agent_uid() -> u32 {
    100
}

fn default_user_uid() -> u32 {
    101
}

fn default_agent_video_uid() -> u32 {
    102
}
