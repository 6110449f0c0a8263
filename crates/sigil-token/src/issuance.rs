//! Issuance policy: which services a participant gets, and what happens when
//! no app certificate is configured.
//!
//! With a certificate, every credential carries a realtime media service with
//! all four media privileges and a messaging service with the login privilege.
//! Without one, the issuer runs in **open mode** and hands out the bare app id,
//! which is only accepted by projects that have token authentication disabled.

use crate::access_token::{AccessToken, SaltSource, SystemSalt};
use crate::error::TokenError;
use crate::packing::checked_u32;
use crate::service::{RtcPrivilege, RtmPrivilege, Service};
use rand::Rng;
use serde::Serialize;
use sigil_core::{ExpiryConfig, ParticipantConfig, ResolvedCredentials};
use std::sync::Arc;

/// Privilege lifetime used when the caller does not pick one.
pub const DEFAULT_PRIVILEGE_EXPIRE_SECS: u32 = 86_400;

/// Length of channel names generated by [`random_channel`].
pub const RANDOM_CHANNEL_LEN: usize = 10;

const CHANNEL_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Random channel name of `len` characters from `A-Z0-9`.
pub fn random_channel(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from(CHANNEL_ALPHABET[rng.random_range(0..CHANNEL_ALPHABET.len())]))
        .collect()
}

/// How a credential was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssuanceMode {
    /// Signed token with RTC and RTM services.
    Signed,
    /// Unsigned: the token value is the app id itself.
    Open,
}

impl IssuanceMode {
    /// Human-readable description reported alongside issued tokens.
    pub fn method(&self) -> &'static str {
        match self {
            IssuanceMode::Signed => "v007 tokens with RTC+RTM services",
            IssuanceMode::Open => "APP_ID only (no APP_CERTIFICATE)",
        }
    }
}

/// A token handed to one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedCredential {
    pub token: String,
    pub uid: u32,
    pub mode: IssuanceMode,
}

/// Tokens for the user and the agent's video stream in one channel.
#[derive(Debug, Clone, Serialize)]
pub struct SessionTokens {
    pub channel: String,
    pub agent_uid: u32,
    /// Messaging identity of the agent: `{agent_uid}-{channel}`.
    pub agent_rtm_uid: String,
    pub user_token: IssuedCredential,
    pub agent_video_token: IssuedCredential,
    pub token_generation_method: &'static str,
}

/// Issues credentials for participants of a project.
pub struct TokenIssuer {
    app_id: String,
    app_certificate: Option<String>,
    token_expire: u32,
    privilege_expire: u32,
    issue_ts: Option<u64>,
    salts: Arc<dyn SaltSource>,
}

impl TokenIssuer {
    /// An empty certificate selects open mode.
    pub fn new(app_id: impl Into<String>, app_certificate: Option<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_certificate: app_certificate.filter(|c| !c.is_empty()),
            token_expire: crate::access_token::DEFAULT_EXPIRE_SECS,
            privilege_expire: DEFAULT_PRIVILEGE_EXPIRE_SECS,
            issue_ts: None,
            salts: Arc::new(SystemSalt),
        }
    }

    /// Build an issuer from resolved configuration.
    pub fn from_config(
        credentials: &ResolvedCredentials,
        expiry: &ExpiryConfig,
    ) -> Result<Self, TokenError> {
        let issuer = Self::new(
            credentials.app_id.clone(),
            credentials.app_certificate.clone(),
        )
        .with_token_expire(checked_u32("token_expire_secs", expiry.token_expire_secs)?)
        .with_privilege_expire(checked_u32(
            "privilege_expire_secs",
            expiry.privilege_expire_secs,
        )?);
        Ok(issuer)
    }

    pub fn with_token_expire(mut self, secs: u32) -> Self {
        self.token_expire = secs;
        self
    }

    pub fn with_privilege_expire(mut self, secs: u32) -> Self {
        self.privilege_expire = secs;
        self
    }

    /// Pin the issue timestamp of every token built by this issuer.
    pub fn with_issue_ts(mut self, issue_ts: u64) -> Self {
        self.issue_ts = Some(issue_ts);
        self
    }

    pub fn with_salt_source(mut self, salts: Arc<dyn SaltSource>) -> Self {
        self.salts = salts;
        self
    }

    pub fn mode(&self) -> IssuanceMode {
        if self.app_certificate.is_some() {
            IssuanceMode::Signed
        } else {
            IssuanceMode::Open
        }
    }

    /// Issue a credential letting `uid` join `channel` and log in to messaging.
    pub fn issue(&self, channel: &str, uid: u32) -> Result<IssuedCredential, TokenError> {
        let Some(certificate) = &self.app_certificate else {
            tracing::warn!(uid, channel, "no app certificate configured, issuing unsigned app id");
            return Ok(IssuedCredential {
                token: self.app_id.clone(),
                uid,
                mode: IssuanceMode::Open,
            });
        };

        let mut token = AccessToken::with_salt_source(
            self.app_id.as_str(),
            certificate.as_str(),
            self.token_expire,
            self.salts.as_ref(),
        );
        if let Some(ts) = self.issue_ts {
            token = token.with_issue_ts(ts);
        }

        let mut rtc = Service::rtc(channel, uid);
        for privilege in RtcPrivilege::ALL {
            rtc.add_privilege(privilege, self.privilege_expire);
        }

        let mut rtm = Service::rtm(uid.to_string());
        rtm.add_privilege(RtmPrivilege::Login, self.privilege_expire);

        token.add_service(rtc).add_service(rtm);
        let token = token.build()?;

        tracing::info!(uid, channel, method = IssuanceMode::Signed.method(), "issued token");
        Ok(IssuedCredential {
            token,
            uid,
            mode: IssuanceMode::Signed,
        })
    }

    /// Issue the user and agent-video credentials for one channel.
    pub fn issue_session(
        &self,
        channel: &str,
        participants: &ParticipantConfig,
    ) -> Result<SessionTokens, TokenError> {
        let user_token = self.issue(channel, participants.user_uid)?;
        let agent_video_token = self.issue(channel, participants.agent_video_uid)?;

        Ok(SessionTokens {
            channel: channel.to_string(),
            agent_uid: participants.agent_uid,
            agent_rtm_uid: format!("{}-{channel}", participants.agent_uid),
            user_token,
            agent_video_token,
            token_generation_method: self.mode().method(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_token::FixedSalt;

    const APP_ID: &str = "abcdef1234567890abcdef1234567890";
    const APP_CERT: &str = "fedcba0987654321fedcba0987654321";

    fn signed_issuer() -> TokenIssuer {
        TokenIssuer::new(APP_ID, Some(APP_CERT.to_string()))
            .with_token_expire(86400)
            .with_privilege_expire(86400)
    }

    #[test]
    fn test_signed_issue() {
        let credential = signed_issuer().issue("test_channel", 123).unwrap();
        assert_eq!(credential.uid, 123);
        assert_eq!(credential.mode, IssuanceMode::Signed);
        assert!(credential.token.starts_with("007"));
    }

    #[test]
    fn test_empty_certificate_falls_back_to_app_id() {
        let issuer = TokenIssuer::new(APP_ID, Some(String::new()));
        assert_eq!(issuer.mode(), IssuanceMode::Open);

        let credential = issuer.issue("test_channel", 123).unwrap();
        assert_eq!(credential.token, APP_ID);
        assert_eq!(credential.uid, 123);
        assert_eq!(credential.mode, IssuanceMode::Open);
    }

    #[test]
    fn test_missing_certificate_falls_back_to_app_id() {
        let credential = TokenIssuer::new(APP_ID, None).issue("c", 1).unwrap();
        assert_eq!(credential.token, APP_ID);
    }

    #[test]
    fn test_different_channels_different_tokens() {
        let issuer = signed_issuer();
        let a = issuer.issue("channel1", 123).unwrap();
        let b = issuer.issue("channel2", 123).unwrap();
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_different_uids_different_tokens() {
        let issuer = signed_issuer();
        let a = issuer.issue("test_channel", 123).unwrap();
        let b = issuer.issue("test_channel", 456).unwrap();
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_pinned_issuer_is_reproducible() {
        let issuer = signed_issuer()
            .with_issue_ts(1_700_000_000)
            .with_salt_source(Arc::new(FixedSalt(99)));
        let a = issuer.issue("room1", 42).unwrap();
        let b = issuer.issue("room1", 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_malformed_certificate_is_an_error() {
        let issuer = TokenIssuer::new(APP_ID, Some("not-a-certificate".to_string()));
        assert!(matches!(
            issuer.issue("room1", 1),
            Err(TokenError::InvalidCredential {
                field: "app_certificate",
                ..
            })
        ));
    }

    #[test]
    fn test_session_tokens() {
        let participants = ParticipantConfig::default();
        let session = signed_issuer()
            .issue_session("demo", &participants)
            .unwrap();

        assert_eq!(session.channel, "demo");
        assert_eq!(session.agent_uid, participants.agent_uid);
        assert_eq!(session.agent_rtm_uid, "100-demo");
        assert_eq!(session.user_token.uid, participants.user_uid);
        assert_eq!(session.agent_video_token.uid, participants.agent_video_uid);
        assert_ne!(session.user_token.token, session.agent_video_token.token);
        assert_eq!(session.token_generation_method, "v007 tokens with RTC+RTM services");
    }

    #[test]
    fn test_open_session_serializes_method() {
        let session = TokenIssuer::new(APP_ID, None)
            .issue_session("demo", &ParticipantConfig::default())
            .unwrap();
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["user_token"]["token"], APP_ID);
        assert_eq!(json["user_token"]["mode"], "open");
        assert_eq!(
            json["token_generation_method"],
            "APP_ID only (no APP_CERTIFICATE)"
        );
    }

    #[test]
    fn test_default_privilege_expire_is_one_day() {
        let issuer = TokenIssuer::new(APP_ID, Some(APP_CERT.to_string()));
        assert_eq!(issuer.privilege_expire, 86_400);
        assert_eq!(
            u64::from(DEFAULT_PRIVILEGE_EXPIRE_SECS),
            ExpiryConfig::default().privilege_expire_secs
        );
    }

    #[test]
    fn test_issuer_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TokenIssuer>();
    }

    #[test]
    fn test_random_channel_shape() {
        for _ in 0..100 {
            let channel = random_channel(RANDOM_CHANNEL_LEN);
            assert_eq!(channel.len(), 10);
            assert!(
                channel
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            );
        }
        assert_eq!(random_channel(0), "");
        assert_ne!(random_channel(32), random_channel(32));
    }

    #[test]
    fn test_session_agent_rtm_uid_follows_participants() {
        let participants = ParticipantConfig {
            agent_uid: 7,
            user_uid: 8,
            agent_video_uid: 9,
        };
        let session = TokenIssuer::new(APP_ID, None)
            .issue_session("ROOM42", &participants)
            .unwrap();
        assert_eq!(session.agent_rtm_uid, "7-ROOM42");

        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["agent_rtm_uid"], "7-ROOM42");
    }

    #[test]
    fn test_from_config_rejects_oversized_expiry() {
        let credentials = ResolvedCredentials {
            app_id: APP_ID.to_string(),
            app_certificate: Some(APP_CERT.to_string()),
        };
        let expiry = ExpiryConfig {
            token_expire_secs: u64::from(u32::MAX) + 1,
            privilege_expire_secs: 60,
        };
        assert!(matches!(
            TokenIssuer::from_config(&credentials, &expiry),
            Err(TokenError::EncodingOverflow {
                field: "token_expire_secs",
                ..
            })
        ));
    }
}
