//! Access token construction and signing.
//!
//! A token is built from an app id, an app certificate and one or more
//! [`Service`]s. The certificate never appears on the wire: it is folded into a
//! per-token signing key together with the issue timestamp and a random salt.
//!
//! ```text
//! k1           = HMAC-SHA256(key = u32(issue_ts), msg = app_certificate)
//! signing_key  = HMAC-SHA256(key = u32(salt),     msg = k1)
//! signing_info = string(app_id) || u32(issue_ts) || u32(expire) || u32(salt)
//!                || u16(service_count) || service...   (ascending type id)
//! signature    = HMAC-SHA256(key = signing_key, msg = signing_info)
//! token        = "007" || base64(zlib(string(signature) || signing_info))
//! ```

use crate::error::TokenError;
use crate::packing::{ByteWriter, checked_u16, checked_u32};
use crate::service::Service;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::Utc;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

type HmacSha256 = Hmac<Sha256>;

/// Version tag prefixed to every token.
pub const VERSION: &str = "007";

/// Validity window used when the caller does not pick one.
pub const DEFAULT_EXPIRE_SECS: u32 = 900;

/// Largest salt value drawn by [`SystemSalt`].
pub const MAX_SALT: u32 = 99_999_999;

const CREDENTIAL_LEN: usize = 32;

/// Source of per-token salts.
pub trait SaltSource: Send + Sync {
    fn next_salt(&self) -> u32;
}

/// Salts drawn uniformly from `1..=MAX_SALT` with the thread-local CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSalt;

impl SaltSource for SystemSalt {
    fn next_salt(&self) -> u32 {
        rand::rng().random_range(1..=MAX_SALT)
    }
}

/// Always returns the same salt. Useful for reproducible output.
#[derive(Debug, Clone, Copy)]
pub struct FixedSalt(pub u32);

impl SaltSource for FixedSalt {
    fn next_salt(&self) -> u32 {
        self.0
    }
}

/// Builder for a single signed access token.
///
/// Register services with [`add_service`](Self::add_service), then call
/// [`build`](Self::build) once.
pub struct AccessToken {
    app_id: String,
    app_certificate: String,
    /// `None` when the system clock read before the unix epoch.
    issue_ts: Option<u64>,
    expire: u32,
    salt: u32,
    services: BTreeMap<u16, Service>,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("app_id", &self.app_id)
            .field("app_certificate", &"<redacted>")
            .field("issue_ts", &self.issue_ts)
            .field("expire", &self.expire)
            .field("salt", &self.salt)
            .field("services", &self.services)
            .finish()
    }
}

impl AccessToken {
    /// Create a token issued now, valid for `expire` seconds, with a random salt.
    pub fn new(app_id: impl Into<String>, app_certificate: impl Into<String>, expire: u32) -> Self {
        Self::with_salt_source(app_id, app_certificate, expire, &SystemSalt)
    }

    /// Like [`new`](Self::new) but drawing the salt from `salts`.
    pub fn with_salt_source(
        app_id: impl Into<String>,
        app_certificate: impl Into<String>,
        expire: u32,
        salts: &dyn SaltSource,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            app_certificate: app_certificate.into(),
            issue_ts: unix_now(),
            expire,
            salt: salts.next_salt(),
            services: BTreeMap::new(),
        }
    }

    /// Pin the issue timestamp (unix seconds).
    pub fn with_issue_ts(mut self, issue_ts: u64) -> Self {
        self.issue_ts = Some(issue_ts);
        self
    }

    /// Pin the salt.
    pub fn with_salt(mut self, salt: u32) -> Self {
        self.salt = salt;
        self
    }

    /// Register a service. A service of the same type replaces the previous one.
    pub fn add_service(&mut self, service: Service) -> &mut Self {
        if self.services.insert(service.service_type(), service).is_some() {
            tracing::debug!("replaced previously registered service of the same type");
        }
        self
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn issue_ts(&self) -> Option<u64> {
        self.issue_ts
    }

    pub fn expire(&self) -> u32 {
        self.expire
    }

    pub fn salt(&self) -> u32 {
        self.salt
    }

    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.services.values()
    }

    /// The exact bytes covered by the signature.
    pub fn signing_info(&self) -> Result<Vec<u8>, TokenError> {
        let mut w = ByteWriter::new();
        w.put_string("app_id", &self.app_id)?
            .put_u32(self.packed_issue_ts()?)
            .put_u32(self.expire)
            .put_u32(self.salt)
            .put_u16(checked_u16("service_count", self.services.len() as u64)?);

        for service in self.services.values() {
            service.pack(&mut w)?;
        }
        Ok(w.into_bytes())
    }

    /// Validate, sign, compress and encode the token.
    pub fn build(self) -> Result<String, TokenError> {
        self.check()?;

        let signing_info = self.signing_info()?;
        let signing_key = self.signing_key()?;
        let signature = hmac_sha256(&signing_key, &signing_info);

        let mut content = ByteWriter::new();
        content
            .put_bytes("signature", &signature)?
            .put_raw(&signing_info);

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(content.as_bytes())?;
        let compressed = encoder.finish()?;

        tracing::debug!(
            services = self.services.len(),
            signing_info_len = signing_info.len(),
            compressed_len = compressed.len(),
            "built access token"
        );

        Ok(format!("{VERSION}{}", BASE64.encode(compressed)))
    }

    fn check(&self) -> Result<(), TokenError> {
        validate_credential("app_id", &self.app_id)?;
        validate_credential("app_certificate", &self.app_certificate)?;
        if self.services.is_empty() {
            return Err(TokenError::EmptyServiceSet);
        }
        Ok(())
    }

    fn signing_key(&self) -> Result<[u8; 32], TokenError> {
        let issue_ts = self.packed_issue_ts()?;
        let k1 = hmac_sha256(&issue_ts.to_le_bytes(), self.app_certificate.as_bytes());
        Ok(hmac_sha256(&self.salt.to_le_bytes(), &k1))
    }

    fn packed_issue_ts(&self) -> Result<u32, TokenError> {
        let issue_ts = self.issue_ts.ok_or(TokenError::ClockBeforeEpoch)?;
        checked_u32("issue_ts", issue_ts)
    }
}

/// App ids and certificates are 32 hex digits, either case.
fn validate_credential(field: &'static str, value: &str) -> Result<(), TokenError> {
    if value.len() != CREDENTIAL_LEN {
        return Err(TokenError::InvalidCredential {
            field,
            reason: format!(
                "expected {CREDENTIAL_LEN} hex characters, got {} bytes",
                value.len()
            ),
        });
    }
    if let Some(c) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(TokenError::InvalidCredential {
            field,
            reason: format!("non-hex character {c:?}"),
        });
    }
    Ok(())
}

fn hmac_sha256(key: &[u8], msg: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(msg);
    mac.finalize().into_bytes().into()
}

/// Current unix time, or `None` if the clock is set before the epoch.
fn unix_now() -> Option<u64> {
    u64::try_from(Utc::now().timestamp()).ok()
}
