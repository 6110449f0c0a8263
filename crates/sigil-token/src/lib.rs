//! # sigil-token
//!
//! Signed access tokens for realtime channels and messaging.
//!
//! This crate provides functionality for:
//! - Packing integers, strings and privilege maps in the token wire format
//! - Describing capability services and their privileges
//! - Deriving a per-token signing key and building versioned tokens
//! - Deciding which services a participant receives (issuance policy)
//!
//! ## Token Layout
//!
//! | Part | Contents |
//! |------|----------|
//! | Version | literal `007` |
//! | Body | base64 of the zlib-compressed `string(signature) || signing_info` |
//! | `signing_info` | app id, issue timestamp, validity window, salt, services |
//!
//! ## Why this format?
//!
//! - **Self-contained**: a verifier holding the app certificate recomputes the
//!   signing key from the timestamp and salt carried in the token
//! - **Deterministic**: privileges and services are packed in ascending id order
//! - **Extensible**: services are tagged segments, new types slot in without
//!   changing the envelope

pub mod access_token;
pub mod error;
pub mod issuance;
pub mod packing;
pub mod service;

pub use access_token::{AccessToken, FixedSalt, SaltSource, SystemSalt, VERSION};
pub use error::TokenError;
pub use issuance::{
    DEFAULT_PRIVILEGE_EXPIRE_SECS, IssuanceMode, IssuedCredential, RANDOM_CHANNEL_LEN,
    SessionTokens, TokenIssuer, random_channel,
};
pub use service::{RtcPrivilege, RtmPrivilege, Service, ServiceKind};
