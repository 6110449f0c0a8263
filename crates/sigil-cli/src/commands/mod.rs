//! CLI command implementations for Sigil.

pub mod config;
pub mod token;
