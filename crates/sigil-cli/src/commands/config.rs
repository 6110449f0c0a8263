//! Configuration commands.
//!
//! `sigil config check` - Resolve configuration and report the issuance mode.

use anyhow::Context;
use sigil_core::{ResolvedCredentials, SigilConfig};
use sigil_token::{IssuanceMode, TokenIssuer};
use std::path::Path;

/// Summarize resolved configuration without revealing the certificate.
pub fn describe(config: &SigilConfig, credentials: &ResolvedCredentials) -> anyhow::Result<Vec<String>> {
    let issuer = TokenIssuer::from_config(credentials, &config.expiry)
        .context("Invalid expiry configuration")?;

    let mut lines = vec![
        format!("  Profile: {}", config.profile.as_deref().unwrap_or("(none)")),
        format!("  App id: {}", credentials.app_id),
    ];
    match issuer.mode() {
        IssuanceMode::Signed => lines.push("  Mode: signed (app certificate configured)".to_string()),
        IssuanceMode::Open => {
            lines.push("  Mode: open (no app certificate, tokens are the bare app id)".to_string())
        }
    }
    lines.push(format!("  Method: {}", issuer.mode().method()));
    lines.push(format!("  Token expire: {}s", config.expiry.token_expire_secs));
    lines.push(format!("  Privilege expire: {}s", config.expiry.privilege_expire_secs));
    lines.push(format!(
        "  Participants: agent={} user={} agent_video={}",
        config.participants.agent_uid,
        config.participants.user_uid,
        config.participants.agent_video_uid
    ));
    Ok(lines)
}

/// Load configuration, resolve credentials from the environment and print a summary.
pub fn check(config_path: Option<&Path>, profile: Option<String>) -> anyhow::Result<()> {
    let mut config = SigilConfig::load_or_default(config_path).context("Failed to load config")?;
    if profile.is_some() {
        config.profile = profile;
    }

    let credentials = config
        .resolve_credentials_from_env()
        .context("Failed to resolve app credentials")?;

    println!("✔ Configuration is valid");
    println!();
    for line in describe(&config, &credentials)? {
        println!("{}", line);
    }

    if credentials.app_certificate.is_none() {
        println!();
        println!("⚠️  Open mode: anyone with the app id can join channels of this project.");
    }

    Ok(())
}
