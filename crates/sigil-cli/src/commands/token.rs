//! Token commands.
//!
//! `sigil token mint` - Mint a token with explicit services and lifetimes.
//! `sigil token session` - Issue the user and agent-video tokens for a channel.

use anyhow::Context;
use clap::ValueEnum;
use sigil_core::{ResolvedCredentials, SigilConfig};
use sigil_token::{
    AccessToken, RANDOM_CHANNEL_LEN, RtcPrivilege, RtmPrivilege, Service, TokenIssuer,
    random_channel,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Services that can be attached to a minted token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ServiceArg {
    /// Realtime media: join, publish audio, video and data.
    Rtc,
    /// Messaging login.
    Rtm,
}

/// Options for `sigil token mint`.
#[derive(Debug, Clone)]
pub struct MintOptions {
    pub app_id: Option<String>,
    pub app_certificate: Option<String>,
    pub channel: String,
    pub uid: u32,
    pub account: Option<String>,
    pub user_id: Option<String>,
    pub services: Vec<ServiceArg>,
    pub expire: String,
    pub privilege_expire: String,
    pub issue_ts: Option<u64>,
    pub salt: Option<u32>,
    pub output: Option<PathBuf>,
}

/// Parse a duration string like "24h", "7d", "30m", "60s" into seconds.
fn parse_duration(s: &str) -> anyhow::Result<u32> {
    let s = s.trim().to_lowercase();

    let (digits, unit) = if let Some(days) = s.strip_suffix('d') {
        (days, 86_400)
    } else if let Some(hours) = s.strip_suffix('h') {
        (hours, 3_600)
    } else if let Some(minutes) = s.strip_suffix('m') {
        (minutes, 60)
    } else if let Some(seconds) = s.strip_suffix('s') {
        (seconds, 1)
    } else {
        // Bare numbers are seconds
        (s.as_str(), 1)
    };

    let value: u32 = digits
        .parse()
        .with_context(|| format!("Invalid duration '{s}'"))?;
    value
        .checked_mul(unit)
        .with_context(|| format!("Duration '{s}' does not fit in 32 bits of seconds"))
}

/// Build the token described by `opts` and return it.
pub fn mint_token(opts: &MintOptions) -> anyhow::Result<String> {
    let app_id = opts
        .app_id
        .clone()
        .context("App id not provided. Either pass --app-id or set APP_ID env var")?;
    let app_certificate = opts.app_certificate.clone().context(
        "App certificate not provided. Either pass --app-certificate or set APP_CERTIFICATE env var",
    )?;

    let expire = parse_duration(&opts.expire)?;
    let privilege_expire = parse_duration(&opts.privilege_expire)?;

    let mut token = AccessToken::new(app_id, app_certificate, expire);
    if let Some(ts) = opts.issue_ts {
        token = token.with_issue_ts(ts);
    }
    if let Some(salt) = opts.salt {
        token = token.with_salt(salt);
    }

    let services = if opts.services.is_empty() {
        vec![ServiceArg::Rtc, ServiceArg::Rtm]
    } else {
        opts.services.clone()
    };

    for service in services {
        match service {
            ServiceArg::Rtc => {
                let mut rtc = match &opts.account {
                    Some(account) => Service::rtc_with_account(&opts.channel, account),
                    None => Service::rtc(&opts.channel, opts.uid),
                };
                for privilege in RtcPrivilege::ALL {
                    rtc.add_privilege(privilege, privilege_expire);
                }
                token.add_service(rtc);
            }
            ServiceArg::Rtm => {
                let user_id = opts
                    .user_id
                    .clone()
                    .or_else(|| opts.account.clone())
                    .unwrap_or_else(|| opts.uid.to_string());
                let mut rtm = Service::rtm(user_id);
                rtm.add_privilege(RtmPrivilege::Login, privilege_expire);
                token.add_service(rtm);
            }
        }
    }

    token.build().context("Failed to build access token")
}

/// Mint a token and print it or write it to a file.
pub fn mint(opts: MintOptions) -> anyhow::Result<()> {
    let token = mint_token(&opts)?;

    if let Some(output_path) = &opts.output {
        fs::write(output_path, &token)?;
        println!("✔ Token written to: {}", output_path.display());
        println!("  Channel: {}", display_or_any(&opts.channel));
        match &opts.account {
            Some(account) => println!("  Account: {}", account),
            None => println!("  Uid: {}", opts.uid),
        }
        println!("  Expires: {}", opts.expire);
    } else {
        println!("{}", token);
    }

    Ok(())
}

fn display_or_any(channel: &str) -> &str {
    if channel.is_empty() { "(any)" } else { channel }
}

/// Issue session tokens for `channel` and render them as pretty JSON.
pub fn session_json(
    config: &SigilConfig,
    credentials: &ResolvedCredentials,
    channel: &str,
) -> anyhow::Result<String> {
    let issuer = TokenIssuer::from_config(credentials, &config.expiry)
        .context("Invalid expiry configuration")?;
    let session = issuer
        .issue_session(channel, &config.participants)
        .context("Failed to issue session tokens")?;
    Ok(serde_json::to_string_pretty(&session)?)
}

/// The requested channel, or a fresh random one when none was given.
fn session_channel(channel: Option<String>) -> String {
    channel
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| random_channel(RANDOM_CHANNEL_LEN))
}

/// Load configuration, resolve credentials from the environment and print
/// the session tokens for `channel` (random when omitted).
pub fn session(
    config_path: Option<&Path>,
    profile: Option<String>,
    channel: Option<String>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let channel = session_channel(channel);

    let mut config = SigilConfig::load_or_default(config_path).context("Failed to load config")?;
    if profile.is_some() {
        config.profile = profile;
    }

    let credentials = config
        .resolve_credentials_from_env()
        .context("Failed to resolve app credentials")?;
    let json = session_json(&config, &credentials, &channel)?;

    if let Some(output_path) = output {
        fs::write(&output_path, &json)?;
        println!("✔ Session tokens written to: {}", output_path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}
