use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::token::{MintOptions, ServiceArg};

#[derive(Parser, Debug)]
#[command(name = "sigil", version, about = "Sigil access token CLI")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Token minting and session issuance
    Token {
        #[command(subcommand)]
        cmd: TokenCommand,
    },

    /// Configuration checks
    Config {
        #[command(subcommand)]
        cmd: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Mint a single access token
    Mint {
        /// App id (32 hex characters)
        #[arg(long, env = "APP_ID")]
        app_id: Option<String>,

        /// App certificate (32 hex characters)
        #[arg(long, env = "APP_CERTIFICATE", hide_env_values = true)]
        app_certificate: Option<String>,

        /// Channel name. Empty means any channel.
        #[arg(long, default_value = "")]
        channel: String,

        /// Numeric participant id. 0 means any participant.
        #[arg(long, default_value_t = 0)]
        uid: u32,

        /// String user account, used instead of --uid
        #[arg(long, conflicts_with = "uid")]
        account: Option<String>,

        /// Messaging user id. Defaults to the account or uid.
        #[arg(long)]
        user_id: Option<String>,

        /// Services to include (repeatable). Defaults to rtc and rtm.
        #[arg(long = "service", value_enum)]
        services: Vec<ServiceArg>,

        /// Token validity window (e.g. "15m", "24h", or seconds)
        #[arg(long, default_value = "900")]
        expire: String,

        /// Privilege expiry offset (e.g. "24h")
        #[arg(long, default_value = "24h")]
        privilege_expire: String,

        /// Pin the issue timestamp (unix seconds)
        #[arg(long)]
        issue_ts: Option<u64>,

        /// Pin the salt
        #[arg(long)]
        salt: Option<u32>,

        /// Write the token to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Issue the user and agent-video tokens for a channel
    Session {
        /// Path to sigil.yaml
        #[arg(long, env = "SIGIL_CONFIG")]
        config: Option<PathBuf>,

        /// Environment profile suffix (reads APP_ID_<PROFILE> first)
        #[arg(long)]
        profile: Option<String>,

        /// Channel name. A random 10-character name is generated when omitted.
        #[arg(long)]
        channel: Option<String>,

        /// Write the JSON to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Resolve configuration and report the issuance mode
    Check {
        /// Path to sigil.yaml
        #[arg(long, env = "SIGIL_CONFIG")]
        config: Option<PathBuf>,

        /// Environment profile suffix
        #[arg(long)]
        profile: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Token { cmd } => match cmd {
            TokenCommand::Mint {
                app_id,
                app_certificate,
                channel,
                uid,
                account,
                user_id,
                services,
                expire,
                privilege_expire,
                issue_ts,
                salt,
                output,
            } => commands::token::mint(MintOptions {
                app_id,
                app_certificate,
                channel,
                uid,
                account,
                user_id,
                services,
                expire,
                privilege_expire,
                issue_ts,
                salt,
                output,
            })?,

            TokenCommand::Session {
                config,
                profile,
                channel,
                output,
            } => commands::token::session(config.as_deref(), profile, channel, output)?,
        },

        Command::Config { cmd } => match cmd {
            ConfigCommand::Check { config, profile } => {
                commands::config::check(config.as_deref(), profile)?
            }
        },
    }

    Ok(())
}
