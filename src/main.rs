//! sms-reader - Sender-filtered SMS retrieval and live listening.
//!
//! Reads the inbox database directly; live mode polls it for new rows.
//!
//! CHANGELOG:
//! - 10/16/2026 - Sms reader commands (permissions, messages, listen, senders)
//! - 01/10/2026 - Initial scaffold with CLI skeleton

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use sms_reader::config::{self, Config};
use sms_reader::error::SmsError;
use sms_reader::output;

mod commands;

/// Read and watch text messages from a whitelist of senders.
#[derive(Parser, Debug)]
#[command(name = "sms-reader")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Output as JSON (most commands support this)
    #[arg(long, global = true)]
    json: bool,

    /// Compact JSON output (no whitespace)
    #[arg(long, global = true)]
    compact: bool,

    /// Comma-separated field allowlist
    #[arg(long, global = true)]
    fields: Option<String>,

    /// Truncate text fields to this length
    #[arg(long, global = true)]
    max_text_chars: Option<u32>,

    /// Config file (default: $SMS_READER_CONFIG or ~/.sms-reader/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the SMS permission state
    Permissions {
        /// Run the permission request flow first
        #[arg(long)]
        request: bool,
    },

    /// Stored messages from the given senders, newest first
    Messages {
        /// Sender pattern (repeatable, case-insensitive partial match; default: configured senders)
        #[arg(short, long = "sender")]
        senders: Vec<String>,

        /// Max messages (default: configured limit)
        #[arg(short, long)]
        limit: Option<u32>,

        /// Only messages after this Unix millisecond timestamp
        #[arg(long, conflicts_with = "days")]
        since: Option<i64>,

        /// Only messages from the last N days (0 = all time)
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Print messages from the given senders as they arrive
    Listen {
        /// Sender pattern (repeatable; default: configured senders)
        #[arg(short, long = "sender")]
        senders: Vec<String>,

        /// Stop after this many seconds
        #[arg(long)]
        duration: Option<u64>,
    },

    /// List the configured sender whitelist
    Senders,
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Build output controls from global flags
    let output_controls = output::OutputControls {
        json: cli.json,
        compact: cli.compact,
        fields: cli.fields.clone(),
        max_text_chars: cli.max_text_chars,
    };

    let result = Config::load(cli.config.clone().unwrap_or_else(config::default_config_path))
        .and_then(|config| match cli.command {
            Command::Permissions { request } => {
                commands::permissions::permissions(&config, request, &output_controls)
            }
            Command::Messages { senders, limit, since, days } => {
                commands::inbox::messages(&config, senders, limit, since, days, &output_controls)
            }
            Command::Listen { senders, duration } => {
                commands::live::listen(&config, senders, duration, &output_controls)
            }
            Command::Senders => commands::inbox::senders(&config, &output_controls),
        });

    match result {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            if cli.json {
                let code = e.downcast_ref::<SmsError>().map_or("ERROR", SmsError::code);
                println!("{}", output::format_error(code, &format!("{:#}", e)));
            } else {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::from(1)
        }
    }
}
