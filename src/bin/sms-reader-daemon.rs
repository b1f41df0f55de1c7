//! sms-reader-daemon - Persistent daemon holding the inbox and listener hot.
//!
//! CHANGELOG:
//! - 10/16/2026 - Socket and inbox from config; tracing instead of eprintln
//! - 01/10/2026 - Initial implementation (Phase 4C)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use sms_reader::config::{self, Config};
use sms_reader::daemon::server::DaemonServer;

#[derive(Parser)]
#[command(name = "sms-reader-daemon")]
#[command(about = "Persistent daemon for sms-reader")]
struct Cli {
    /// Config file (default: $SMS_READER_CONFIG or ~/.sms-reader/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon
    Start {
        /// Socket path (default: config socket_path)
        #[arg(long)]
        socket: Option<String>,

        /// Run in foreground (don't daemonize)
        #[arg(long)]
        foreground: bool,
    },

    /// Stop the daemon
    Stop {
        /// Socket path
        #[arg(long)]
        socket: Option<String>,
    },

    /// Check daemon status
    Status {
        /// Socket path
        #[arg(long)]
        socket: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.unwrap_or_else(config::default_config_path))?;

    match cli.command {
        Commands::Start { socket, foreground } => {
            cmd_start(&config, socket_path(&config, socket), foreground)
        }
        Commands::Stop { socket } => cmd_stop(socket_path(&config, socket)),
        Commands::Status { socket } => cmd_status(socket_path(&config, socket)),
    }
}

fn socket_path(config: &Config, socket: Option<String>) -> String {
    match socket {
        Some(socket) => shellexpand::tilde(&socket).to_string(),
        None => config.socket_path().to_string_lossy().to_string(),
    }
}

fn cmd_start(config: &Config, socket_path: String, foreground: bool) -> Result<()> {
    // Create parent directory if needed
    if let Some(parent) = Path::new(&socket_path).parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    if foreground {
        // Foreground mode (for development/debugging)
        tracing::info!("starting in foreground");
        let server = DaemonServer::new(&socket_path, config)?;
        server.serve()?;
    } else {
        // Background mode (fork into daemon process)
        use daemonize::Daemonize;

        let pid_file = format!("{}.pid", socket_path);

        let daemonize = Daemonize::new()
            .pid_file(&pid_file)
            .working_directory("/tmp");

        match daemonize.start() {
            Ok(_) => {
                // Child process: run server
                let server = DaemonServer::new(&socket_path, config)?;
                server.serve()?;
            }
            Err(e) => {
                eprintln!("Failed to daemonize: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn cmd_stop(socket_path: String) -> Result<()> {
    let pid_file = format!("{}.pid", socket_path);

    // Read PID file
    let pid_str = std::fs::read_to_string(&pid_file)
        .with_context(|| format!("Failed to read pid file: {}", pid_file))?;
    let pid: i32 = pid_str.trim().parse().context("Malformed pid file")?;

    // Send SIGTERM
    unsafe {
        libc::kill(pid, libc::SIGTERM);
    }

    // Clean up files
    let _ = std::fs::remove_file(&pid_file);
    let _ = std::fs::remove_file(&socket_path);

    println!("Daemon stopped (pid {})", pid);

    Ok(())
}

fn cmd_status(socket_path: String) -> Result<()> {
    // Try to connect to socket
    match std::os::unix::net::UnixStream::connect(&socket_path) {
        Ok(_) => {
            println!("Daemon running at {}", socket_path);
            Ok(())
        }
        Err(_) => {
            println!("Daemon not running");
            std::process::exit(1);
        }
    }
}
