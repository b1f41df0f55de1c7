//! sms-reader-client - Thin client for daemon mode.
//!
//! CHANGELOG:
//! - 10/16/2026 - Stream event lines after a subscribe acknowledgement
//! - 01/10/2026 - Initial implementation (Phase 4C)

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;

use sms_reader::config::{self, Config};
use sms_reader::daemon::protocol::PROTOCOL_VERSION;
use sms_reader::daemon::server::SUBSCRIBE_METHOD;

#[derive(Parser)]
#[command(name = "sms-reader-client")]
#[command(about = "Thin client for sms-reader daemon")]
struct Cli {
    /// Method to call (health, checkPermissions, getMessages, startListening, subscribe, ...)
    method: String,

    /// Socket path (default: config socket_path)
    #[arg(long)]
    socket: Option<String>,

    /// JSON parameters (as string)
    #[arg(long)]
    params: Option<String>,

    /// Request timeout (seconds)
    #[arg(long, default_value = "5.0")]
    timeout: f64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Parse params JSON
    let params: HashMap<String, serde_json::Value> = if let Some(p) = cli.params {
        serde_json::from_str(&p).context("--params must be a JSON object")?
    } else {
        HashMap::new()
    };

    // Build request
    let request = json!({
        "id": uuid::Uuid::new_v4().to_string(),
        "v": PROTOCOL_VERSION,
        "method": cli.method,
        "params": params,
    });

    // Connect to daemon
    let socket_path = match cli.socket {
        Some(socket) => shellexpand::tilde(&socket).to_string(),
        None => Config::load(config::default_config_path())?
            .socket_path()
            .to_string_lossy()
            .to_string(),
    };
    let stream = UnixStream::connect(&socket_path)
        .with_context(|| format!("Failed to connect to daemon at {}", socket_path))?;

    // Set timeout
    stream.set_read_timeout(Some(std::time::Duration::from_secs_f64(cli.timeout)))?;
    stream.set_write_timeout(Some(std::time::Duration::from_secs_f64(cli.timeout)))?;

    // Send request (NDJSON)
    let request_line = format!("{}\n", serde_json::to_string(&request)?);
    (&stream).write_all(request_line.as_bytes())?;

    // Read response (NDJSON)
    let mut reader = BufReader::new(&stream);
    let mut response_line = String::new();
    reader.read_line(&mut response_line)?;

    // Parse and print response
    let response: serde_json::Value = serde_json::from_str(&response_line)?;

    if !response["ok"].as_bool().unwrap_or(false) {
        // Error: print error and exit with code 1
        eprintln!(
            "Error [{}]: {}",
            response["error"]["code"].as_str().unwrap_or("ERROR"),
            response["error"]["message"]
                .as_str()
                .unwrap_or("unknown")
        );
        std::process::exit(1);
    }

    if cli.method != SUBSCRIBE_METHOD {
        // Success: print result only
        println!("{}", serde_json::to_string_pretty(&response["result"])?);
        return Ok(());
    }

    // Subscription: one event per line until the daemon closes the stream
    stream.set_read_timeout(None)?;
    for line in reader.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            println!("{}", line);
        }
    }
    Ok(())
}
