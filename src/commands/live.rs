//! Live command: listen.
//!
//! CHANGELOG:
//! - 10/16/2026 - Stop listening on Ctrl-C instead of exiting mid-session
//! - 10/16/2026 - Initial implementation

use anyhow::{Context, Result};
use std::time::Duration;

use sms_reader::config::Config;
use sms_reader::output::OutputControls;
use sms_reader::reader::{SmsReader, StartListeningOptions};

use super::inbox::summary_line;

/// Print matched messages as they arrive, for `duration` or until Ctrl-C,
/// then stop listening.
pub fn listen(
    config: &Config,
    senders: Vec<String>,
    duration: Option<u64>,
    output: &OutputControls,
) -> Result<()> {
    let senders = if senders.is_empty() {
        config.senders.clone()
    } else {
        senders
    };

    let reader = SmsReader::from_config(config);
    let line_output = output.line();
    let json = output.json;
    let _printer = reader.add_listener(move |msg| {
        if json {
            line_output.print(msg);
        } else {
            println!("{}", summary_line(msg));
        }
    });

    let started = reader.start_listening(&StartListeningOptions { senders })?;
    if !output.json {
        eprintln!("Listening for {} (Ctrl-C to stop)", started.senders.join(", "));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build runtime")?;
    runtime.block_on(wait_for_exit(duration.map(Duration::from_secs)));

    let stopped = reader.stop_listening();
    tracing::debug!(listening = stopped.listening, "listen finished");
    Ok(())
}

/// Resolve after `duration`, or on Ctrl-C (the only way out when there is no duration).
async fn wait_for_exit(duration: Option<Duration>) {
    let interrupted = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Ctrl-C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    match duration {
        Some(duration) => {
            tokio::select! {
                _ = tokio::time::sleep(duration) => {}
                _ = interrupted => {}
            }
        }
        None => interrupted.await,
    }
}
