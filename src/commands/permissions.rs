//! Permission command.
//!
//! CHANGELOG:
//! - 10/16/2026 - Initial implementation

use anyhow::{Context, Result};

use sms_reader::config::Config;
use sms_reader::output::OutputControls;
use sms_reader::permission::PermissionState;
use sms_reader::reader::SmsReader;

/// Report the SMS grant; with `request`, run the request flow first.
pub fn permissions(config: &Config, request: bool, output: &OutputControls) -> Result<()> {
    let reader = SmsReader::from_config(config);

    let status = if request {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .context("Failed to build runtime")?;
        runtime.block_on(reader.request_permissions())
    } else {
        reader.check_permissions()
    };

    if output.json {
        output.print(&status);
    } else {
        let note = match status.sms {
            PermissionState::Granted => "inbox readable",
            PermissionState::Denied => "inbox present but not readable",
            PermissionState::Prompting => "inbox not found",
        };
        println!("sms: {} ({}, {})", status.sms.as_str(), note, config.db_path().display());
    }

    Ok(())
}
