// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::error::CliError;
use qrscan::allow::AllowList;
use qrscan::config::ScannerConfig;
use qrscan::DevicePosition;
use signal_hook::consts::SIGINT;
use signal_hook::flag;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Parse a camera position ("front", "back" or "rear")
///
/// # Examples
/// ```
/// use qrscan::DevicePosition;
/// use qrscan_cli::utils::parse_position;
/// assert_eq!(parse_position("front").unwrap(), DevicePosition::Front);
/// ```
pub fn parse_position(s: &str) -> Result<DevicePosition, CliError> {
    s.parse::<DevicePosition>().map_err(CliError::InvalidArgs)
}

/// Build an allow-list from `--allow` flags, refusing empty prefixes
pub fn parse_allow_list(prefixes: &[String]) -> Result<AllowList, CliError> {
    if prefixes.iter().any(|p| p.is_empty()) {
        return Err(CliError::InvalidArgs(
            "--allow prefix must not be empty".to_string(),
        ));
    }
    Ok(prefixes.iter().cloned().collect())
}

/// Load the scanner configuration and apply command-line overrides.
///
/// Values given on the command line replace the ones from the file; the
/// `--allow` prefixes replace the whole file allow-list.
pub fn load_config(
    path: Option<&Path>,
    position: Option<&str>,
    allow: &[String],
) -> Result<ScannerConfig, CliError> {
    let mut config = match path {
        Some(path) => ScannerConfig::from_path(path)?,
        None => ScannerConfig::default(),
    };

    if let Some(position) = position {
        config.position = parse_position(position)?;
    }

    if !allow.is_empty() {
        config.allowed_prefixes = parse_allow_list(allow)?;
    }

    log::debug!(
        "Scanner configuration: {} camera, {} allowed prefixes",
        config.position,
        config.allowed_prefixes.len()
    );
    Ok(config)
}

/// Install signal handler for graceful shutdown on Ctrl+C
///
/// Returns an Arc<AtomicBool> that will be set to true when SIGINT is received.
/// Check this flag periodically in your main loop to exit gracefully.
pub fn install_signal_handler() -> Result<Arc<AtomicBool>, CliError> {
    let term = Arc::new(AtomicBool::new(false));

    flag::register(SIGINT, Arc::clone(&term))
        .map_err(|e| CliError::General(format!("Failed to register signal handler: {}", e)))?;

    log::debug!("Installed SIGINT handler");
    Ok(term)
}
