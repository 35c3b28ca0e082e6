// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! QR Scan Session Library for Rust
//!
//! Platform-independent core of a camera-based QR scanning screen: camera
//! pipeline configuration, reduction of per-frame symbology detections to a
//! single decoded value, URL prefix allow-listing, and result delivery with
//! guaranteed teardown of the capture pipeline.
//!
//! The camera and haptic services are external capabilities expressed as
//! traits in [`capture`] and [`observer`]. The [`scripted`] module provides a
//! capture backend that replays a recorded detection feed, which is what the
//! tests and the `qrscan` CLI drive.
//!
//! # Quick Start
//!
//! ```no_run
//! use qrscan::config::ScannerConfig;
//! use qrscan::observer::ScanOutcome;
//! use qrscan::scripted::{ScanScript, ScriptedCamera};
//! use qrscan::session::ScanSession;
//! use std::sync::mpsc;
//!
//! let script = ScanScript::from_path("capture.json")?;
//! let events = script.events.clone();
//! let camera = ScriptedCamera::new(script);
//!
//! let (tx, rx) = mpsc::channel::<ScanOutcome>();
//! let mut session = ScanSession::new(Box::new(camera), ScannerConfig::default())
//!     .with_observer(Box::new(tx));
//!
//! session.present()?;
//! session.wait_until_started();
//! for event in events {
//!     session.handle(event);
//! }
//!
//! for outcome in rx.try_iter() {
//!     println!("{}", outcome);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Features
//!
//! - Default-allow URL prefix filter with exact, case-sensitive matching
//! - Zoom clamping to the device range and the 7x product limit
//! - Torch control that is a no-op on front cameras and torch-less devices
//! - Idempotent start and teardown with scoped release of pipeline resources
//! - Typed internal error taxonomy flattened to strings at the observer

use std::{error, fmt, io};

/// The allow module provides the URL prefix acceptance filter.
pub mod allow;

/// The zoom module provides zoom clamping and pinch stepping.
pub mod zoom;

/// The capture module provides the camera platform capability traits.
pub mod capture;

/// The event module provides detection and user-input event types.
pub mod event;

/// The adapter module reduces frame detections to a single decision.
pub mod adapter;

/// The observer module provides the outbound result contract.
pub mod observer;

/// The indicator module provides the transient rejection indicator.
pub mod indicator;

/// The session module provides the scan session controller.
pub mod session;

/// The config module provides scanner configuration loading.
pub mod config;

/// The scripted module provides a replayable capture backend.
pub mod scripted;

pub use capture::{DeviceError, DevicePosition, PipelineStage, SetupError};

/// Error type for qrscan library operations
#[derive(Debug)]
pub enum Error {
    /// I/O error while reading configuration or capture scripts
    Io(io::Error),

    /// JSON parsing error in configuration or capture scripts
    Json(serde_json::Error),

    /// The capture pipeline could not be configured
    Setup(SetupError),

    /// A camera device rejected a reconfiguration request
    Device(DeviceError),

    /// Configuration values were parsed but are not usable
    InvalidConfig(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Json(err) => write!(f, "JSON error: {}", err),
            Error::Setup(err) => write!(f, "Setup error: {}", err),
            Error::Device(err) => write!(f, "Device error: {}", err),
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::Setup(err) => Some(err),
            Error::Device(err) => Some(err),
            Error::InvalidConfig(_) => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<SetupError> for Error {
    fn from(err: SetupError) -> Self {
        Error::Setup(err)
    }
}

impl From<DeviceError> for Error {
    fn from(err: DeviceError) -> Self {
        Error::Device(err)
    }
}

/// Get the qrscan library version string
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
