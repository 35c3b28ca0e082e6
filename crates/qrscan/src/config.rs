// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Scanner configuration.
//!
//! ```json
//! {
//!   "position": "back",
//!   "allowed_prefixes": ["https://shop.example/", "myapp://"]
//! }
//! ```
//!
//! Both fields are optional: the defaults are the back camera and an empty
//! allow-list, which accepts every scanned value.

use crate::allow::AllowList;
use crate::capture::DevicePosition;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScannerConfig {
    /// Camera used when the scanner is presented
    pub position: DevicePosition,

    /// URL prefixes a scanned value must start with
    pub allowed_prefixes: AllowList,
}

impl ScannerConfig {
    pub fn with_position(self, position: DevicePosition) -> ScannerConfig {
        ScannerConfig { position, ..self }
    }

    pub fn with_allowed_prefixes(self, allowed_prefixes: AllowList) -> ScannerConfig {
        ScannerConfig {
            allowed_prefixes,
            ..self
        }
    }

    pub fn from_json(json: &str) -> Result<ScannerConfig, Error> {
        let config: ScannerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ScannerConfig, Error> {
        let path = path.as_ref();
        log::debug!("Loading scanner configuration from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// An empty prefix would match every value and silently disable the
    /// filter, so it is refused.
    pub fn validate(&self) -> Result<(), Error> {
        if self.allowed_prefixes.prefixes().iter().any(String::is_empty) {
            return Err(Error::InvalidConfig(
                "allowed_prefixes must not contain an empty prefix".to_string(),
            ));
        }
        Ok(())
    }
}
