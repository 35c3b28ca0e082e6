// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Outbound contract of a scan session.
//!
//! The embedding application receives plain strings: one
//! `on_scan_succeeded` per successful session and zero or more
//! `on_scan_failed` calls for recoverable conditions, plus at most one for a
//! terminal setup failure.

use serde::Serialize;
use std::fmt;
use std::sync::mpsc::Sender;

/// Receiver of scan results.
pub trait ScanObserver {
    fn on_scan_succeeded(&mut self, result: &str);

    fn on_scan_failed(&mut self, error: &str);
}

/// Observer callback captured as a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum ScanOutcome {
    Succeeded(String),
    Failed(String),
}

impl fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScanOutcome::Succeeded(result) => write!(f, "scan succeeded: {}", result),
            ScanOutcome::Failed(error) => write!(f, "scan failed: {}", error),
        }
    }
}

/// Forward callbacks over a channel. A disconnected receiver drops the
/// outcome.
impl ScanObserver for Sender<ScanOutcome> {
    fn on_scan_succeeded(&mut self, result: &str) {
        if self.send(ScanOutcome::Succeeded(result.to_owned())).is_err() {
            log::debug!("Scan observer disconnected, dropping success");
        }
    }

    fn on_scan_failed(&mut self, error: &str) {
        if self.send(ScanOutcome::Failed(error.to_owned())).is_err() {
            log::debug!("Scan observer disconnected, dropping failure");
        }
    }
}

/// Haptic feedback variants. Rejections are visual only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Success,
}

/// Fire-and-forget haptic service.
pub trait Haptics {
    fn notify(&self, feedback: Feedback);
}

/// Forward feedback requests over a channel.
impl Haptics for Sender<Feedback> {
    fn notify(&self, feedback: Feedback) {
        if self.send(feedback).is_err() {
            log::debug!("Haptics receiver disconnected, dropping {:?}", feedback);
        }
    }
}

/// Haptics for hosts without a vibration motor.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHaptics;

impl Haptics for NoHaptics {
    fn notify(&self, feedback: Feedback) {
        log::trace!("Haptic feedback ignored: {:?}", feedback);
    }
}
