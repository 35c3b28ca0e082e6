// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Rejection indicator shown on the scan frame after a disallowed value.

use std::time::{Duration, Instant};

/// How long the scan frame stays in its error color after a rejection.
pub const ERROR_INDICATOR_DURATION: Duration = Duration::from_secs(2);

/// Transient, visual-only rejection signal. Showing it again while visible
/// restarts the window.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorIndicator {
    shown_at: Option<Instant>,
}

impl ErrorIndicator {
    pub fn show(&mut self, now: Instant) {
        self.shown_at = Some(now);
    }

    pub fn is_visible_at(&self, now: Instant) -> bool {
        self.shown_at
            .is_some_and(|at| now.saturating_duration_since(at) < ERROR_INDICATOR_DURATION)
    }

    /// Revert to the normal state once the window has elapsed. Returns true
    /// if the indicator was hidden by this call.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.shown_at.is_some() && !self.is_visible_at(now) {
            self.shown_at = None;
            return true;
        }
        false
    }

    pub fn clear(&mut self) {
        self.shown_at = None;
    }
}
