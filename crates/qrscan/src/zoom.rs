// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Zoom factor clamping and pinch-gesture stepping.

/// Minimum (and default) zoom factor.
pub const MIN_ZOOM: f64 = 1.0;

/// Product-imposed maximum zoom factor, regardless of device capability.
pub const MAX_ZOOM: f64 = 7.0;

/// Zoom change applied per pinch gesture tick.
pub const PINCH_STEP: f64 = 0.125;

/// Valid zoom interval for one device: `[1.0, min(7.0, device_max)]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomRange {
    max: f64,
}

impl ZoomRange {
    /// Build the range for a device reporting `device_max` as its maximum
    /// zoom. Devices reporting less than 1.0 (or NaN) get a fixed 1.0 range.
    pub fn for_device(device_max: f64) -> Self {
        let max = if device_max.is_nan() {
            MIN_ZOOM
        } else {
            device_max.clamp(MIN_ZOOM, MAX_ZOOM)
        };
        ZoomRange { max }
    }

    pub fn min(&self) -> f64 {
        MIN_ZOOM
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Clamp a requested factor into the range. NaN maps to the minimum.
    pub fn clamp(&self, factor: f64) -> f64 {
        if factor.is_nan() {
            return MIN_ZOOM;
        }
        factor.clamp(MIN_ZOOM, self.max)
    }

    /// Next zoom factor for one pinch tick. Scales above 1.0 zoom in by
    /// [`PINCH_STEP`], anything else zooms out.
    pub fn pinch(&self, current: f64, scale: f64) -> f64 {
        let next = if scale > 1.0 {
            current + PINCH_STEP
        } else {
            current - PINCH_STEP
        };
        self.clamp(next)
    }
}

impl Default for ZoomRange {
    fn default() -> Self {
        ZoomRange { max: MAX_ZOOM }
    }
}
