// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Events delivered to a scan session.
//!
//! Every source feeding the session has exactly one [`ScanEvent`] variant:
//! the detection output produces [`ScanEvent::Frame`], the pinch recognizer
//! [`ScanEvent::Pinch`], the torch and close buttons [`ScanEvent::ToggleTorch`]
//! and [`ScanEvent::Close`], and the host application
//! [`ScanEvent::MemoryWarning`]. All events are delivered on the thread that
//! owns the session.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Encoding scheme of a detected code as recognized by the capture platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbology {
    #[default]
    Qr,
    MicroQr,
    Aztec,
    DataMatrix,
    Pdf417,
    Ean8,
    Ean13,
    Code39,
    Code128,
    Itf14,
    Upce,
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Symbology::Qr => "QR",
            Symbology::MicroQr => "MicroQR",
            Symbology::Aztec => "Aztec",
            Symbology::DataMatrix => "DataMatrix",
            Symbology::Pdf417 => "PDF417",
            Symbology::Ean8 => "EAN-8",
            Symbology::Ean13 => "EAN-13",
            Symbology::Code39 => "Code39",
            Symbology::Code128 => "Code128",
            Symbology::Itf14 => "ITF-14",
            Symbology::Upce => "UPC-E",
        };
        write!(f, "{}", name)
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// Scale a rectangle in normalized `[0, 1]` coordinates to a surface of
    /// `width` x `height`.
    pub fn scaled(&self, width: f64, height: f64) -> Rect {
        Rect {
            x: self.x * width,
            y: self.y * height,
            width: self.width * width,
            height: self.height * height,
        }
    }
}

/// One detected code as reported by the capture layer, before the preview
/// coordinate transform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub symbology: Symbology,

    /// Decoded payload. Absent when the platform detected a code it could
    /// not read.
    #[serde(default)]
    pub value: Option<String>,

    /// Bounding box in normalized capture coordinates.
    #[serde(default)]
    pub bounds: Rect,
}

impl Candidate {
    pub fn qr(value: &str) -> Self {
        Candidate {
            symbology: Symbology::Qr,
            value: Some(value.to_owned()),
            bounds: Rect::new(0.25, 0.25, 0.5, 0.5),
        }
    }

    pub fn unreadable() -> Self {
        Candidate {
            value: None,
            ..Default::default()
        }
    }
}

/// A candidate resolved through the preview transform.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCode {
    pub symbology: Symbology,
    pub value: Option<String>,

    /// Bounding box in preview pixels.
    pub bounds: Rect,
}

/// All candidates detected in one captured frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameEvent {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl FrameEvent {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        FrameEvent { candidates }
    }

    pub fn single(candidate: Candidate) -> Self {
        FrameEvent {
            candidates: vec![candidate],
        }
    }
}

/// Input to a scan session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanEvent {
    /// Detection output for one frame
    Frame(FrameEvent),

    /// One "changed" tick of a pinch gesture
    Pinch { scale: f64 },

    /// Torch button tapped
    ToggleTorch,

    /// Close button released
    Close,

    /// The host received a memory-pressure warning
    MemoryWarning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_scaled() {
        let r = Rect::new(0.25, 0.5, 0.5, 0.25).scaled(400.0, 800.0);
        assert_eq!(r, Rect::new(100.0, 400.0, 200.0, 200.0));
    }

    #[test]
    fn test_event_json_shapes() {
        let events: Vec<ScanEvent> = serde_json::from_str(
            r#"[
                {"frame": {"candidates": [{"value": "https://a.example/"}]}},
                {"pinch": {"scale": 1.5}},
                "toggle_torch",
                "close",
                "memory_warning"
            ]"#,
        )
        .expect("valid events");

        assert_eq!(
            events[0],
            ScanEvent::Frame(FrameEvent::single(Candidate {
                symbology: Symbology::Qr,
                value: Some("https://a.example/".to_string()),
                bounds: Rect::default(),
            }))
        );
        assert_eq!(events[1], ScanEvent::Pinch { scale: 1.5 });
        assert_eq!(events[2], ScanEvent::ToggleTorch);
        assert_eq!(events[3], ScanEvent::Close);
        assert_eq!(events[4], ScanEvent::MemoryWarning);
    }

    #[test]
    fn test_symbology_display() {
        assert_eq!(Symbology::Qr.to_string(), "QR");
        assert_eq!(Symbology::Ean13.to_string(), "EAN-13");
    }
}
