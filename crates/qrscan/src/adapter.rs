// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Reduction of one frame's detections to at most one decision.

use crate::allow::AllowList;
use crate::capture::PreviewSurface;
use crate::event::FrameEvent;

/// Classification of the first readable candidate in a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The value passed the allow-list
    Accepted(String),

    /// The value was decoded but no allowed prefix matched
    Rejected(String),
}

/// Result of reducing a single frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReduction {
    /// Candidates before the decision that resolved to no value or an empty
    /// string, in frame order.
    pub empty_decodes: usize,

    /// Decision for the first non-empty candidate, if the frame had one.
    pub decision: Option<Decision>,
}

/// Walk the frame's candidates in order, resolving each through the preview
/// transform. Unreadable or empty candidates are counted and skipped; the
/// first non-empty value is classified against `allow` and ends the walk.
/// There is no ranking by size or position.
pub fn reduce_frame(
    frame: &FrameEvent,
    preview: &dyn PreviewSurface,
    allow: &AllowList,
) -> FrameReduction {
    let mut reduction = FrameReduction::default();

    for candidate in &frame.candidates {
        let value = preview
            .transform(candidate)
            .and_then(|code| code.value)
            .filter(|value| !value.is_empty());

        let Some(value) = value else {
            reduction.empty_decodes += 1;
            continue;
        };

        log::trace!("Resolved {} candidate: {}", candidate.symbology, value);

        reduction.decision = Some(if allow.is_allowed(&value) {
            Decision::Accepted(value)
        } else {
            Decision::Rejected(value)
        });
        break;
    }

    reduction
}
