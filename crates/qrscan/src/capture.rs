// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Camera platform capabilities consumed by the scan session.
//!
//! The platform camera service is modelled as four collaborating traits:
//!
//! - [`CameraProvider`] - device lookup by position and construction of the
//!   pipeline and preview objects
//! - [`CaptureDevice`] - one physical camera with zoom, torch, focus and
//!   exposure controls
//! - [`CapturePipeline`] - the capture session wiring a device input to a
//!   symbology-detection output
//! - [`PreviewSurface`] - the live preview, which also owns the coordinate
//!   transform used to resolve detected candidates
//!
//! [`ActivePipeline`] owns a wired pipeline and its preview for the lifetime
//! of a scan session and releases both when dropped, so every exit path
//! (setup failure, success, user close, memory pressure) tears down the same
//! way.

use crate::event::{Candidate, ResolvedCode};
use serde::{Deserialize, Serialize};
use std::{error, fmt, str::FromStr, sync::Arc};

/// Physical camera position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePosition {
    Front,
    #[default]
    Back,
}

impl fmt::Display for DevicePosition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DevicePosition::Front => write!(f, "front"),
            DevicePosition::Back => write!(f, "back"),
        }
    }
}

impl FromStr for DevicePosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "front" => Ok(DevicePosition::Front),
            "back" | "rear" => Ok(DevicePosition::Back),
            other => Err(format!("unknown camera position: {}", other)),
        }
    }
}

/// Which half of the pipeline wiring was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Input,
    Output,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PipelineStage::Input => write!(f, "Input"),
            PipelineStage::Output => write!(f, "Output"),
        }
    }
}

/// Terminal errors raised while building the capture pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    /// No physical camera exists for the requested position
    DeviceUnavailable(DevicePosition),

    /// The session refused the device input or the detection output
    PipelineRejected(PipelineStage),

    /// `configure` was called on a session that is already configured
    AlreadyConfigured,
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SetupError::DeviceUnavailable(position) => {
                write!(f, "No camera available for {} position", position)
            }
            SetupError::PipelineRejected(stage) => write!(f, "Failed to add {}", stage),
            SetupError::AlreadyConfigured => write!(f, "Capture session already configured"),
        }
    }
}

impl error::Error for SetupError {}

/// Best-effort device reconfiguration failures. These are logged by the
/// session and never reach the observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The device could not be locked for configuration
    ConfigurationLocked(String),

    /// The device does not support the requested control
    Unsupported(&'static str),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeviceError::ConfigurationLocked(reason) => {
                write!(f, "Device configuration locked: {}", reason)
            }
            DeviceError::Unsupported(control) => write!(f, "Unsupported device control: {}", control),
        }
    }
}

impl error::Error for DeviceError {}

/// One physical camera.
///
/// All methods are called from the thread that owns the scan session.
pub trait CaptureDevice: fmt::Debug {
    fn name(&self) -> &str;

    fn position(&self) -> DevicePosition;

    /// Largest zoom factor the hardware supports.
    fn max_zoom(&self) -> f64;

    fn zoom(&self) -> f64;

    fn set_zoom(&mut self, factor: f64) -> Result<(), DeviceError>;

    fn has_torch(&self) -> bool;

    fn torch(&self) -> bool;

    fn set_torch(&mut self, on: bool) -> Result<(), DeviceError>;

    fn supports_continuous_autofocus(&self) -> bool;

    fn enable_continuous_autofocus(&mut self) -> Result<(), DeviceError>;

    fn supports_continuous_autoexposure(&self) -> bool;

    fn enable_continuous_autoexposure(&mut self) -> Result<(), DeviceError>;
}

/// A capture session wiring one device input to a detection output.
///
/// `start_running` blocks until the pipeline is live and is called from a
/// background thread. Implementations must serialize `start_running` and
/// `stop_running` internally so a stop may race an in-flight start.
pub trait CapturePipeline: Send + Sync {
    fn add_input(&self, device: &dyn CaptureDevice) -> Result<(), SetupError>;

    fn add_detection_output(&self) -> Result<(), SetupError>;

    /// Detach every input and output. A pipeline with nothing wired stops
    /// and refuses to start.
    fn remove_all(&self);

    fn start_running(&self);

    fn stop_running(&self);

    fn is_running(&self) -> bool;
}

/// The live video preview.
pub trait PreviewSurface {
    fn attach(&mut self);

    /// Must be safe to call when not attached.
    fn detach(&mut self);

    fn is_attached(&self) -> bool;

    /// Map a raw candidate into preview space and resolve its value.
    /// Returns `None` when the candidate is not a readable code.
    fn transform(&self, candidate: &Candidate) -> Option<ResolvedCode>;
}

/// The platform camera service.
pub trait CameraProvider {
    /// Default device for `position`, if one exists.
    fn device(&self, position: DevicePosition) -> Option<Box<dyn CaptureDevice>>;

    fn pipeline(&self) -> Arc<dyn CapturePipeline>;

    fn preview(&self) -> Box<dyn PreviewSurface>;
}

/// A wired capture pipeline together with its preview surface.
///
/// Acquired as a unit by [`ActivePipeline::wire`] and released as a unit on
/// drop: its inputs and outputs are removed, the pipeline is stopped, and the
/// preview detached. Unwiring comes first so a start still in flight finds
/// nothing to run.
pub struct ActivePipeline {
    pipeline: Arc<dyn CapturePipeline>,
    preview: Box<dyn PreviewSurface>,
}

impl ActivePipeline {
    /// Attach `device` and a detection output to `pipeline`, then attach the
    /// preview. On error everything already attached is released before
    /// returning and the preview is never attached.
    pub fn wire(
        pipeline: Arc<dyn CapturePipeline>,
        preview: Box<dyn PreviewSurface>,
        device: &dyn CaptureDevice,
    ) -> Result<Self, SetupError> {
        let mut active = ActivePipeline { pipeline, preview };

        active.pipeline.add_input(device)?;
        active.pipeline.add_detection_output()?;
        active.preview.attach();

        log::debug!("Wired capture pipeline for {}", device.name());
        Ok(active)
    }

    pub fn pipeline(&self) -> &Arc<dyn CapturePipeline> {
        &self.pipeline
    }

    pub fn preview(&self) -> &dyn PreviewSurface {
        self.preview.as_ref()
    }
}

impl Drop for ActivePipeline {
    fn drop(&mut self) {
        self.pipeline.remove_all();
        self.pipeline.stop_running();
        self.preview.detach();
        log::debug!("Released capture pipeline");
    }
}

impl fmt::Debug for ActivePipeline {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ActivePipeline")
            .field("running", &self.pipeline.is_running())
            .field("preview_attached", &self.preview.is_attached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::{ScanScript, ScriptedCamera, ScriptedDevice};

    #[test]
    fn test_position_parse_and_display() {
        assert_eq!("front".parse::<DevicePosition>(), Ok(DevicePosition::Front));
        assert_eq!("BACK".parse::<DevicePosition>(), Ok(DevicePosition::Back));
        assert_eq!("rear".parse::<DevicePosition>(), Ok(DevicePosition::Back));
        assert!("side".parse::<DevicePosition>().is_err());
        assert_eq!(DevicePosition::Front.to_string(), "front");
        assert_eq!(DevicePosition::default(), DevicePosition::Back);
    }

    #[test]
    fn test_setup_error_messages() {
        assert_eq!(
            SetupError::PipelineRejected(PipelineStage::Input).to_string(),
            "Failed to add Input"
        );
        assert_eq!(
            SetupError::PipelineRejected(PipelineStage::Output).to_string(),
            "Failed to add Output"
        );
        assert_eq!(
            SetupError::DeviceUnavailable(DevicePosition::Back).to_string(),
            "No camera available for back position"
        );
    }

    #[test]
    fn test_wire_and_release() {
        let camera = ScriptedCamera::new(ScanScript::with_devices(vec![ScriptedDevice::back()]));
        let device = camera.device(DevicePosition::Back).expect("back camera");

        let active = ActivePipeline::wire(camera.pipeline(), camera.preview(), device.as_ref())
            .expect("wiring succeeds");
        assert!(active.preview().is_attached());
        assert!(camera.state().wired());

        active.pipeline().start_running();
        assert!(camera.state().running());

        drop(active);
        assert!(!camera.state().running());
        assert!(!camera.state().wired());
        assert!(!camera.state().preview_attached());
    }

    #[test]
    fn test_wire_output_rejected_releases_input() {
        let mut script = ScanScript::with_devices(vec![ScriptedDevice::back()]);
        script.reject_output = true;
        let camera = ScriptedCamera::new(script);
        let device = camera.device(DevicePosition::Back).expect("back camera");

        let err = ActivePipeline::wire(camera.pipeline(), camera.preview(), device.as_ref())
            .expect_err("output is rejected");
        assert_eq!(err, SetupError::PipelineRejected(PipelineStage::Output));
        assert!(!camera.state().wired());
        assert_eq!(camera.state().preview_attach_count(), 0);
    }
}
