// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Replayable capture backend.
//!
//! A [`ScanScript`] describes the cameras a host exposes, whether the capture
//! session refuses the input or output, and a recorded feed of
//! [`ScanEvent`]s. [`ScriptedCamera`] implements [`CameraProvider`] on top of
//! it so a complete scan session can run without camera hardware.
//!
//! ```json
//! {
//!   "devices": [
//!     { "name": "Back Camera", "position": "back", "max_zoom": 10.0, "torch": true }
//!   ],
//!   "events": [
//!     { "frame": { "candidates": [ { "value": "https://site.example/page" } ] } }
//!   ]
//! }
//! ```
//!
//! Every object handed out by a [`ScriptedCamera`] reports into one shared
//! [`ScriptedState`], which tests and the CLI inspect after a run.

use crate::capture::{
    CameraProvider, CaptureDevice, CapturePipeline, DeviceError, DevicePosition, PipelineStage,
    PreviewSurface, SetupError,
};
use crate::event::{Candidate, ResolvedCode, ScanEvent};
use crate::zoom::MIN_ZOOM;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

fn default_max_zoom() -> f64 {
    10.0
}

fn enabled() -> bool {
    true
}

/// A camera as described by a script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedDevice {
    pub name: String,

    pub position: DevicePosition,

    #[serde(default = "default_max_zoom")]
    pub max_zoom: f64,

    /// Torch hardware present
    #[serde(default)]
    pub torch: bool,

    #[serde(default = "enabled")]
    pub autofocus: bool,

    #[serde(default = "enabled")]
    pub autoexposure: bool,

    /// Every configuration lock attempt fails
    #[serde(default)]
    pub fail_configuration: bool,

    /// Configuration locks succeed this many times, then fail
    #[serde(default)]
    pub fail_configuration_after: Option<u32>,
}

impl ScriptedDevice {
    pub fn back() -> ScriptedDevice {
        ScriptedDevice {
            name: "Back Camera".to_string(),
            position: DevicePosition::Back,
            max_zoom: default_max_zoom(),
            torch: true,
            autofocus: true,
            autoexposure: true,
            fail_configuration: false,
            fail_configuration_after: None,
        }
    }

    pub fn front() -> ScriptedDevice {
        ScriptedDevice {
            name: "Front Camera".to_string(),
            position: DevicePosition::Front,
            max_zoom: 4.0,
            torch: false,
            autofocus: false,
            autoexposure: true,
            fail_configuration: false,
            fail_configuration_after: None,
        }
    }
}

/// Preview surface size in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreviewSize {
    pub width: f64,
    pub height: f64,
}

impl Default for PreviewSize {
    fn default() -> Self {
        PreviewSize {
            width: 390.0,
            height: 844.0,
        }
    }
}

/// A recorded capture environment and event feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanScript {
    pub devices: Vec<ScriptedDevice>,

    /// The capture session refuses the device input
    pub reject_input: bool,

    /// The capture session refuses the detection output
    pub reject_output: bool,

    pub preview: PreviewSize,

    pub events: Vec<ScanEvent>,
}

impl ScanScript {
    pub fn with_devices(devices: Vec<ScriptedDevice>) -> ScanScript {
        ScanScript {
            devices,
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<ScanScript, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ScanScript, Error> {
        let path = path.as_ref();
        log::debug!("Loading capture script from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// First device at `position`, which is what the platform reports as the
    /// default camera for that position.
    pub fn device(&self, position: DevicePosition) -> Option<&ScriptedDevice> {
        self.devices.iter().find(|d| d.position == position)
    }
}

/// Live configuration of one scripted device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceStatus {
    pub name: String,
    pub position: DevicePosition,
    pub zoom: f64,
    pub torch_on: bool,
    pub autofocus_enabled: bool,
    pub autoexposure_enabled: bool,

    /// Number of times continuous autofocus was (re-)enabled
    pub focus_resets: u32,

    /// Successful configuration locks
    pub configuration_locks: u32,
}

#[derive(Debug, Default)]
struct StateInner {
    input_attached: bool,
    output_attached: bool,
    running: bool,
    start_count: usize,
    preview_attached: bool,
    preview_attach_count: usize,
    devices: Vec<DeviceStatus>,
}

/// Shared record of everything a [`ScriptedCamera`] was asked to do.
#[derive(Debug, Default)]
pub struct ScriptedState {
    inner: Mutex<StateInner>,
}

impl ScriptedState {
    fn lock(&self) -> MutexGuard<'_, StateInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn running(&self) -> bool {
        self.lock().running
    }

    /// True while any input or output is attached to the pipeline.
    pub fn wired(&self) -> bool {
        let inner = self.lock();
        inner.input_attached || inner.output_attached
    }

    /// Number of effective pipeline starts.
    pub fn start_count(&self) -> usize {
        self.lock().start_count
    }

    pub fn preview_attached(&self) -> bool {
        self.lock().preview_attached
    }

    pub fn preview_attach_count(&self) -> usize {
        self.lock().preview_attach_count
    }

    pub fn device(&self, position: DevicePosition) -> Option<DeviceStatus> {
        self.lock()
            .devices
            .iter()
            .find(|d| d.position == position)
            .cloned()
    }

    fn update_device<F>(&self, index: usize, f: F)
    where
        F: FnOnce(&mut DeviceStatus),
    {
        if let Some(status) = self.lock().devices.get_mut(index) {
            f(status);
        }
    }
}

/// [`CameraProvider`] backed by a [`ScanScript`].
#[derive(Debug, Clone)]
pub struct ScriptedCamera {
    script: Arc<ScanScript>,
    state: Arc<ScriptedState>,
}

impl ScriptedCamera {
    pub fn new(script: ScanScript) -> ScriptedCamera {
        let state = ScriptedState::default();
        state.lock().devices = script
            .devices
            .iter()
            .map(|d| DeviceStatus {
                name: d.name.clone(),
                position: d.position,
                zoom: MIN_ZOOM,
                torch_on: false,
                autofocus_enabled: false,
                autoexposure_enabled: false,
                focus_resets: 0,
                configuration_locks: 0,
            })
            .collect();

        ScriptedCamera {
            script: Arc::new(script),
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> &ScriptedState {
        &self.state
    }
}

impl CameraProvider for ScriptedCamera {
    fn device(&self, position: DevicePosition) -> Option<Box<dyn CaptureDevice>> {
        let index = self
            .script
            .devices
            .iter()
            .position(|d| d.position == position)?;

        Some(Box::new(ScriptedCaptureDevice {
            config: self.script.devices[index].clone(),
            index,
            state: Arc::clone(&self.state),
        }))
    }

    fn pipeline(&self) -> Arc<dyn CapturePipeline> {
        Arc::new(ScriptedPipeline {
            reject_input: self.script.reject_input,
            reject_output: self.script.reject_output,
            state: Arc::clone(&self.state),
        })
    }

    fn preview(&self) -> Box<dyn PreviewSurface> {
        Box::new(ScriptedPreview {
            size: self.script.preview,
            attached: false,
            state: Some(Arc::clone(&self.state)),
        })
    }
}

#[derive(Debug)]
struct ScriptedCaptureDevice {
    config: ScriptedDevice,
    index: usize,
    state: Arc<ScriptedState>,
}

impl ScriptedCaptureDevice {
    fn lock_for_configuration(&self) -> Result<(), DeviceError> {
        let mut inner = self.state.lock();
        let locks = inner
            .devices
            .get(self.index)
            .map_or(0, |s| s.configuration_locks);
        let exhausted = self
            .config
            .fail_configuration_after
            .is_some_and(|limit| locks >= limit);

        if self.config.fail_configuration || exhausted {
            return Err(DeviceError::ConfigurationLocked(format!(
                "{} is in use by another client",
                self.config.name
            )));
        }

        if let Some(status) = inner.devices.get_mut(self.index) {
            status.configuration_locks += 1;
        }
        Ok(())
    }

    fn status(&self) -> Option<DeviceStatus> {
        self.state.lock().devices.get(self.index).cloned()
    }
}

impl CaptureDevice for ScriptedCaptureDevice {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn position(&self) -> DevicePosition {
        self.config.position
    }

    fn max_zoom(&self) -> f64 {
        self.config.max_zoom
    }

    fn zoom(&self) -> f64 {
        self.status().map_or(MIN_ZOOM, |s| s.zoom)
    }

    fn set_zoom(&mut self, factor: f64) -> Result<(), DeviceError> {
        self.lock_for_configuration()?;
        self.state.update_device(self.index, |s| s.zoom = factor);
        Ok(())
    }

    fn has_torch(&self) -> bool {
        self.config.torch
    }

    fn torch(&self) -> bool {
        self.status().is_some_and(|s| s.torch_on)
    }

    fn set_torch(&mut self, on: bool) -> Result<(), DeviceError> {
        if !self.config.torch {
            return Err(DeviceError::Unsupported("torch"));
        }
        self.lock_for_configuration()?;
        self.state.update_device(self.index, |s| s.torch_on = on);
        Ok(())
    }

    fn supports_continuous_autofocus(&self) -> bool {
        self.config.autofocus
    }

    fn enable_continuous_autofocus(&mut self) -> Result<(), DeviceError> {
        if !self.config.autofocus {
            return Err(DeviceError::Unsupported("continuous autofocus"));
        }
        self.lock_for_configuration()?;
        self.state.update_device(self.index, |s| {
            s.autofocus_enabled = true;
            s.focus_resets += 1;
        });
        Ok(())
    }

    fn supports_continuous_autoexposure(&self) -> bool {
        self.config.autoexposure
    }

    fn enable_continuous_autoexposure(&mut self) -> Result<(), DeviceError> {
        if !self.config.autoexposure {
            return Err(DeviceError::Unsupported("continuous auto-exposure"));
        }
        self.lock_for_configuration()?;
        self.state
            .update_device(self.index, |s| s.autoexposure_enabled = true);
        Ok(())
    }
}

struct ScriptedPipeline {
    reject_input: bool,
    reject_output: bool,
    state: Arc<ScriptedState>,
}

impl CapturePipeline for ScriptedPipeline {
    fn add_input(&self, device: &dyn CaptureDevice) -> Result<(), SetupError> {
        if self.reject_input {
            return Err(SetupError::PipelineRejected(PipelineStage::Input));
        }
        self.state.lock().input_attached = true;
        log::trace!("Attached input {}", device.name());
        Ok(())
    }

    fn add_detection_output(&self) -> Result<(), SetupError> {
        if self.reject_output {
            return Err(SetupError::PipelineRejected(PipelineStage::Output));
        }
        self.state.lock().output_attached = true;
        Ok(())
    }

    fn remove_all(&self) {
        let mut inner = self.state.lock();
        inner.input_attached = false;
        inner.output_attached = false;
        inner.running = false;
    }

    fn start_running(&self) {
        let mut inner = self.state.lock();
        if !(inner.input_attached && inner.output_attached) {
            log::debug!("Capture pipeline has nothing wired, not starting");
            return;
        }
        if !inner.running {
            inner.running = true;
            inner.start_count += 1;
        }
    }

    fn stop_running(&self) {
        self.state.lock().running = false;
    }

    fn is_running(&self) -> bool {
        self.state.lock().running
    }
}

/// Preview surface that maps normalized capture coordinates onto a fixed
/// size.
#[derive(Debug)]
pub struct ScriptedPreview {
    size: PreviewSize,
    attached: bool,
    state: Option<Arc<ScriptedState>>,
}

impl ScriptedPreview {
    /// A standalone preview not reporting into any [`ScriptedState`].
    pub fn detached(width: f64, height: f64) -> ScriptedPreview {
        ScriptedPreview {
            size: PreviewSize { width, height },
            attached: false,
            state: None,
        }
    }
}

impl PreviewSurface for ScriptedPreview {
    fn attach(&mut self) {
        self.attached = true;
        if let Some(state) = &self.state {
            let mut inner = state.lock();
            inner.preview_attached = true;
            inner.preview_attach_count += 1;
        }
    }

    fn detach(&mut self) {
        self.attached = false;
        if let Some(state) = &self.state {
            state.lock().preview_attached = false;
        }
    }

    fn is_attached(&self) -> bool {
        self.attached
    }

    fn transform(&self, candidate: &Candidate) -> Option<ResolvedCode> {
        let value = candidate.value.clone()?;
        Some(ResolvedCode {
            symbology: candidate.symbology,
            value: Some(value),
            bounds: candidate.bounds.scaled(self.size.width, self.size.height),
        })
    }
}
