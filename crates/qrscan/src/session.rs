// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Scan session controller.
//!
//! A [`ScanSession`] drives one camera-to-result attempt through the
//! following states:
//!
//! | From | Event | To |
//! |------|-------|----|
//! | Idle | `present` | Configuring |
//! | Configuring | pipeline wired | Running |
//! | Configuring | wiring failed | FailedTerminal |
//! | Running | first accepted value | Succeeded |
//! | Running | disallowed value | Running (error indicator for 2 s) |
//! | Running | close / memory warning | Dismissed |
//!
//! Once Running, every failure is recoverable. All state lives on the thread
//! that owns the session; only the blocking pipeline start is dispatched to
//! a background thread.

use crate::adapter::{reduce_frame, Decision};
use crate::allow::AllowList;
use crate::capture::{
    ActivePipeline, CameraProvider, CaptureDevice, DeviceError, DevicePosition, SetupError,
};
use crate::config::ScannerConfig;
use crate::event::{FrameEvent, ScanEvent};
use crate::indicator::ErrorIndicator;
use crate::observer::{Feedback, Haptics, NoHaptics, ScanObserver};
use crate::zoom::{ZoomRange, MIN_ZOOM};
use std::{
    error, fmt,
    thread::{self, JoinHandle},
    time::Instant,
};

/// Lifecycle state of a scan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanState {
    Idle,
    Configuring,
    Running,
    /// Running with the rejection indicator visible. Only reported by
    /// [`ScanSession::phase_at`]; the stored state stays `Running`.
    RejectedTransient,
    Succeeded,
    FailedTerminal,
    Dismissed,
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ScanState::Idle => "idle",
            ScanState::Configuring => "configuring",
            ScanState::Running => "running",
            ScanState::RejectedTransient => "rejected",
            ScanState::Succeeded => "succeeded",
            ScanState::FailedTerminal => "failed",
            ScanState::Dismissed => "dismissed",
        };
        write!(f, "{}", name)
    }
}

/// Internal error taxonomy. Observers only ever see the `Display` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// Terminal pipeline construction failure
    Setup(SetupError),

    /// A detected code resolved to no value
    EmptyDecode,

    /// A decoded value did not match the allow-list
    NotAllowed(String),

    /// Best-effort device reconfiguration failed; logged only
    Device(DeviceError),
}

impl ScanError {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanError::Setup(_))
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScanError::Setup(err) => write!(f, "{}", err),
            ScanError::EmptyDecode => write!(f, "Empty string found"),
            ScanError::NotAllowed(_) => write!(f, "Scanned URL is not allowed"),
            ScanError::Device(err) => write!(f, "{}", err),
        }
    }
}

impl error::Error for ScanError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            ScanError::Setup(err) => Some(err),
            ScanError::Device(err) => Some(err),
            ScanError::EmptyDecode | ScanError::NotAllowed(_) => None,
        }
    }
}

/// Controller for one scanning screen.
pub struct ScanSession {
    camera: Box<dyn CameraProvider>,
    config: ScannerConfig,
    observer: Option<Box<dyn ScanObserver>>,
    haptics: Box<dyn Haptics>,

    state: ScanState,
    position: DevicePosition,
    device: Option<Box<dyn CaptureDevice>>,
    active: Option<ActivePipeline>,
    start_thread: Option<JoinHandle<()>>,

    zoom_range: ZoomRange,
    zoom_factor: f64,
    torch_enabled: bool,
    is_running: bool,
    presented: bool,
    indicator: ErrorIndicator,
}

impl ScanSession {
    pub fn new(camera: Box<dyn CameraProvider>, config: ScannerConfig) -> ScanSession {
        ScanSession {
            camera,
            position: config.position,
            config,
            observer: None,
            haptics: Box::new(NoHaptics),
            state: ScanState::Idle,
            device: None,
            active: None,
            start_thread: None,
            zoom_range: ZoomRange::default(),
            zoom_factor: MIN_ZOOM,
            torch_enabled: false,
            is_running: false,
            presented: false,
            indicator: ErrorIndicator::default(),
        }
    }

    pub fn with_observer(self, observer: Box<dyn ScanObserver>) -> ScanSession {
        ScanSession {
            observer: Some(observer),
            ..self
        }
    }

    pub fn with_haptics(self, haptics: Box<dyn Haptics>) -> ScanSession {
        ScanSession { haptics, ..self }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// State as seen by the user at `now`, including the transient
    /// rejection phase.
    pub fn phase_at(&self, now: Instant) -> ScanState {
        if self.state == ScanState::Running && self.indicator.is_visible_at(now) {
            ScanState::RejectedTransient
        } else {
            self.state
        }
    }

    pub fn device_position(&self) -> DevicePosition {
        self.position
    }

    pub fn zoom_factor(&self) -> f64 {
        self.zoom_factor
    }

    pub fn zoom_range(&self) -> ZoomRange {
        self.zoom_range
    }

    pub fn torch_enabled(&self) -> bool {
        self.torch_enabled
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    /// True while the hosting screen is on display.
    pub fn is_presented(&self) -> bool {
        self.presented
    }

    pub fn preview_attached(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.preview().is_attached())
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.config.allowed_prefixes
    }

    /// Present the scanning screen: configure the pipeline for the
    /// configured camera position, reset zoom and start capturing.
    ///
    /// A setup failure is reported to the observer and also returned.
    pub fn present(&mut self) -> Result<(), SetupError> {
        if self.state != ScanState::Idle {
            log::warn!("Scan session presented twice (state: {})", self.state);
            return Err(SetupError::AlreadyConfigured);
        }

        self.presented = true;
        self.configure(self.config.position)?;
        self.set_zoom(MIN_ZOOM);
        self.start();
        Ok(())
    }

    /// Acquire the camera at `position` and wire it into a capture pipeline
    /// with a detection output.
    pub fn configure(&mut self, position: DevicePosition) -> Result<(), SetupError> {
        if self.device.is_some() || !matches!(self.state, ScanState::Idle | ScanState::Configuring)
        {
            log::warn!("Capture session already configured");
            return Err(SetupError::AlreadyConfigured);
        }

        self.state = ScanState::Configuring;
        log::debug!("Configuring capture session for {} camera", position);

        match self.wire(position) {
            Ok(()) => {
                self.state = ScanState::Running;
                Ok(())
            }
            Err(err) => {
                let scan_err = ScanError::Setup(err.clone());
                log::error!("Capture session setup failed: {}", scan_err);
                self.notify_failure(&scan_err);
                self.state = ScanState::FailedTerminal;
                self.teardown();
                Err(err)
            }
        }
    }

    fn wire(&mut self, position: DevicePosition) -> Result<(), SetupError> {
        let mut device = self
            .camera
            .device(position)
            .ok_or(SetupError::DeviceUnavailable(position))?;

        let active = ActivePipeline::wire(
            self.camera.pipeline(),
            self.camera.preview(),
            device.as_ref(),
        )?;

        if position == DevicePosition::Back {
            if device.supports_continuous_autofocus() {
                if let Err(err) = device.enable_continuous_autofocus() {
                    log_device_error(err);
                }
            }
            if device.supports_continuous_autoexposure() {
                if let Err(err) = device.enable_continuous_autoexposure() {
                    log_device_error(err);
                }
            }
        }

        self.zoom_range = ZoomRange::for_device(device.max_zoom());
        self.zoom_factor = self.zoom_range.clamp(device.zoom());
        self.torch_enabled = device.has_torch() && device.torch();
        self.position = position;
        self.device = Some(device);
        self.active = Some(active);
        Ok(())
    }

    /// Start capturing without blocking the caller. No-op while running.
    pub fn start(&mut self) {
        if self.is_running {
            log::trace!("Capture session already running");
            return;
        }

        let Some(active) = self.active.as_ref() else {
            log::warn!("Cannot start capture session before it is configured");
            return;
        };

        self.is_running = true;
        let pipeline = active.pipeline().clone();
        let spawned = thread::Builder::new()
            .name("qrscan-start".to_string())
            .spawn({
                let pipeline = pipeline.clone();
                move || pipeline.start_running()
            });

        match spawned {
            Ok(handle) => self.start_thread = Some(handle),
            Err(err) => {
                log::warn!("Failed to spawn capture start thread, starting inline: {}", err);
                pipeline.start_running();
            }
        }
        log::debug!("Capture session start dispatched");
    }

    /// Block until the dispatched pipeline start has returned.
    pub fn wait_until_started(&mut self) {
        if let Some(handle) = self.start_thread.take() {
            if handle.join().is_err() {
                log::error!("Capture start thread panicked");
            }
        }
    }

    /// Stop capturing and detach the preview. Safe to call repeatedly.
    pub fn stop(&mut self) {
        // An in-flight start is left to finish on its own; the released
        // pipeline has no inputs to run.
        self.start_thread = None;
        if self.active.take().is_some() {
            log::debug!("Capture session stopped");
        }
        self.is_running = false;
    }

    /// Stop capturing and release the device and observer.
    pub fn teardown(&mut self) {
        self.stop();
        self.device = None;
        self.observer = None;
        self.indicator.clear();
        self.presented = false;
    }

    /// Request a zoom factor. The value is clamped to the device range and
    /// continuous autofocus is re-enabled afterwards.
    pub fn set_zoom(&mut self, factor: f64) {
        let target = self.zoom_range.clamp(factor);
        let Some(device) = self.device.as_mut() else {
            log::debug!("Ignoring zoom request without a configured device");
            return;
        };

        match device.set_zoom(target) {
            Ok(()) => {
                self.zoom_factor = target;
                log::trace!("Zoom factor set to {:.3}", target);
            }
            Err(err) => log_device_error(err),
        }

        if device.supports_continuous_autofocus() {
            if let Err(err) = device.enable_continuous_autofocus() {
                log_device_error(err);
            }
        }
    }

    /// Apply one pinch gesture tick.
    pub fn pinch(&mut self, scale: f64) {
        let target = self.zoom_range.pinch(self.zoom_factor, scale);
        self.set_zoom(target);
    }

    /// Switch the torch. Front cameras and torch-less devices ignore the
    /// request without changing state.
    pub fn set_torch(&mut self, enabled: bool) {
        let Some(device) = self.device.as_mut() else {
            log::debug!("Ignoring torch request without a configured device");
            return;
        };

        if device.position() == DevicePosition::Front || !device.has_torch() {
            log::debug!("Torch not available on {}", device.name());
            return;
        }

        match device.set_torch(enabled) {
            Ok(()) => self.torch_enabled = enabled,
            Err(err) => log_device_error(err),
        }
    }

    pub fn toggle_torch(&mut self) {
        self.set_torch(!self.torch_enabled);
    }

    /// Close the scanner at the user's request. Turns the torch off and
    /// resets zoom first if the torch was on.
    pub fn dismiss(&mut self) {
        if self.torch_enabled {
            if let Some(device) = self.device.as_mut() {
                if let Err(err) = device.set_zoom(MIN_ZOOM) {
                    log_device_error(err);
                }
                if device.torch() {
                    if let Err(err) = device.set_torch(false) {
                        log_device_error(err);
                    }
                }
            }
            self.torch_enabled = false;
            self.zoom_factor = MIN_ZOOM;
        }

        self.teardown();
        if !matches!(self.state, ScanState::Succeeded | ScanState::FailedTerminal) {
            self.state = ScanState::Dismissed;
        }
        log::debug!("Scan session dismissed");
    }

    /// Release everything in response to memory pressure.
    pub fn handle_memory_warning(&mut self) {
        log::warn!("Memory warning, tearing down scan session");
        self.teardown();
        if !matches!(self.state, ScanState::Succeeded | ScanState::FailedTerminal) {
            self.state = ScanState::Dismissed;
        }
    }

    /// Process one event. Events are ignored unless the session is running.
    pub fn handle(&mut self, event: ScanEvent) {
        self.handle_at(event, Instant::now());
    }

    /// [`handle`](Self::handle) with an explicit clock for the rejection
    /// indicator.
    pub fn handle_at(&mut self, event: ScanEvent, now: Instant) {
        if self.indicator.tick(now) {
            log::trace!("Error indicator reverted");
        }

        if self.state != ScanState::Running {
            log::trace!("Ignoring {:?} in state {}", event, self.state);
            return;
        }

        match event {
            ScanEvent::Frame(frame) => self.handle_frame(&frame, now),
            ScanEvent::Pinch { scale } => self.pinch(scale),
            ScanEvent::ToggleTorch => self.toggle_torch(),
            ScanEvent::Close => self.dismiss(),
            ScanEvent::MemoryWarning => self.handle_memory_warning(),
        }
    }

    fn handle_frame(&mut self, frame: &FrameEvent, now: Instant) {
        let Some(active) = self.active.as_ref() else {
            return;
        };

        let reduction = reduce_frame(frame, active.preview(), &self.config.allowed_prefixes);

        for _ in 0..reduction.empty_decodes {
            self.notify_failure(&ScanError::EmptyDecode);
        }

        match reduction.decision {
            Some(Decision::Accepted(value)) => self.succeed(value),
            Some(Decision::Rejected(value)) => {
                log::info!("Rejected scanned value: {}", value);
                self.notify_failure(&ScanError::NotAllowed(value));
                self.indicator.show(now);
            }
            None => {}
        }
    }

    fn succeed(&mut self, value: String) {
        log::info!("Scanned value accepted: {}", value);
        self.state = ScanState::Succeeded;
        self.haptics.notify(Feedback::Success);
        if let Some(observer) = self.observer.as_mut() {
            observer.on_scan_succeeded(&value);
        }
        self.teardown();
    }

    fn notify_failure(&mut self, err: &ScanError) {
        if !err.is_terminal() {
            log::debug!("Recoverable scan failure: {}", err);
        }
        if let Some(observer) = self.observer.as_mut() {
            observer.on_scan_failed(&err.to_string());
        }
    }
}

impl fmt::Debug for ScanSession {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ScanSession")
            .field("state", &self.state)
            .field("position", &self.position)
            .field("zoom_factor", &self.zoom_factor)
            .field("torch_enabled", &self.torch_enabled)
            .field("is_running", &self.is_running)
            .field("active", &self.active)
            .finish()
    }
}

fn log_device_error(err: DeviceError) {
    log::warn!("{}", ScanError::Device(err));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Candidate;
    use crate::observer::ScanOutcome;
    use crate::scripted::{ScanScript, ScriptedCamera, ScriptedDevice};
    use std::sync::mpsc::{self, Receiver};
    use std::time::Duration;

    fn session_with(
        devices: Vec<ScriptedDevice>,
        config: ScannerConfig,
    ) -> (ScanSession, ScriptedCamera, Receiver<ScanOutcome>) {
        let camera = ScriptedCamera::new(ScanScript::with_devices(devices));
        let (tx, rx) = mpsc::channel();
        let session = ScanSession::new(Box::new(camera.clone()), config).with_observer(Box::new(tx));
        (session, camera, rx)
    }

    fn frame(value: &str) -> ScanEvent {
        ScanEvent::Frame(FrameEvent::single(Candidate::qr(value)))
    }

    #[test]
    fn test_present_runs_session() {
        let (mut session, camera, _rx) =
            session_with(vec![ScriptedDevice::back()], ScannerConfig::default());
        assert_eq!(session.state(), ScanState::Idle);

        session.present().unwrap();
        session.wait_until_started();

        assert_eq!(session.state(), ScanState::Running);
        assert!(session.is_running());
        assert!(session.is_presented());
        assert!(session.preview_attached());
        assert!(camera.state().running());
        assert_eq!(session.zoom_factor(), 1.0);
    }

    #[test]
    fn test_present_twice_is_refused() {
        let (mut session, camera, _rx) =
            session_with(vec![ScriptedDevice::back()], ScannerConfig::default());
        session.present().unwrap();
        assert_eq!(session.present(), Err(SetupError::AlreadyConfigured));
        session.wait_until_started();
        assert_eq!(camera.state().start_count(), 1);
    }

    #[test]
    fn test_start_is_idempotent() {
        let (mut session, camera, _rx) =
            session_with(vec![ScriptedDevice::back()], ScannerConfig::default());
        session.configure(DevicePosition::Back).unwrap();
        session.start();
        session.start();
        session.wait_until_started();
        assert_eq!(camera.state().start_count(), 1);
    }

    #[test]
    fn test_start_before_configure_is_ignored() {
        let (mut session, camera, _rx) =
            session_with(vec![ScriptedDevice::back()], ScannerConfig::default());
        session.start();
        assert!(!session.is_running());
        assert_eq!(camera.state().start_count(), 0);
    }

    #[test]
    fn test_configure_twice_is_refused() {
        let (mut session, _camera, rx) =
            session_with(vec![ScriptedDevice::back()], ScannerConfig::default());
        session.configure(DevicePosition::Back).unwrap();
        assert_eq!(
            session.configure(DevicePosition::Back),
            Err(SetupError::AlreadyConfigured)
        );
        assert_eq!(session.state(), ScanState::Running);
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[test]
    fn test_missing_device_is_terminal() {
        let (mut session, camera, rx) =
            session_with(vec![ScriptedDevice::back()], ScannerConfig::default());
        let err = session.configure(DevicePosition::Front).unwrap_err();
        assert_eq!(err, SetupError::DeviceUnavailable(DevicePosition::Front));
        assert_eq!(session.state(), ScanState::FailedTerminal);
        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![ScanOutcome::Failed(
                "No camera available for front position".to_string()
            )]
        );
        assert_eq!(camera.state().preview_attach_count(), 0);

        // a failed session never starts
        session.start();
        assert!(!session.is_running());
    }

    #[test]
    fn test_back_camera_gets_autofocus_and_autoexposure() {
        let (mut session, camera, _rx) =
            session_with(vec![ScriptedDevice::back()], ScannerConfig::default());
        session.configure(DevicePosition::Back).unwrap();
        let device = camera.state().device(DevicePosition::Back).unwrap();
        assert!(device.autofocus_enabled);
        assert!(device.autoexposure_enabled);
    }

    #[test]
    fn test_zoom_clamped_and_refocused() {
        let mut back = ScriptedDevice::back();
        back.max_zoom = 5.0;
        let (mut session, camera, _rx) = session_with(vec![back], ScannerConfig::default());
        session.present().unwrap();

        session.set_zoom(12.0);
        assert_eq!(session.zoom_factor(), 5.0);
        session.set_zoom(0.2);
        assert_eq!(session.zoom_factor(), 1.0);
        session.set_zoom(2.5);
        assert_eq!(session.zoom_factor(), 2.5);

        let device = camera.state().device(DevicePosition::Back).unwrap();
        assert_eq!(device.zoom, 2.5);
        assert!(device.focus_resets >= 3);
    }

    #[test]
    fn test_pinch_steps_zoom() {
        let (mut session, _camera, _rx) =
            session_with(vec![ScriptedDevice::back()], ScannerConfig::default());
        session.present().unwrap();

        session.handle(ScanEvent::Pinch { scale: 1.3 });
        session.handle(ScanEvent::Pinch { scale: 1.3 });
        assert_eq!(session.zoom_factor(), 1.25);
        session.handle(ScanEvent::Pinch { scale: 0.7 });
        assert_eq!(session.zoom_factor(), 1.125);
        for _ in 0..10 {
            session.handle(ScanEvent::Pinch { scale: 0.7 });
        }
        assert_eq!(session.zoom_factor(), 1.0);
    }

    #[test]
    fn test_zoom_failure_is_logged_only() {
        let mut back = ScriptedDevice::back();
        back.fail_configuration = true;
        let (mut session, _camera, rx) = session_with(vec![back], ScannerConfig::default());
        session.present().unwrap();

        session.set_zoom(3.0);
        assert_eq!(session.zoom_factor(), 1.0);
        session.toggle_torch();
        assert!(!session.torch_enabled());
        assert_eq!(session.state(), ScanState::Running);
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[test]
    fn test_torch_on_back_camera() {
        let (mut session, camera, _rx) =
            session_with(vec![ScriptedDevice::back()], ScannerConfig::default());
        session.present().unwrap();

        session.handle(ScanEvent::ToggleTorch);
        assert!(session.torch_enabled());
        assert!(camera.state().device(DevicePosition::Back).unwrap().torch_on);

        session.set_torch(false);
        assert!(!session.torch_enabled());
    }

    #[test]
    fn test_torch_ignored_on_front_camera() {
        let mut front = ScriptedDevice::front();
        front.torch = true;
        let config = ScannerConfig::default().with_position(DevicePosition::Front);
        let (mut session, camera, _rx) = session_with(vec![front], config);
        session.present().unwrap();

        session.set_torch(true);
        assert!(!session.torch_enabled());
        assert!(!camera.state().device(DevicePosition::Front).unwrap().torch_on);
    }

    #[test]
    fn test_torch_ignored_without_hardware() {
        let mut back = ScriptedDevice::back();
        back.torch = false;
        let (mut session, _camera, _rx) = session_with(vec![back], ScannerConfig::default());
        session.present().unwrap();
        session.toggle_torch();
        assert!(!session.torch_enabled());
    }

    #[test]
    fn test_close_resets_torch_and_zoom() {
        let (mut session, camera, _rx) =
            session_with(vec![ScriptedDevice::back()], ScannerConfig::default());
        session.present().unwrap();
        session.set_zoom(4.0);
        session.set_torch(true);

        session.handle(ScanEvent::Close);

        assert_eq!(session.state(), ScanState::Dismissed);
        assert!(!session.torch_enabled());
        assert_eq!(session.zoom_factor(), 1.0);
        let device = camera.state().device(DevicePosition::Back).unwrap();
        assert!(!device.torch_on);
        assert_eq!(device.zoom, 1.0);
        assert!(!camera.state().preview_attached());
        assert!(!session.is_presented());
    }

    #[test]
    fn test_close_without_torch_keeps_zoom() {
        let (mut session, camera, _rx) =
            session_with(vec![ScriptedDevice::back()], ScannerConfig::default());
        session.present().unwrap();
        session.set_zoom(3.0);
        session.dismiss();
        assert_eq!(camera.state().device(DevicePosition::Back).unwrap().zoom, 3.0);
        assert_eq!(session.state(), ScanState::Dismissed);
    }

    #[test]
    fn test_close_with_locked_device_still_dismisses() {
        // autofocus, auto-exposure, zoom reset, refocus and torch on succeed
        let mut back = ScriptedDevice::back();
        back.fail_configuration_after = Some(5);
        let (mut session, camera, rx) = session_with(vec![back], ScannerConfig::default());
        session.present().unwrap();
        session.wait_until_started();
        session.set_torch(true);
        assert!(session.torch_enabled());

        session.handle(ScanEvent::Close);

        assert_eq!(session.state(), ScanState::Dismissed);
        assert!(!session.torch_enabled());
        assert!(!session.is_running());
        assert!(!session.preview_attached());
        assert!(!camera.state().preview_attached());
        assert!(!camera.state().running());
        // the device refused both resets
        let device = camera.state().device(DevicePosition::Back).unwrap();
        assert!(device.torch_on);
        assert_eq!(device.configuration_locks, 5);
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[test]
    fn test_rejection_shows_indicator_for_two_seconds() {
        let config = ScannerConfig::default()
            .with_allowed_prefixes(AllowList::new(["https://good.example/"]));
        let (mut session, _camera, rx) = session_with(vec![ScriptedDevice::back()], config);
        session.present().unwrap();

        let t0 = Instant::now();
        session.handle_at(frame("https://other.example/"), t0);
        assert_eq!(session.phase_at(t0), ScanState::RejectedTransient);
        assert_eq!(
            session.phase_at(t0 + Duration::from_millis(1900)),
            ScanState::RejectedTransient
        );
        assert_eq!(session.phase_at(t0 + Duration::from_secs(2)), ScanState::Running);
        assert_eq!(session.state(), ScanState::Running);
        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![ScanOutcome::Failed("Scanned URL is not allowed".to_string())]
        );
    }

    #[test]
    fn test_success_haptic_then_teardown() {
        let camera = ScriptedCamera::new(ScanScript::with_devices(vec![ScriptedDevice::back()]));
        let (tx, rx) = mpsc::channel();
        let (haptic_tx, haptic_rx) = mpsc::channel();
        let mut session = ScanSession::new(Box::new(camera.clone()), ScannerConfig::default())
            .with_observer(Box::new(tx))
            .with_haptics(Box::new(haptic_tx));
        session.present().unwrap();
        session.wait_until_started();

        session.handle(frame("https://site.example/page"));
        assert_eq!(session.state(), ScanState::Succeeded);
        assert_eq!(haptic_rx.try_iter().collect::<Vec<_>>(), vec![Feedback::Success]);
        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![ScanOutcome::Succeeded("https://site.example/page".to_string())]
        );
        assert!(!camera.state().running());
        assert!(!camera.state().preview_attached());
        assert!(!session.is_presented());

        // later frames are ignored
        session.handle(frame("https://site.example/again"));
        assert_eq!(session.state(), ScanState::Succeeded);
    }

    #[test]
    fn test_empty_decode_is_recoverable() {
        let (mut session, _camera, rx) =
            session_with(vec![ScriptedDevice::back()], ScannerConfig::default());
        session.present().unwrap();
        session.handle(ScanEvent::Frame(FrameEvent::single(Candidate::unreadable())));
        assert_eq!(session.state(), ScanState::Running);
        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![ScanOutcome::Failed("Empty string found".to_string())]
        );
    }

    #[test]
    fn test_memory_warning_tears_down() {
        let (mut session, camera, _rx) =
            session_with(vec![ScriptedDevice::back()], ScannerConfig::default());
        session.present().unwrap();
        session.handle(ScanEvent::MemoryWarning);
        assert_eq!(session.state(), ScanState::Dismissed);
        assert!(!session.is_running());
        assert!(!camera.state().preview_attached());
    }

    #[test]
    fn test_scan_error_taxonomy() {
        assert!(ScanError::Setup(SetupError::AlreadyConfigured).is_terminal());
        assert!(!ScanError::EmptyDecode.is_terminal());
        assert!(!ScanError::NotAllowed("x".into()).is_terminal());
        assert!(!ScanError::Device(DeviceError::Unsupported("torch")).is_terminal());
        assert_eq!(
            ScanError::NotAllowed("https://x/".into()).to_string(),
            "Scanned URL is not allowed"
        );
    }
}
