// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Run a scan session over a recorded capture script.
//!
//! Events from the script are fed to the session in order. Observer
//! callbacks are printed as they arrive. Ctrl+C closes the scanner the way
//! the close button would.

use crate::error::CliError;
use crate::utils;
use clap::Args as ClapArgs;
use qrscan::event::ScanEvent;
use qrscan::observer::ScanOutcome;
use qrscan::scripted::{ScanScript, ScriptedCamera};
use qrscan::session::{ScanSession, ScanState};
use qrscan::DevicePosition;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// Capture script with devices and recorded events
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,

    /// Scanner configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Camera position (front or back), overrides the configuration file
    #[arg(short, long, value_name = "POSITION")]
    position: Option<String>,

    /// Allowed URL prefix (repeatable), replaces the configured allow-list
    #[arg(short, long = "allow", value_name = "PREFIX")]
    allow: Vec<String>,

    /// Delay between events in milliseconds
    #[arg(short, long, default_value = "0", value_name = "MS")]
    interval_ms: u64,
}

#[derive(Debug, Serialize)]
struct ReplayReport {
    state: String,
    position: DevicePosition,
    allowed_prefixes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<String>,
    outcomes: Vec<ScanOutcome>,
    events_total: usize,
    events_processed: usize,
    zoom_factor: f64,
    torch: bool,
    interrupted: bool,
    duration_ms: u128,
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Executing replay command: {:?}", args);

    let config = utils::load_config(
        args.config.as_deref(),
        args.position.as_deref(),
        &args.allow,
    )?;
    let script = ScanScript::from_path(&args.script)?;
    let term = utils::install_signal_handler()?;

    let events = script.events.clone();
    let camera = ScriptedCamera::new(script);
    let (tx, rx) = mpsc::channel();
    let mut session = ScanSession::new(Box::new(camera), config).with_observer(Box::new(tx));

    let start = Instant::now();
    let mut outcomes = Vec::new();

    if let Err(err) = session.present() {
        drain(&rx, &mut outcomes, json);
        let report = build_report(&session, outcomes, events.len(), 0, false, start);
        print_report(&report, json)?;
        return Err(err.into());
    }
    session.wait_until_started();
    log::info!(
        "Scanner running on {} camera, replaying {} events",
        session.device_position(),
        events.len()
    );

    let (processed, interrupted) =
        run_events(&mut session, events.iter(), &term, args.interval_ms, |session| {
            drain(&rx, &mut outcomes, json);
            session.state() != ScanState::Running
        });

    if session.state() == ScanState::Running {
        log::info!("Capture feed ended without an accepted code, closing scanner");
        session.dismiss();
    }
    drain(&rx, &mut outcomes, json);

    let report = build_report(&session, outcomes, events.len(), processed, interrupted, start);
    print_report(&report, json)?;

    match report.result {
        Some(_) => Ok(()),
        None if interrupted => Err(CliError::NoResult(
            "scanner closed by interrupt".to_string(),
        )),
        None => Err(CliError::NoResult(format!(
            "no code accepted after {} events",
            processed
        ))),
    }
}

/// Feed events until the feed ends, `finished` reports a terminal session,
/// or SIGINT arrives. Returns the number of events handled and whether the
/// run was interrupted.
fn run_events<'a, I, F>(
    session: &mut ScanSession,
    events: I,
    term: &AtomicBool,
    interval_ms: u64,
    mut finished: F,
) -> (usize, bool)
where
    I: Iterator<Item = &'a ScanEvent>,
    F: FnMut(&ScanSession) -> bool,
{
    let interval = Duration::from_millis(interval_ms);
    let mut processed = 0;

    for event in events {
        if term.load(Ordering::Relaxed) {
            log::info!("Received Ctrl+C, closing scanner");
            session.handle(ScanEvent::Close);
            return (processed, true);
        }

        log::trace!("Event {}: {:?}", processed, event);
        session.handle(event.clone());
        processed += 1;

        if finished(session) {
            break;
        }

        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }

    (processed, false)
}

fn drain(rx: &Receiver<ScanOutcome>, outcomes: &mut Vec<ScanOutcome>, json: bool) {
    for outcome in rx.try_iter() {
        if !json {
            println!("{}", outcome);
        }
        outcomes.push(outcome);
    }
}

fn build_report(
    session: &ScanSession,
    outcomes: Vec<ScanOutcome>,
    events_total: usize,
    events_processed: usize,
    interrupted: bool,
    start: Instant,
) -> ReplayReport {
    let result = outcomes.iter().find_map(|o| match o {
        ScanOutcome::Succeeded(value) => Some(value.clone()),
        ScanOutcome::Failed(_) => None,
    });

    ReplayReport {
        state: session.state().to_string(),
        position: session.device_position(),
        allowed_prefixes: session.allow_list().prefixes().to_vec(),
        result,
        outcomes,
        events_total,
        events_processed,
        zoom_factor: session.zoom_factor(),
        torch: session.torch_enabled(),
        interrupted,
        duration_ms: start.elapsed().as_millis(),
    }
}

fn print_report(report: &ReplayReport, json: bool) -> Result<(), CliError> {
    if json {
        let json_str = serde_json::to_string_pretty(report)
            .map_err(|e| CliError::General(format!("JSON serialization failed: {}", e)))?;
        println!("{}", json_str);
        return Ok(());
    }

    println!();
    println!("Session:  {}", report.state);
    println!("Camera:   {}", report.position);
    if report.allowed_prefixes.is_empty() {
        println!("Allowed:  (any)");
    } else {
        println!("Allowed:  {}", report.allowed_prefixes.join(", "));
    }
    println!(
        "Events:   {} of {} processed",
        report.events_processed, report.events_total
    );
    println!("Zoom:     {:.3}x", report.zoom_factor);
    println!("Torch:    {}", if report.torch { "on" } else { "off" });
    if let Some(result) = &report.result {
        println!("Result:   {}", result);
    }
    Ok(())
}
