// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Camera enumeration for capture scripts, grouped by position.

use crate::error::CliError;
use crate::utils;
use clap::Args as ClapArgs;
use qrscan::scripted::{ScanScript, ScriptedDevice};
use qrscan::zoom::ZoomRange;
use qrscan::DevicePosition;
use serde::Serialize;
use std::path::PathBuf;

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// Capture script describing the available cameras
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,

    /// Show only cameras at this position (front or back)
    #[arg(short, long, value_name = "POSITION")]
    position: Option<String>,
}

#[derive(Debug, Serialize)]
struct DevicesOutput {
    back: Vec<DeviceInfo>,
    front: Vec<DeviceInfo>,
    summary: Summary,
}

#[derive(Debug, Serialize)]
struct DeviceInfo {
    name: String,
    position: DevicePosition,
    /// Zoom ceiling the scanner will use
    max_zoom: f64,
    device_max_zoom: f64,
    torch: bool,
    continuous_autofocus: bool,
    continuous_autoexposure: bool,
    /// First device at its position, selected when scanning
    default: bool,
}

#[derive(Debug, Serialize)]
struct Summary {
    total_devices: usize,
    back: usize,
    front: usize,
    pipeline_rejects_input: bool,
    pipeline_rejects_output: bool,
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Executing devices command: {:?}", args);

    let filter = args
        .position
        .as_deref()
        .map(utils::parse_position)
        .transpose()?;

    let script = ScanScript::from_path(&args.script)?;
    let output = collect(&script, filter);

    if json {
        let json_str = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::General(format!("JSON serialization failed: {}", e)))?;
        println!("{}", json_str);
    } else {
        print_text_output(&output, filter);
    }

    Ok(())
}

fn collect(script: &ScanScript, filter: Option<DevicePosition>) -> DevicesOutput {
    let back = devices_at(script, DevicePosition::Back);
    let front = devices_at(script, DevicePosition::Front);

    DevicesOutput {
        summary: Summary {
            total_devices: script.devices.len(),
            back: back.len(),
            front: front.len(),
            pipeline_rejects_input: script.reject_input,
            pipeline_rejects_output: script.reject_output,
        },
        back: if filter != Some(DevicePosition::Front) {
            back
        } else {
            vec![]
        },
        front: if filter != Some(DevicePosition::Back) {
            front
        } else {
            vec![]
        },
    }
}

fn devices_at(script: &ScanScript, position: DevicePosition) -> Vec<DeviceInfo> {
    script
        .devices
        .iter()
        .filter(|d| d.position == position)
        .enumerate()
        .map(|(i, d)| device_info(d, i == 0))
        .collect()
}

fn device_info(device: &ScriptedDevice, default: bool) -> DeviceInfo {
    DeviceInfo {
        name: device.name.clone(),
        position: device.position,
        max_zoom: ZoomRange::for_device(device.max_zoom).max(),
        device_max_zoom: device.max_zoom,
        torch: device.torch,
        continuous_autofocus: device.autofocus,
        continuous_autoexposure: device.autoexposure,
        default,
    }
}

fn print_text_output(output: &DevicesOutput, filter: Option<DevicePosition>) {
    if filter != Some(DevicePosition::Front) {
        print_group("Back cameras", &output.back);
    }
    if filter != Some(DevicePosition::Back) {
        print_group("Front cameras", &output.front);
    }

    if output.summary.pipeline_rejects_input {
        println!("Note: the capture session refuses camera inputs");
    }
    if output.summary.pipeline_rejects_output {
        println!("Note: the capture session refuses the detection output");
    }

    println!(
        "Summary: {} cameras ({} back, {} front)",
        output.summary.total_devices, output.summary.back, output.summary.front
    );
}

fn print_group(title: &str, devices: &[DeviceInfo]) {
    println!("{} ({}):", title, devices.len());
    if devices.is_empty() {
        println!("  (none)");
    }

    for device in devices {
        let marker = if device.default { " [default]" } else { "" };
        println!("  {}{}", device.name, marker);
        println!(
            "    Zoom:      1.0x - {:.1}x (device {:.1}x)",
            device.max_zoom, device.device_max_zoom
        );
        println!("    Torch:     {}", yes_no(device.torch));
        println!("    Autofocus: {}", yes_no(device.continuous_autofocus));
        println!("    Exposure:  {}", yes_no(device.continuous_autoexposure));
    }
    println!();
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
