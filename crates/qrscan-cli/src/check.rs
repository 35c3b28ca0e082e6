// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Allow-list check for scanned values.

use crate::error::CliError;
use crate::utils;
use clap::Args as ClapArgs;
use qrscan::allow::AllowList;
use serde::Serialize;
use std::path::PathBuf;

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// Scanned values to check
    #[arg(required = true, value_name = "VALUE")]
    values: Vec<String>,

    /// Allowed URL prefix (repeatable; none allows everything)
    #[arg(short, long = "allow", value_name = "PREFIX")]
    allow: Vec<String>,

    /// Scanner configuration file providing the allow-list
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct CheckOutput {
    prefixes: Vec<String>,
    results: Vec<CheckResult>,
    summary: Summary,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    value: String,
    allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    matched_prefix: Option<String>,
}

#[derive(Debug, Serialize)]
struct Summary {
    total: usize,
    allowed: usize,
    denied: usize,
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Executing check command: {:?}", args);

    let config = utils::load_config(args.config.as_deref(), None, &args.allow)?;
    let output = classify(&config.allowed_prefixes, &args.values);

    if json {
        let json_str = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::General(format!("JSON serialization failed: {}", e)))?;
        println!("{}", json_str);
    } else {
        print_text_output(&output);
    }

    if output.summary.denied > 0 {
        return Err(CliError::NotAllowed(format!(
            "{} of {} values did not match the allow-list",
            output.summary.denied, output.summary.total
        )));
    }

    Ok(())
}

fn classify(list: &AllowList, values: &[String]) -> CheckOutput {
    let results: Vec<CheckResult> = values
        .iter()
        .map(|value| {
            let matched_prefix = list.matching_prefix(value).map(str::to_owned);
            CheckResult {
                value: value.clone(),
                allowed: list.is_allowed(value),
                matched_prefix,
            }
        })
        .collect();

    let allowed = results.iter().filter(|r| r.allowed).count();
    CheckOutput {
        prefixes: list.prefixes().to_vec(),
        summary: Summary {
            total: results.len(),
            allowed,
            denied: results.len() - allowed,
        },
        results,
    }
}

fn print_text_output(output: &CheckOutput) {
    if output.prefixes.is_empty() {
        println!("Allow-list: (empty, all values allowed)");
    } else {
        println!("Allow-list:");
        for prefix in &output.prefixes {
            println!("  {}", prefix);
        }
    }
    println!();

    for result in &output.results {
        match (result.allowed, &result.matched_prefix) {
            (true, Some(prefix)) => println!("ALLOWED  {}  ({})", result.value, prefix),
            (true, None) => println!("ALLOWED  {}", result.value),
            (false, _) => println!("DENIED   {}", result.value),
        }
    }

    println!();
    println!(
        "Summary: {} allowed, {} denied",
        output.summary.allowed, output.summary.denied
    );
}
