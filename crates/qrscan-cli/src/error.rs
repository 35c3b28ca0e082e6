// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use qrscan::SetupError;
use std::fmt;
use std::process::ExitCode;

/// CLI-specific error type with exit code mapping
#[derive(Debug)]
pub enum CliError {
    /// Invalid command-line arguments or configuration
    InvalidArgs(String),
    /// No camera for the requested position
    CameraNotFound(String),
    /// The capture session refused the input or output
    PipelineRejected(String),
    /// One or more scanned values failed the allow-list
    NotAllowed(String),
    /// The capture feed ended without an accepted code
    NoResult(String),
    /// General error from the qrscan library
    General(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::InvalidArgs(msg) => write!(f, "Invalid arguments: {}", msg),
            CliError::CameraNotFound(msg) => write!(f, "Camera not found: {}", msg),
            CliError::PipelineRejected(msg) => write!(f, "Capture pipeline rejected: {}", msg),
            CliError::NotAllowed(msg) => write!(f, "Not allowed: {}", msg),
            CliError::NoResult(msg) => write!(f, "No result: {}", msg),
            CliError::General(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::InvalidArgs(_) => ExitCode::from(2),
            CliError::CameraNotFound(_) => ExitCode::from(3),
            CliError::PipelineRejected(_) => ExitCode::from(4),
            CliError::NotAllowed(_) => ExitCode::from(5),
            CliError::NoResult(_) => ExitCode::from(6),
            CliError::General(_) => ExitCode::from(1),
        }
    }
}

impl From<SetupError> for CliError {
    fn from(err: SetupError) -> Self {
        match err {
            SetupError::DeviceUnavailable(_) => CliError::CameraNotFound(err.to_string()),
            SetupError::PipelineRejected(_) => CliError::PipelineRejected(err.to_string()),
            SetupError::AlreadyConfigured => CliError::General(err.to_string()),
        }
    }
}

/// Map qrscan::Error to CliError with appropriate exit codes
impl From<qrscan::Error> for CliError {
    fn from(err: qrscan::Error) -> Self {
        use qrscan::Error;

        match err {
            Error::Io(io_err) => match io_err.kind() {
                std::io::ErrorKind::NotFound => {
                    CliError::InvalidArgs(format!("File not found: {}", io_err))
                }
                _ => CliError::General(format!("I/O error: {}", io_err)),
            },
            Error::Json(json_err) => CliError::InvalidArgs(format!("Malformed JSON: {}", json_err)),
            Error::InvalidConfig(msg) => CliError::InvalidArgs(msg),
            Error::Setup(setup_err) => setup_err.into(),
            Error::Device(dev_err) => CliError::General(format!("Device error: {}", dev_err)),
        }
    }
}

/// Helper function to convert result to exit code
pub fn result_to_exit_code<T>(result: Result<T, CliError>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            e.exit_code()
        }
    }
}
