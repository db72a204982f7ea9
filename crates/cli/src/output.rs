// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Machine-readable result envelope.
//!
//! Downstream tooling parses this shape; the field names and the error-code
//! to exit-code mapping are stable.

use crate::exit_error::ExitError;
use serde::Serialize;

pub const ENVELOPE_VERSION: &str = "v1";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Envelope {
    pub version: &'static str,
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Envelope {
    pub fn success(command: &str, data: serde_json::Value) -> Self {
        Self {
            version: ENVELOPE_VERSION,
            command: command.to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(command: &str, error: &ExitError, trace_id: &str) -> Self {
        Self {
            version: ENVELOPE_VERSION,
            command: command.to_string(),
            data: None,
            error: Some(ErrorBody {
                code: error.code.as_str().to_string(),
                message: error.message.clone(),
                details: error.details.clone(),
                remediation: error.remediation.clone(),
                trace_id: Some(trace_id.to_string()),
            }),
        }
    }
}

/// Print a success envelope to stdout (JSON mode only; text mode output is
/// command-specific).
pub fn emit_success(command: &str, data: serde_json::Value) {
    let envelope = Envelope::success(command, data);
    match serde_json::to_string_pretty(&envelope) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("failed to encode result envelope: {e}"),
    }
}

/// Print a failure envelope to stdout so parsers see structured errors.
pub fn emit_failure(command: &str, error: &ExitError, trace_id: &str) {
    let envelope = Envelope::failure(command, error, trace_id);
    match serde_json::to_string_pretty(&envelope) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("failed to encode error envelope: {e}"),
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
