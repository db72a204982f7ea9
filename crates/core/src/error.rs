// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy shared across the controller.
//!
//! The codes and their exit codes are a stable contract: downstream tooling
//! parses the machine-readable envelope and branches on them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Process exit code for a successful command.
pub const EXIT_SUCCESS: i32 = 0;

/// Process exit code when the operator interrupts a command (SIGINT).
pub const EXIT_INTERRUPTED: i32 = 130;

/// Abstract failure kinds surfaced at the command-line boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    #[serde(rename = "AUTH_ERROR")]
    Auth,
    #[serde(rename = "NETWORK_ERROR")]
    Network,
    #[serde(rename = "REMOTE_STATE_ERROR")]
    RemoteState,
    #[serde(rename = "INTERNAL_ERROR")]
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Validation => "VALIDATION_ERROR",
            ErrorCode::Auth => "AUTH_ERROR",
            ErrorCode::Network => "NETWORK_ERROR",
            ErrorCode::RemoteState => "REMOTE_STATE_ERROR",
            ErrorCode::Internal => "INTERNAL_ERROR",
        }
    }

    /// Stable exit-code mapping. Unknown code strings map to 1 via
    /// [`ErrorCode::parse`] falling back to `Internal`.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorCode::Validation => 2,
            ErrorCode::Auth => 3,
            ErrorCode::Network => 4,
            ErrorCode::RemoteState => 5,
            ErrorCode::Internal => 1,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "VALIDATION_ERROR" => ErrorCode::Validation,
            "AUTH_ERROR" => ErrorCode::Auth,
            "NETWORK_ERROR" => ErrorCode::Network,
            "REMOTE_STATE_ERROR" => ErrorCode::RemoteState,
            _ => ErrorCode::Internal,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
