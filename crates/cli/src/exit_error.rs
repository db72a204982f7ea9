// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom error type that carries a stable error code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, allowing `main()` to handle envelope printing and process
//! termination.

use bb_core::ErrorCode;
use std::fmt;

#[derive(Debug)]
pub struct ExitError {
    pub code: ErrorCode,
    pub message: String,
    pub remediation: Option<String>,
    pub details: Option<serde_json::Value>,
}

impl ExitError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), remediation: None, details: None }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, message)
    }

    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn exit_code(&self) -> i32 {
        self.code.exit_code()
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

impl From<bb_compose::ComposeError> for ExitError {
    fn from(e: bb_compose::ComposeError) -> Self {
        Self::new(ErrorCode::Validation, e.to_string())
            .with_remediation("check the composition file against `bb reconcile --help`")
    }
}

impl From<bb_core::SpriteNameError> for ExitError {
    fn from(e: bb_core::SpriteNameError) -> Self {
        Self::new(ErrorCode::Validation, e.to_string())
    }
}

impl From<bb_registry::RegistryError> for ExitError {
    fn from(e: bb_registry::RegistryError) -> Self {
        use bb_registry::RegistryError;
        match &e {
            RegistryError::Corrupt { path, .. } => {
                Self::new(ErrorCode::RemoteState, e.to_string()).with_remediation(format!(
                    "move {} aside and re-run `bb registry init`",
                    path.display()
                ))
            }
            _ => Self::new(ErrorCode::Internal, e.to_string()),
        }
    }
}

impl From<bb_dispatch::DispatchError> for ExitError {
    fn from(e: bb_dispatch::DispatchError) -> Self {
        use bb_dispatch::DispatchError;
        match e {
            DispatchError::NotFound(name) => {
                Self::new(ErrorCode::RemoteState, format!("sprite {name} not found in registry"))
                    .with_remediation("run `bb registry show` to list known sprites")
            }
            DispatchError::Busy(busy) => {
                let details = serde_json::to_value(&busy.candidates).unwrap_or_default();
                Self::new(ErrorCode::RemoteState, busy.to_string()).with_details(details)
            }
            DispatchError::Registry(e) => e.into(),
        }
    }
}

impl From<bb_eventlog::EventLogError> for ExitError {
    fn from(e: bb_eventlog::EventLogError) -> Self {
        use bb_eventlog::EventLogError;
        match &e {
            EventLogError::InvalidEvent(_) => Self::new(ErrorCode::Validation, e.to_string()),
            _ => Self::new(ErrorCode::Internal, e.to_string()),
        }
    }
}

impl From<bb_fleet::TransportError> for ExitError {
    fn from(e: bb_fleet::TransportError) -> Self {
        use bb_fleet::TransportError;
        match &e {
            TransportError::Network(_) => Self::new(ErrorCode::Network, e.to_string())
                .with_remediation("check connectivity and retry"),
            TransportError::Auth(_) => Self::new(ErrorCode::Auth, e.to_string())
                .with_remediation("re-authenticate with the platform CLI"),
            TransportError::Remote(_) => Self::new(ErrorCode::RemoteState, e.to_string()),
        }
    }
}

impl From<bb_fleet::FleetError> for ExitError {
    fn from(e: bb_fleet::FleetError) -> Self {
        match e {
            bb_fleet::FleetError::Transport(t) => t.into(),
            bb_fleet::FleetError::EventLog(l) => l.into(),
        }
    }
}

impl From<bb_planner::ExecuteError> for ExitError {
    fn from(e: bb_planner::ExecuteError) -> Self {
        Self::new(ErrorCode::RemoteState, e.to_string())
    }
}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
