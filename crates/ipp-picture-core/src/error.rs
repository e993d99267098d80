// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for ipp-picture.

use std::time::Duration;

use thiserror::Error;

/// Top-level error type for all ipp-picture operations.
#[derive(Debug, Error)]
pub enum AirPrintError {
    // -- Discovery / selection --
    #[error("printer discovery failed: {0}")]
    Discovery(String),

    #[error("Printer not set! Call set_printer() first!")]
    NotSelected,

    #[error("no discovered printer named '{0}'")]
    UnknownPrinter(String),

    #[error("printer '{0}' has no resolvable IPP URL")]
    UnresolvableUrl(String),

    // -- IPP round trip --
    #[error("IPP transport failed: {0}")]
    Transport(String),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Printer could not process the request! The printer response: {status}")]
    DeviceRejected {
        operation: &'static str,
        status: String,
    },

    // -- Caller mistakes --
    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    // -- Local environment --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification of an [`AirPrintError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A command was issued before any printer was selected.
    NotSelected,
    /// The network or IPP round trip itself failed.
    Transport,
    /// The printer answered with a status outside the accepted set.
    DeviceRejected,
    /// The caller passed something unusable (unknown printer, empty argument).
    Usage,
    /// Local failures: discovery daemon, config files, serialization.
    Local,
}

impl AirPrintError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotSelected => ErrorKind::NotSelected,
            Self::Transport(_) | Self::Timeout { .. } => ErrorKind::Transport,
            Self::DeviceRejected { .. } => ErrorKind::DeviceRejected,
            Self::UnknownPrinter(_) | Self::UnresolvableUrl(_) | Self::MissingArgument(_) => {
                ErrorKind::Usage
            }
            Self::Discovery(_) | Self::Config(_) | Self::Io(_) | Self::Serialization(_) => {
                ErrorKind::Local
            }
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AirPrintError>;
