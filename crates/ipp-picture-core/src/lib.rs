// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ipp-picture: core types, IPP message model, errors and configuration
// shared by the discovery/dispatch crate and the smoke drivers.

pub mod config;
pub mod error;
pub mod message;
pub mod types;

pub use config::ClientConfig;
pub use error::{AirPrintError, ErrorKind, Result};
pub use message::*;
pub use types::*;
