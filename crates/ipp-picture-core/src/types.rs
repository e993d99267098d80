// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for discovered printers.

use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv6Addr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::IppResponse;

/// A printer as announced over mDNS, before any IPP traffic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredDevice {
    /// Service instance name (e.g. "Office Printer"), unique per network.
    pub name: String,
    /// Address used to reach the printer: an IP literal or a host name.
    pub host: String,
    /// Advertised host name (e.g. "office-printer.local").
    pub hostname: String,
    pub port: u16,
    /// TXT record key/value pairs.  `rp` is the IPP resource path.
    pub txt: BTreeMap<String, String>,
}

impl DiscoveredDevice {
    /// IPP resource path from the TXT record.
    pub fn resource_path(&self) -> Option<&str> {
        self.txt
            .get("rp")
            .map(|rp| rp.trim())
            .filter(|rp| !rp.is_empty())
    }

    /// `http://{host}:{port}/{rp}`, or `None` when host or port is unusable.
    ///
    /// `default_path` is used when the TXT record carries no usable `rp` key.
    pub fn ipp_url(&self, default_path: &str) -> Option<String> {
        let host = self.host.trim();
        if host.is_empty() || self.port == 0 {
            return None;
        }
        let path = self.resource_path().unwrap_or(default_path);
        let path = path.trim_start_matches('/');
        if host.parse::<Ipv6Addr>().is_ok() {
            Some(format!("http://[{host}]:{}/{path}", self.port))
        } else {
            Some(format!("http://{host}:{}/{path}", self.port))
        }
    }
}

/// Registry-level view of a printer's health.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrinterStatus {
    /// Discovered; attribute fetch still in flight.
    Init,
    /// Attributes fetched but no `printer-state` reported.
    Ok,
    /// The attribute fetch failed; see [`PrinterRecord::error`].
    Error,
    /// `printer-state` keyword reported by the device.
    Reported(String),
}

impl fmt::Display for PrinterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => f.write_str("init"),
            Self::Ok => f.write_str("ok"),
            Self::Error => f.write_str("error"),
            Self::Reported(state) => f.write_str(state),
        }
    }
}

/// Everything known about one discovered printer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterRecord {
    pub name: String,
    pub status: PrinterStatus,
    pub url: Option<String>,
    pub device: DiscoveredDevice,
    /// Last Get-Printer-Attributes response.
    pub attributes: Option<IppResponse>,
    /// Cause of the last failed attribute fetch; set only with `Error`.
    pub error: Option<String>,
    pub discovered_at: DateTime<Utc>,
}

impl PrinterRecord {
    pub fn new(device: DiscoveredDevice, default_path: &str) -> Self {
        Self {
            name: device.name.clone(),
            status: PrinterStatus::Init,
            url: device.ipp_url(default_path),
            device,
            attributes: None,
            error: None,
            discovered_at: Utc::now(),
        }
    }

    /// Record a successful attribute fetch.
    pub fn apply_attributes(&mut self, attributes: IppResponse) {
        self.status = match attributes.printer_state() {
            Some(state) => PrinterStatus::Reported(state),
            None => PrinterStatus::Ok,
        };
        self.attributes = Some(attributes);
        self.error = None;
    }

    /// Record a failed attribute fetch.
    pub fn apply_error(&mut self, cause: String) {
        self.status = PrinterStatus::Error;
        self.error = Some(cause);
    }
}
