// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ipp-picture print: mDNS printer discovery, the live printer registry and
// IPP command dispatch to the selected printer.  Message types, errors and
// config come from `ipp-picture-core`.

pub mod client;
pub mod discovery;
pub mod dispatch;
pub mod job_name;
pub mod registry;
pub mod transport;

#[cfg(test)]
mod testing;

pub use client::AirPrintClient;
pub use discovery::{DiscoveryBrowser, DiscoveryEvent, MdnsBrowser};
pub use registry::PrinterRegistry;
pub use transport::{HttpConnector, HttpTransport, IppTransport, TransportConnector};
