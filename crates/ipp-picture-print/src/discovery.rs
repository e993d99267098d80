// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// mDNS service discovery for IPP printers on the local network.
//
// We browse for the configured service type (`_ipp._tcp.local.` by default)
// using the `mdns-sd` crate.  Resolved and removed services are turned into
// `DiscoveryEvent`s and pushed into a tokio channel; the registry consumes
// them on the async side.

use std::collections::BTreeMap;
use std::net::IpAddr;

use mdns_sd::{ServiceDaemon, ServiceEvent, ServiceInfo};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use ipp_picture_core::error::{AirPrintError, Result};
use ipp_picture_core::types::DiscoveredDevice;

/// A change in the set of printers visible on the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    /// A printer was announced and resolved.
    Up(DiscoveredDevice),
    /// A printer withdrew its announcement.
    Down { name: String },
}

/// Source of [`DiscoveryEvent`]s.
pub trait DiscoveryBrowser: Send {
    /// Begin browsing; events are delivered on `events` until [`stop`].
    ///
    /// [`stop`]: DiscoveryBrowser::stop
    fn start(&mut self, events: UnboundedSender<DiscoveryEvent>) -> Result<()>;

    /// Stop browsing.  Calling this while stopped is a no-op.
    fn stop(&mut self) -> Result<()>;
}

/// Printer browser backed by an `mdns-sd` daemon.
pub struct MdnsBrowser {
    daemon: ServiceDaemon,
    service_type: String,
    browsing: bool,
}

impl MdnsBrowser {
    /// Spawn the mDNS daemon thread without browsing yet.
    pub fn new(service_type: &str) -> Result<Self> {
        let daemon = ServiceDaemon::new()
            .map_err(|e| AirPrintError::Discovery(format!("failed to start mDNS daemon: {e}")))?;
        Ok(Self {
            daemon,
            service_type: service_type.to_owned(),
            browsing: false,
        })
    }

    pub fn is_browsing(&self) -> bool {
        self.browsing
    }

    /// Shut down the mDNS daemon entirely.
    pub fn shutdown(mut self) -> Result<()> {
        self.stop()?;
        let _status_rx = self
            .daemon
            .shutdown()
            .map_err(|e| AirPrintError::Discovery(format!("daemon shutdown: {e}")))?;
        info!("mDNS daemon shut down");
        Ok(())
    }

    /// Drain the daemon's receiver on a dedicated thread, forwarding events
    /// until browsing stops or the event consumer goes away.
    fn spawn_listener(
        &self,
        receiver: mdns_sd::Receiver<ServiceEvent>,
        events: UnboundedSender<DiscoveryEvent>,
    ) -> Result<()> {
        let service_type = self.service_type.clone();
        std::thread::Builder::new()
            .name(format!("mdns-{service_type}"))
            .spawn(move || {
                while let Ok(event) = receiver.recv() {
                    let forwarded = match event {
                        ServiceEvent::SearchStarted(stype) => {
                            debug!(service_type = %stype, "mDNS search started");
                            None
                        }
                        ServiceEvent::ServiceFound(stype, fullname) => {
                            debug!(service_type = %stype, name = %fullname, "service found");
                            None
                        }
                        ServiceEvent::ServiceResolved(info) => match device_from_service(&info, &service_type) {
                            Some(device) => {
                                info!(name = %device.name, host = %device.host, port = device.port, "printer resolved");
                                Some(DiscoveryEvent::Up(device))
                            }
                            None => {
                                warn!(fullname = %info.get_fullname(), "resolved service has no usable address");
                                None
                            }
                        },
                        ServiceEvent::ServiceRemoved(stype, fullname) => {
                            info!(service_type = %stype, name = %fullname, "printer removed");
                            Some(DiscoveryEvent::Down {
                                name: instance_name(&fullname, &service_type),
                            })
                        }
                        ServiceEvent::SearchStopped(stype) => {
                            debug!(service_type = %stype, "mDNS search stopped");
                            break;
                        }
                    };

                    if let Some(event) = forwarded
                        && events.send(event).is_err()
                    {
                        debug!("discovery event consumer gone; listener exiting");
                        break;
                    }
                }
            })
            .map_err(|e| AirPrintError::Discovery(format!("spawn mDNS listener: {e}")))?;
        Ok(())
    }
}

impl DiscoveryBrowser for MdnsBrowser {
    fn start(&mut self, events: UnboundedSender<DiscoveryEvent>) -> Result<()> {
        if self.browsing {
            debug!("printer discovery already running");
            return Ok(());
        }

        let receiver = self
            .daemon
            .browse(&self.service_type)
            .map_err(|e| AirPrintError::Discovery(format!("browse {}: {e}", self.service_type)))?;
        self.spawn_listener(receiver, events)?;

        self.browsing = true;
        info!(service_type = %self.service_type, "mDNS printer discovery started");
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if !self.browsing {
            return Ok(());
        }

        self.daemon.stop_browse(&self.service_type).map_err(|e| {
            AirPrintError::Discovery(format!("stop browse {}: {e}", self.service_type))
        })?;

        self.browsing = false;
        info!("mDNS printer discovery stopped");
        Ok(())
    }
}

/// Convert a resolved `ServiceInfo` into a `DiscoveredDevice`.
///
/// The host prefers an IPv4 address for wider printer compatibility, then
/// any address, then the advertised host name.
fn device_from_service(info: &ServiceInfo, service_type: &str) -> Option<DiscoveredDevice> {
    let hostname = info.get_hostname().trim_end_matches('.').to_owned();

    let ip: Option<IpAddr> = info
        .get_addresses()
        .iter()
        .find(|a| a.is_ipv4())
        .or_else(|| info.get_addresses().iter().next())
        .copied();

    let host = match ip {
        Some(ip) => ip.to_string(),
        None if !hostname.is_empty() => hostname.clone(),
        None => return None,
    };

    let txt: BTreeMap<String, String> = info
        .get_properties()
        .iter()
        .map(|p| (p.key().to_owned(), p.val_str().to_owned()))
        .collect();

    Some(DiscoveredDevice {
        name: instance_name(info.get_fullname(), service_type),
        host,
        hostname,
        port: info.get_port(),
        txt,
    })
}

/// Strip the service type from a full service name:
/// `"Office._ipp._tcp.local."` becomes `"Office"`.
fn instance_name(fullname: &str, service_type: &str) -> String {
    fullname
        .strip_suffix(service_type)
        .map(|s| s.trim_end_matches('.'))
        .unwrap_or(fullname)
        .to_owned()
}
