// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Live registry of discovered printers plus the current selection.
//
// Discovery events and user calls can arrive from different tasks, so the
// printer map and the selection sit behind one mutex.  The lock is never held
// across an await: background attribute fetches re-acquire it only to write
// their result.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use ipp_picture_core::config::ClientConfig;
use ipp_picture_core::error::{AirPrintError, Result};
use ipp_picture_core::types::{DiscoveredDevice, PrinterRecord};

use crate::discovery::DiscoveryEvent;
use crate::dispatch;
use crate::transport::{IppTransport, TransportConnector};

/// Which printer, if any, commands are sent to.
#[derive(Clone, Default)]
pub enum Selection {
    #[default]
    Unselected,
    Selected {
        name: String,
        transport: Arc<dyn IppTransport>,
    },
}

impl Selection {
    fn name(&self) -> Option<&str> {
        match self {
            Self::Unselected => None,
            Self::Selected { name, .. } => Some(name),
        }
    }
}

#[derive(Default)]
struct RegistryState {
    printers: BTreeMap<String, PrinterRecord>,
    selection: Selection,
}

/// Printer registry shared between the discovery event loop and callers.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone)]
pub struct PrinterRegistry {
    state: Arc<Mutex<RegistryState>>,
    connector: Arc<dyn TransportConnector>,
    config: Arc<ClientConfig>,
}

impl PrinterRegistry {
    pub fn new(config: Arc<ClientConfig>, connector: Arc<dyn TransportConnector>) -> Self {
        Self {
            state: Arc::default(),
            connector,
            config,
        }
    }

    /// Apply one discovery event.
    ///
    /// Returns the handle of the background attribute fetch started by an
    /// `Up` event, if any.
    pub fn handle_event(&self, event: DiscoveryEvent) -> Option<JoinHandle<()>> {
        match event {
            DiscoveryEvent::Up(device) => self.on_device_added(device),
            DiscoveryEvent::Down { name } => {
                self.on_device_removed(&name);
                None
            }
        }
    }

    /// Insert a newly announced printer and fetch its attributes.
    ///
    /// A name already present is left untouched.  The first printer to enter
    /// an empty registry is selected when nothing is selected yet.  Must be
    /// called inside a tokio runtime.
    pub fn on_device_added(&self, device: DiscoveredDevice) -> Option<JoinHandle<()>> {
        let record = PrinterRecord::new(device, &self.config.default_resource_path);
        let name = record.name.clone();
        let url = record.url.clone();
        let discovered_at = record.discovered_at;

        {
            let mut state = self.lock();
            if state.printers.contains_key(&name) {
                debug!(name = %name, "printer already registered");
                return None;
            }
            state.printers.insert(name.clone(), record);
            info!(name = %name, url = ?url, count = state.printers.len(), "printer registered");

            let first = state.printers.len() == 1;
            if self.config.auto_select_first && first && state.selection.name().is_none() {
                self.auto_select(&mut state, &name, url.as_deref());
            }
        }

        let Some(url) = url else {
            warn!(name = %name, "printer has no resolvable URL; skipping attribute fetch");
            self.record_failure(&name, discovered_at, "no resolvable IPP URL".into());
            return None;
        };

        // A separate handle, so the fetch never touches the selected one.
        let transport = match self.connector.connect(&url) {
            Ok(transport) => transport,
            Err(e) => {
                self.record_failure(&name, discovered_at, e.to_string());
                return None;
            }
        };

        let registry = self.clone();
        Some(tokio::spawn(async move {
            let outcome =
                dispatch::execute(transport.as_ref(), dispatch::get_printer_attributes()).await;

            let mut state = registry.lock();
            let Some(record) = state
                .printers
                .get_mut(&name)
                .filter(|r| r.discovered_at == discovered_at)
            else {
                debug!(name = %name, "printer left before its attributes arrived");
                return;
            };
            match outcome {
                Ok(attributes) => {
                    record.apply_attributes(attributes);
                    info!(name = %name, status = %record.status, "printer attributes fetched");
                }
                Err(e) => {
                    warn!(name = %name, error = %e, "printer attribute fetch failed");
                    record.apply_error(e.to_string());
                }
            }
        }))
    }

    /// Handle a printer withdrawing its announcement.
    ///
    /// Returns whether a record was evicted.  Evicting the selected printer
    /// clears the selection.
    pub fn on_device_removed(&self, name: &str) -> bool {
        if !self.config.evict_on_removal {
            debug!(name, "removal ignored; eviction disabled");
            return false;
        }

        let mut state = self.lock();
        if state.printers.remove(name).is_none() {
            return false;
        }
        info!(name, "printer evicted");

        if state.selection.name() == Some(name) {
            state.selection = Selection::Unselected;
            warn!(name, "selected printer left the network; selection cleared");
        }
        true
    }

    /// Forget every discovered printer.  The selection is kept.
    pub fn clear(&self) {
        self.lock().printers.clear();
    }

    /// Snapshot of the registry keyed by printer name.
    pub fn list(&self) -> BTreeMap<String, PrinterRecord> {
        self.lock().printers.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().printers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record of the selected printer.
    pub fn details(&self) -> Option<PrinterRecord> {
        let state = self.lock();
        let name = state.selection.name()?;
        state.printers.get(name).cloned()
    }

    /// Select `name` and return the transport bound to it.
    pub fn set_printer(&self, name: &str) -> Result<Arc<dyn IppTransport>> {
        let mut state = self.lock();
        let record = state
            .printers
            .get(name)
            .ok_or_else(|| AirPrintError::UnknownPrinter(name.to_owned()))?;
        let url = record
            .url
            .clone()
            .ok_or_else(|| AirPrintError::UnresolvableUrl(name.to_owned()))?;

        let transport = self.connector.connect(&url)?;
        state.selection = Selection::Selected {
            name: name.to_owned(),
            transport: Arc::clone(&transport),
        };
        info!(name, url = %url, "printer selected");
        Ok(transport)
    }

    pub fn selected(&self) -> bool {
        self.lock().selection.name().is_some()
    }

    pub fn selected_name(&self) -> Option<String> {
        self.lock().selection.name().map(str::to_owned)
    }

    /// Transport of the selected printer, or `NotSelected`.
    pub fn selected_transport(&self) -> Result<Arc<dyn IppTransport>> {
        match &self.lock().selection {
            Selection::Selected { transport, .. } => Ok(Arc::clone(transport)),
            Selection::Unselected => Err(AirPrintError::NotSelected),
        }
    }

    fn auto_select(&self, state: &mut RegistryState, name: &str, url: Option<&str>) {
        let Some(url) = url else {
            return;
        };
        match self.connector.connect(url) {
            Ok(transport) => {
                state.selection = Selection::Selected {
                    name: name.to_owned(),
                    transport,
                };
                info!(name, url, "first printer auto-selected");
            }
            Err(e) => warn!(name, error = %e, "auto-selection failed"),
        }
    }

    fn record_failure(&self, name: &str, discovered_at: DateTime<Utc>, cause: String) {
        let mut state = self.lock();
        if let Some(record) = state
            .printers
            .get_mut(name)
            .filter(|r| r.discovered_at == discovered_at)
        {
            record.apply_error(cause);
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockConnector, device};
    use ipp_picture_core::message::{IppCommand, StatusCode};
    use ipp_picture_core::types::PrinterStatus;

    fn registry(connector: &MockConnector) -> PrinterRegistry {
        registry_with(connector, ClientConfig::default())
    }

    fn registry_with(connector: &MockConnector, config: ClientConfig) -> PrinterRegistry {
        PrinterRegistry::new(Arc::new(config), Arc::new(connector.clone()))
    }

    async fn add(registry: &PrinterRegistry, name: &str, octet: u8) {
        if let Some(fetch) = registry.on_device_added(device(name, octet)) {
            fetch.await.expect("fetch task");
        }
    }

    #[tokio::test]
    async fn added_device_gets_exactly_one_record() {
        let connector = MockConnector::replying(StatusCode::SUCCESSFUL_OK);
        let registry = registry(&connector);

        let fetch = registry.on_device_added(device("Office", 20));
        let list = registry.list();
        assert_eq!(list.len(), 1);
        assert_eq!(
            list["Office"].url.as_deref(),
            Some("http://10.0.0.20:631/ipp/print")
        );
        fetch.expect("fetch started").await.expect("fetch task");

        // One handle for the auto-selection, one for the attribute fetch.
        assert_eq!(connector.connect_count(), 2);
        assert!(registry.on_device_added(device("Office", 20)).is_none());
        assert_eq!(registry.len(), 1);
        assert_eq!(connector.connect_count(), 2);
    }

    #[tokio::test]
    async fn attribute_fetch_updates_status() {
        let connector = MockConnector::replying(StatusCode::SUCCESSFUL_OK);
        let registry = registry(&connector);
        add(&registry, "Office", 20).await;

        let list = registry.list();
        let record = &list["Office"];
        // The canned printer group reports printer-state 3.
        assert_eq!(record.status, PrinterStatus::Reported("idle".into()));
        assert!(record.attributes.is_some());

        let requests = connector.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, "http://10.0.0.20:631/ipp/print");
        assert_eq!(requests[0].1.command, IppCommand::GetPrinterAttributes);
    }

    #[tokio::test]
    async fn failed_fetch_is_recorded_not_raised() {
        let connector = MockConnector::replying(StatusCode::CLIENT_ERROR_NOT_FOUND);
        let registry = registry(&connector);
        add(&registry, "Office", 20).await;

        let list = registry.list();
        let record = &list["Office"];
        assert_eq!(record.status, PrinterStatus::Error);
        assert!(
            record
                .error
                .as_deref()
                .is_some_and(|e| e.contains("client-error-not-found"))
        );

        connector.set_failing();
        add(&registry, "Lobby", 21).await;
        assert_eq!(registry.list()["Lobby"].status, PrinterStatus::Error);
    }

    #[tokio::test]
    async fn first_device_is_auto_selected_and_kept() {
        let connector = MockConnector::replying(StatusCode::SUCCESSFUL_OK);
        let registry = registry(&connector);
        assert!(!registry.selected());

        add(&registry, "Office", 20).await;
        assert_eq!(registry.selected_name().as_deref(), Some("Office"));

        add(&registry, "Lobby", 21).await;
        assert_eq!(registry.selected_name().as_deref(), Some("Office"));
        assert_eq!(registry.details().map(|r| r.name).as_deref(), Some("Office"));
    }

    #[tokio::test]
    async fn auto_selection_can_be_disabled() {
        let connector = MockConnector::replying(StatusCode::SUCCESSFUL_OK);
        let config = ClientConfig {
            auto_select_first: false,
            ..Default::default()
        };
        let registry = registry_with(&connector, config);
        add(&registry, "Office", 20).await;
        assert!(!registry.selected());
        assert!(matches!(registry.selected_transport(), Err(AirPrintError::NotSelected)));
    }

    #[tokio::test]
    async fn set_printer_switches_selection() {
        let connector = MockConnector::replying(StatusCode::SUCCESSFUL_OK);
        let registry = registry(&connector);
        add(&registry, "Office", 20).await;
        add(&registry, "Lobby", 21).await;

        let transport = registry.set_printer("Lobby").expect("select");
        assert_eq!(transport.url(), "http://10.0.0.21:631/ipp/print");
        assert_eq!(registry.selected_name().as_deref(), Some("Lobby"));

        assert!(matches!(
            registry.set_printer("Basement"),
            Err(AirPrintError::UnknownPrinter(_))
        ));
        assert_eq!(registry.selected_name().as_deref(), Some("Lobby"));
    }

    #[tokio::test]
    async fn set_printer_requires_url() {
        let connector = MockConnector::replying(StatusCode::SUCCESSFUL_OK);
        let config = ClientConfig {
            auto_select_first: false,
            ..Default::default()
        };
        let registry = registry_with(&connector, config);
        let mut hostless = device("Ghost", 9);
        hostless.host.clear();
        assert!(registry.on_device_added(hostless).is_none());

        assert_eq!(registry.list()["Ghost"].status, PrinterStatus::Error);
        assert!(matches!(
            registry.set_printer("Ghost"),
            Err(AirPrintError::UnresolvableUrl(_))
        ));
    }

    #[tokio::test]
    async fn removal_evicts_and_clears_selection() {
        let connector = MockConnector::replying(StatusCode::SUCCESSFUL_OK);
        let registry = registry(&connector);
        add(&registry, "Office", 20).await;
        add(&registry, "Lobby", 21).await;

        assert!(registry.on_device_removed("Lobby"));
        assert_eq!(registry.selected_name().as_deref(), Some("Office"));

        assert!(registry.on_device_removed("Office"));
        assert!(!registry.selected());
        assert!(registry.is_empty());
        assert!(!registry.on_device_removed("Office"));
    }

    #[tokio::test]
    async fn removal_can_be_ignored() {
        let connector = MockConnector::replying(StatusCode::SUCCESSFUL_OK);
        let config = ClientConfig {
            evict_on_removal: false,
            ..Default::default()
        };
        let registry = registry_with(&connector, config);
        add(&registry, "Office", 20).await;

        assert!(registry.handle_event(DiscoveryEvent::Down { name: "Office".into() }).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn clear_keeps_selection() {
        let connector = MockConnector::replying(StatusCode::SUCCESSFUL_OK);
        let registry = registry(&connector);
        add(&registry, "Office", 20).await;

        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.selected());
        assert!(registry.details().is_none());
    }
}
