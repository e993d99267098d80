// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Client façade: discovery lifecycle, printer selection and the IPP
// commands, all sent to the selected printer.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use ipp_picture_core::config::ClientConfig;
use ipp_picture_core::error::Result;
use ipp_picture_core::message::{IppRequest, IppResponse, PrintMeta, WhichJobs};
use ipp_picture_core::types::PrinterRecord;

use crate::discovery::{DiscoveryBrowser, MdnsBrowser};
use crate::dispatch;
use crate::registry::PrinterRegistry;
use crate::transport::{HttpConnector, IppTransport, TransportConnector};

/// Discovers AirPrint printers and drives the selected one over IPP.
///
/// Discovery and background attribute fetches run as tokio tasks, so
/// [`start_discovery`](Self::start_discovery) and every command must be
/// called inside a tokio runtime.
pub struct AirPrintClient {
    config: Arc<ClientConfig>,
    registry: PrinterRegistry,
    browser: Mutex<Box<dyn DiscoveryBrowser>>,
    event_loop: Mutex<Option<JoinHandle<()>>>,
}

impl AirPrintClient {
    /// Client using the `mdns-sd` browser and the HTTP transport.
    pub fn with_mdns(config: ClientConfig) -> Result<Self> {
        let browser = MdnsBrowser::new(&config.service_type)?;
        let connector = HttpConnector::new(config.request_timeout());
        Ok(Self::new(config, Box::new(browser), Arc::new(connector)))
    }

    pub fn new(
        config: ClientConfig,
        browser: Box<dyn DiscoveryBrowser>,
        connector: Arc<dyn TransportConnector>,
    ) -> Self {
        let config = Arc::new(config);
        Self {
            registry: PrinterRegistry::new(Arc::clone(&config), connector),
            config,
            browser: Mutex::new(browser),
            event_loop: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn registry(&self) -> &PrinterRegistry {
        &self.registry
    }

    // -- discovery ----------------------------------------------------------

    /// Clear the registry and start listening for printers.
    ///
    /// A browse already in progress is restarted so that printers still on
    /// the network are announced again into the emptied registry.
    pub fn start_discovery(&self) -> Result<()> {
        let mut event_loop = lock(&self.event_loop);
        let mut browser = lock(&self.browser);
        if let Some(handle) = event_loop.take() {
            debug!("discovery already running; restarting browse");
            handle.abort();
            browser.stop()?;
        }
        self.registry.clear();

        let (tx, mut rx) = mpsc::unbounded_channel();
        browser.start(tx)?;
        drop(browser);

        let registry = self.registry.clone();
        *event_loop = Some(tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                registry.handle_event(event);
            }
            debug!("discovery event loop finished");
        }));
        info!("discovery started");
        Ok(())
    }

    /// Stop listening for printers and clear the registry.
    pub fn stop_discovery(&self) -> Result<()> {
        lock(&self.browser).stop()?;
        if let Some(handle) = lock(&self.event_loop).take() {
            handle.abort();
        }
        self.registry.clear();
        info!("discovery stopped");
        Ok(())
    }

    // -- registry and selection ---------------------------------------------

    /// Snapshot of every discovered printer keyed by name.
    pub fn list(&self) -> BTreeMap<String, PrinterRecord> {
        self.registry.list()
    }

    pub fn printer_count(&self) -> usize {
        self.registry.len()
    }

    /// Whether a printer is selected.
    pub fn selected(&self) -> bool {
        self.registry.selected()
    }

    /// Record of the selected printer.
    pub fn details(&self) -> Option<PrinterRecord> {
        self.registry.details()
    }

    /// Select a discovered printer by name.
    pub fn set_printer(&self, name: &str) -> Result<Arc<dyn IppTransport>> {
        self.registry.set_printer(name)
    }

    // -- commands -----------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn get_printer_attributes(&self) -> Result<IppResponse> {
        self.run(|| Ok(dispatch::get_printer_attributes())).await
    }

    /// The selected printer's `printer-state` keyword.
    pub async fn get_printer_status(&self) -> Result<Option<String>> {
        Ok(self.get_printer_attributes().await?.printer_state())
    }

    #[instrument(skip(self))]
    pub async fn get_job_attributes(&self, job_uri: &str) -> Result<IppResponse> {
        self.run(|| dispatch::get_job_attributes(job_uri)).await
    }

    #[instrument(skip(self))]
    pub async fn get_incomplete_jobs(&self) -> Result<IppResponse> {
        self.run(|| Ok(dispatch::get_jobs(WhichJobs::NotCompleted))).await
    }

    #[instrument(skip(self))]
    pub async fn get_completed_jobs(&self) -> Result<IppResponse> {
        self.run(|| Ok(dispatch::get_jobs(WhichJobs::Completed))).await
    }

    #[instrument(skip(self))]
    pub async fn cancel_job(&self, job_uri: &str) -> Result<IppResponse> {
        self.run(|| dispatch::cancel_job(job_uri)).await
    }

    /// Cancel the given jobs; an empty slice cancels all of them.
    #[instrument(skip(self))]
    pub async fn cancel_jobs(&self, job_ids: &[i32]) -> Result<IppResponse> {
        self.run(|| Ok(dispatch::cancel_jobs(job_ids))).await
    }

    #[instrument(skip(self))]
    pub async fn identify_printer(&self) -> Result<IppResponse> {
        self.run(|| Ok(dispatch::identify_printer())).await
    }

    /// Print a JPEG image on the selected printer.
    ///
    /// The job is named `<id>-<file_name>.jpg` (or `<id>.jpg`) and
    /// `meta.job_attributes` is sent as the job attribute group.
    #[instrument(skip(self, buffer, meta), fields(bytes = buffer.len()))]
    pub async fn print_jpeg(
        &self,
        buffer: &[u8],
        meta: &PrintMeta,
        file_name: Option<&str>,
    ) -> Result<IppResponse> {
        let user = self.config.requesting_user_name.as_str();
        let response = self
            .run(|| dispatch::print_jpeg(buffer, meta, file_name, user))
            .await?;
        info!(job_uri = ?response.job_uri(), "print job accepted");
        Ok(response)
    }

    /// Resolve the selected transport, then build and send the request.
    ///
    /// Nothing reaches the network when no printer is selected or the
    /// request cannot be built.
    async fn run<F>(&self, build: F) -> Result<IppResponse>
    where
        F: FnOnce() -> Result<IppRequest>,
    {
        let transport = self.registry.selected_transport()?;
        let request = build()?;
        dispatch::execute(transport.as_ref(), request).await
    }
}

impl Drop for AirPrintClient {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.event_loop).take() {
            handle.abort();
            if let Err(e) = lock(&self.browser).stop() {
                warn!(error = %e, "failed to stop discovery on drop");
            }
        }
    }
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
