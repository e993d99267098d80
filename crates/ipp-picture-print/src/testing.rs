// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-crate test doubles for the transport and discovery seams.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use ipp_picture_core::error::{AirPrintError, Result};
use ipp_picture_core::message::{
    AttributeGroup, AttributeValue, GroupTag, IppRequest, IppResponse, StatusCode,
};
use ipp_picture_core::types::DiscoveredDevice;

use crate::discovery::{DiscoveryBrowser, DiscoveryEvent};
use crate::transport::{IppTransport, TransportConnector};

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Reply(StatusCode),
    Fail,
}

/// Response every mock transport returns for `status`.
pub fn canned_response(status: StatusCode) -> IppResponse {
    let mut operation = AttributeGroup::new(GroupTag::Operation);
    operation
        .attributes
        .insert("attributes-charset".into(), "utf-8".into());

    let mut printer = AttributeGroup::new(GroupTag::Printer);
    printer
        .attributes
        .insert("printer-state".into(), AttributeValue::Integer(3));

    let mut job = AttributeGroup::new(GroupTag::Job);
    job.attributes.insert("job-id".into(), 42.into());
    job.attributes
        .insert("job-uri".into(), "ipp://printer.local/jobs/42".into());

    IppResponse {
        status,
        request_id: 1,
        groups: vec![operation, printer, job],
    }
}

/// Transport that records requests and answers with a fixed outcome.
pub struct MockTransport {
    url: String,
    outcome: Arc<Mutex<Outcome>>,
    requests: Arc<Mutex<Vec<(String, IppRequest)>>>,
}

impl MockTransport {
    pub fn replying(status: StatusCode) -> Self {
        Self {
            url: "http://mock:631/ipp/print".into(),
            outcome: Arc::new(Mutex::new(Outcome::Reply(status))),
            requests: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            outcome: Arc::new(Mutex::new(Outcome::Fail)),
            ..Self::replying(StatusCode::SUCCESSFUL_OK)
        }
    }

    /// What this transport answers when it replies.
    pub fn reply(&self) -> IppResponse {
        match *self.outcome.lock().expect("outcome lock") {
            Outcome::Reply(status) => canned_response(status),
            Outcome::Fail => panic!("failing transport has no reply"),
        }
    }
}

#[async_trait]
impl IppTransport for MockTransport {
    fn url(&self) -> &str {
        &self.url
    }

    async fn execute(&self, request: IppRequest) -> Result<IppResponse> {
        self.requests
            .lock()
            .expect("request log lock")
            .push((self.url.clone(), request));
        let outcome = *self.outcome.lock().expect("outcome lock");
        match outcome {
            Outcome::Reply(status) => Ok(canned_response(status)),
            Outcome::Fail => Err(AirPrintError::Transport("connection refused".into())),
        }
    }
}

/// Connector whose transports share one outcome and one request log.
#[derive(Clone)]
pub struct MockConnector {
    outcome: Arc<Mutex<Outcome>>,
    requests: Arc<Mutex<Vec<(String, IppRequest)>>>,
    connects: Arc<AtomicUsize>,
}

impl MockConnector {
    pub fn replying(status: StatusCode) -> Self {
        Self {
            outcome: Arc::new(Mutex::new(Outcome::Reply(status))),
            requests: Arc::default(),
            connects: Arc::default(),
        }
    }

    /// Change the answer of every transport, including ones already open.
    pub fn set_status(&self, status: StatusCode) {
        *self.outcome.lock().expect("outcome lock") = Outcome::Reply(status);
    }

    pub fn set_failing(&self) {
        *self.outcome.lock().expect("outcome lock") = Outcome::Fail;
    }

    /// Requests sent so far, with the URL each went to.
    pub fn requests(&self) -> Vec<(String, IppRequest)> {
        self.requests.lock().expect("request log lock").clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("request log lock").len()
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl TransportConnector for MockConnector {
    fn connect(&self, url: &str) -> Result<Arc<dyn IppTransport>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockTransport {
            url: url.to_owned(),
            outcome: Arc::clone(&self.outcome),
            requests: Arc::clone(&self.requests),
        }))
    }
}

/// Browser driven by the test: events are pushed with [`MockBrowser::emit`].
#[derive(Clone, Default)]
pub struct MockBrowser {
    sender: Arc<Mutex<Option<UnboundedSender<DiscoveryEvent>>>>,
    starts: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
}

impl MockBrowser {
    pub fn emit(&self, event: DiscoveryEvent) {
        if let Some(sender) = self.sender.lock().expect("sender lock").as_ref() {
            sender.send(event).expect("event loop alive");
        }
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl DiscoveryBrowser for MockBrowser {
    fn start(&mut self, events: UnboundedSender<DiscoveryEvent>) -> Result<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        *self.sender.lock().expect("sender lock") = Some(events);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        *self.sender.lock().expect("sender lock") = None;
        Ok(())
    }
}

/// A device on `10.0.0.<octet>:631` advertising `rp=ipp/print`.
pub fn device(name: &str, octet: u8) -> DiscoveredDevice {
    let mut txt = BTreeMap::new();
    txt.insert("rp".to_owned(), "ipp/print".to_owned());
    DiscoveredDevice {
        name: name.to_owned(),
        host: format!("10.0.0.{octet}"),
        hostname: format!("{}.local", name.to_lowercase()),
        port: 631,
        txt,
    }
}
