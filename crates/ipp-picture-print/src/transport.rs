// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// IPP transport: one printer URL, one round trip per request.
//
// `HttpTransport` converts the crate's message model into an `ipp`
// `IppRequestResponse`, sends it with the `ipp` crate's async client and
// decodes every attribute group of the answer.  It never judges the status
// code; that is the dispatcher's job.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ipp::prelude::*;
use tracing::{debug, error, instrument, warn};

use ipp_picture_core::error::{AirPrintError, Result};
use ipp_picture_core::message::{
    AttributeGroup, AttributeValue, GroupTag, IppCommand, IppRequest, IppResponse, StatusCode,
};

/// A handle bound to a single printer URL.
#[async_trait]
pub trait IppTransport: Send + Sync {
    /// The printer URL this handle talks to.
    fn url(&self) -> &str;

    /// Perform one IPP round trip.
    ///
    /// Fails only when the exchange itself fails; a response with any status
    /// code is returned as `Ok`.
    async fn execute(&self, request: IppRequest) -> Result<IppResponse>;
}

/// Opens transport handles for printer URLs.
pub trait TransportConnector: Send + Sync {
    fn connect(&self, url: &str) -> Result<Arc<dyn IppTransport>>;
}

/// Transport over HTTP using the `ipp` crate.
pub struct HttpTransport {
    url: String,
    uri: Uri,
    timeout: Duration,
}

impl HttpTransport {
    /// Bind a transport to `url` (http:// or ipp://).
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let uri: Uri = url
            .parse()
            .map_err(|e| AirPrintError::Transport(format!("invalid URI '{url}': {e}")))?;
        Ok(Self {
            url: url.to_owned(),
            uri,
            timeout,
        })
    }
}

#[async_trait]
impl IppTransport for HttpTransport {
    fn url(&self) -> &str {
        &self.url
    }

    #[instrument(skip(self, request), fields(url = %self.url, operation = %request.command))]
    async fn execute(&self, request: IppRequest) -> Result<IppResponse> {
        let operation = request.command.name();
        let ipp_request = to_ipp_request(&self.uri, request);
        let client = AsyncIppClient::new(self.uri.clone());

        debug!("sending IPP request");
        let response = tokio::time::timeout(self.timeout, client.send(ipp_request))
            .await
            .map_err(|_| {
                error!(after = ?self.timeout, "IPP request timed out");
                AirPrintError::Timeout {
                    operation,
                    after: self.timeout,
                }
            })?
            .map_err(|e| {
                error!(error = %e, "IPP request failed");
                AirPrintError::Transport(format!("{operation}: {e}"))
            })?;

        let decoded = from_ipp_response(&response);
        debug!(status = %decoded.status, groups = decoded.groups.len(), "received IPP response");
        Ok(decoded)
    }
}

/// Connector producing [`HttpTransport`] handles.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    timeout: Duration,
}

impl HttpConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl TransportConnector for HttpConnector {
    fn connect(&self, url: &str) -> Result<Arc<dyn IppTransport>> {
        Ok(Arc::new(HttpTransport::new(url, self.timeout)?))
    }
}

// ---------------------------------------------------------------------------
// Conversion between the message model and the `ipp` crate
// ---------------------------------------------------------------------------

/// Attributes whose integer values use the `enum` syntax.
const ENUM_ATTRIBUTES: &[&str] = &[
    "job-state",
    "printer-state",
    "orientation-requested",
    "print-quality",
    "finishings",
];

/// Build the wire request for `request` addressed to `uri`.
///
/// The operation id is written straight into the header so that operations
/// without a variant in the `ipp` crate's `Operation` enum (Cancel-Jobs,
/// Identify-Printer) go out unchanged.
pub fn to_ipp_request(uri: &Uri, request: IppRequest) -> IppRequestResponse {
    let mut ipp_request = IppRequestResponse::new(
        ipp_version(request.command),
        Operation::GetPrinterAttributes,
        Some(uri.clone()),
    );
    ipp_request.header_mut().operation_or_status = request.command.code();

    for group in request.groups {
        let Some(tag) = delimiter_tag(group.tag) else {
            warn!(tag = group.tag.code(), "dropping attribute group with unsupported tag");
            continue;
        };
        for (name, value) in &group.attributes {
            ipp_request
                .attributes_mut()
                .add(tag, IppAttribute::new(name, ipp_value(name, value)));
        }
    }

    if let Some(document) = request.document {
        *ipp_request.payload_mut() = IppPayload::new(Cursor::new(document));
    }

    ipp_request
}

/// Decode status, request id and every attribute group of a response.
pub fn from_ipp_response(response: &IppRequestResponse) -> IppResponse {
    let header = response.header();
    let groups = response
        .attributes()
        .groups()
        .iter()
        .map(|group| AttributeGroup {
            tag: GroupTag::from_code(group.tag() as u8),
            attributes: group
                .attributes()
                .iter()
                .map(|(name, attr)| (name.clone(), attribute_value(attr.value())))
                .collect(),
        })
        .collect();

    IppResponse {
        status: StatusCode(header.operation_or_status),
        request_id: header.request_id,
        groups,
    }
}

/// Cancel-Jobs and Identify-Printer are IPP/2.0 operations.
fn ipp_version(command: IppCommand) -> IppVersion {
    match command {
        IppCommand::CancelJobs | IppCommand::IdentifyPrinter => IppVersion::v2_0(),
        _ => IppVersion::v1_1(),
    }
}

fn delimiter_tag(tag: GroupTag) -> Option<DelimiterTag> {
    match tag {
        GroupTag::Operation => Some(DelimiterTag::OperationAttributes),
        GroupTag::Job => Some(DelimiterTag::JobAttributes),
        GroupTag::Printer => Some(DelimiterTag::PrinterAttributes),
        GroupTag::Unsupported => Some(DelimiterTag::UnsupportedAttributes),
        GroupTag::Other(_) => None,
    }
}

/// Pick the IPP value syntax for `value` from the attribute name.
fn ipp_value(name: &str, value: &AttributeValue) -> IppValue {
    match value {
        AttributeValue::Boolean(b) => IppValue::Boolean(*b),
        AttributeValue::Integer(n) if ENUM_ATTRIBUTES.contains(&name) => IppValue::Enum(*n),
        AttributeValue::Integer(n) => IppValue::Integer(*n),
        AttributeValue::Text(s) => text_value(name, s),
        AttributeValue::List(items) => {
            IppValue::Array(items.iter().map(|item| ipp_value(name, item)).collect())
        }
        AttributeValue::Collection(members) => IppValue::Collection(
            members
                .iter()
                .map(|(member, v)| (member.clone(), ipp_value(member, v)))
                .collect(),
        ),
    }
}

fn text_value(name: &str, s: &str) -> IppValue {
    let s = s.to_owned();
    match name {
        "job-uri" | "printer-uri" | "document-uri" => IppValue::Uri(s),
        "requesting-user-name" | "job-name" | "document-name" | "job-originating-user-name" => {
            IppValue::NameWithoutLanguage(s)
        }
        "document-format" => IppValue::MimeMediaType(s),
        "job-message-to-operator" | "printer-message-from-operator" => {
            IppValue::TextWithoutLanguage(s)
        }
        _ => IppValue::Keyword(s),
    }
}

fn attribute_value(value: &IppValue) -> AttributeValue {
    match value {
        IppValue::Integer(n) | IppValue::Enum(n) => AttributeValue::Integer(*n),
        IppValue::Boolean(b) => AttributeValue::Boolean(*b),
        IppValue::Array(items) => AttributeValue::List(items.iter().map(attribute_value).collect()),
        IppValue::Collection(members) => AttributeValue::Collection(
            members
                .iter()
                .map(|(name, v)| (name.clone(), attribute_value(v)))
                .collect(),
        ),
        other => AttributeValue::Text(other.to_string()),
    }
}
