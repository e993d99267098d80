// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command dispatch: request payloads for every supported operation and the
// single round-trip wrapper that turns IPP status codes into errors.

use tracing::{debug, instrument, warn};

use ipp_picture_core::error::{AirPrintError, Result};
use ipp_picture_core::message::{
    GroupTag, IppCommand, IppRequest, IppResponse, JOB_SUMMARY_ATTRIBUTES, PrintMeta, WhichJobs,
};

use crate::job_name::jpeg_job_name;
use crate::transport::IppTransport;

/// Send `request` and accept only the allow-listed success codes.
///
/// Transport failures propagate unchanged; any other status becomes
/// [`AirPrintError::DeviceRejected`] carrying the literal status keyword.
#[instrument(skip(transport, request), fields(url = %transport.url(), operation = %request.command))]
pub async fn execute(transport: &dyn IppTransport, request: IppRequest) -> Result<IppResponse> {
    let operation = request.command.name();
    let response = transport.execute(request).await?;

    if !response.status.is_accepted() {
        warn!(status = %response.status, "printer rejected request");
        return Err(AirPrintError::DeviceRejected {
            operation,
            status: response.status.to_string(),
        });
    }

    debug!(status = %response.status, "request accepted");
    Ok(response)
}

pub fn get_printer_attributes() -> IppRequest {
    IppRequest::new(IppCommand::GetPrinterAttributes)
}

pub fn get_job_attributes(job_uri: &str) -> Result<IppRequest> {
    let job_uri = required_job_uri(job_uri)?;
    Ok(IppRequest::new(IppCommand::GetJobAttributes).with_attribute(
        GroupTag::Operation,
        "job-uri",
        job_uri,
    ))
}

/// Get-Jobs asking for the summary fields of the chosen jobs.
pub fn get_jobs(which: WhichJobs) -> IppRequest {
    IppRequest::new(IppCommand::GetJobs)
        .with_attribute(GroupTag::Operation, "which-jobs", which.keyword())
        .with_attribute(
            GroupTag::Operation,
            "requested-attributes",
            JOB_SUMMARY_ATTRIBUTES.to_vec(),
        )
}

pub fn cancel_job(job_uri: &str) -> Result<IppRequest> {
    let job_uri = required_job_uri(job_uri)?;
    Ok(IppRequest::new(IppCommand::CancelJob).with_attribute(
        GroupTag::Operation,
        "job-uri",
        job_uri,
    ))
}

/// Cancel-Jobs for `job_ids`.
///
/// An empty slice cancels every job: IPP has no encoding for an empty
/// `1setOf integer`, and an absent `job-ids` means "all jobs" (PWG 5100.11
/// §4.1).
pub fn cancel_jobs(job_ids: &[i32]) -> IppRequest {
    let request = IppRequest::new(IppCommand::CancelJobs);
    if job_ids.is_empty() {
        request
    } else {
        request.with_attribute(GroupTag::Operation, "job-ids", job_ids.to_vec())
    }
}

pub fn identify_printer() -> IppRequest {
    IppRequest::new(IppCommand::IdentifyPrinter)
}

/// Print-Job carrying a JPEG document.
pub fn print_jpeg(
    buffer: &[u8],
    meta: &PrintMeta,
    file_name: Option<&str>,
    requesting_user_name: &str,
) -> Result<IppRequest> {
    if buffer.is_empty() {
        return Err(AirPrintError::MissingArgument("JPEG document bytes"));
    }
    if !buffer.starts_with(&[0xFF, 0xD8]) {
        warn!(len = buffer.len(), "document does not start with a JPEG SOI marker");
    }

    let mut request = IppRequest::new(IppCommand::PrintJob)
        .with_attribute(GroupTag::Operation, "requesting-user-name", requesting_user_name)
        .with_attribute(GroupTag::Operation, "job-name", jpeg_job_name(file_name))
        .with_attribute(GroupTag::Operation, "document-format", "image/jpeg");

    if let Some(job_attributes) = &meta.job_attributes {
        request = request.with_attributes(GroupTag::Job, job_attributes.clone());
    }

    Ok(request.with_document(buffer.to_vec()))
}

fn required_job_uri(job_uri: &str) -> Result<&str> {
    let job_uri = job_uri.trim();
    if job_uri.is_empty() {
        return Err(AirPrintError::MissingArgument("job-uri"));
    }
    Ok(job_uri)
}
