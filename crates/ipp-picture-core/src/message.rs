// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transport-neutral model of the IPP messages exchanged with a printer.
//
// The wire encoding belongs to the `ipp` crate; these types only describe
// which operation is sent, which attribute groups it carries, and what the
// printer answered (RFC 8011 §4.1).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw IPP status code from a response header (RFC 8011 Appendix B).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const SUCCESSFUL_OK: Self = Self(0x0000);
    pub const SUCCESSFUL_OK_IGNORED_OR_SUBSTITUTED_ATTRIBUTES: Self = Self(0x0001);
    pub const CLIENT_ERROR_NOT_FOUND: Self = Self(0x0406);

    /// Whether a response with this status is handed back to the caller.
    ///
    /// Only the two plain success codes count; every other code, including
    /// `successful-ok-conflicting-attributes`, is a rejection.
    pub fn is_accepted(self) -> bool {
        self == Self::SUCCESSFUL_OK || self == Self::SUCCESSFUL_OK_IGNORED_OR_SUBSTITUTED_ATTRIBUTES
    }

    /// RFC keyword for the code, if it is a registered one.
    pub fn keyword(self) -> Option<&'static str> {
        let kw = match self.0 {
            0x0000 => "successful-ok",
            0x0001 => "successful-ok-ignored-or-substituted-attributes",
            0x0002 => "successful-ok-conflicting-attributes",
            0x0400 => "client-error-bad-request",
            0x0401 => "client-error-forbidden",
            0x0402 => "client-error-not-authenticated",
            0x0403 => "client-error-not-authorized",
            0x0404 => "client-error-not-possible",
            0x0405 => "client-error-timeout",
            0x0406 => "client-error-not-found",
            0x0407 => "client-error-gone",
            0x0408 => "client-error-request-entity-too-large",
            0x0409 => "client-error-request-value-too-long",
            0x040A => "client-error-document-format-not-supported",
            0x040B => "client-error-attributes-or-values-not-supported",
            0x040C => "client-error-uri-scheme-not-supported",
            0x040D => "client-error-charset-not-supported",
            0x040E => "client-error-conflicting-attributes",
            0x040F => "client-error-compression-not-supported",
            0x0410 => "client-error-compression-error",
            0x0411 => "client-error-document-format-error",
            0x0412 => "client-error-document-access-error",
            0x0500 => "server-error-internal-error",
            0x0501 => "server-error-operation-not-supported",
            0x0502 => "server-error-service-unavailable",
            0x0503 => "server-error-version-not-supported",
            0x0504 => "server-error-device-error",
            0x0505 => "server-error-temporary-error",
            0x0506 => "server-error-not-accepting-jobs",
            0x0507 => "server-error-busy",
            0x0508 => "server-error-job-canceled",
            0x0509 => "server-error-multiple-document-jobs-not-supported",
            _ => return None,
        };
        Some(kw)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.keyword() {
            Some(kw) => f.write_str(kw),
            None => write!(f, "0x{:04x}", self.0),
        }
    }
}

/// The IPP operations this client issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IppCommand {
    PrintJob,
    CancelJob,
    GetJobAttributes,
    GetJobs,
    GetPrinterAttributes,
    CancelJobs,
    IdentifyPrinter,
}

impl IppCommand {
    /// Operation name as written in RFC 8011 / PWG 5100.11 / PWG 5100.13.
    pub fn name(self) -> &'static str {
        match self {
            Self::PrintJob => "Print-Job",
            Self::CancelJob => "Cancel-Job",
            Self::GetJobAttributes => "Get-Job-Attributes",
            Self::GetJobs => "Get-Jobs",
            Self::GetPrinterAttributes => "Get-Printer-Attributes",
            Self::CancelJobs => "Cancel-Jobs",
            Self::IdentifyPrinter => "Identify-Printer",
        }
    }

    /// `operation-id` value in the request header.
    pub fn code(self) -> u16 {
        match self {
            Self::PrintJob => 0x0002,
            Self::CancelJob => 0x0008,
            Self::GetJobAttributes => 0x0009,
            Self::GetJobs => 0x000A,
            Self::GetPrinterAttributes => 0x000B,
            Self::CancelJobs => 0x0038,
            Self::IdentifyPrinter => 0x003C,
        }
    }
}

impl fmt::Display for IppCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Attribute group delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupTag {
    Operation,
    Job,
    Printer,
    Unsupported,
    Other(u8),
}

impl GroupTag {
    pub fn code(self) -> u8 {
        match self {
            Self::Operation => 0x01,
            Self::Job => 0x02,
            Self::Printer => 0x04,
            Self::Unsupported => 0x05,
            Self::Other(code) => code,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            0x01 => Self::Operation,
            0x02 => Self::Job,
            0x04 => Self::Printer,
            0x05 => Self::Unsupported,
            other => Self::Other(other),
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Operation => "operation-attributes-tag",
            Self::Job => "job-attributes-tag",
            Self::Printer => "printer-attributes-tag",
            Self::Unsupported => "unsupported-attributes-tag",
            Self::Other(_) => "other-attributes-tag",
        }
    }
}

/// An attribute value, independent of its IPP value syntax.
///
/// Deserializes from plain JSON (`2`, `"iso_a4_210x297mm"`, `[1, 2]`,
/// `{"media-size": {...}}`) so callers can hand over job attributes as data.
/// The transport picks the concrete IPP syntax from the attribute name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Boolean(bool),
    Integer(i32),
    Text(String),
    List(Vec<AttributeValue>),
    Collection(BTreeMap<String, AttributeValue>),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Values of a multi-valued attribute; a single value yields itself.
    pub fn values(&self) -> &[AttributeValue] {
        match self {
            Self::List(items) => items,
            single => std::slice::from_ref(single),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Self::Collection(members) => {
                f.write_str("{")?;
                for (i, (name, value)) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{name}={value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl<T: Into<AttributeValue>> From<Vec<T>> for AttributeValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// One delimited group of attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeGroup {
    pub tag: GroupTag,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl AttributeGroup {
    pub fn new(tag: GroupTag) -> Self {
        Self {
            tag,
            attributes: BTreeMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }
}

/// An operation plus the attribute groups and document it carries.
///
/// `attributes-charset`, `attributes-natural-language` and `printer-uri` are
/// added by the transport and are not part of this model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IppRequest {
    pub command: IppCommand,
    pub groups: Vec<AttributeGroup>,
    pub document: Option<Vec<u8>>,
}

impl IppRequest {
    pub fn new(command: IppCommand) -> Self {
        Self {
            command,
            groups: Vec::new(),
            document: None,
        }
    }

    /// Add an attribute, creating its group on first use.
    pub fn with_attribute(
        mut self,
        tag: GroupTag,
        name: &str,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.group_mut(tag)
            .attributes
            .insert(name.to_owned(), value.into());
        self
    }

    /// Merge a whole set of attributes into the group `tag`.
    pub fn with_attributes(
        mut self,
        tag: GroupTag,
        attributes: impl IntoIterator<Item = (String, AttributeValue)>,
    ) -> Self {
        self.group_mut(tag).attributes.extend(attributes);
        self
    }

    pub fn with_document(mut self, bytes: Vec<u8>) -> Self {
        self.document = Some(bytes);
        self
    }

    pub fn group(&self, tag: GroupTag) -> Option<&AttributeGroup> {
        self.groups.iter().find(|g| g.tag == tag)
    }

    fn group_mut(&mut self, tag: GroupTag) -> &mut AttributeGroup {
        let idx = match self.groups.iter().position(|g| g.tag == tag) {
            Some(idx) => idx,
            None => {
                self.groups.push(AttributeGroup::new(tag));
                self.groups.len() - 1
            }
        };
        &mut self.groups[idx]
    }
}

/// A decoded IPP response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IppResponse {
    pub status: StatusCode,
    pub request_id: u32,
    /// Groups in wire order.  Get-Jobs responses carry one job group per job.
    pub groups: Vec<AttributeGroup>,
}

impl IppResponse {
    /// First group with the given tag.
    pub fn group(&self, tag: GroupTag) -> Option<&AttributeGroup> {
        self.groups.iter().find(|g| g.tag == tag)
    }

    /// All groups with the given tag.
    pub fn groups_of(&self, tag: GroupTag) -> impl Iterator<Item = &AttributeGroup> {
        self.groups.iter().filter(move |g| g.tag == tag)
    }

    pub fn attribute(&self, tag: GroupTag, name: &str) -> Option<&AttributeValue> {
        self.group(tag).and_then(|g| g.get(name))
    }

    /// The `printer-state` keyword of a Get-Printer-Attributes response.
    pub fn printer_state(&self) -> Option<String> {
        match self.attribute(GroupTag::Printer, "printer-state")? {
            AttributeValue::Integer(n) => Some(
                printer_state_keyword(*n)
                    .map(str::to_owned)
                    .unwrap_or_else(|| n.to_string()),
            ),
            other => Some(other.to_string()),
        }
    }

    /// `job-uri` of the first job group, e.g. from a Print-Job response.
    pub fn job_uri(&self) -> Option<&str> {
        self.attribute(GroupTag::Job, "job-uri")
            .and_then(AttributeValue::as_str)
    }

    /// One summary per job group that carries a `job-id`.
    pub fn jobs(&self) -> Vec<JobSummary> {
        self.groups_of(GroupTag::Job)
            .filter_map(JobSummary::from_group)
            .collect()
    }
}

/// Which jobs a Get-Jobs request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WhichJobs {
    Completed,
    NotCompleted,
}

impl WhichJobs {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::NotCompleted => "not-completed",
        }
    }
}

/// Caller-supplied extras for a Print-Job request.
///
/// `job-attributes-tag` is copied into the request's job group as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintMeta {
    #[serde(rename = "job-attributes-tag", default, skip_serializing_if = "Option::is_none")]
    pub job_attributes: Option<BTreeMap<String, AttributeValue>>,
}

/// Attributes requested for every job in the Get-Jobs listings.
pub const JOB_SUMMARY_ATTRIBUTES: [&str; 7] = [
    "job-id",
    "job-uri",
    "job-state",
    "job-state-reasons",
    "job-name",
    "job-originating-user-name",
    "job-media-sheets-completed",
];

/// The fields of [`JOB_SUMMARY_ATTRIBUTES`] for a single job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: i32,
    pub job_uri: Option<String>,
    /// `job-state` keyword (e.g. "processing", "completed").
    pub job_state: Option<String>,
    pub job_state_reasons: Vec<String>,
    pub job_name: Option<String>,
    pub job_originating_user_name: Option<String>,
    pub job_media_sheets_completed: Option<i32>,
}

impl JobSummary {
    fn from_group(group: &AttributeGroup) -> Option<Self> {
        let job_id = group.get("job-id")?.as_integer()?;
        let text = |name: &str| group.get(name).map(|v| v.to_string());

        let job_state = group.get("job-state").map(|v| match v {
            AttributeValue::Integer(n) => job_state_keyword(*n)
                .map(str::to_owned)
                .unwrap_or_else(|| n.to_string()),
            other => other.to_string(),
        });

        let job_state_reasons = group
            .get("job-state-reasons")
            .map(|v| v.values().iter().map(|r| r.to_string()).collect())
            .unwrap_or_default();

        Some(Self {
            job_id,
            job_uri: text("job-uri"),
            job_state,
            job_state_reasons,
            job_name: text("job-name"),
            job_originating_user_name: text("job-originating-user-name"),
            job_media_sheets_completed: group
                .get("job-media-sheets-completed")
                .and_then(AttributeValue::as_integer),
        })
    }
}

/// `printer-state` enum keyword (RFC 8011 §5.4.11).
pub fn printer_state_keyword(value: i32) -> Option<&'static str> {
    match value {
        3 => Some("idle"),
        4 => Some("processing"),
        5 => Some("stopped"),
        _ => None,
    }
}

/// `job-state` enum keyword (RFC 8011 §5.3.7).
pub fn job_state_keyword(value: i32) -> Option<&'static str> {
    match value {
        3 => Some("pending"),
        4 => Some("pending-held"),
        5 => Some("processing"),
        6 => Some("processing-stopped"),
        7 => Some("canceled"),
        8 => Some("aborted"),
        9 => Some("completed"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_group(id: i32, state: i32) -> AttributeGroup {
        let mut group = AttributeGroup::new(GroupTag::Job);
        group.attributes.insert("job-id".into(), id.into());
        group.attributes.insert("job-state".into(), state.into());
        group.attributes.insert(
            "job-state-reasons".into(),
            vec!["job-printing", "media-low"].into(),
        );
        group.attributes.insert(
            "job-uri".into(),
            format!("ipp://printer.local/jobs/{id}").into(),
        );
        group
    }

    #[test]
    fn only_two_codes_are_accepted() {
        assert!(StatusCode(0x0000).is_accepted());
        assert!(StatusCode(0x0001).is_accepted());
        assert!(!StatusCode(0x0002).is_accepted());
        assert!(!StatusCode::CLIENT_ERROR_NOT_FOUND.is_accepted());
    }

    #[test]
    fn status_code_displays_keyword_or_hex() {
        assert_eq!(StatusCode(0x0406).to_string(), "client-error-not-found");
        assert_eq!(StatusCode(0x0001).to_string(), "successful-ok-ignored-or-substituted-attributes");
        assert_eq!(StatusCode(0x0777).to_string(), "0x0777");
    }

    #[test]
    fn request_builder_merges_into_existing_group() {
        let request = IppRequest::new(IppCommand::GetJobs)
            .with_attribute(GroupTag::Operation, "which-jobs", "completed")
            .with_attribute(GroupTag::Operation, "limit", 10);
        assert_eq!(request.groups.len(), 1);
        let group = request.group(GroupTag::Operation).expect("operation group");
        assert_eq!(group.get("which-jobs"), Some(&AttributeValue::from("completed")));
        assert_eq!(group.get("limit"), Some(&AttributeValue::Integer(10)));
    }

    #[test]
    fn jobs_are_projected_from_job_groups() {
        let response = IppResponse {
            status: StatusCode::SUCCESSFUL_OK,
            request_id: 1,
            groups: vec![
                AttributeGroup::new(GroupTag::Operation),
                job_group(12, 5),
                job_group(13, 9),
            ],
        };
        let jobs = response.jobs();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].job_id, 12);
        assert_eq!(jobs[0].job_state.as_deref(), Some("processing"));
        assert_eq!(jobs[0].job_state_reasons, vec!["job-printing", "media-low"]);
        assert_eq!(jobs[1].job_state.as_deref(), Some("completed"));
        assert_eq!(response.job_uri(), Some("ipp://printer.local/jobs/12"));
    }

    #[test]
    fn printer_state_maps_enum_to_keyword() {
        let mut printer = AttributeGroup::new(GroupTag::Printer);
        printer.attributes.insert("printer-state".into(), 3.into());
        let response = IppResponse {
            status: StatusCode::SUCCESSFUL_OK,
            request_id: 1,
            groups: vec![printer],
        };
        assert_eq!(response.printer_state().as_deref(), Some("idle"));
    }

    #[test]
    fn print_meta_reads_job_attributes_tag() {
        let meta: PrintMeta = serde_json::from_str(
            r#"{ "job-attributes-tag": { "copies": 2, "media": "na_index-4x6_4x6in" } }"#,
        )
        .expect("parse");
        let job = meta.job_attributes.expect("job attributes");
        assert_eq!(job["copies"], AttributeValue::Integer(2));

        let empty: PrintMeta = serde_json::from_str("{}").expect("parse");
        assert!(empty.job_attributes.is_none());
    }

    #[test]
    fn attribute_values_deserialize_from_plain_json() {
        let parsed: BTreeMap<String, AttributeValue> = serde_json::from_str(
            r#"{ "copies": 2, "media": "iso_a4_210x297mm", "print-color": true,
                 "page-ranges": [1, 3], "media-col": { "media-type": "photographic" } }"#,
        )
        .expect("parse");
        assert_eq!(parsed["copies"], AttributeValue::Integer(2));
        assert_eq!(parsed["media"].as_str(), Some("iso_a4_210x297mm"));
        assert_eq!(parsed["print-color"], AttributeValue::Boolean(true));
        assert_eq!(parsed["page-ranges"].values().len(), 2);
        assert!(matches!(parsed["media-col"], AttributeValue::Collection(_)));
    }
}
