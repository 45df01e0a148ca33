//! Report request: the layout document plus the metadata it is rendered with.

use serde::{Deserialize, Serialize};
use time::Date;
use time::macros::format_description;

use crate::compat::HostSelection;
use crate::layout::Document;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    #[error("report name is required")]
    NameRequired,
    #[error("no module has been added to the report layout")]
    EmptyLayout,
    #[error("no host is selected")]
    NoHosts,
    #[error("invalid {field}: '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { field: &'static str, value: String },
    #[error("start date {start} is after end date {end}")]
    DateRange { start: String, end: String },
}

impl crate::error::ErrorCode for ReportError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NameRequired => "E_REPORT_NAME_REQUIRED",
            Self::EmptyLayout => "E_REPORT_EMPTY_LAYOUT",
            Self::NoHosts => "E_REPORT_NO_HOSTS",
            Self::InvalidDate { .. } => "E_REPORT_INVALID_DATE",
            Self::DateRange { .. } => "E_REPORT_DATE_RANGE",
        }
    }
}

/// User-supplied report metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportOptions {
    pub report_name: String,
    pub start_date: String,
    pub end_date: String,
}

/// Everything the renderer needs to produce one report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRequest {
    pub report_name: String,
    pub hosts: Vec<String>,
    pub start_date: String,
    pub end_date: String,
    pub modules: Document,
}

/// Assemble and validate a report request.
///
/// # Errors
///
/// Returns the first failed check, in order: name, layout, hosts, dates.
pub fn build_request(options: ReportOptions, hosts: &HostSelection, modules: Document) -> Result<ReportRequest, ReportError> {
    let report_name = options.report_name.trim().to_string();
    if report_name.is_empty() {
        return Err(ReportError::NameRequired);
    }
    if modules.is_empty() {
        return Err(ReportError::EmptyLayout);
    }
    if hosts.is_empty() {
        return Err(ReportError::NoHosts);
    }

    let start = parse_date("start_date", &options.start_date)?;
    let end = parse_date("end_date", &options.end_date)?;
    if start > end {
        return Err(ReportError::DateRange { start: options.start_date, end: options.end_date });
    }

    Ok(ReportRequest {
        report_name,
        hosts: hosts.iter().cloned().collect(),
        start_date: options.start_date.trim().to_string(),
        end_date: options.end_date.trim().to_string(),
        modules,
    })
}

fn parse_date(field: &'static str, raw: &str) -> Result<Date, ReportError> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| ReportError::InvalidDate { field, value: raw.to_string() })
}

#[cfg(test)]
#[path = "report_test.rs"]
mod tests;
