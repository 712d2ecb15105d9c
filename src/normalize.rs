//! Turn a loosely filled [`JobRecord`] into display-ready strings.
//!
//! Every field goes through the same absence rule: `None`, `""` and the upstream sentinel `"NA"`
//! all display as an empty string. Nothing here fails; a value that cannot be interpreted is
//! shown as it arrived.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::warn;

use crate::job::{ChecklistItem, InputValue, JobRecord};

/// Upstream marker for "no value".
pub const NA_SENTINEL: &str = "NA";

const DATE_ONLY_FORMAT: &str = "%d/%m/%Y";
const DATE_TIME_FORMAT: &str = "%d/%m/%Y, %I:%M %p";
const NAIVE_DATE_TIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

pub fn is_absent(value: Option<&str>) -> bool {
    matches!(value, None | Some("") | Some(NA_SENTINEL))
}

/// The display form of an optional field: the value verbatim, or `""` when absent.
pub fn display(value: Option<&str>) -> String {
    match value {
        None | Some("") | Some(NA_SENTINEL) => String::new(),
        Some(v) => v.to_string(),
    }
}

/// Format a timestamp as day/month/year.
///
/// Values that already look formatted (they contain a comma and an `AM`/`PM` marker) are
/// returned untouched, so formatting is idempotent. Values that cannot be parsed are returned
/// as given.
///
/// # Example
/// ```rust
/// use jobsheet_pdf::normalize::format_date;
///
/// assert_eq!(format_date(Some("2026-10-16")), "16/10/2026");
/// assert_eq!(format_date(Some("2026-10-16T14:05:00")), "16/10/2026, 02:05 PM");
/// assert_eq!(format_date(Some("16 Oct, 02:05 PM")), "16 Oct, 02:05 PM");
/// assert_eq!(format_date(Some("next tuesday")), "next tuesday");
/// assert_eq!(format_date(None), "");
/// ```
pub fn format_date(raw: Option<&str>) -> String {
    let raw = match raw {
        Some(r) if !is_absent(Some(r)) => r.trim(),
        _ => return String::new(),
    };
    if raw.contains(',') && (raw.contains("AM") || raw.contains("PM")) {
        return raw.to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format(DATE_TIME_FORMAT).to_string();
    }
    for fmt in NAIVE_DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return dt.format(DATE_TIME_FORMAT).to_string();
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d.format(DATE_ONLY_FORMAT).to_string();
    }
    warn!(value = raw, "unrecognised date, displaying as given");
    raw.to_string()
}

/// Format a duration as `H:MM:00`, or `""` when both parts are zero.
///
/// Minutes are reduced modulo 60 before padding; the overflow is not carried into hours.
pub fn format_duration(hours: u64, minutes: u64) -> String {
    if hours == 0 && minutes == 0 {
        return String::new();
    }
    format!("{}:{:02}:00", hours, minutes % 60)
}

/// A label/value pair of the client information table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfoCell {
    pub label: &'static str,
    pub value: String,
}

/// One row of the client information table: two label/value pairs side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfoRow {
    pub left: InfoCell,
    pub right: InfoCell,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationStep {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImagePanel {
    pub label: &'static str,
    pub src: Option<String>,
    pub caption: String,
}

/// A checklist entry with its display strings resolved.
///
/// The result column is not resolved here: whether an unanswered row reads `""` or
/// `"Not Completed"` depends on the rest of the rows printed on the same page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistEntry {
    pub serial: u64,
    pub activity: String,
    pub answer: InputValue,
    pub comments: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Measurement {
    pub start_time: String,
    pub end_time: String,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signatures {
    pub performed_by: String,
    pub verified_by: String,
}

/// Display-ready content for one job sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedJobSheet {
    pub job_id: String,
    pub info_rows: Vec<InfoRow>,
    pub location_steps: Vec<LocationStep>,
    pub before: ImagePanel,
    pub after: ImagePanel,
    pub checklist_title: String,
    pub checklist: Vec<ChecklistEntry>,
    pub remarks: String,
    pub measurement: Measurement,
    pub signatures: Signatures,
}

fn cell(label: &'static str, value: Option<&str>) -> InfoCell {
    InfoCell {
        label,
        value: display(value),
    }
}

fn date_cell(label: &'static str, value: Option<&str>) -> InfoCell {
    InfoCell {
        label,
        value: format_date(value),
    }
}

fn info_rows(record: &JobRecord, job_id: &str) -> Vec<InfoRow> {
    let row = |left, right| InfoRow { left, right };
    vec![
        row(
            cell("Client Name", record.client_name.as_deref()),
            cell("Site Name", record.site_name.as_deref()),
        ),
        row(
            cell("Asset Name", record.asset_name.as_deref()),
            cell("Asset Code", record.asset_code.as_deref()),
        ),
        row(
            cell("Asset Category", record.asset_category.as_deref()),
            cell("Asset Group", record.asset_group.as_deref()),
        ),
        row(
            cell("Task Name", record.task_name.as_deref()),
            cell("Job ID", Some(job_id)),
        ),
        row(
            date_cell("Scheduled On", record.scheduled_on.as_deref()),
            cell("Frequency", record.frequency.as_deref()),
        ),
        row(
            cell("Status", record.status.as_deref()),
            cell("Priority", record.priority.as_deref()),
        ),
        row(
            cell("Assigned To", record.assigned_to.as_deref()),
            cell("Supervisor", record.supervisor.as_deref()),
        ),
        row(
            cell("Checklist", record.checklist_name.as_deref()),
            date_cell("Completed On", record.completed_on.as_deref()),
        ),
    ]
}

fn location_steps(record: &JobRecord) -> Vec<LocationStep> {
    let loc = &record.location;
    [
        ("Site", &loc.site),
        ("Building", &loc.building),
        ("Wing", &loc.wing),
        ("Floor", &loc.floor),
        ("Area", &loc.area),
        ("Room", &loc.room),
    ]
    .into_iter()
    .map(|(label, value)| LocationStep {
        label,
        value: display(value.as_deref()),
    })
    .collect()
}

fn image_panel(label: &'static str, src: Option<&str>, taken_at: Option<&str>) -> ImagePanel {
    ImagePanel {
        label,
        src: (!is_absent(src)).then(|| display(src)),
        caption: format_date(taken_at),
    }
}

/// The checklist heading: the task name when there is one, otherwise derived from the asset
/// category.
pub fn checklist_title(record: &JobRecord) -> String {
    if !is_absent(record.task_name.as_deref()) {
        return display(record.task_name.as_deref());
    }
    format!(
        "SERVICE CHECKLIST OF {}",
        display(record.asset_category.as_deref()).to_uppercase()
    )
}

fn checklist_entry(position: usize, item: &ChecklistItem) -> ChecklistEntry {
    ChecklistEntry {
        serial: item.index.unwrap_or(position as u64 + 1),
        activity: display(item.activity.as_deref()),
        answer: match &item.input_value {
            InputValue::Value(v) if v == NA_SENTINEL => InputValue::Empty,
            other => other.clone(),
        },
        comments: display(item.comments.as_deref()),
    }
}

/// The identifier a job sheet is known by: the record id, then the occurrence id.
pub fn job_id(record: &JobRecord) -> Option<String> {
    [record.id.as_deref(), record.occurrence_id.as_deref()]
        .into_iter()
        .find(|v| !is_absent(*v))
        .map(display)
}

/// Normalize a [`JobRecord`] for rendering.
///
/// `comments` is the free-text remark supplied alongside the record; when it is absent the
/// record's own `remarks` field is used instead.
pub fn normalize(record: &JobRecord, comments: Option<&str>) -> NormalizedJobSheet {
    let job_id = job_id(record).unwrap_or_default();
    let remarks = if is_absent(comments) {
        display(record.remarks.as_deref())
    } else {
        display(comments)
    };
    let tracking = &record.time_tracking;

    NormalizedJobSheet {
        info_rows: info_rows(record, &job_id),
        location_steps: location_steps(record),
        before: image_panel(
            "Before",
            record.before_image.as_deref(),
            record.before_image_at.as_deref(),
        ),
        after: image_panel(
            "After",
            record.after_image.as_deref(),
            record.after_image_at.as_deref(),
        ),
        checklist_title: checklist_title(record),
        checklist: record
            .checklist
            .iter()
            .enumerate()
            .map(|(position, item)| checklist_entry(position, item))
            .collect(),
        remarks,
        measurement: Measurement {
            start_time: format_date(tracking.start_time.as_deref()),
            end_time: format_date(tracking.end_time.as_deref()),
            duration: format_duration(
                tracking.duration_hours.unwrap_or(0),
                tracking.duration_minutes.unwrap_or(0),
            ),
        },
        signatures: Signatures {
            performed_by: display(record.personnel.performed_by.as_deref()),
            verified_by: display(record.personnel.verified_by.as_deref()),
        },
        job_id,
    }
}
