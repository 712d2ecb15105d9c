//! Assemble the HTML for each logical page of a job sheet.
//!
//! A sheet is rendered either as one page holding every section, or, when the
//! [`PaginationPlan`] asks for it, as one page per checklist batch. Batched pages repeat the
//! header and footer; the first carries client information, location and photos, the last
//! carries remarks, time tracking and signatures.

use minijinja::Environment;
use serde::Serialize;
use tracing::debug;

use crate::{
    error::{AddContext, Error},
    layout::PaginationPlan,
    normalize::{
        ChecklistEntry, ImagePanel, InfoRow, LocationStep, Measurement, NormalizedJobSheet,
        Signatures,
    },
    template_env::render_template,
};

/// Result text for every row of a page on which nothing was answered.
pub const NOT_COMPLETED: &str = "Not Completed";
const CONTINUED_SUFFIX: &str = " (Continued)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistRow {
    pub serial: u64,
    pub activity: String,
    pub result: String,
    pub comments: String,
}

/// Resolve the result column for the rows printed together on one page.
///
/// If no row on the page has an answer, every row reads [`NOT_COMPLETED`]. Otherwise
/// unanswered rows stay blank.
pub fn checklist_rows(entries: &[ChecklistEntry]) -> Vec<ChecklistRow> {
    let has_responses = entries.iter().any(|e| e.answer.is_answered());
    entries
        .iter()
        .map(|e| ChecklistRow {
            serial: e.serial,
            activity: e.activity.clone(),
            result: if e.answer.is_answered() || has_responses {
                e.answer.as_str().to_string()
            } else {
                NOT_COMPLETED.to_string()
            },
            comments: e.comments.clone(),
        })
        .collect()
}

/// Everything the page template needs for one logical page.
#[derive(Debug, Clone, Serialize)]
pub struct PageContext<'a> {
    pub job_id: &'a str,
    pub logo_src: &'a str,
    pub page_number: usize,
    pub page_count: usize,
    pub show_client_info: bool,
    pub show_location: bool,
    pub show_images: bool,
    pub show_closing: bool,
    pub info_rows: &'a [InfoRow],
    pub location_steps: &'a [LocationStep],
    pub before: &'a ImagePanel,
    pub after: &'a ImagePanel,
    pub checklist_title: String,
    pub checklist_rows: Vec<ChecklistRow>,
    pub remarks: &'a str,
    pub measurement: &'a Measurement,
    pub signatures: &'a Signatures,
}

fn page<'a>(
    sheet: &'a NormalizedJobSheet,
    logo_src: &'a str,
    entries: &[ChecklistEntry],
    page_number: usize,
    page_count: usize,
) -> PageContext<'a> {
    let first = page_number == 1;
    let checklist_title = if first {
        sheet.checklist_title.clone()
    } else {
        format!("{}{CONTINUED_SUFFIX}", sheet.checklist_title)
    };
    PageContext {
        job_id: &sheet.job_id,
        logo_src,
        page_number,
        page_count,
        show_client_info: first,
        show_location: first,
        show_images: first,
        show_closing: page_number == page_count,
        info_rows: &sheet.info_rows,
        location_steps: &sheet.location_steps,
        before: &sheet.before,
        after: &sheet.after,
        checklist_title,
        checklist_rows: checklist_rows(entries),
        remarks: &sheet.remarks,
        measurement: &sheet.measurement,
        signatures: &sheet.signatures,
    }
}

/// The single page holding the whole sheet.
pub fn single_page<'a>(sheet: &'a NormalizedJobSheet, logo_src: &'a str) -> PageContext<'a> {
    page(sheet, logo_src, &sheet.checklist, 1, 1)
}

/// One page per checklist batch.
pub fn batched_pages<'a>(
    sheet: &'a NormalizedJobSheet,
    logo_src: &'a str,
    batches: &[Vec<ChecklistEntry>],
) -> Vec<PageContext<'a>> {
    let page_count = batches.len();
    batches
        .iter()
        .enumerate()
        .map(|(n, batch)| page(sheet, logo_src, batch, n + 1, page_count))
        .collect()
}

/// The logical pages selected by `plan`.
pub fn page_contexts<'a>(
    sheet: &'a NormalizedJobSheet,
    plan: &PaginationPlan,
    logo_src: &'a str,
) -> Vec<PageContext<'a>> {
    if plan.needs_multi_page && !plan.batches.is_empty() {
        batched_pages(sheet, logo_src, &plan.batches)
    } else {
        vec![single_page(sheet, logo_src)]
    }
}

/// Render the HTML document for every logical page, in order.
pub fn assemble_pages(
    env: &Environment<'static>,
    sheet: &NormalizedJobSheet,
    plan: &PaginationPlan,
    logo_src: &str,
) -> Result<Vec<String>, Error> {
    page_contexts(sheet, plan, logo_src)
        .iter()
        .map(|ctx| {
            debug!(
                page = ctx.page_number,
                of = ctx.page_count,
                rows = ctx.checklist_rows.len(),
                "assembling logical page"
            );
            render_template(env, ctx)
                .map_err(Error::from)
                .add_context(&format!("rendering logical page {}", ctx.page_number))
        })
        .collect()
}
