//! Decide whether a job sheet fits on one page.
//!
//! The estimate is a fixed-cost heuristic in millimetres; nothing is measured from rendered
//! output. Section constants are sized for the stylesheet in `templates/jobsheet.css`.

use crate::normalize::{ChecklistEntry, NormalizedJobSheet};

pub const HEADER_HEIGHT_MM: f64 = 20.0;
pub const CLIENT_INFO_HEIGHT_MM: f64 = 40.0;
pub const LOCATION_HEIGHT_MM: f64 = 15.0;
pub const IMAGE_COMPARISON_HEIGHT_MM: f64 = 50.0;
pub const MEASUREMENT_HEIGHT_MM: f64 = 10.0;
pub const SIGNATURE_HEIGHT_MM: f64 = 20.0;
pub const FOOTER_HEIGHT_MM: f64 = 10.0;
pub const REMARKS_HEIGHT_MM: f64 = 15.0;
pub const EMPTY_REMARKS_HEIGHT_MM: f64 = 5.0;
pub const CHECKLIST_TITLE_HEIGHT_MM: f64 = 8.0;
pub const CHECKLIST_HEADER_HEIGHT_MM: f64 = 7.0;
pub const CHECKLIST_ROW_HEIGHT_MM: f64 = 6.0;

/// Row count assumed for an empty checklist.
pub const PLACEHOLDER_ROW_COUNT: usize = 8;
/// Above this estimated height the sheet is split across pages.
pub const SINGLE_PAGE_THRESHOLD_MM: f64 = 270.0;
/// Above this many checklist rows the sheet is split, whatever the height.
pub const MAX_ITEMS_PER_PAGE: usize = 12;

/// How a job sheet is laid out over logical pages.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationPlan {
    pub estimated_height_mm: f64,
    pub needs_multi_page: bool,
    /// Consecutive checklist batches of at most [`MAX_ITEMS_PER_PAGE`] entries. Empty unless
    /// `needs_multi_page` is set.
    pub batches: Vec<Vec<ChecklistEntry>>,
}

/// Estimate the printed height of a sheet with `checklist_items` rows.
pub fn estimate_content_height(checklist_items: usize, has_remarks: bool) -> f64 {
    let fixed = HEADER_HEIGHT_MM
        + CLIENT_INFO_HEIGHT_MM
        + LOCATION_HEIGHT_MM
        + IMAGE_COMPARISON_HEIGHT_MM
        + MEASUREMENT_HEIGHT_MM
        + SIGNATURE_HEIGHT_MM
        + FOOTER_HEIGHT_MM;
    let remarks = if has_remarks {
        REMARKS_HEIGHT_MM
    } else {
        EMPTY_REMARKS_HEIGHT_MM
    };
    let rows = if checklist_items == 0 {
        PLACEHOLDER_ROW_COUNT
    } else {
        checklist_items
    };
    let checklist =
        CHECKLIST_TITLE_HEIGHT_MM + CHECKLIST_HEADER_HEIGHT_MM + rows as f64 * CHECKLIST_ROW_HEIGHT_MM;
    fixed + remarks + checklist
}

pub fn needs_multi_page(estimated_height_mm: f64, checklist_items: usize) -> bool {
    estimated_height_mm > SINGLE_PAGE_THRESHOLD_MM || checklist_items > MAX_ITEMS_PER_PAGE
}

/// Build the [`PaginationPlan`] for a normalized sheet.
pub fn plan_pagination(sheet: &NormalizedJobSheet) -> PaginationPlan {
    let items = sheet.checklist.len();
    let estimated_height_mm = estimate_content_height(items, !sheet.remarks.is_empty());
    let needs_multi_page = needs_multi_page(estimated_height_mm, items);
    let batches = if needs_multi_page {
        sheet
            .checklist
            .chunks(MAX_ITEMS_PER_PAGE)
            .map(<[ChecklistEntry]>::to_vec)
            .collect()
    } else {
        Vec::new()
    };
    PaginationPlan {
        estimated_height_mm,
        needs_multi_page,
        batches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{ChecklistItemBuilder, JobRecordBuilder};
    use crate::normalize::normalize;

    fn sheet_with_items(count: usize, remarks: Option<&str>) -> NormalizedJobSheet {
        let mut builder = JobRecordBuilder::default();
        for n in 0..count {
            builder = builder.add_checklist_item(
                ChecklistItemBuilder::default()
                    .activity(format!("activity {n}"))
                    .build()
                    .unwrap(),
            );
        }
        normalize(&builder.build().unwrap(), remarks)
    }

    #[test]
    fn estimate_is_stable() {
        let first = estimate_content_height(8, false);
        assert_eq!(first, estimate_content_height(8, false));
        assert_eq!(first, 233.0);
    }

    #[test]
    fn empty_checklist_is_estimated_with_placeholder_rows() {
        assert_eq!(
            estimate_content_height(0, false),
            estimate_content_height(PLACEHOLDER_ROW_COUNT, false)
        );
        let plan = plan_pagination(&sheet_with_items(0, None));
        assert!(!plan.needs_multi_page);
        assert!(plan.batches.is_empty());
    }

    #[test]
    fn remarks_add_height() {
        assert_eq!(
            estimate_content_height(3, true) - estimate_content_height(3, false),
            REMARKS_HEIGHT_MM - EMPTY_REMARKS_HEIGHT_MM
        );
    }

    #[test]
    fn twelve_items_fit_and_thirteen_do_not() {
        let twelve = plan_pagination(&sheet_with_items(12, Some("long remark")));
        assert!(twelve.estimated_height_mm <= SINGLE_PAGE_THRESHOLD_MM);
        assert!(!twelve.needs_multi_page);

        let thirteen = plan_pagination(&sheet_with_items(13, None));
        assert!(thirteen.needs_multi_page);
        assert_eq!(thirteen.batches.len(), 2);
        assert_eq!(thirteen.batches[0].len(), 12);
        assert_eq!(thirteen.batches[1].len(), 1);
    }

    #[test]
    fn height_alone_can_force_a_split() {
        assert!(needs_multi_page(270.5, 4));
        assert!(!needs_multi_page(270.0, 12));
    }

    #[test]
    fn batches_preserve_order() {
        let plan = plan_pagination(&sheet_with_items(30, None));
        assert_eq!(
            plan.batches.iter().map(Vec::len).collect::<Vec<_>>(),
            [12, 12, 6]
        );
        let serials: Vec<u64> = plan.batches.iter().flatten().map(|e| e.serial).collect();
        assert_eq!(serials, (1..=30).collect::<Vec<u64>>());
    }
}
