use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbImage};
use jobsheet_pdf::{
    ChecklistItemBuilder, Error, GeneratorOptions, JobRecord, JobRecordBuilder, Stage,
    config::RenderConfig, generate_job_sheet_pdf,
};
use lopdf::Document;

const PAGE_WIDTH_PX: u32 = 1588;

/// Captures a blank image whose height grows with the number of checklist rows on the page.
#[derive(Default)]
struct FakeStage {
    mounted: Vec<String>,
    current: Option<String>,
    unmounts: usize,
    fixed_height_px: Option<u32>,
    fail_on_page: Option<usize>,
}

impl Stage for FakeStage {
    async fn mount(&mut self, html: &str) -> Result<(), Error> {
        self.mounted.push(html.to_string());
        self.current = Some(html.to_string());
        Ok(())
    }

    async fn capture(&mut self) -> Result<Vec<u8>, Error> {
        if self.fail_on_page == Some(self.mounted.len()) {
            return Err(Error::from(String::from("renderer crashed")));
        }
        let html = self.current.as_deref().unwrap_or_default();
        let rows = html.matches("<td class=\"serial\">").count() as u32;
        let height = self.fixed_height_px.unwrap_or(1400 + rows * 40);
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(PAGE_WIDTH_PX, height))
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(Error::from)?;
        Ok(buf)
    }

    async fn unmount(&mut self) -> Result<(), Error> {
        self.current = None;
        self.unmounts += 1;
        Ok(())
    }
}

fn options() -> GeneratorOptions {
    GeneratorOptions {
        render: RenderConfig {
            settle_delay_ms: 0,
            ..RenderConfig::default()
        },
        ..GeneratorOptions::default()
    }
}

fn record_with_items(count: usize) -> JobRecord {
    let mut builder = JobRecordBuilder::default().id("42").asset_category("Chiller");
    for n in 0..count {
        builder = builder.add_checklist_item(
            ChecklistItemBuilder::default()
                .activity(format!("Step {n}"))
                .input_value(if n % 2 == 0 { "OK" } else { "" })
                .build()
                .unwrap(),
        );
    }
    builder.build().unwrap()
}

fn page_count(bytes: &[u8]) -> usize {
    Document::load_mem(bytes).unwrap().get_pages().len()
}

#[tokio::test]
async fn empty_record_fits_on_one_page() {
    let record: JobRecord = serde_json::from_value(serde_json::json!({
        "id": 7,
        "checklist_responses": [],
        "bef_sub_attachment": null,
        "aft_sub_attachment": null
    }))
    .unwrap();
    let mut stage = FakeStage::default();
    let pdf = generate_job_sheet_pdf(&mut stage, &record, None, &options())
        .await
        .unwrap();

    assert_eq!(stage.mounted.len(), 1);
    let html = &stage.mounted[0];
    assert!(html.contains("No checklist items available"));
    assert_eq!(html.matches("No image available").count(), 2);
    assert_eq!(pdf.logical_pages, 1);
    assert_eq!(pdf.physical_pages, 1);
    assert_eq!(page_count(&pdf.bytes), 1);
    assert!(pdf.filename.starts_with("JobSheet_7_"));
    assert!(pdf.filename.ends_with(".pdf"));
}

#[tokio::test]
async fn long_checklist_is_batched() {
    let mut stage = FakeStage::default();
    let pdf = generate_job_sheet_pdf(&mut stage, &record_with_items(30), Some("done"), &options())
        .await
        .unwrap();

    assert_eq!(pdf.logical_pages, 3);
    assert_eq!(stage.mounted.len(), 3);
    assert_eq!(stage.unmounts, 3);
    assert!(stage.mounted[1].contains("SERVICE CHECKLIST OF CHILLER (Continued)"));
    assert!(stage.mounted[0].contains("Page 1 of 3"));
    assert!(stage.mounted[2].contains("done"));
    assert!(!stage.mounted[0].contains("Remarks"));
    assert_eq!(page_count(&pdf.bytes), pdf.physical_pages);
    assert!(pdf.physical_pages >= pdf.logical_pages);
}

#[tokio::test]
async fn tall_render_spills_onto_extra_pages() {
    let mut stage = FakeStage {
        // 5000px at 1588px wide is about 661mm, three bands of 287mm.
        fixed_height_px: Some(5000),
        ..FakeStage::default()
    };
    let pdf = generate_job_sheet_pdf(&mut stage, &record_with_items(4), None, &options())
        .await
        .unwrap();
    assert_eq!(pdf.logical_pages, 1);
    assert_eq!(pdf.physical_pages, 3);
    assert_eq!(page_count(&pdf.bytes), 3);
}

#[tokio::test]
async fn rasterization_failure_is_surfaced_after_cleanup() {
    let mut stage = FakeStage {
        fail_on_page: Some(2),
        ..FakeStage::default()
    };
    let err = generate_job_sheet_pdf(&mut stage, &record_with_items(20), None, &options())
        .await
        .unwrap_err();
    assert_eq!(stage.unmounts, 2);
    let message = err.to_string();
    assert!(message.starts_with("generating job sheet pdf"));
    assert!(message.contains("rasterizing logical page 2"));
    assert!(message.contains("renderer crashed"));
}
