//! Utilities for generating service job sheets as PDFs
//!
//! A [`JobRecord`] is normalized into display strings, laid out over one or more logical pages,
//! rendered to HTML, captured as an image by a headless chrome(ium), and composed into an A4
//! PDF. Rendered pages taller than a sheet of paper are spread across several physical pages.
//!
//! # Example
//!
//! ```rust,no_run
//! use jobsheet_pdf::{ChecklistItemBuilder, Config, JobRecordBuilder, generate_with_browser};
//!
//! # async fn run() -> Result<(), jobsheet_pdf::Error> {
//! let record = JobRecordBuilder::default()
//!     .id("42")
//!     .asset_category("Chiller")
//!     .add_checklist_item(
//!         ChecklistItemBuilder::default()
//!             .activity("Check refrigerant pressure")
//!             .input_value("OK")
//!             .build()
//!             .unwrap(),
//!     )
//!     .build()
//!     .unwrap();
//! let pdf = generate_with_browser(&record, Some("All good"), &Config::default()).await?;
//! pdf.save(std::path::Path::new("."))?;
//! # Ok(())
//! # }
//! ```

pub mod compose;
pub mod config;
pub mod error;
pub mod job;
pub mod layout;
pub mod logging;
pub mod normalize;
pub mod output;
pub mod raster;
pub mod render;
pub mod site;
pub mod template_env;

use std::{
    net::TcpListener,
    process::{Child, Command, Stdio},
    thread,
    time::Duration,
};

pub use config::Config;
pub use error::Error;
pub use job::{
    ChecklistItem, ChecklistItemBuilder, ChecklistItemBuilderError, InputValue, JobRecord,
    JobRecordBuilder, JobRecordBuilderError, Location, LocationBuilder, LocationBuilderError,
    Personnel, PersonnelBuilder, PersonnelBuilderError, TimeTracking, TimeTrackingBuilder,
    TimeTrackingBuilderError,
};
pub use output::JobSheetPdf;
pub use raster::{BrowserStage, RenderedPageImage, Stage};
pub use site::SiteVariant;

use chrono::Local;
use error::AddContext;
use fantoccini::{Client, ClientBuilder};
use serde_json::Map;
use tracing::{debug, error, info, warn};

use crate::{
    compose::PdfComposer,
    config::{BrandingConfig, BrowserConfig, RenderConfig},
    layout::plan_pagination,
    normalize::normalize,
    output::job_sheet_filename,
    raster::rasterize,
    render::assemble_pages,
    site::logo_src,
    template_env::setup_template_env,
};

/// Starts ChromeDriver as a child process on the configured port
///
/// # Returns
/// - [`Child`] if ChromeDriver successfully starts and the port is available
///
/// # Errors
/// - [`crate::Error`] if the chromedriver binary is not in the path, or if the port is not
/// available, or if the chromedriver process fails to start for any other reason
pub fn start_chromedriver(browser: &BrowserConfig) -> Result<Child, crate::Error> {
    let port = browser.port;
    if is_port_in_use(port) {
        return Err(
            crate::Error::from(format!("Port {port} is already in use"))
                .add_context("starting chromedriver"),
        );
    }

    let mut child = Command::new(&browser.chromedriver)
        .arg(format!("--port={port}"))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(crate::Error::from)
        .add_context(&format!("spawning '{}'", browser.chromedriver))?;

    for _ in 0..100 {
        if is_port_in_use(port) {
            debug!(port, "chromedriver is listening");
            return Ok(child);
        }

        if child
            .try_wait()
            .map_err(crate::Error::from)
            .add_context("starting chromedriver")?
            .is_some()
        {
            return Err(
                crate::Error::from(String::from("Chromedriver has stopped unexpectedly"))
                    .add_context("starting chromedriver"),
            );
        }

        thread::sleep(Duration::from_millis(10));
    }

    if !is_port_in_use(port) {
        child.kill()?;
        return Err(
            crate::Error::from(format!("Chromedriver failed to bind to port {port}"))
                .add_context("starting chromedriver"),
        );
    }

    Ok(child)
}

/// Check if a given port is currently in use
///
/// # Arguments
/// - `port` The port number to check
///
/// # Returns
/// - `true` if the TCP port is currently on use on the localhost
/// - `false` if the TCP port is not being used on localhost
fn is_port_in_use(port: u16) -> bool {
    TcpListener::bind(format!("localhost:{port}")).is_err()
}

async fn connect_to_client(
    browser: &BrowserConfig,
    render: &RenderConfig,
) -> Result<Client, fantoccini::error::NewSessionError> {
    let mut args = vec![
        format!("--force-device-scale-factor={}", render.scale),
        String::from("--hide-scrollbars"),
    ];
    if browser.headless {
        args.push(String::from("--headless"));
    }
    let mut caps = Map::new();
    caps.insert(
        "goog:chromeOptions".to_string(),
        serde_json::json!({ "args": args }),
    );
    ClientBuilder::native()
        .capabilities(caps)
        .connect(&browser.webdriver_url)
        .await
}

/// What a job sheet looks like, independent of the data on it.
#[derive(Debug, Clone, Default)]
pub struct GeneratorOptions {
    pub site: SiteVariant,
    pub branding: BrandingConfig,
    pub render: RenderConfig,
}

impl GeneratorOptions {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            site: SiteVariant::from_config(&cfg.branding),
            branding: cfg.branding.clone(),
            render: cfg.render.clone(),
        }
    }
}

async fn build_job_sheet<S: Stage>(
    stage: &mut S,
    record: &JobRecord,
    comments: Option<&str>,
    options: &GeneratorOptions,
) -> Result<JobSheetPdf, crate::Error> {
    let sheet = normalize(record, comments);
    let plan = plan_pagination(&sheet);
    info!(
        job_id = %sheet.job_id,
        checklist_items = sheet.checklist.len(),
        estimated_height_mm = plan.estimated_height_mm,
        multi_page = plan.needs_multi_page,
        site = %options.site,
        "planned job sheet"
    );

    let logo = logo_src(options.site.logo_source(&options.branding))
        .add_context("resolving header logo")?;
    let template_env = setup_template_env()
        .map_err(crate::Error::from)
        .add_context("setting up templating environment")?;
    let pages = assemble_pages(&template_env, &sheet, &plan, &logo)
        .add_context("assembling logical pages")?;

    let mut composer = PdfComposer::new();
    for (n, html) in pages.iter().enumerate() {
        let image = rasterize(stage, html, &options.render)
            .await
            .add_context(&format!("rasterizing logical page {}", n + 1))?;
        composer
            .add_rendered_page(&image)
            .add_context(&format!("composing logical page {}", n + 1))?;
    }
    let physical_pages = composer.page_count();
    let bytes = composer
        .finish(&format!("Job Sheet {}", sheet.job_id))
        .add_context("finishing document")?;

    Ok(JobSheetPdf {
        filename: job_sheet_filename(record, &Local::now()),
        bytes,
        logical_pages: pages.len(),
        physical_pages,
    })
}

/// Generate a job sheet PDF from a [`JobRecord`], rasterizing pages on `stage`
///
/// # Arguments
///
/// - `stage`: Where each assembled page is mounted and captured.
/// - `record`: The job to print.
/// - `comments`: Free-text remarks entered alongside the job. Falls back to the record's own
///   remarks when absent.
/// - `options`: Branding and rasterization settings.
///
/// # Errors
///
/// Returns `Err(crate::Error)` if rendering a page template, rasterizing a page, or writing the
/// document fails. Missing data never fails generation; it renders as blanks and placeholders.
pub async fn generate_job_sheet_pdf<S: Stage>(
    stage: &mut S,
    record: &JobRecord,
    comments: Option<&str>,
    options: &GeneratorOptions,
) -> Result<JobSheetPdf, crate::Error> {
    match build_job_sheet(stage, record, comments, options).await {
        Ok(pdf) => {
            info!(
                filename = %pdf.filename,
                logical_pages = pdf.logical_pages,
                physical_pages = pdf.physical_pages,
                "generated job sheet"
            );
            Ok(pdf)
        }
        Err(e) => {
            error!(error = %e, "job sheet generation failed");
            Err(e.add_context("generating job sheet pdf"))
        }
    }
}

/// Generate a job sheet PDF using a WebDriver session described by `cfg`
///
/// Connects to the driver at `cfg.browser.webdriver_url`, generates the document, and closes
/// the session whether or not generation succeeded.
pub async fn generate_with_browser(
    record: &JobRecord,
    comments: Option<&str>,
    cfg: &Config,
) -> Result<JobSheetPdf, crate::Error> {
    let client = connect_to_client(&cfg.browser, &cfg.render)
        .await
        .map_err(crate::Error::from)
        .add_context("connecting to client")
        .add_context("generating job sheet pdf")?;
    let mut stage = BrowserStage::new(client.clone(), cfg.browser.window_height_px);
    let result =
        generate_job_sheet_pdf(&mut stage, record, comments, &GeneratorOptions::from_config(cfg))
            .await;
    if let Err(e) = client.close().await {
        warn!(error = ?e, "closing webdriver session");
    }
    result
}
