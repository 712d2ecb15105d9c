//! Rasterize assembled pages.
//!
//! A page is mounted on a [`Stage`], given a moment to load fonts and images, captured as a
//! PNG, and unmounted again. Unmounting runs on every path out of [`rasterize`], whether
//! mounting or capturing failed. The capture is re-encoded as JPEG for embedding.

use base64::{Engine, engine::general_purpose};
use fantoccini::{Client, Locator, wd::WindowHandle};
use image::{ExtendedColorType, codecs::jpeg::JpegEncoder};
use tracing::{debug, warn};

use crate::{
    compose::PAGE_WIDTH_MM,
    config::RenderConfig,
    error::{AddContext, Error},
};

/// Selector of the element holding a whole page.
pub const PAGE_SELECTOR: &str = ".jobsheet-page";
/// Browser viewport width; the page itself is 794 CSS px (210mm at 96dpi) wide.
pub const VIEWPORT_WIDTH_PX: u32 = 900;
const SIGNATURE_OVERRIDE: &str = "<style>.signature-section { display: block !important; visibility: visible !important; }</style>";

/// A captured page, JPEG encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPageImage {
    pub width_px: u32,
    pub height_px: u32,
    pub jpeg: Vec<u8>,
}

impl RenderedPageImage {
    /// Height of the image when scaled to the physical page width.
    pub fn height_mm(&self) -> f64 {
        self.height_px as f64 * PAGE_WIDTH_MM / self.width_px as f64
    }
}

/// Somewhere an HTML page can be mounted out of sight and captured.
#[allow(async_fn_in_trait)]
pub trait Stage {
    /// Mount `html` as a stand-alone page.
    async fn mount(&mut self, html: &str) -> Result<(), Error>;

    /// Capture the mounted page as PNG bytes.
    async fn capture(&mut self) -> Result<Vec<u8>, Error>;

    /// Remove whatever [`Stage::mount`] left behind. Must be safe to call when nothing, or
    /// only part of a page, is mounted.
    async fn unmount(&mut self) -> Result<(), Error>;
}

/// Force the signature block visible whatever the page stylesheet says.
fn with_overrides(html: &str) -> String {
    match html.rfind("</head>") {
        Some(at) => format!("{}{SIGNATURE_OVERRIDE}{}", &html[..at], &html[at..]),
        None => format!("{SIGNATURE_OVERRIDE}{html}"),
    }
}

/// Rasterize one assembled page.
///
/// # Errors
/// Returns `Err(crate::Error)` if mounting, capturing or decoding the capture fails. The stage
/// is unmounted before any error is returned.
pub async fn rasterize<S: Stage>(
    stage: &mut S,
    html: &str,
    settings: &RenderConfig,
) -> Result<RenderedPageImage, Error> {
    let html = with_overrides(html);
    let captured = match stage.mount(&html).await {
        Ok(()) => {
            tokio::time::sleep(settings.settle_delay()).await;
            stage.capture().await.add_context("capturing page")
        }
        Err(e) => Err(e.add_context("mounting page")),
    };
    let released = stage.unmount().await;
    let png = match (captured, released) {
        (Ok(png), Ok(())) => png,
        (Ok(_), Err(e)) => return Err(e.add_context("unmounting page")),
        (Err(e), Ok(())) => return Err(e),
        (Err(e), Err(cleanup)) => {
            warn!(error = %cleanup, "unmounting page after a failed capture");
            return Err(e);
        }
    };
    encode_page_image(&png, settings.jpeg_quality).add_context("encoding page image")
}

/// Decode a PNG capture and re-encode it as JPEG.
pub fn encode_page_image(png: &[u8], quality: u8) -> Result<RenderedPageImage, Error> {
    let rgb = image::load_from_memory(png)?.to_rgb8();
    let (width_px, height_px) = rgb.dimensions();
    if width_px == 0 || height_px == 0 {
        return Err(Error::from(format!(
            "captured page is empty ({width_px}x{height_px})"
        )));
    }
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality).encode(
        rgb.as_raw(),
        width_px,
        height_px,
        ExtendedColorType::Rgb8,
    )?;
    debug!(width_px, height_px, bytes = jpeg.len(), "encoded page image");
    Ok(RenderedPageImage {
        width_px,
        height_px,
        jpeg,
    })
}

struct Mounted {
    origin: WindowHandle,
    tab: Option<WindowHandle>,
}

/// A [`Stage`] backed by a WebDriver session. Each page is mounted in its own tab, which is
/// closed again on unmount.
pub struct BrowserStage {
    client: Client,
    window_height_px: u32,
    mounted: Option<Mounted>,
}

impl BrowserStage {
    pub fn new(client: Client, window_height_px: u32) -> Self {
        Self {
            client,
            window_height_px,
            mounted: None,
        }
    }
}

impl Stage for BrowserStage {
    async fn mount(&mut self, html: &str) -> Result<(), Error> {
        let origin = self.client.window().await?;
        self.mounted = Some(Mounted { origin, tab: None });
        let opened = self.client.new_window(true).await?;
        if let Some(mounted) = self.mounted.as_mut() {
            mounted.tab = Some(opened.handle.clone());
        }
        self.client.switch_to_window(opened.handle).await?;
        self.client
            .set_window_size(VIEWPORT_WIDTH_PX, self.window_height_px)
            .await?;
        let encoded = general_purpose::STANDARD.encode(html.as_bytes());
        self.client
            .goto(&format!("data:text/html;base64,{encoded}"))
            .await
            .map_err(Error::from)
            .add_context("navigating to page")
    }

    async fn capture(&mut self) -> Result<Vec<u8>, Error> {
        let height = self
            .client
            .execute(
                &format!("return document.querySelector('{PAGE_SELECTOR}').scrollHeight;"),
                vec![],
            )
            .await?
            .as_u64()
            .unwrap_or(u64::from(self.window_height_px));
        let height = u32::try_from(height).unwrap_or(u32::MAX);
        if height > self.window_height_px {
            self.client
                .set_window_size(VIEWPORT_WIDTH_PX, height.saturating_add(100))
                .await?;
        }
        let page = self.client.find(Locator::Css(PAGE_SELECTOR)).await?;
        Ok(page.screenshot().await?)
    }

    async fn unmount(&mut self) -> Result<(), Error> {
        let Some(mounted) = self.mounted.take() else {
            return Ok(());
        };
        if let Some(tab) = mounted.tab {
            self.client.switch_to_window(tab).await?;
            self.client.close_window().await?;
        }
        self.client
            .switch_to_window(mounted.origin)
            .await
            .map_err(Error::from)
            .add_context("returning to the original window")
    }
}
