//! Lay rasterized pages out on A4 and write the PDF.
//!
//! A rendered page no taller than the usable page height goes on one physical page, 5mm from
//! the top. A taller one is spread over several physical pages: each page shows the same image
//! XObject shifted up by one usable page height, and the page's media box clips the rest.

use lopdf::{
    Dictionary, Document, Object, ObjectId, Stream,
    content::{Content, Operation},
    dictionary,
};
use tracing::debug;

use crate::{
    error::{AddContext, Error},
    raster::RenderedPageImage,
};

pub const PAGE_WIDTH_MM: f64 = 210.0;
pub const PAGE_HEIGHT_MM: f64 = 297.0;
/// Kept free at the bottom of every physical page.
pub const SAFETY_MARGIN_MM: f64 = 10.0;
/// Offset from the page top of an image that fits on one page.
pub const TOP_OFFSET_MM: f64 = 5.0;

const PT_PER_MM: f64 = 72.0 / 25.4;

/// Height of a page's worth of image, in millimetres.
pub fn usable_page_height_mm() -> f64 {
    PAGE_HEIGHT_MM - SAFETY_MARGIN_MM
}

/// The vertical offsets, in millimetres from the page top, at which a rendered page of
/// `image_height_mm` is drawn. One offset per physical page.
///
/// # Example
/// ```rust
/// use jobsheet_pdf::compose::band_offsets;
///
/// assert_eq!(band_offsets(200.0), vec![5.0]);
/// assert_eq!(band_offsets(600.0), vec![0.0, -287.0, -574.0]);
/// ```
pub fn band_offsets(image_height_mm: f64) -> Vec<f64> {
    let step = usable_page_height_mm();
    if image_height_mm <= step {
        return vec![TOP_OFFSET_MM];
    }
    let mut offsets = Vec::new();
    let mut height_left = image_height_mm;
    let mut offset = 0.0;
    while height_left > 0.0 {
        offsets.push(offset);
        height_left -= step;
        offset -= step;
    }
    offsets
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

/// Incrementally builds the output document, one rendered page at a time.
pub struct PdfComposer {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    images: usize,
}

impl Default for PdfComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfComposer {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            images: 0,
        }
    }

    /// Number of physical pages added so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Place one rendered page, adding as many physical pages as it needs.
    ///
    /// # Returns
    /// - The number of physical pages added
    pub fn add_rendered_page(&mut self, image: &RenderedPageImage) -> Result<usize, Error> {
        let image_height_mm = image.height_mm();
        let image_id = self.doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width_px as i64,
                "Height" => image.height_px as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8_i64,
                "Filter" => "DCTDecode",
            },
            image.jpeg.clone(),
        ));
        let name = format!("Im{}", self.images);
        self.images += 1;

        let offsets = band_offsets(image_height_mm);
        for offset_mm in &offsets {
            self.add_physical_page(&name, image_id, *offset_mm, image_height_mm)
                .add_context(&format!("placing {name} at {offset_mm}mm"))?;
        }
        debug!(
            image = %name,
            height_mm = image_height_mm,
            physical_pages = offsets.len(),
            "placed rendered page"
        );
        Ok(offsets.len())
    }

    fn add_physical_page(
        &mut self,
        name: &str,
        image_id: ObjectId,
        offset_mm: f64,
        image_height_mm: f64,
    ) -> Result<(), Error> {
        let bottom_mm = PAGE_HEIGHT_MM - offset_mm - image_height_mm;
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        real(PAGE_WIDTH_MM * PT_PER_MM),
                        Object::Integer(0),
                        Object::Integer(0),
                        real(image_height_mm * PT_PER_MM),
                        Object::Integer(0),
                        real(bottom_mm * PT_PER_MM),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content.encode()?;
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), encoded));
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                real(PAGE_WIDTH_MM * PT_PER_MM),
                real(PAGE_HEIGHT_MM * PT_PER_MM),
            ],
            "Resources" => dictionary! {
                "XObject" => dictionary! { name => image_id },
            },
            "Contents" => content_id,
        });
        self.kids.push(Object::Reference(page_id));
        Ok(())
    }

    /// Close the document and serialize it.
    ///
    /// # Errors
    /// - [`crate::Error`] if no page was added, or if writing the document fails
    pub fn finish(mut self, title: &str) -> Result<Vec<u8>, Error> {
        if self.kids.is_empty() {
            return Err(Error::from(String::from("document has no pages")))
                .add_context("finishing pdf");
        }
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        let created = chrono::Local::now().format("D:%Y%m%d%H%M%S").to_string();
        let info_id = self.doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
            "Producer" => Object::string_literal("jobsheet-pdf"),
            "CreationDate" => Object::string_literal(created),
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.trailer.set("Info", info_id);

        let mut buf = Vec::new();
        self.doc
            .save_to(&mut buf)
            .map_err(Error::from)
            .add_context("writing pdf")?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_image(width_px: u32, height_px: u32) -> RenderedPageImage {
        RenderedPageImage {
            width_px,
            height_px,
            jpeg: vec![0xFF, 0xD8, 0xFF, 0xD9],
        }
    }

    #[test]
    fn short_image_sits_below_top_margin() {
        assert_eq!(band_offsets(287.0), vec![TOP_OFFSET_MM]);
        assert_eq!(band_offsets(0.0), vec![TOP_OFFSET_MM]);
    }

    #[test]
    fn tall_image_is_banded() {
        let offsets = band_offsets(600.0);
        assert_eq!(offsets.len(), (600.0_f64 / 287.0).ceil() as usize);
        assert_eq!(offsets, vec![0.0, -287.0, -574.0]);
        assert_eq!(band_offsets(287.5), vec![0.0, -287.0]);
        assert_eq!(band_offsets(574.0), vec![0.0, -287.0]);
    }

    #[test]
    fn page_count_follows_image_heights() {
        let mut composer = PdfComposer::new();
        // 1588px at 794px width is 420mm: two bands.
        assert_eq!(composer.add_rendered_page(&fake_image(794, 1588)).unwrap(), 2);
        assert_eq!(composer.add_rendered_page(&fake_image(794, 794)).unwrap(), 1);
        assert_eq!(composer.page_count(), 3);

        let bytes = composer.finish("Job Sheet 1").unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn bands_of_one_image_share_the_xobject() {
        let mut composer = PdfComposer::new();
        composer.add_rendered_page(&fake_image(100, 400)).unwrap();
        let bytes = composer.finish("t").unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let images = doc
            .objects
            .values()
            .filter(|o| {
                o.as_stream()
                    .ok()
                    .and_then(|s| s.dict.get(b"Subtype").ok())
                    .and_then(|n| n.as_name().ok())
                    == Some(b"Image".as_slice())
            })
            .count();
        assert_eq!(images, 1);
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn empty_document_is_an_error() {
        assert!(PdfComposer::new().finish("t").is_err());
    }
}
