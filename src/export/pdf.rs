//! Single-page PDF wrapping one raster
//!
//! The page is A4 landscape. The image is aspect-fitted into a 280 × 200 mm
//! box, centered in it, with the box itself offset 10 mm from the top-left
//! page corner.

use std::fmt::Write as _;
use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::RgbImage;

use crate::render::geometry::aspect_fit;

pub const PAGE_WIDTH_MM: f32 = 297.0;
pub const PAGE_HEIGHT_MM: f32 = 210.0;
pub const IMAGE_BOX_MM: (f32, f32) = (280.0, 200.0);
pub const IMAGE_OFFSET_MM: f32 = 10.0;

const PT_PER_MM: f32 = 72.0 / 25.4;

/// Image box on the page, in millimetres from the top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfPlacement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PdfPlacement {
    /// Aspect-fit an image of `width × height` pixels into the image box
    pub fn for_image(width: u32, height: u32) -> Self {
        let (box_w, box_h) = IMAGE_BOX_MM;
        let (w, h) = aspect_fit(width as f32, height as f32, box_w, box_h);
        Self {
            x: (box_w - w) / 2.0 + IMAGE_OFFSET_MM,
            y: (box_h - h) / 2.0 + IMAGE_OFFSET_MM,
            width: w,
            height: h,
        }
    }

    /// `cm` operands in points, PDF origin at the bottom-left
    fn matrix_pt(&self) -> [f32; 4] {
        let page_h = PAGE_HEIGHT_MM * PT_PER_MM;
        let w = self.width * PT_PER_MM;
        let h = self.height * PT_PER_MM;
        [w, h, self.x * PT_PER_MM, page_h - (self.y * PT_PER_MM + h)]
    }
}

/// Accumulates numbered objects and their byte offsets
struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    fn object(&mut self, dict: &str) {
        self.offsets.push(self.buf.len());
        let id = self.offsets.len();
        self.buf
            .extend_from_slice(format!("{id} 0 obj\n{dict}\nendobj\n").as_bytes());
    }

    fn stream(&mut self, dict: &str, data: &[u8]) {
        self.offsets.push(self.buf.len());
        let id = self.offsets.len();
        self.buf.extend_from_slice(
            format!("{id} 0 obj\n<< {dict} /Length {} >>\nstream\n", data.len()).as_bytes(),
        );
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\nendstream\nendobj\n");
    }

    fn finish(mut self) -> Vec<u8> {
        let xref_at = self.buf.len();
        let mut table = format!("xref\n0 {}\n0000000000 65535 f \n", self.offsets.len() + 1);
        for offset in &self.offsets {
            let _ = writeln!(table, "{offset:010} 00000 n ");
        }
        let _ = write!(
            table,
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
            self.offsets.len() + 1
        );
        self.buf.extend_from_slice(table.as_bytes());
        self.buf
    }
}

/// Build a one-page PDF embedding `image` once
pub fn write_pdf(image: &RgbImage) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(image.as_raw())?;
    let pixels = encoder.finish()?;

    let placement = PdfPlacement::for_image(image.width(), image.height());
    let [w, h, x, y] = placement.matrix_pt();
    let content = format!("q\n{w:.2} 0 0 {h:.2} {x:.2} {y:.2} cm\n/Im0 Do\nQ");

    let mut pdf = PdfWriter::new();
    pdf.object("<< /Type /Catalog /Pages 2 0 R >>");
    pdf.object("<< /Type /Pages /Kids [3 0 R] /Count 1 >>");
    pdf.object(&format!(
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
         /Resources << /XObject << /Im0 5 0 R >> >> /Contents 4 0 R >>",
        PAGE_WIDTH_MM * PT_PER_MM,
        PAGE_HEIGHT_MM * PT_PER_MM
    ));
    pdf.stream("", content.as_bytes());
    pdf.stream(
        &format!(
            "/Type /XObject /Subtype /Image /Width {} /Height {} \
             /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode",
            image.width(),
            image.height()
        ),
        &pixels,
    );
    Ok(pdf.finish())
}
