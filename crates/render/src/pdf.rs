//! PDF output of a [`QuoteDocument`] on A4 pages.

use std::time::Instant;

use domain::QuoteSheet;
use printpdf::image_crate::DynamicImage;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point, Rgb,
};

use crate::document::{ACCEPTANCE_CLAUSE, ITEM_COLUMNS, ItemLine, QuoteDocument, SIGNATURE_CAPTION};
use crate::error::{RenderError, Result};
use crate::logo::{Logo, LogoStore};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const TOP: f32 = PAGE_HEIGHT - 20.0;
const BOTTOM: f32 = 30.0;
const LEFT: f32 = 20.0;

const COLUMN_WIDTHS: [f32; 7] = [10.0, 15.0, 15.0, 65.0, 30.0, 25.0, 28.0];
const DESCRIPTION_COLUMN: usize = 3;
const HEADER_ROW: f32 = 8.0;
const ITEM_ROW: f32 = 6.0;

const LOGO_DPI: f32 = 300.0;
const PT_PER_MM: f32 = 72.0 / 25.4;
const CLAUSE_WRAP: usize = 95;

type Rgb3 = (f32, f32, f32);

const BLACK: Rgb3 = (0.0, 0.0, 0.0);
const WHITE: Rgb3 = (0.96, 0.96, 0.96);
const GRID: Rgb3 = (0.5, 0.5, 0.5);
const TOTAL_BAND: Rgb3 = (0.83, 0.83, 0.83);

fn color((r, g, b): Rgb3) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

/// Helvetica has no embedded metrics here; half an em per glyph is close
/// enough to centre short strings.
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.5 / PT_PER_MM
}

fn table_width() -> f32 {
    COLUMN_WIDTHS.iter().sum()
}

fn table_left() -> f32 {
    (PAGE_WIDTH - table_width()) / 2.0
}

/// Greedy word wrap on character count.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn builtin(doc: &PdfDocumentReference, font: BuiltinFont, name: &'static str) -> Result<IndirectFontRef> {
    doc.add_builtin_font(font).map_err(|e| RenderError::Font {
        font: name,
        reason: e.to_string(),
    })
}

/// Cursor over the current page, moving top to bottom.
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    brand: Rgb3,
    y: f32,
    pages: usize,
}

impl PageWriter {
    fn new(title: &str, brand: Rgb3) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = builtin(&doc, BuiltinFont::Helvetica, "Helvetica")?;
        let bold = builtin(&doc, BuiltinFont::HelveticaBold, "Helvetica-Bold")?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            brand,
            y: TOP,
            pages: 1,
        })
    }

    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), format!("Layer {}", self.pages + 1));
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = TOP;
        self.pages += 1;
    }

    /// Starts a new page unless `height` still fits. Returns true on a break.
    fn ensure(&mut self, height: f32) -> bool {
        if self.y - height < BOTTOM {
            self.new_page();
            return true;
        }
        false
    }

    fn skip(&mut self, height: f32) {
        self.y -= height;
    }

    fn text_at(&self, text: &str, size: f32, x: f32, baseline: f32, bold: bool, rgb: Rgb3) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.set_fill_color(color(rgb));
        self.layer.use_text(text, size, Mm(x), Mm(baseline), font);
    }

    fn centered(&mut self, text: &str, size: f32, bold: bool, rgb: Rgb3) {
        let line_height = size / PT_PER_MM * 1.4;
        self.ensure(line_height);
        self.skip(line_height);
        let x = (PAGE_WIDTH - text_width(text, size)) / 2.0;
        self.text_at(text, size, x.max(LEFT), self.y, bold, rgb);
    }

    /// A horizontal stroke; thick strokes double as filled bands.
    fn band(&self, from: f32, to: f32, y: f32, thickness_mm: f32, rgb: Rgb3) {
        self.layer.set_outline_color(color(rgb));
        self.layer.set_outline_thickness(thickness_mm * PT_PER_MM);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(from), Mm(y)), false),
                (Point::new(Mm(to), Mm(y)), false),
            ],
            is_closed: false,
        });
    }

    fn vertical(&self, x: f32, top: f32, bottom: f32) {
        self.layer.set_outline_color(color(GRID));
        self.layer.set_outline_thickness(0.5);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x), Mm(top)), false),
                (Point::new(Mm(x), Mm(bottom)), false),
            ],
            is_closed: false,
        });
    }

    fn logo(&mut self, logo: &Logo) {
        let (width_px, height_px) = logo.pixels();
        let (width, height) = logo.printed_size();
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        self.ensure(height + 2.0);

        let natural_width = width_px as f32 / LOGO_DPI * 25.4;
        let natural_height = height_px as f32 / LOGO_DPI * 25.4;
        let rgb = DynamicImage::ImageRgb8(logo.image.to_rgb8());
        Image::from_dynamic_image(&rgb).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm((PAGE_WIDTH - width) / 2.0)),
                translate_y: Some(Mm(self.y - height)),
                scale_x: Some(width / natural_width),
                scale_y: Some(height / natural_height),
                dpi: Some(LOGO_DPI),
                ..Default::default()
            },
        );
        self.skip(height + 2.0);
    }

    fn label_rows(&mut self, rows: &[(&'static str, String)], value_x: f32) {
        for (label, value) in rows {
            self.ensure(5.0);
            self.skip(5.0);
            self.text_at(label, 9.0, LEFT, self.y, true, BLACK);
            self.text_at(value, 9.0, value_x, self.y, false, BLACK);
        }
    }

    fn row_cells(&self, cells: [&str; 7], size: f32, baseline: f32, bold: bool, rgb: Rgb3) {
        let mut x = table_left();
        for (i, (cell, width)) in cells.iter().zip(COLUMN_WIDTHS).enumerate() {
            let cell_x = if i == DESCRIPTION_COLUMN {
                x + 1.5
            } else {
                x + (width - text_width(cell, size)).max(0.0) / 2.0
            };
            self.text_at(cell, size, cell_x, baseline, bold, rgb);
            x += width;
        }
    }

    fn grid_verticals(&self, top: f32, bottom: f32) {
        let mut x = table_left();
        self.vertical(x, top, bottom);
        for width in COLUMN_WIDTHS {
            x += width;
            self.vertical(x, top, bottom);
        }
    }

    fn table_header(&mut self) {
        self.ensure(HEADER_ROW);
        let top = self.y;
        let left = table_left();
        self.band(left, left + table_width(), top - HEADER_ROW / 2.0, HEADER_ROW, self.brand);
        self.row_cells(ITEM_COLUMNS, 9.0, top - HEADER_ROW + 2.5, true, WHITE);
        self.skip(HEADER_ROW);
    }

    fn item_row(&mut self, item: &ItemLine) {
        if self.ensure(ITEM_ROW) {
            self.table_header();
        }
        let top = self.y;
        let left = table_left();
        self.row_cells(item.cells(), 8.0, top - ITEM_ROW + 2.0, false, BLACK);
        self.grid_verticals(top, top - ITEM_ROW);
        self.band(left, left + table_width(), top - ITEM_ROW, 0.35, GRID);
        self.skip(ITEM_ROW);
    }

    fn total_row(&mut self, total: &str) {
        if self.ensure(ITEM_ROW) {
            self.table_header();
        }
        let top = self.y;
        let left = table_left();
        let right = left + table_width();
        self.band(left, right, top - ITEM_ROW / 2.0, ITEM_ROW, TOTAL_BAND);
        self.band(left, right, top, 0.7, self.brand);
        self.row_cells(["", "", "", "", "", "TOTAL:", total], 8.0, top - ITEM_ROW + 2.0, true, BLACK);
        self.skip(ITEM_ROW);
    }

    fn paragraph(&mut self, text: &str, size: f32) {
        let line_height = size / PT_PER_MM * 1.3;
        for line in wrap(text, CLAUSE_WRAP) {
            self.ensure(line_height);
            self.skip(line_height);
            self.text_at(&line, size, LEFT, self.y, false, BLACK);
        }
    }

    fn signature(&mut self, caption: &str) {
        self.ensure(25.0);
        self.skip(15.0);
        let half = 50.0;
        self.band(PAGE_WIDTH / 2.0 - half, PAGE_WIDTH / 2.0 + half, self.y, 0.3, BLACK);
        self.centered(caption, 9.0, false, BLACK);
    }

    fn finish(self) -> Result<Vec<u8>> {
        self.doc
            .save_to_bytes()
            .map_err(|e| RenderError::Write(e.to_string()))
    }
}

/// Renders the document to PDF bytes. No I/O happens here; the logo is
/// passed in already decoded.
pub fn render_pdf(document: &QuoteDocument, logo: Option<&Logo>) -> Result<Vec<u8>> {
    let mut page = PageWriter::new(&document.title, document.brand_rgb)?;
    let brand = document.brand_rgb;

    if let Some(logo) = logo {
        page.logo(logo);
    }

    page.centered(&document.company_name, 16.0, true, brand);
    for line in &document.company_lines {
        page.centered(line, 10.0, false, BLACK);
    }
    page.centered(&document.title, 16.0, true, brand);
    page.skip(2.0);

    page.label_rows(&document.client_rows, LEFT + 40.0);
    page.skip(5.0);
    page.label_rows(&document.proposal_rows, LEFT + 50.0);
    page.skip(4.0);

    page.table_header();
    for item in &document.items {
        page.item_row(item);
    }
    page.total_row(&document.total);
    page.skip(4.0);

    page.paragraph(ACCEPTANCE_CLAUSE, 10.0);
    page.skip(2.0);
    page.centered(&document.signatory, 10.0, true, BLACK);
    page.signature(SIGNATURE_CAPTION);

    page.finish()
}

/// Renders quote sheets, reading logos from the media root.
#[derive(Debug, Clone)]
pub struct Renderer {
    logos: LogoStore,
}

impl Renderer {
    pub fn new(logos: LogoStore) -> Self {
        Self { logos }
    }

    #[tracing::instrument(skip(self, sheet), fields(number = %sheet.quote.number))]
    pub fn render(&self, sheet: &QuoteSheet) -> Result<Vec<u8>> {
        let started = Instant::now();
        let document = QuoteDocument::from_sheet(sheet);
        let logo = document
            .logo_path
            .as_deref()
            .and_then(|path| self.logos.load(path));

        let bytes = render_pdf(&document, logo.as_ref())?;

        metrics::histogram!("pdf_render_seconds").record(started.elapsed().as_secs_f64());
        tracing::debug!(bytes = bytes.len(), with_logo = logo.is_some(), "Rendered PDF");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_respects_width() {
        let lines = wrap(ACCEPTANCE_CLAUSE, 40);
        assert!(lines.len() > 2);
        assert!(lines.iter().all(|line| line.chars().count() <= 40));
        assert_eq!(lines.join(" "), ACCEPTANCE_CLAUSE);
    }

    #[test]
    fn test_table_fits_page() {
        assert!(table_left() > 0.0);
        assert!(table_left() + table_width() < PAGE_WIDTH);
    }
}
