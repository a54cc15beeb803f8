//! Minimal PDF report builder used by the attendance export routes.
//!
//! Renders headings, info lines and simple grid tables top-to-bottom on A4
//! pages with builtin Helvetica, which keeps the documents free of bundled
//! font files.

use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 18.0;
const LINE_HEIGHT_MM: f32 = 6.5;

pub struct ReportBuilder {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    y: f32,
}

impl ReportBuilder {
    pub fn new(title: &str) -> Result<Self, printpdf::Error> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
        let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let font_bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
        let layer = doc.get_page(page).get_layer(layer);

        let mut builder = Self {
            doc,
            layer,
            font,
            font_bold,
            y: PAGE_HEIGHT_MM - MARGIN_MM,
        };
        builder.text_at(title, 16.0, true);
        builder.y -= LINE_HEIGHT_MM;
        Ok(builder)
    }

    fn ensure_space(&mut self, needed_mm: f32) {
        if self.y - needed_mm < MARGIN_MM {
            let (page, layer) = self
                .doc
                .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT_MM - MARGIN_MM;
        }
    }

    fn text_at(&mut self, text: &str, size: f32, bold: bool) {
        self.ensure_space(LINE_HEIGHT_MM);
        let font = if bold { &self.font_bold } else { &self.font };
        self.layer
            .use_text(text, size, Mm(MARGIN_MM), Mm(self.y), font);
        self.y -= LINE_HEIGHT_MM;
    }

    pub fn heading(&mut self, text: &str) {
        self.ensure_space(LINE_HEIGHT_MM * 2.0);
        self.y -= LINE_HEIGHT_MM / 2.0;
        self.text_at(text, 13.0, true);
    }

    pub fn line(&mut self, text: &str) {
        self.text_at(text, 11.0, false);
    }

    /// Draws a simple table. `col_widths_mm` gives per-column widths; rows
    /// wider than the column count are truncated, narrower rows are padded.
    pub fn table(&mut self, headers: &[&str], rows: &[Vec<String>], col_widths_mm: &[f32]) {
        self.ensure_space(LINE_HEIGHT_MM * 2.0);

        let mut x = MARGIN_MM;
        for (i, header) in headers.iter().enumerate().take(col_widths_mm.len()) {
            self.layer
                .use_text(*header, 10.0, Mm(x), Mm(self.y), &self.font_bold);
            x += col_widths_mm[i];
        }
        self.y -= LINE_HEIGHT_MM;

        for row in rows {
            self.ensure_space(LINE_HEIGHT_MM);
            let mut x = MARGIN_MM;
            for (i, width) in col_widths_mm.iter().enumerate() {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                self.layer.use_text(cell, 9.0, Mm(x), Mm(self.y), &self.font);
                x += width;
            }
            self.y -= LINE_HEIGHT_MM;
        }
    }

    pub fn finish(self) -> Result<Vec<u8>, printpdf::Error> {
        self.doc.save_to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_pdf_document() {
        let mut report = ReportBuilder::new("Attendance Report - 5CSE1").unwrap();
        report.line("Session Date: 2026-03-01 10:00:00");
        report.heading("Present Students");
        report.table(
            &["Roll No", "Name"],
            &[
                vec!["2021001".into(), "John Doe".into()],
                vec!["2021002".into(), "Jane Smith".into()],
            ],
            &[35.0, 90.0],
        );

        let bytes = report.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn long_tables_paginate() {
        let mut report = ReportBuilder::new("Attendance Records").unwrap();
        let rows: Vec<Vec<String>> = (0..120)
            .map(|i| vec![format!("20210{i:02}"), format!("Student {i}")])
            .collect();
        report.table(&["Roll No", "Name"], &rows, &[35.0, 90.0]);
        assert!(report.finish().unwrap().starts_with(b"%PDF"));
    }
}
