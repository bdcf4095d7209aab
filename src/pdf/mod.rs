//! # PDF Serializer
//!
//! The document sink: receives laid-out pages one at a time and writes a
//! valid PDF file.
//!
//! This is a from-scratch PDF 1.7 writer. Pages are written as they arrive,
//! so the sink never holds more than the current page's content stream plus
//! the finished objects. Text uses the standard Helvetica faces, which
//! every viewer has built in and which need no embedding.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- objects (catalog, page tree, fonts, pages, content streams)
//! 2 0 obj ... endobj
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```

use std::fmt::Write as FmtWrite; // for write! on String
use std::io::Write as IoWrite; // for write! on Vec<u8>

use log::debug;
use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::error::{RenderError, Result};
use crate::geom::{Point, Size};
use crate::layout::{DrawCommand, LayoutElement, LayoutPage};
use crate::model::Metadata;

/// Where finished pages go.
///
/// The renderer calls `begin_page`, `draw_content` and `end_page` once per
/// page, in page order, and `finish` exactly once at the end.
pub trait DocumentSink {
    fn begin_page(&mut self, media: Size);

    /// Draw a laid-out page, shifted by `translate` (top-left origin).
    fn draw_content(&mut self, content: &LayoutPage, translate: Point);

    fn end_page(&mut self);

    /// Close the document and hand back its bytes.
    fn finish(self) -> Result<Vec<u8>>
    where
        Self: Sized;
}

const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const FONT_REGULAR_ID: usize = 3;
const FONT_BOLD_ID: usize = 4;

/// A [`DocumentSink`] producing PDF bytes.
pub struct PdfSink {
    /// Object bodies, indexed by object id. Index 0 is the unused free entry.
    objects: Vec<Vec<u8>>,
    page_ids: Vec<usize>,
    metadata: Metadata,
    current: Option<OpenPage>,
}

struct OpenPage {
    media: Size,
    stream: String,
}

impl PdfSink {
    /// Set up a sink for pages of `media` size.
    pub fn new(media: Size, metadata: Metadata) -> Result<Self> {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !usable(media.width) || !usable(media.height) {
            return Err(RenderError::FailedToAcquireDrawingContext {
                width: media.width,
                height: media.height,
            });
        }

        let mut objects = vec![Vec::new(); 5];
        objects[FONT_REGULAR_ID] =
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_vec();
        objects[FONT_BOLD_ID] =
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
                .to_vec();

        Ok(Self {
            objects,
            page_ids: Vec::new(),
            metadata,
            current: None,
        })
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn push_object(&mut self, data: Vec<u8>) -> usize {
        self.objects.push(data);
        self.objects.len() - 1
    }

    /// Write a single layout element as PDF operators.
    fn write_element(stream: &mut String, element: &LayoutElement, page_height: f64, offset: Point) {
        let x = offset.x + element.frame.x();
        let w = element.frame.width();
        let h = element.frame.height();
        // PDF space has its origin at the bottom left.
        let y = page_height - (offset.y + element.frame.y()) - h;

        match &element.draw {
            DrawCommand::Fill { color } => {
                let _ = write!(
                    stream,
                    "q\n{:.3} {:.3} {:.3} rg\n{:.2} {:.2} {:.2} {:.2} re\nf\nQ\n",
                    color.r, color.g, color.b, x, y, w, h
                );
            }

            DrawCommand::Text {
                lines,
                font_size,
                bold,
                color,
            } => {
                let font = if *bold { "F1" } else { "F0" };
                let _ = write!(
                    stream,
                    "BT\n{:.3} {:.3} {:.3} rg\n/{} {:.1} Tf\n",
                    color.r, color.g, color.b, font, font_size
                );
                for line in lines {
                    let pdf_y = page_height - (offset.y + line.baseline);
                    let _ = write!(
                        stream,
                        "1 0 0 1 {:.2} {:.2} Tm\n({}) Tj\n",
                        offset.x + line.x,
                        pdf_y,
                        Self::escape_pdf_string(&line.text)
                    );
                }
                let _ = write!(stream, "ET\n");
            }

            DrawCommand::Clip { children } => {
                let _ = write!(stream, "q\n{:.2} {:.2} {:.2} {:.2} re\nW n\n", x, y, w, h);
                for child in children {
                    Self::write_element(stream, child, page_height, offset);
                }
                let _ = write!(stream, "Q\n");
            }
        }
    }

    /// Escape a string for a PDF literal in WinAnsi encoding.
    ///
    /// Latin-1 characters are written as octal escapes; anything the
    /// encoding can't represent becomes `?`.
    fn escape_pdf_string(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for ch in s.chars() {
            match ch {
                '\\' => out.push_str("\\\\"),
                '(' => out.push_str("\\("),
                ')' => out.push_str("\\)"),
                ' '..='~' => out.push(ch),
                '\u{a0}'..='\u{ff}' => {
                    let _ = write!(out, "\\{:03o}", ch as u32);
                }
                _ => out.push('?'),
            }
        }
        out
    }

    fn info_dictionary(&self) -> Option<Vec<u8>> {
        let m = &self.metadata;
        if m.title.is_none() && m.author.is_none() && m.subject.is_none() && m.creator.is_none() {
            return None;
        }
        let mut info = String::from("<< ");
        let fields = [
            ("Title", &m.title),
            ("Author", &m.author),
            ("Subject", &m.subject),
            ("Creator", &m.creator),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                let _ = write!(info, "/{} ({}) ", key, Self::escape_pdf_string(value));
            }
        }
        let _ = write!(info, "/Producer (flowpress {}) >>", env!("CARGO_PKG_VERSION"));
        Some(info.into_bytes())
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, info_id: Option<usize>) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; self.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, data) in self.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", self.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(output, "trailer\n<< /Size {} /Root {} 0 R", self.objects.len(), CATALOG_ID);
        if let Some(info_id) = info_id {
            let _ = write!(output, " /Info {} 0 R", info_id);
        }
        let _ = write!(output, " >>\nstartxref\n{}\n%%EOF\n", xref_offset);

        output
    }
}

impl DocumentSink for PdfSink {
    fn begin_page(&mut self, media: Size) {
        if self.current.is_some() {
            self.end_page();
        }
        self.current = Some(OpenPage {
            media,
            stream: String::new(),
        });
    }

    fn draw_content(&mut self, content: &LayoutPage, translate: Point) {
        let Some(page) = self.current.as_mut() else {
            debug!("draw_content called outside of a page; ignoring");
            return;
        };
        for element in &content.elements {
            Self::write_element(&mut page.stream, element, page.media.height, translate);
        }
    }

    fn end_page(&mut self) {
        let Some(page) = self.current.take() else {
            return;
        };

        let compressed = compress_to_vec_zlib(page.stream.as_bytes(), 6);
        let mut content: Vec<u8> = Vec::new();
        let _ = write!(
            content,
            "<< /Length {} /Filter /FlateDecode >>\nstream\n",
            compressed.len()
        );
        content.extend_from_slice(&compressed);
        content.extend_from_slice(b"\nendstream");
        let content_id = self.push_object(content);

        let page_dict = format!(
            "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {:.2} {:.2}] \
             /Contents {} 0 R /Resources << /Font << /F0 {} 0 R /F1 {} 0 R >> >> >>",
            PAGES_ID, page.media.width, page.media.height, content_id, FONT_REGULAR_ID, FONT_BOLD_ID
        );
        let page_id = self.push_object(page_dict.into_bytes());
        self.page_ids.push(page_id);
        debug!("Wrote page {} as object {}", self.page_ids.len(), page_id);
    }

    fn finish(mut self) -> Result<Vec<u8>> {
        self.end_page();

        self.objects[CATALOG_ID] = format!("<< /Type /Catalog /Pages {} 0 R >>", PAGES_ID).into_bytes();
        let kids: String = self
            .page_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        self.objects[PAGES_ID] = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            self.page_ids.len()
        )
        .into_bytes();

        let info_id = self.info_dictionary().map(|info| self.push_object(info));
        Ok(self.serialize(info_id))
    }
}

/// A finished PDF, checked for the structure a viewer needs to open it.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    bytes: Vec<u8>,
    page_count: usize,
}

impl PdfDocument {
    /// Check that `bytes` look like a complete PDF and count its pages.
    pub fn parse(bytes: Vec<u8>) -> Result<Self> {
        let fail = |reason: &str| Err(RenderError::FailedToProduceOutputDocument(reason.to_string()));

        if !bytes.starts_with(b"%PDF-") {
            return fail("missing %PDF header");
        }
        if !contains(&bytes, b"%%EOF") {
            return fail("missing %%EOF marker");
        }
        if !contains(&bytes, b"\nxref\n") && !bytes.starts_with(b"xref\n") {
            return fail("missing cross-reference table");
        }
        if !contains(&bytes, b"trailer") || !contains(&bytes, b"/Root") {
            return fail("missing trailer");
        }

        let page_count = count(&bytes, b"/Type /Page ");
        if page_count == 0 {
            return fail("document has no pages");
        }

        Ok(Self { bytes, page_count })
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Media box (width, height) of every page, in document order.
    pub fn media_boxes(&self) -> Vec<(f64, f64)> {
        let text = String::from_utf8_lossy(&self.bytes);
        text.match_indices("/MediaBox [0 0 ")
            .filter_map(|(at, marker)| {
                let rest = &text[at + marker.len()..];
                let end = rest.find(']')?;
                let mut dims = rest[..end].split_whitespace().map(str::parse::<f64>);
                match (dims.next(), dims.next()) {
                    (Some(Ok(w)), Some(Ok(h))) => Some((w, h)),
                    _ => None,
                }
            })
            .collect()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn count(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}
