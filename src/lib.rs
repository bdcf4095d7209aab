//! # flowpress
//!
//! Multi-pass pagination of declarative layouts into PDF.
//!
//! A document is described once, as a tree of stacks, text and blocks, and
//! that same tree is laid out for every page. Most of it is simply repeated
//! (letterheads, footers with page numbers). The interesting part is the
//! **flow area**: a named region whose children continue from page to page.
//! Nobody knows in advance where page 1 ends, so rendering runs twice:
//!
//! ```text
//! Content (JSON / Node tree / closure)
//!       ↓
//!   [layout]    stacks, text, blocks inside the art area
//!       ↓           ↘
//!   [flow]      greedy per-page packing of each flow area, recorded per page
//!       ↓
//!   [renderer]  pass 1 measures until every area converges,
//!               pass 2 replays pages 1..=N
//!       ↓
//!   [pdf]       serialize to PDF bytes
//! ```

pub mod environment;
pub mod error;
pub mod flow;
pub mod geom;
pub mod layout;
pub mod model;
pub mod paper;
pub mod pdf;
pub mod renderer;
pub mod text;
pub mod units;

pub use environment::DocumentEnvironment;
pub use error::{RenderError, Result};
pub use flow::{FlowArea, FlowAreaCollection, FlowLayout, PlacedItem};
pub use model::{Document, Node};
pub use paper::{Orientation, PaperFormat, PaperSize};
pub use pdf::{DocumentSink, PdfDocument, PdfSink};
pub use renderer::{ContentFactory, PdfRenderer, RenderConfig};

/// Render content to PDF bytes on the given paper.
pub fn render<C: ContentFactory>(content: C, format: PaperFormat) -> Result<Vec<u8>> {
    PdfRenderer::new(RenderConfig::new(format), content).render_bytes()
}

/// Render content and return the checked PDF document.
pub fn render_document<C: ContentFactory>(content: C, format: PaperFormat) -> Result<PdfDocument> {
    PdfRenderer::new(RenderConfig::new(format), content).render_document()
}

/// Render a document described as JSON to PDF bytes.
pub fn render_json(json: &str) -> Result<Vec<u8>> {
    let document: Document = serde_json::from_str(json)?;
    PdfRenderer::new(RenderConfig::from(&document), document.content).render_bytes()
}
