//! # Two-Pass Renderer
//!
//! Page boundaries are not known up front: a flow area only finds out where
//! page 1 ends by laying page 1 out. So rendering takes two passes over the
//! same content.
//!
//! 1. **Measure.** Lay out page after page, discarding the output, until no
//!    flow area has unplaced items. Every item's page and position is
//!    recorded in the flow areas on the way.
//! 2. **Render.** Lay out pages `1..=N` again with the same flow areas, so
//!    placements are replayed rather than recomputed, and hand each page to
//!    the document sink.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::environment::DocumentEnvironment;
use crate::error::{RenderError, Result};
use crate::flow::{FlowAreaCollection, RetryPolicy};
use crate::geom::Point;
use crate::layout::{LayoutContext, LayoutEngine};
use crate::model::{Document, Metadata, Node};
use crate::paper::PaperFormat;
use crate::pdf::{DocumentSink, PdfDocument, PdfSink};

/// Builds the content tree for a page.
///
/// Called once per page in both passes; must return the same tree for the
/// same environment.
pub trait ContentFactory {
    fn build(&self, environment: &DocumentEnvironment) -> Node;
}

impl<F> ContentFactory for F
where
    F: Fn(&DocumentEnvironment) -> Node,
{
    fn build(&self, environment: &DocumentEnvironment) -> Node {
        self(environment)
    }
}

impl ContentFactory for Node {
    fn build(&self, _environment: &DocumentEnvironment) -> Node {
        self.clone()
    }
}

/// Everything about a render other than its content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    pub format: PaperFormat,
    pub metadata: Metadata,
    pub page_count_retry: RetryPolicy,
}

impl RenderConfig {
    pub fn new(format: PaperFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }
}

impl From<&Document> for RenderConfig {
    fn from(document: &Document) -> Self {
        Self {
            format: document.format,
            metadata: document.metadata.clone(),
            page_count_retry: document.page_count_retry,
        }
    }
}

/// Drives both passes for one content factory.
pub struct PdfRenderer<C> {
    config: RenderConfig,
    content: C,
    engine: LayoutEngine,
}

impl<C: ContentFactory> PdfRenderer<C> {
    pub fn new(config: RenderConfig, content: C) -> Self {
        Self {
            config,
            content,
            engine: LayoutEngine::new(),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render to PDF bytes.
    pub fn render_bytes(&self) -> Result<Vec<u8>> {
        let sink = PdfSink::new(self.config.format.media_size(), self.config.metadata.clone())?;
        self.render_with(sink)
    }

    /// Render and check the result opens as a PDF.
    pub fn render_document(&self) -> Result<PdfDocument> {
        PdfDocument::parse(self.render_bytes()?)
    }

    /// Run both passes, drawing the second into `sink`. The sink is finished
    /// once, after the last page.
    pub fn render_with<S: DocumentSink>(&self, mut sink: S) -> Result<Vec<u8>> {
        let format = self.config.format;
        let art = format.art_size();
        let media = format.media_size();
        let mut environment = DocumentEnvironment::new();
        let mut flows = FlowAreaCollection::new();

        info!("Measuring pass");
        while environment.page_number() == 0 || flows.has_more_pages() {
            environment.start_new_page();
            debug!("Measuring page {}", environment.page_number());
            let root = self.content.build(&environment);
            let mut ctx = LayoutContext::new(&environment, &mut flows);
            self.engine.layout_page(&root, art, &mut ctx);
        }

        environment.reset_for_rendering();
        let page_count = self.settle_page_count(&mut environment, &flows)?;
        info!("Rendering {} page(s)", page_count);

        // Center the art area on the sheet.
        let translate = Point::new(
            (media.width - art.width) / 2.0,
            (media.height - art.height) / 2.0,
        );

        while environment.page_number() < page_count {
            environment.start_new_page();
            let root = self.content.build(&environment);
            let mut ctx = LayoutContext::new(&environment, &mut flows);
            let page = self.engine.layout_page(&root, art, &mut ctx);

            sink.begin_page(media);
            sink.draw_content(&page, translate);
            sink.end_page();
        }

        sink.finish()
    }

    /// Decide how many pages the rendering pass walks.
    ///
    /// With flow areas the count is the one they published; without any,
    /// it's the number of pages the measuring pass laid out (always 1). The
    /// rendering pass never walks fewer pages than were measured.
    fn settle_page_count(
        &self,
        environment: &mut DocumentEnvironment,
        flows: &FlowAreaCollection,
    ) -> Result<usize> {
        let measured = environment
            .page_count()
            .ok_or(RenderError::FailedToCalculatePageCount)?;
        if flows.is_empty() {
            return Ok(measured);
        }

        let published = flows
            .page_count_handle()
            .wait(self.config.page_count_retry)
            .ok_or(RenderError::FailedToCalculatePageCount)?;
        if published == measured {
            return Ok(published);
        }

        let settled = published.max(measured);
        warn!(
            "Flow areas settled on {} page(s) but {} were measured; using {}",
            published, measured, settled
        );
        environment.settle_page_count(settled);
        Ok(settled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Size;
    use crate::layout::LayoutPage;
    use crate::paper::{Orientation, PaperSize};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct Recorded {
        pages: Vec<Vec<String>>,
        translate: Option<Point>,
        finished: usize,
    }

    /// Records what the renderer sends to a sink.
    #[derive(Default)]
    struct RecordingSink {
        log: Rc<RefCell<Recorded>>,
        open: bool,
    }

    impl DocumentSink for RecordingSink {
        fn begin_page(&mut self, _media: Size) {
            assert!(!self.open, "page begun twice");
            self.open = true;
            self.log.borrow_mut().pages.push(Vec::new());
        }

        fn draw_content(&mut self, content: &LayoutPage, translate: Point) {
            let mut log = self.log.borrow_mut();
            log.translate = Some(translate);
            if let Some(page) = log.pages.last_mut() {
                page.extend(content.text_lines().into_iter().map(str::to_string));
            }
        }

        fn end_page(&mut self) {
            assert!(self.open, "page ended without being begun");
            self.open = false;
        }

        fn finish(self) -> Result<Vec<u8>> {
            assert!(!self.open, "finished with a page open");
            self.log.borrow_mut().finished += 1;
            Ok(Vec::new())
        }
    }

    fn record<C: ContentFactory>(renderer: &PdfRenderer<C>) -> Recorded {
        let sink = RecordingSink::default();
        let log = Rc::clone(&sink.log);
        renderer.render_with(sink).unwrap();
        log.take()
    }

    fn footer_document(items: usize) -> Node {
        Node::column(vec![
            Node::flow(
                "body",
                (1..=items).map(|i| Node::text(&format!("row {i}"))).collect(),
            ),
            Node::text("Page {page} of {pages}"),
        ])
    }

    fn a6() -> RenderConfig {
        RenderConfig::new(PaperFormat::new(PaperSize::A6, Orientation::Portrait, 20.0))
    }

    #[test]
    fn render_pass_visits_every_page_once_in_order() {
        // A6 with 20pt margins leaves ~367pt for the flow above a 12pt
        // footer: 30 rows of 12pt per page.
        let recorded = record(&PdfRenderer::new(a6(), footer_document(70)));

        let footers: Vec<&str> = recorded
            .pages
            .iter()
            .filter_map(|page| page.last().map(String::as_str))
            .collect();
        assert_eq!(footers, vec!["Page 1 of 3", "Page 2 of 3", "Page 3 of 3"]);

        let rows: Vec<usize> = recorded.pages.iter().map(|p| p.len() - 1).collect();
        assert_eq!(rows, vec![30, 30, 10]);
        assert_eq!(recorded.finished, 1);
    }

    #[test]
    fn short_area_first_does_not_truncate_the_document() {
        let renderer = PdfRenderer::new(a6(), |_: &DocumentEnvironment| {
            Node::column(vec![
                Node::Flow {
                    name: "short".to_string(),
                    height: Some(150.0),
                    children: vec![Node::text("only row")],
                },
                Node::Flow {
                    name: "long".to_string(),
                    height: Some(150.0),
                    children: (0..8).map(|_| Node::block(100.0)).collect(),
                },
                Node::text("Page {page} of {pages}"),
            ])
        });
        let recorded = record(&renderer);
        let footers: Vec<&str> = recorded
            .pages
            .iter()
            .filter_map(|page| page.last().map(String::as_str))
            .collect();
        assert_eq!(footers, vec!["Page 1 of 8", "Page 2 of 8", "Page 3 of 8", "Page 4 of 8",
                                 "Page 5 of 8", "Page 6 of 8", "Page 7 of 8", "Page 8 of 8"]);
        assert_eq!(recorded.pages[0], vec!["only row".to_string(), "Page 1 of 8".to_string()]);
    }

    #[test]
    fn content_is_centered_on_the_sheet() {
        let recorded = record(&PdfRenderer::new(a6(), footer_document(1)));
        let translate = recorded.translate.unwrap_or_default();
        assert!((translate.x - 20.0).abs() < 1e-9);
        assert!((translate.y - 20.0).abs() < 1e-9);
    }

    #[test]
    fn document_without_flows_renders_one_page() {
        let renderer = PdfRenderer::new(a6(), Node::text("Hello"));
        let doc = renderer.render_document().unwrap();
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn closure_content_sees_the_environment() {
        let renderer = PdfRenderer::new(a6(), |env: &DocumentEnvironment| {
            Node::column(vec![
                Node::flow("body", vec![Node::block(300.0), Node::block(300.0)]),
                Node::text(&format!("built for page {}", env.page_number())),
            ])
        });
        let recorded = record(&renderer);
        assert_eq!(
            recorded.pages,
            vec![vec!["built for page 1".to_string()], vec!["built for page 2".to_string()]]
        );
    }

    #[test]
    fn unusable_sheet_fails_to_acquire_a_drawing_context() {
        let mut config = a6();
        config.format.margin = 0.0;
        let renderer = PdfRenderer::new(config, Node::text("x"));
        assert!(renderer.render_bytes().is_ok());

        let sink = PdfSink::new(Size::new(-1.0, 10.0), Metadata::default());
        assert!(matches!(
            sink.err(),
            Some(RenderError::FailedToAcquireDrawingContext { .. })
        ));
    }
}
