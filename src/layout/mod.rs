//! # Layout Engine
//!
//! Measures and positions one page of the content tree. The engine itself
//! knows nothing about pagination: stacks, text and blocks are laid out
//! inside the page's art area, and whenever a [`Node::Flow`] is reached the
//! decision of which items go on this page is delegated to
//! [`FlowLayout`], keyed by the area's name.
//!
//! Coordinates are in points relative to the top-left corner of the art
//! area, with y growing downward. The document sink translates the finished
//! page onto the sheet.

use crate::environment::DocumentEnvironment;
use crate::flow::{FlowAreaCollection, FlowLayout, Subview};
use crate::geom::{Rect, Size};
use crate::model::{Color, Node, TextNode};
use crate::text::{break_lines, ASCENT, LINE_HEIGHT};

/// A fully laid out page, ready for a document sink.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPage {
    /// Size of the art area the content was laid out in.
    pub size: Size,
    pub elements: Vec<LayoutElement>,
}

impl LayoutPage {
    /// Every text line on the page, depth first, in drawing order.
    pub fn text_lines(&self) -> Vec<&str> {
        let mut lines = Vec::new();
        collect_text(&self.elements, &mut lines);
        lines
    }
}

fn collect_text<'a>(elements: &'a [LayoutElement], out: &mut Vec<&'a str>) {
    for element in elements {
        match &element.draw {
            DrawCommand::Text { lines, .. } => out.extend(lines.iter().map(|l| l.text.as_str())),
            DrawCommand::Clip { children } => collect_text(children, out),
            DrawCommand::Fill { .. } => {}
        }
    }
}

/// A positioned element.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutElement {
    pub frame: Rect,
    pub draw: DrawCommand,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Fill the frame with a solid color.
    Fill { color: Color },
    Text {
        lines: Vec<TextLine>,
        font_size: f64,
        bold: bool,
        color: Color,
    },
    /// Draw `children` clipped to the frame.
    Clip { children: Vec<LayoutElement> },
}

/// A line of text positioned by its baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub x: f64,
    pub baseline: f64,
    pub text: String,
}

/// The per-render state a page layout reads and updates.
pub struct LayoutContext<'a> {
    pub environment: &'a DocumentEnvironment,
    pub flows: &'a mut FlowAreaCollection,
}

impl<'a> LayoutContext<'a> {
    pub fn new(environment: &'a DocumentEnvironment, flows: &'a mut FlowAreaCollection) -> Self {
        Self { environment, flows }
    }
}

/// The main layout engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct LayoutEngine;

/// A content node seen as a flow item.
struct NodeSubview<'a> {
    engine: &'a LayoutEngine,
    node: &'a Node,
    environment: &'a DocumentEnvironment,
}

impl Subview for NodeSubview<'_> {
    fn preferred_size(&self, proposal: Size) -> Size {
        self.engine.measure(self.node, proposal, self.environment)
    }
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self
    }

    /// Lay out one page. Flow areas reached on the way are sized (first
    /// visit of the page) or replayed.
    ///
    /// Once the page is done, any page count the flow areas agreed on
    /// during this layout is published.
    pub fn layout_page(&self, root: &Node, art: Size, ctx: &mut LayoutContext<'_>) -> LayoutPage {
        let mut elements = Vec::new();
        self.place(root, Rect::from_size(art), ctx, &mut elements);
        ctx.flows.publish_pending();
        LayoutPage {
            size: art,
            elements,
        }
    }

    /// The natural size of `node` when offered `proposal`.
    pub fn measure(&self, node: &Node, proposal: Size, environment: &DocumentEnvironment) -> Size {
        match node {
            Node::Column { children, spacing } => {
                let height = self.stacked_height(children, *spacing, proposal, environment);
                Size::new(proposal.width, height)
            }
            Node::Row { children, spacing } => {
                let share = row_share(proposal.width, children.len(), *spacing);
                let height = children
                    .iter()
                    .map(|child| {
                        self.measure(child, Size::new(share, proposal.height), environment)
                            .height
                    })
                    .fold(0.0, f64::max);
                Size::new(proposal.width, height)
            }
            Node::Text(text) => self.measure_text(text, proposal.width, environment),
            Node::Block { height, .. } => Size::new(proposal.width, *height),
            Node::Spacer { min_height } => Size::new(0.0, *min_height),
            Node::OnPage { page, child } => {
                if *page == environment.page_number() {
                    self.measure(child, proposal, environment)
                } else {
                    Size::ZERO
                }
            }
            Node::Flow { height, .. } => {
                Size::new(proposal.width, height.unwrap_or(proposal.height))
            }
        }
    }

    /// The height a node needs before leftover space is shared out.
    fn min_height(&self, node: &Node, proposal: Size, environment: &DocumentEnvironment) -> f64 {
        match node {
            Node::Spacer { min_height } => *min_height,
            Node::Flow { height: None, .. } => 0.0,
            Node::Column { children, spacing } => {
                self.stacked_height(children, *spacing, proposal, environment)
            }
            Node::Row { children, spacing } => {
                let share = row_share(proposal.width, children.len(), *spacing);
                children
                    .iter()
                    .map(|child| self.min_height(child, Size::new(share, proposal.height), environment))
                    .fold(0.0, f64::max)
            }
            Node::OnPage { page, child } if *page == environment.page_number() => {
                self.min_height(child, proposal, environment)
            }
            _ => self.measure(node, proposal, environment).height,
        }
    }

    fn stacked_height(
        &self,
        children: &[Node],
        spacing: f64,
        proposal: Size,
        environment: &DocumentEnvironment,
    ) -> f64 {
        let content: f64 = children
            .iter()
            .map(|child| self.min_height(child, proposal, environment))
            .sum();
        content + spacing * children.len().saturating_sub(1) as f64
    }

    fn measure_text(&self, text: &TextNode, max_width: f64, environment: &DocumentEnvironment) -> Size {
        let content = text.resolved_content(environment);
        let inner_width = (max_width - text.padding.horizontal()).max(0.0);
        let lines = break_lines(&content, text.font_size, text.bold, inner_width);
        let widest = lines.iter().map(|l| l.width).fold(0.0, f64::max);
        let height = lines.len() as f64 * text.font_size * LINE_HEIGHT;
        Size::new(
            (widest + text.padding.horizontal()).min(max_width),
            height + text.padding.vertical(),
        )
    }

    fn place(&self, node: &Node, frame: Rect, ctx: &mut LayoutContext<'_>, out: &mut Vec<LayoutElement>) {
        let environment = ctx.environment;
        match node {
            Node::Column { children, spacing } => {
                self.place_column(children, *spacing, frame, ctx, out);
            }
            Node::Row { children, spacing } => {
                let share = row_share(frame.width(), children.len(), *spacing);
                let mut x = frame.x();
                for child in children {
                    self.place(child, Rect::new(x, frame.y(), share, frame.height()), ctx, out);
                    x += share + spacing;
                }
            }
            Node::Text(text) => out.push(self.layout_text(text, frame, environment)),
            Node::Block { height, color } => {
                if color.a > 0.0 {
                    out.push(LayoutElement {
                        frame: Rect::new(frame.x(), frame.y(), frame.width(), *height),
                        draw: DrawCommand::Fill { color: *color },
                    });
                }
            }
            Node::Spacer { .. } => {}
            Node::OnPage { page, child } => {
                if *page == environment.page_number() {
                    self.place(child, frame, ctx, out);
                }
            }
            Node::Flow {
                name,
                height,
                children,
            } => {
                let mut bounds = frame;
                if let Some(height) = height {
                    bounds.size.height = *height;
                }
                self.place_flow(name, children, bounds, ctx, out);
            }
        }
    }

    fn place_column(
        &self,
        children: &[Node],
        spacing: f64,
        frame: Rect,
        ctx: &mut LayoutContext<'_>,
        out: &mut Vec<LayoutElement>,
    ) {
        let environment = ctx.environment;
        let heights: Vec<f64> = children
            .iter()
            .map(|child| self.min_height(child, frame.size, environment))
            .collect();
        let flexible = children
            .iter()
            .filter(|child| child.fills_height(environment))
            .count();
        let used: f64 =
            heights.iter().sum::<f64>() + spacing * children.len().saturating_sub(1) as f64;
        let extra = if flexible > 0 {
            (frame.height() - used).max(0.0) / flexible as f64
        } else {
            0.0
        };

        let mut y = frame.y();
        for (child, height) in children.iter().zip(heights) {
            let height = if child.fills_height(environment) {
                height + extra
            } else {
                height
            };
            self.place(child, Rect::new(frame.x(), y, frame.width(), height), ctx, out);
            y += height + spacing;
        }
    }

    fn place_flow(
        &self,
        name: &str,
        children: &[Node],
        bounds: Rect,
        ctx: &mut LayoutContext<'_>,
        out: &mut Vec<LayoutElement>,
    ) {
        let environment = ctx.environment;
        let subviews: Vec<NodeSubview<'_>> = children
            .iter()
            .map(|node| NodeSubview {
                engine: self,
                node,
                environment,
            })
            .collect();

        let placements =
            FlowLayout::new(ctx.flows, name, environment.page_number()).place(bounds, &subviews);

        // Items parked off canvas belong to other pages and are not drawn.
        let mut inner = Vec::new();
        for placement in placements {
            if let Some(item_frame) = placement.frame() {
                // The recorded width is the natural one; lay out across the
                // area so text wraps exactly as it was measured.
                let frame = Rect::new(
                    item_frame.x(),
                    item_frame.y(),
                    bounds.max_x() - item_frame.x(),
                    item_frame.height(),
                );
                self.place(&children[placement.index()], frame, ctx, &mut inner);
            }
        }

        out.push(LayoutElement {
            frame: bounds,
            draw: DrawCommand::Clip { children: inner },
        });
    }

    fn layout_text(&self, text: &TextNode, frame: Rect, environment: &DocumentEnvironment) -> LayoutElement {
        let content = text.resolved_content(environment);
        let inner_width = (frame.width() - text.padding.horizontal()).max(0.0);
        let line_height = text.font_size * LINE_HEIGHT;
        let top = frame.y() + text.padding.top;

        let lines: Vec<TextLine> = break_lines(&content, text.font_size, text.bold, inner_width)
            .into_iter()
            .enumerate()
            .map(|(i, line)| TextLine {
                x: frame.x() + text.padding.left,
                baseline: top + i as f64 * line_height + text.font_size * ASCENT,
                text: line.text,
            })
            .collect();
        let height = lines.len() as f64 * line_height + text.padding.vertical();

        LayoutElement {
            frame: Rect::new(frame.x(), frame.y(), frame.width(), height),
            draw: DrawCommand::Text {
                lines,
                font_size: text.font_size,
                bold: text.bold,
                color: text.color,
            },
        }
    }
}

fn row_share(width: f64, count: usize, spacing: f64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    ((width - spacing * (count - 1) as f64) / count as f64).max(0.0)
}
