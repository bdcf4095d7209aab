//! # Document Model
//!
//! The declarative input of the renderer: a tree of stacks, text, blocks and
//! flow areas. The same tree is rebuilt for every page in both passes, so it
//! must be a pure description. Page-dependent content is expressed inside
//! the tree (`OnPage`, `{page}` placeholders) rather than by the caller.
//!
//! A [`Flow`](Node::Flow) node is the one node kind that spans pages: its
//! direct children are the flow items that the pagination engine spreads
//! across as many pages as they need.

use serde::{Deserialize, Serialize};

use crate::environment::DocumentEnvironment;
use crate::flow::{RetryPolicy, DEFAULT_AREA};
use crate::paper::PaperFormat;

/// A complete document ready for rendering, as read from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Paper size, orientation and margin of every page.
    #[serde(default)]
    pub format: PaperFormat,

    /// Document metadata (title, author, etc.)
    #[serde(default)]
    pub metadata: Metadata,

    /// How long to wait for the flow areas to agree on a page count.
    #[serde(default)]
    pub page_count_retry: RetryPolicy,

    /// The content laid out on every page.
    pub content: Node,
}

/// Document metadata embedded in the PDF.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
}

/// An RGB(A) color with components in 0.0 - 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    #[serde(default = "opaque")]
    pub a: f64,
}

fn opaque() -> f64 {
    1.0
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const LIGHT_GRAY: Color = Color {
        r: 0.85,
        g: 0.85,
        b: 0.85,
        a: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Edge values (top, right, bottom, left) used for padding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn symmetric(vertical: f64, horizontal: f64) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// A run of wrapped text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextNode {
    /// The text. `{page}` and `{pages}` are replaced with the current page
    /// number and the page count.
    pub content: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub padding: Edges,
}

fn default_font_size() -> f64 {
    10.0
}

impl TextNode {
    /// The content with page placeholders filled in. The page count is
    /// unknown while measuring and renders as `?`.
    ///
    /// Flow placements are recorded while measuring and replayed when
    /// rendering. A `{pages}` text that wraps onto more lines once the real
    /// count is in shrinks any height-filling flow next to it, and the last
    /// item of that flow is clipped. Keep such text short enough to stay on
    /// one line, or give the flow a fixed height.
    pub fn resolved_content(&self, environment: &DocumentEnvironment) -> String {
        if !self.content.contains('{') {
            return self.content.clone();
        }
        let pages = environment
            .page_count()
            .map(|count| count.to_string())
            .unwrap_or_else(|| "?".to_string());
        self.content
            .replace("{page}", &environment.page_number().to_string())
            .replace("{pages}", &pages)
    }
}

/// A node in the content tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum Node {
    /// Children stacked top to bottom. Flexible children share the height
    /// left over after the fixed ones.
    Column {
        #[serde(default)]
        children: Vec<Node>,
        #[serde(default)]
        spacing: f64,
    },
    /// Children side by side, each with an equal share of the width.
    Row {
        #[serde(default)]
        children: Vec<Node>,
        #[serde(default)]
        spacing: f64,
    },
    Text(TextNode),
    /// A filled rectangle of fixed height spanning the available width.
    Block {
        height: f64,
        #[serde(default = "block_color")]
        color: Color,
    },
    /// Flexible empty space.
    Spacer {
        #[serde(default)]
        min_height: f64,
    },
    /// Content shown on a single page only.
    OnPage { page: usize, child: Box<Node> },
    /// A flow area. Its children are paginated across pages.
    Flow {
        #[serde(default = "default_area_name")]
        name: String,
        /// Fixed height; without one the area takes the leftover height.
        #[serde(default)]
        height: Option<f64>,
        #[serde(default)]
        children: Vec<Node>,
    },
}

fn block_color() -> Color {
    Color::LIGHT_GRAY
}

fn default_area_name() -> String {
    DEFAULT_AREA.to_string()
}

impl Node {
    pub fn column(children: Vec<Node>) -> Self {
        Node::Column {
            children,
            spacing: 0.0,
        }
    }

    pub fn row(children: Vec<Node>) -> Self {
        Node::Row {
            children,
            spacing: 0.0,
        }
    }

    pub fn text(content: &str) -> Self {
        Node::Text(TextNode {
            content: content.to_string(),
            font_size: default_font_size(),
            bold: false,
            color: Color::BLACK,
            padding: Edges::default(),
        })
    }

    pub fn heading(content: &str, font_size: f64) -> Self {
        Node::Text(TextNode {
            content: content.to_string(),
            font_size,
            bold: true,
            color: Color::BLACK,
            padding: Edges::symmetric(font_size / 2.0, 0.0),
        })
    }

    pub fn block(height: f64) -> Self {
        Node::Block {
            height,
            color: block_color(),
        }
    }

    pub fn spacer() -> Self {
        Node::Spacer { min_height: 0.0 }
    }

    pub fn on_page(page: usize, child: Node) -> Self {
        Node::OnPage {
            page,
            child: Box::new(child),
        }
    }

    pub fn flow(name: &str, children: Vec<Node>) -> Self {
        Node::Flow {
            name: name.to_string(),
            height: None,
            children,
        }
    }

    /// Whether the node stretches to absorb leftover height in a column.
    pub fn fills_height(&self, environment: &DocumentEnvironment) -> bool {
        match self {
            Node::Spacer { .. } => true,
            Node::Flow { height, .. } => height.is_none(),
            Node::Column { children, .. } | Node::Row { children, .. } => {
                children.iter().any(|child| child.fills_height(environment))
            }
            Node::OnPage { page, child } => {
                *page == environment.page_number() && child.fills_height(environment)
            }
            Node::Text(_) | Node::Block { .. } => false,
        }
    }
}
