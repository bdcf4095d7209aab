//! # Paper Format
//!
//! Page geometry: the full media box of a sheet and the usable "art" area
//! left after margins. Pure values, no state.

use crate::geom::Size;
use crate::units::mm;
use serde::{Deserialize, Serialize};

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A0,
    A1,
    A2,
    A3,
    #[default]
    A4,
    A5,
    A6,
    Letter,
}

impl PaperSize {
    /// Portrait (width, height) in millimeters.
    pub fn millimeters(&self) -> (f64, f64) {
        match self {
            PaperSize::A0 => (841.0, 1189.0),
            PaperSize::A1 => (594.0, 841.0),
            PaperSize::A2 => (420.0, 594.0),
            PaperSize::A3 => (297.0, 420.0),
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::A5 => (148.0, 210.0),
            PaperSize::A6 => (105.0, 148.0),
            PaperSize::Letter => (216.0, 279.0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Size, orientation and uniform margin of every page in a document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperFormat {
    pub size: PaperSize,
    pub orientation: Orientation,
    /// Uniform margin in points.
    pub margin: f64,
}

impl Default for PaperFormat {
    fn default() -> Self {
        Self {
            size: PaperSize::A4,
            orientation: Orientation::Portrait,
            margin: mm(10.0),
        }
    }
}

impl PaperFormat {
    pub fn new(size: PaperSize, orientation: Orientation, margin: f64) -> Self {
        Self {
            size,
            orientation,
            margin,
        }
    }

    /// The full sheet in points, rotated for landscape.
    pub fn media_size(&self) -> Size {
        let (w, h) = self.size.millimeters();
        match self.orientation {
            Orientation::Portrait => Size::new(mm(w), mm(h)),
            Orientation::Landscape => Size::new(mm(h), mm(w)),
        }
    }

    /// The usable content area: the sheet minus a margin on every side.
    pub fn art_size(&self) -> Size {
        let paper = self.media_size();
        Size::new(paper.width - 2.0 * self.margin, paper.height - 2.0 * self.margin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_media_in_points() {
        let media = PaperFormat::default().media_size();
        assert!((media.width - 595.28).abs() < 0.01);
        assert!((media.height - 841.89).abs() < 0.01);
    }

    #[test]
    fn art_size_subtracts_both_margins() {
        let format = PaperFormat::new(PaperSize::A5, Orientation::Portrait, 20.0);
        let media = format.media_size();
        let art = format.art_size();
        assert!((art.width - (media.width - 40.0)).abs() < 1e-9);
        assert!((art.height - (media.height - 40.0)).abs() < 1e-9);
    }

    #[test]
    fn landscape_swaps_axes_before_margins() {
        let format = PaperFormat::new(PaperSize::Letter, Orientation::Landscape, mm(10.0));
        let art = format.art_size();
        assert!((art.width - mm(279.0 - 20.0)).abs() < 1e-6);
        assert!((art.height - mm(216.0 - 20.0)).abs() < 1e-6);
        assert!(format.media_size().width > format.media_size().height);
    }

    #[test]
    fn format_deserializes_with_defaults() {
        let format: PaperFormat = serde_json::from_str(r#"{ "size": "A3" }"#).unwrap();
        assert_eq!(format.size, PaperSize::A3);
        assert_eq!(format.orientation, Orientation::Portrait);
        assert!((format.margin - mm(10.0)).abs() < 1e-9);
    }
}
