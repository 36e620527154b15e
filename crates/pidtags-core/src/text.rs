//! Positioned text input.
//!
//! A [`TextItem`] is one text run as reported by an external text-layout
//! source (PDF text layer, OCR overlay, etc.). The engine never mutates
//! items; recognition is a pure function of the item slice and the rule set.

use crate::geometry::BBox;

/// One positioned text run on a page.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct TextItem {
    /// The text content of this run.
    pub text: String,
    /// Bounding box in top-left-origin page coordinates.
    pub bbox: BBox,
    /// Page number (1-based).
    pub page: usize,
}

impl TextItem {
    /// Build an item from the `{text, x, y, width, height, page}` form
    /// produced by most text-layout sources.
    pub fn new(text: impl Into<String>, x: f64, y: f64, width: f64, height: f64, page: usize) -> Self {
        Self {
            text: text.into(),
            bbox: BBox::from_origin(x, y, width, height),
            page,
        }
    }

    /// Whether the item has no usable geometry (zero or negative extents).
    pub fn is_degenerate(&self) -> bool {
        self.bbox.width() <= 0.0 || self.bbox.height() <= 0.0
    }
}
