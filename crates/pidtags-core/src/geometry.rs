/// Bounding box with top-left origin coordinate system.
///
/// Coordinates follow the text-layer convention used by most PDF text
/// extractors:
/// - `x0`: left edge
/// - `top`: top edge (distance from top of page)
/// - `x1`: right edge
/// - `bottom`: bottom edge (distance from top of page)
///
/// Y increases downward.
#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct BBox {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
}

impl BBox {
    pub fn new(x0: f64, top: f64, x1: f64, bottom: f64) -> Self {
        Self {
            x0,
            top,
            x1,
            bottom,
        }
    }

    /// Build a box from a top-left corner and extents, the form most
    /// text-layout sources report (`x`, `y`, `width`, `height`).
    pub fn from_origin(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x0: x,
            top: y,
            x1: x + width,
            bottom: y + height,
        }
    }

    /// Width of the bounding box.
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Height of the bounding box.
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Horizontal midpoint.
    pub fn x_center(&self) -> f64 {
        (self.x0 + self.x1) / 2.0
    }

    /// Vertical midpoint.
    pub fn y_center(&self) -> f64 {
        (self.top + self.bottom) / 2.0
    }

    /// Straight-line distance between the centroids of two boxes.
    pub fn center_distance(&self, other: &BBox) -> f64 {
        let dx = self.x_center() - other.x_center();
        let dy = self.y_center() - other.y_center();
        (dx * dx + dy * dy).sqrt()
    }

    /// Compute the union of two bounding boxes.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            top: self.top.min(other.top),
            x1: self.x1.max(other.x1),
            bottom: self.bottom.max(other.bottom),
        }
    }
}
