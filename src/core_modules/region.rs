// THEORY:
// A `Region` is what the detector hands back for one frame: a connected patch of
// in-range pixels that survived the area filter, summarized by its bounding box
// and an approximate centroid. Like the pixel and mask types it is a stateless
// data container. It is rebuilt from scratch every frame and has no identity
// across frames, so there is no id field and no tracking here.

/// A 2D point in pixel coordinates. Signed so geometry near the image edge
/// (labels above a box at y = 0, neighbor probes at x - 1) stays well-defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding rectangle. `width`/`height` count pixels, so a single
/// pixel has a 1x1 box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest box holding every point; `None` for an empty slice.
    pub fn enclosing(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for point in &points[1..] {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }

    /// Midpoint using integer halves of the extent.
    pub fn midpoint(&self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// One detected blob.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub bounding_box: BoundingBox,
    /// Midpoint of `bounding_box`, not the mean of the region's pixels.
    pub centroid: Point,
    /// Area enclosed by the region's outer contour, in px².
    pub area: f64,
}

impl Region {
    pub fn new(bounding_box: BoundingBox, area: f64) -> Self {
        Self {
            centroid: bounding_box.midpoint(),
            bounding_box,
            area,
        }
    }

    /// Text drawn next to the centroid marker.
    pub fn label(&self) -> String {
        format!("({}, {})", self.centroid.x, self.centroid.y)
    }
}
