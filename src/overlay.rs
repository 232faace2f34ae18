// THEORY:
// The overlay is described, not drawn, here. `compose` turns the regions and the
// status line of one frame into a flat list of `Annotation`s; the display sink
// renders them onto its own copy of the frame with whatever drawing library it
// has. The raw frame handed to the recorder and the snapshot writer is therefore
// never touched by annotation code.

use crate::core_modules::region::{BoundingBox, Point, Region};

/// RGB color.
pub type Color = [u8; 3];

pub const GREEN: Color = [0, 255, 0];
pub const RED: Color = [255, 0, 0];

/// Where the status line's baseline starts.
pub const STATUS_ORIGIN: Point = Point::new(10, 30);

/// One drawing primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    /// Rectangle outline.
    Box {
        rect: BoundingBox,
        color: Color,
        thickness: i32,
    },
    /// Filled disc.
    Marker {
        center: Point,
        radius: i32,
        color: Color,
    },
    /// Text; `origin` is the bottom-left of the baseline.
    Label {
        text: String,
        origin: Point,
        scale: f64,
        color: Color,
        thickness: i32,
    },
}

/// Box, centroid marker and coordinate label for each region, then the status
/// line on top.
pub fn compose(regions: &[Region], status: &str) -> Vec<Annotation> {
    let mut annotations = Vec::with_capacity(regions.len() * 3 + 1);
    for region in regions {
        annotations.extend(region_annotations(region));
    }
    annotations.push(Annotation::Label {
        text: status.to_string(),
        origin: STATUS_ORIGIN,
        scale: 1.0,
        color: GREEN,
        thickness: 2,
    });
    annotations
}

pub fn region_annotations(region: &Region) -> [Annotation; 3] {
    let rect = region.bounding_box;
    [
        Annotation::Box {
            rect,
            color: GREEN,
            thickness: 2,
        },
        Annotation::Marker {
            center: region.centroid,
            radius: 5,
            color: RED,
        },
        Annotation::Label {
            text: region.label(),
            origin: Point::new(rect.x, rect.y - 10),
            scale: 0.5,
            color: GREEN,
            thickness: 2,
        },
    ]
}
