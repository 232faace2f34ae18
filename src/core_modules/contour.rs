// THEORY:
// The `contour` module turns a binary `Mask` into the outer boundaries of its
// connected regions. It implements the outer-border half of Suzuki–Abe border
// following with 8-connectivity for the foreground:
//
// 1.  **Exterior background**: Background pixels 4-connected to the outside of
//     the image are flood-filled first. Every other background pixel belongs to
//     a hole of some region.
// 2.  **Region discovery**: A raster scan visits each region once, at its first
//     pixel in raster order (topmost, then leftmost). The region is flood-filled
//     so it is never visited again.
// 3.  **Outermost filter**: The pixel directly above a region's first pixel is
//     background. If that background is exterior (or off-image) the region is
//     outermost; otherwise it sits inside a hole of another region and is
//     skipped, which is the "external contours only" retrieval mode.
// 4.  **Border following**: Starting from the first pixel with its west neighbor
//     as the known background, the border is followed counterclockwise around
//     each pixel until the walk returns to the start along the first edge.
// 5.  **Chain compression**: Runs of equal steps (horizontal, vertical or
//     diagonal) are collapsed to their end points, so a filled rectangle
//     becomes its four corners.
//
// Area is measured on the compressed polygon with the shoelace formula, so a
// filled `w x h` rectangle of pixels encloses `(w - 1) * (h - 1)` px².

use crate::core_modules::mask::Mask;
use crate::core_modules::region::{BoundingBox, Point};

/// The 8 neighbor offsets, indexed counterclockwise starting at east.
/// Image y grows downward, so index 2 ("north") is `y - 1`.
const NEIGHBORS: [(i32, i32); 8] = [
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

const WEST: usize = 4;

/// A closed boundary polygon in pixel coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<Point>,
}

impl Contour {
    /// Builds a compressed contour from a raw border chain.
    pub fn from_chain(chain: Vec<Point>) -> Self {
        Self {
            points: compress_chain(&chain),
        }
    }

    /// Enclosed area in px² (shoelace formula, orientation ignored).
    pub fn area(&self) -> f64 {
        let count = self.points.len();
        if count < 3 {
            return 0.0;
        }
        let twice_area: i64 = (0..count)
            .map(|i| {
                let a = self.points[i];
                let b = self.points[(i + 1) % count];
                a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64
            })
            .sum();
        twice_area.abs() as f64 / 2.0
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::enclosing(&self.points).unwrap_or_default()
    }
}

/// Finds the outer contour of every outermost 8-connected region in `mask`.
/// Regions nested inside holes of other regions are not reported.
pub fn find_external_contours(mask: &Mask) -> Vec<Contour> {
    let width = mask.width() as i32;
    let height = mask.height() as i32;
    let exterior = exterior_background(mask);
    let mut visited = vec![false; mask.as_bytes().len()];
    let mut contours = Vec::new();

    for y in 0..height {
        for x in 0..width {
            let index = mask.index(x as u32, y as u32);
            if visited[index] || !mask.is_set(x, y) {
                continue;
            }

            let start = Point::new(x, y);
            mark_region(mask, start, &mut visited);

            let outermost = y == 0 || exterior[mask.index(x as u32, (y - 1) as u32)];
            if outermost {
                contours.push(Contour::from_chain(trace_outer_border(mask, start)));
            }
        }
    }

    contours
}

/// Follows the outer border of the region whose first raster pixel is `start`.
/// Returns the uncompressed chain of border pixels, beginning at `start`.
pub fn trace_outer_border(mask: &Mask, start: Point) -> Vec<Point> {
    // Look clockwise from the west neighbor for the first region pixel.
    let first_direction = (0..8)
        .map(|step| (WEST + 8 - step) % 8)
        .find(|&direction| is_set(mask, neighbor(start, direction)));

    let Some(first_direction) = first_direction else {
        // Isolated pixel.
        return vec![start];
    };

    let first_step = neighbor(start, first_direction);
    let mut previous = first_step;
    let mut current = start;
    let mut chain = vec![start];

    loop {
        let back = direction_between(current, previous);
        // Counterclockwise from the pixel we came from; the 8th probe is
        // `previous` itself, which is always set.
        let next = (1..=8)
            .map(|step| neighbor(current, (back + step) % 8))
            .find(|&candidate| is_set(mask, candidate))
            .unwrap_or(previous);

        if next == start && current == first_step {
            break;
        }

        chain.push(next);
        previous = current;
        current = next;
    }

    chain
}

/// Keeps only the points where the step direction changes. The first point is
/// always kept.
pub fn compress_chain(chain: &[Point]) -> Vec<Point> {
    let count = chain.len();
    if count <= 2 {
        return chain.to_vec();
    }

    let mut compressed = vec![chain[0]];
    for i in 1..count {
        let incoming = direction_between(chain[i - 1], chain[i]);
        let outgoing = direction_between(chain[i], chain[(i + 1) % count]);
        if incoming != outgoing {
            compressed.push(chain[i]);
        }
    }
    compressed
}

#[inline]
fn is_set(mask: &Mask, point: Point) -> bool {
    mask.is_set(point.x, point.y)
}

#[inline]
fn neighbor(point: Point, direction: usize) -> Point {
    let (dx, dy) = NEIGHBORS[direction];
    Point::new(point.x + dx, point.y + dy)
}

/// Direction index of the unit step `from -> to`. Callers only pass
/// 8-neighbors; anything else is clamped onto the nearest direction.
fn direction_between(from: Point, to: Point) -> usize {
    let dx = (to.x - from.x).signum();
    let dy = (to.y - from.y).signum();
    NEIGHBORS
        .iter()
        .position(|&offset| offset == (dx, dy))
        .unwrap_or(0)
}

/// Background pixels reachable from outside the image through 4-connected
/// background. Indexed like the mask.
fn exterior_background(mask: &Mask) -> Vec<bool> {
    let width = mask.width() as i32;
    let height = mask.height() as i32;
    let mut exterior = vec![false; mask.as_bytes().len()];
    if width == 0 || height == 0 {
        return exterior;
    }
    let mut stack: Vec<Point> = Vec::new();

    let seed = |x: i32, y: i32, exterior: &mut [bool], stack: &mut Vec<Point>| {
        let index = mask.index(x as u32, y as u32);
        if !mask.is_set(x, y) && !exterior[index] {
            exterior[index] = true;
            stack.push(Point::new(x, y));
        }
    };

    for x in 0..width {
        seed(x, 0, &mut exterior, &mut stack);
        seed(x, height - 1, &mut exterior, &mut stack);
    }
    for y in 0..height {
        seed(0, y, &mut exterior, &mut stack);
        seed(width - 1, y, &mut exterior, &mut stack);
    }

    while let Some(current) = stack.pop() {
        for (dx, dy) in [(0, 1), (0, -1), (1, 0), (-1, 0)] {
            let nx = current.x + dx;
            let ny = current.y + dy;
            if nx < 0 || ny < 0 || nx >= width || ny >= height {
                continue;
            }
            let index = mask.index(nx as u32, ny as u32);
            if !exterior[index] && !mask.is_set(nx, ny) {
                exterior[index] = true;
                stack.push(Point::new(nx, ny));
            }
        }
    }

    exterior
}

/// Marks every pixel 8-connected to `start` as visited.
fn mark_region(mask: &Mask, start: Point, visited: &mut [bool]) {
    let mut stack = vec![start];
    visited[mask.index(start.x as u32, start.y as u32)] = true;

    while let Some(current) = stack.pop() {
        for direction in 0..8 {
            let next = neighbor(current, direction);
            if !is_set(mask, next) {
                continue;
            }
            let index = mask.index(next.x as u32, next.y as u32);
            if !visited[index] {
                visited[index] = true;
                stack.push(next);
            }
        }
    }
}
