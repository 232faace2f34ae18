// THEORY:
// The `RegionDetector` is the spatial grouping stage of the color detector. It
// takes the binary mask of in-range pixels and turns it into the list of blobs
// the operator sees boxed on screen.
//
// Algorithm steps:
// 1.  **Contour Extraction**: Only outermost region boundaries are extracted
//     (see `contour`); blobs inside the hole of another blob never surface.
// 2.  **Measurement**: Each contour yields its bounding rectangle and its
//     enclosed area.
// 3.  **Noise Rejection**: Regions whose area does not exceed `min_area` are
//     dropped. This is a noise filter for sensor speckle and thin edges, not a
//     correctness guarantee about what counts as an object.
// 4.  **Stateless Utility**: Like the contour code, the detector has no memory
//     of previous frames. Each call sees one mask and returns fresh regions.

use crate::core_modules::contour::find_external_contours;
use crate::core_modules::mask::Mask;
use crate::core_modules::region::Region;

pub mod region_detector {
    use super::*;

    /// Returns every outermost region of `mask` whose contour area is
    /// strictly greater than `min_area`, in raster order of their first pixel.
    pub fn find_regions(mask: &Mask, min_area: f64) -> Vec<Region> {
        find_external_contours(mask)
            .into_iter()
            .filter_map(|contour| {
                let area = contour.area();
                if area > min_area {
                    Some(Region::new(contour.bounding_box(), area))
                } else {
                    None
                }
            })
            .collect()
    }
}
