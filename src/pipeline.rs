// THEORY:
// The `pipeline` module is the top-level API of the color detector. It wires the
// stages of `core_modules` into one call per frame:
//
//   frame (RGB) -> HSV threshold -> Mask -> outermost contours -> area filter -> Regions
//
// The thresholds and the area cutoff are perception constants tuned for one
// game piece under one lighting setup, so they live in `DetectionConfig` rather
// than in the code. The pipeline keeps no state between frames.

use image::RgbImage;
use tracing::debug;

use crate::core_modules::mask::Mask;
use crate::core_modules::region_detector::region_detector;

// Re-export key data structures for the public API.
pub use crate::core_modules::hsv_pixel::HsvPixel;
pub use crate::core_modules::region::{BoundingBox, Point, Region};

/// Default lower HSV bound: orange game pieces.
pub const DEFAULT_LOWER: HsvPixel = HsvPixel::new(5, 100, 100);
/// Default upper HSV bound: orange game pieces.
pub const DEFAULT_UPPER: HsvPixel = HsvPixel::new(25, 255, 255);
/// Default noise cutoff in px². Regions must enclose strictly more.
pub const DEFAULT_MIN_AREA: f64 = 500.0;

/// Tunable detector constants.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    /// Inclusive lower HSV bound. Hue is on the 0..180 scale.
    pub lower: HsvPixel,
    /// Inclusive upper HSV bound.
    pub upper: HsvPixel,
    /// Minimum contour area; regions at or below it are treated as noise.
    pub min_area: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            lower: DEFAULT_LOWER,
            upper: DEFAULT_UPPER,
            min_area: DEFAULT_MIN_AREA,
        }
    }
}

/// Stateless per-frame color-blob detector.
#[derive(Debug, Clone, Default)]
pub struct DetectionPipeline {
    config: DetectionConfig,
}

impl DetectionPipeline {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    /// Builds the binary mask of in-range pixels.
    pub fn mask(&self, frame: &RgbImage) -> Mask {
        Mask::from_hsv_range(frame, &self.config.lower, &self.config.upper)
    }

    /// Finds every outermost in-range region larger than the area cutoff.
    pub fn detect(&self, frame: &RgbImage) -> Vec<Region> {
        let mask = self.mask(frame);
        let regions = region_detector::find_regions(&mask, self.config.min_area);
        debug!(
            mask_pixels = mask.count_set(),
            regions = regions.len(),
            "detection pass"
        );
        regions
    }
}

/// One-shot detection with the default area cutoff.
pub fn detect(frame: &RgbImage, lower: HsvPixel, upper: HsvPixel) -> Vec<Region> {
    DetectionPipeline::new(DetectionConfig {
        lower,
        upper,
        min_area: DEFAULT_MIN_AREA,
    })
    .detect(frame)
}
