// THEORY:
// A `Mask` is the binary image the detector works on: one byte per pixel, 255
// where the pixel's HSV color falls inside the configured range and 0 elsewhere.
// It is a "dumb" container like the pixel types; building it is the only place
// the detector touches color, everything after this is pure geometry.

use crate::core_modules::hsv_pixel::HsvPixel;
use image::RgbImage;

pub const SET: u8 = 255;
pub const CLEAR: u8 = 0;

/// Binary image, row-major, `width * height` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Mask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![CLEAR; (width as usize) * (height as usize)],
        }
    }

    /// Thresholds every pixel of `frame` against the inclusive HSV range.
    pub fn from_hsv_range(frame: &RgbImage, lower: &HsvPixel, upper: &HsvPixel) -> Self {
        let (width, height) = frame.dimensions();
        let data = frame
            .pixels()
            .map(|pixel| {
                let [red, green, blue] = pixel.0;
                if HsvPixel::from_rgb(red, green, blue).within(lower, upper) {
                    SET
                } else {
                    CLEAR
                }
            })
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Reads a pixel with signed coordinates; anything outside the image is clear.
    #[inline]
    pub fn is_set(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return false;
        }
        self.data[self.index(x as u32, y as u32)] != CLEAR
    }

    pub fn set(&mut self, x: u32, y: u32, on: bool) {
        let index = self.index(x, y);
        self.data[index] = if on { SET } else { CLEAR };
    }

    pub fn count_set(&self) -> usize {
        self.data.iter().filter(|&&byte| byte != CLEAR).count()
    }

    #[inline]
    pub(crate) fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}
