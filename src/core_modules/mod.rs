pub mod contour;
pub mod hsv_pixel;
pub mod mask;
pub mod region;
pub mod region_detector;
pub mod utils;
