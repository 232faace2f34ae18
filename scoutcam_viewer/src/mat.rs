//! Conversions between library frames and OpenCV matrices.

use opencv::{
    core::{self, Mat, Scalar},
    imgproc,
    prelude::*,
};
use scoutcam::overlay::Color;
use scoutcam::stream::Frame;

/// Copies an RGB frame into a fresh BGR `Mat`.
pub fn to_bgr(frame: &Frame) -> opencv::Result<Mat> {
    let mut rgb = Mat::new_rows_cols_with_default(
        frame.height() as i32,
        frame.width() as i32,
        core::CV_8UC3,
        Scalar::all(0.0),
    )?;
    rgb.data_bytes_mut()?.copy_from_slice(frame.pixels().as_raw());

    let mut bgr = Mat::default();
    imgproc::cvt_color(&rgb, &mut bgr, imgproc::COLOR_RGB2BGR, 0)?;
    Ok(bgr)
}

/// OpenCV draws in BGR order.
pub fn scalar(color: Color) -> Scalar {
    let [r, g, b] = color;
    Scalar::new(f64::from(b), f64::from(g), f64::from(r), 0.0)
}
