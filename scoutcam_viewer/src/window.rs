//! HighGUI window that renders the overlay and reads the keyboard.

use opencv::{
    core::{self, Mat},
    highgui, imgproc,
};
use scoutcam::error::SinkError;
use scoutcam::overlay::Annotation;
use scoutcam::sinks::DisplaySink;
use scoutcam::stream::Frame;

use crate::mat;

fn display_error(err: opencv::Error) -> SinkError {
    SinkError::Display(err.to_string())
}

pub struct HighGuiWindow {
    title: String,
}

impl HighGuiWindow {
    pub fn open(title: &str) -> Result<Self, SinkError> {
        highgui::named_window(title, highgui::WINDOW_AUTOSIZE).map_err(display_error)?;
        Ok(Self {
            title: title.to_string(),
        })
    }
}

fn draw(canvas: &mut Mat, annotation: &Annotation) -> opencv::Result<()> {
    match annotation {
        Annotation::Box {
            rect,
            color,
            thickness,
        } => imgproc::rectangle(
            canvas,
            core::Rect::new(rect.x, rect.y, rect.width, rect.height),
            mat::scalar(*color),
            *thickness,
            imgproc::LINE_8,
            0,
        ),
        Annotation::Marker {
            center,
            radius,
            color,
        } => imgproc::circle(
            canvas,
            core::Point::new(center.x, center.y),
            *radius,
            mat::scalar(*color),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        ),
        Annotation::Label {
            text,
            origin,
            scale,
            color,
            thickness,
        } => imgproc::put_text(
            canvas,
            text,
            core::Point::new(origin.x, origin.y),
            imgproc::FONT_HERSHEY_SIMPLEX,
            *scale,
            mat::scalar(*color),
            *thickness,
            imgproc::LINE_8,
            false,
        ),
    }
}

impl DisplaySink for HighGuiWindow {
    fn show(&mut self, frame: &Frame, overlay: &[Annotation]) -> Result<(), SinkError> {
        let mut canvas = mat::to_bgr(frame).map_err(display_error)?;
        for annotation in overlay {
            draw(&mut canvas, annotation).map_err(display_error)?;
        }
        highgui::imshow(&self.title, &canvas).map_err(display_error)
    }

    fn poll_key(&mut self) -> Result<Option<char>, SinkError> {
        let key = highgui::wait_key(1).map_err(display_error)?;
        if key < 0 {
            return Ok(None);
        }
        Ok(Some(char::from((key & 0xFF) as u8)))
    }

    fn close(self) -> Result<(), SinkError> {
        highgui::destroy_all_windows().map_err(display_error)
    }
}
