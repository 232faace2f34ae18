//! Video files written through OpenCV's `VideoWriter`.

use opencv::{
    core::Size,
    prelude::*,
    videoio::VideoWriter,
};
use scoutcam::error::SinkError;
use scoutcam::sinks::{FrameRecorder, RecorderFactory};
use scoutcam::stream::Frame;
use std::path::Path;

use crate::mat;

fn recorder_error(err: opencv::Error) -> SinkError {
    SinkError::Recorder(err.to_string())
}

pub struct VideoWriterFactory {
    fourcc: [char; 4],
}

impl VideoWriterFactory {
    /// `fourcc` must be four characters, e.g. `mp4v`.
    pub fn new(fourcc: &str) -> Result<Self, SinkError> {
        let chars: Vec<char> = fourcc.chars().collect();
        let fourcc: [char; 4] = chars
            .try_into()
            .map_err(|_| SinkError::Recorder(format!("'{fourcc}' is not a four character code")))?;
        Ok(Self { fourcc })
    }
}

impl RecorderFactory for VideoWriterFactory {
    type Recorder = VideoFile;

    fn create(
        &mut self,
        path: &Path,
        fps: f64,
        width: u32,
        height: u32,
    ) -> Result<VideoFile, SinkError> {
        let [a, b, c, d] = self.fourcc;
        let fourcc = VideoWriter::fourcc(a, b, c, d).map_err(recorder_error)?;
        let name = path.to_string_lossy();
        let writer = VideoWriter::new(
            &name,
            fourcc,
            fps,
            Size::new(width as i32, height as i32),
            true,
        )
        .map_err(recorder_error)?;
        if !writer.is_opened().map_err(recorder_error)? {
            return Err(SinkError::Recorder(format!("could not open {name} for writing")));
        }
        Ok(VideoFile { writer })
    }
}

pub struct VideoFile {
    writer: VideoWriter,
}

impl FrameRecorder for VideoFile {
    fn write(&mut self, frame: &Frame) -> Result<(), SinkError> {
        let bgr = mat::to_bgr(frame).map_err(recorder_error)?;
        self.writer.write(&bgr).map_err(recorder_error)
    }

    fn finish(mut self) -> Result<(), SinkError> {
        self.writer.release().map_err(recorder_error)
    }
}
