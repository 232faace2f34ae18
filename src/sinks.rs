//! Frame destinations: the operator's window, video recordings and PNG
//! snapshots, plus the timestamped naming shared by the file outputs.

use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

use crate::core_modules::utils::image_helper::image_helper;
use crate::error::SinkError;
use crate::overlay::Annotation;
use crate::stream::Frame;

pub const SNAPSHOT_EXTENSION: &str = "png";
pub const RECORDING_EXTENSION: &str = "mp4";

/// The operator's window. Renders the overlay onto its own copy of the frame
/// and reports at most one key press per call to `poll_key`.
pub trait DisplaySink {
    fn show(&mut self, frame: &Frame, overlay: &[Annotation]) -> Result<(), SinkError>;

    /// Waits briefly for a key press.
    fn poll_key(&mut self) -> Result<Option<char>, SinkError>;

    fn close(self) -> Result<(), SinkError>
    where
        Self: Sized;
}

/// An open video file.
pub trait FrameRecorder {
    fn write(&mut self, frame: &Frame) -> Result<(), SinkError>;

    /// Flushes and closes the file.
    fn finish(self) -> Result<(), SinkError>
    where
        Self: Sized;
}

/// Creates a new video file per recording.
pub trait RecorderFactory {
    type Recorder: FrameRecorder;

    fn create(
        &mut self,
        path: &Path,
        fps: f64,
        width: u32,
        height: u32,
    ) -> Result<Self::Recorder, SinkError>;
}

/// `prefix_YYYYMMDD_HHMMSS.ext`
pub fn timestamped_name(prefix: &str, extension: &str, at: NaiveDateTime) -> String {
    format!("{prefix}_{}.{extension}", at.format("%Y%m%d_%H%M%S"))
}

/// Where snapshots and recordings go and what they are called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNamer {
    pub directory: PathBuf,
    pub snapshot_prefix: String,
    pub recording_prefix: String,
}

impl Default for ArtifactNamer {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            snapshot_prefix: "screenshot".into(),
            recording_prefix: "recording".into(),
        }
    }
}

impl ArtifactNamer {
    pub fn snapshot_path(&self, at: NaiveDateTime) -> PathBuf {
        self.directory
            .join(timestamped_name(&self.snapshot_prefix, SNAPSHOT_EXTENSION, at))
    }

    pub fn recording_path(&self, at: NaiveDateTime) -> PathBuf {
        self.directory
            .join(timestamped_name(&self.recording_prefix, RECORDING_EXTENSION, at))
    }

    /// Writes the raw frame as a PNG snapshot and returns its path.
    pub fn save_snapshot(&self, frame: &Frame, at: NaiveDateTime) -> Result<PathBuf, SinkError> {
        let path = self.snapshot_path(at);
        image_helper::save_png(&path, frame.pixels())?;
        Ok(path)
    }
}
