//! FFmpeg-backed RTSP capture through OpenCV's `videoio`.

use image::RgbImage;
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};
use scoutcam::error::StreamError;
use scoutcam::stream::{Frame, FrameSource, SourceOpener, StreamProperties};
use tracing::{debug, warn};

/// Opens RTSP URLs with the FFmpeg backend.
pub struct FfmpegOpener {
    /// Frames the backend may queue. 1 keeps the picture close to live.
    pub buffer_size: u32,
}

impl SourceOpener for FfmpegOpener {
    type Source = OpenCvSource;

    fn open(&mut self, url: &str) -> Result<OpenCvSource, StreamError> {
        let open_failed = |err: Option<opencv::Error>| {
            if let Some(err) = err {
                debug!(url, error = %err, "videoio refused the stream");
            }
            StreamError::Open {
                url: url.to_string(),
            }
        };

        let mut cap = VideoCapture::from_file(url, videoio::CAP_FFMPEG)
            .map_err(|e| open_failed(Some(e)))?;
        if !cap.is_opened().map_err(|e| open_failed(Some(e)))? {
            return Err(open_failed(None));
        }
        if let Err(err) = cap.set(videoio::CAP_PROP_BUFFERSIZE, f64::from(self.buffer_size)) {
            warn!(error = %err, "backend ignored the buffer size");
        }

        let prop = |cap: &VideoCapture, id: i32| cap.get(id).unwrap_or(0.0);
        let properties = StreamProperties {
            width: prop(&cap, videoio::CAP_PROP_FRAME_WIDTH) as u32,
            height: prop(&cap, videoio::CAP_PROP_FRAME_HEIGHT) as u32,
            fps: prop(&cap, videoio::CAP_PROP_FPS),
        };

        Ok(OpenCvSource {
            cap,
            properties,
            bgr: Mat::default(),
            rgb: Mat::default(),
        })
    }
}

pub struct OpenCvSource {
    cap: VideoCapture,
    properties: StreamProperties,
    bgr: Mat,
    rgb: Mat,
}

fn read_error(err: opencv::Error) -> StreamError {
    StreamError::Read(err.to_string())
}

impl FrameSource for OpenCvSource {
    fn properties(&self) -> StreamProperties {
        self.properties
    }

    fn read(&mut self) -> Result<Frame, StreamError> {
        if !self.cap.read(&mut self.bgr).map_err(read_error)? || self.bgr.empty() {
            return Err(StreamError::EndOfStream);
        }

        imgproc::cvt_color(&self.bgr, &mut self.rgb, imgproc::COLOR_BGR2RGB, 0).map_err(read_error)?;
        let width = self.rgb.cols() as u32;
        let height = self.rgb.rows() as u32;
        let bytes = self.rgb.data_bytes().map_err(read_error)?.to_vec();

        let pixels = RgbImage::from_raw(width, height, bytes)
            .ok_or_else(|| StreamError::Read(format!("decoded buffer does not fit {width}x{height}")))?;
        Ok(Frame::new(pixels))
    }

    fn close(mut self) {
        if let Err(err) = self.cap.release() {
            warn!(error = %err, "failed to release capture");
        }
    }
}
