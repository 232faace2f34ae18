//! Scripted stand-ins for the capture, display and recording backends.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use image::{Rgb, RgbImage};

use crate::error::{SinkError, StreamError};
use crate::overlay::Annotation;
use crate::sinks::{DisplaySink, FrameRecorder, RecorderFactory};
use crate::stream::{Frame, FrameSource, SourceOpener, StreamProperties};

pub(crate) fn solid_frame(width: u32, height: u32, rgb: [u8; 3]) -> Frame {
    Frame::new(RgbImage::from_pixel(width, height, Rgb(rgb)))
}

/// What the next `open` call does.
pub(crate) enum Session {
    Refused,
    /// Opens, then plays these reads back in order. Once exhausted every read
    /// reports end of stream.
    Frames(Vec<Result<Frame, StreamError>>),
}

#[derive(Clone, Default)]
pub(crate) struct OpenerLog {
    opens: Rc<Cell<u32>>,
    closes: Rc<Cell<u32>>,
}

impl OpenerLog {
    pub(crate) fn opens(&self) -> u32 {
        self.opens.get()
    }

    pub(crate) fn closes(&self) -> u32 {
        self.closes.get()
    }
}

pub(crate) struct ScriptedSource {
    reads: VecDeque<Result<Frame, StreamError>>,
    properties: StreamProperties,
    closes: Rc<Cell<u32>>,
}

impl FrameSource for ScriptedSource {
    fn properties(&self) -> StreamProperties {
        self.properties
    }

    fn read(&mut self) -> Result<Frame, StreamError> {
        self.reads.pop_front().unwrap_or(Err(StreamError::EndOfStream))
    }

    fn close(self) {
        self.closes.set(self.closes.get() + 1);
    }
}

pub(crate) struct ScriptedOpener {
    sessions: VecDeque<Session>,
    log: OpenerLog,
}

impl ScriptedOpener {
    pub(crate) fn new(sessions: Vec<Session>, log: &OpenerLog) -> Self {
        Self {
            sessions: sessions.into(),
            log: log.clone(),
        }
    }
}

impl SourceOpener for ScriptedOpener {
    type Source = ScriptedSource;

    fn open(&mut self, url: &str) -> Result<ScriptedSource, StreamError> {
        self.log.opens.set(self.log.opens.get() + 1);
        match self.sessions.pop_front() {
            Some(Session::Frames(reads)) => {
                // Sources report the size of their first frame, or 8x6.
                let (width, height) = reads
                    .iter()
                    .find_map(|read| read.as_ref().ok().map(|frame| (frame.width(), frame.height())))
                    .unwrap_or((8, 6));
                Ok(ScriptedSource {
                    reads: reads.into(),
                    properties: StreamProperties {
                        width,
                        height,
                        fps: 30.0,
                    },
                    closes: self.log.closes.clone(),
                })
            }
            Some(Session::Refused) | None => Err(StreamError::Open { url: url.to_string() }),
        }
    }
}

/// Display that records what it was asked to show and replays scripted keys.
/// When the script runs out it presses `q`.
pub(crate) struct ScriptedDisplay {
    keys: VecDeque<Option<char>>,
    pub(crate) log: DisplayLog,
}

#[derive(Clone, Default)]
pub(crate) struct DisplayLog {
    pub(crate) shown: Rc<RefCell<Vec<Vec<Annotation>>>>,
    pub(crate) closed: Rc<Cell<bool>>,
}

impl ScriptedDisplay {
    pub(crate) fn new(keys: &str) -> Self {
        Self::with_keys(keys.chars().map(|c| if c == '.' { None } else { Some(c) }).collect())
    }

    pub(crate) fn with_keys(keys: Vec<Option<char>>) -> Self {
        Self {
            keys: keys.into(),
            log: DisplayLog::default(),
        }
    }
}

impl DisplaySink for ScriptedDisplay {
    fn show(&mut self, _frame: &Frame, overlay: &[Annotation]) -> Result<(), SinkError> {
        self.log.shown.borrow_mut().push(overlay.to_vec());
        Ok(())
    }

    fn poll_key(&mut self) -> Result<Option<char>, SinkError> {
        Ok(self.keys.pop_front().unwrap_or(Some('q')))
    }

    fn close(self) -> Result<(), SinkError> {
        self.log.closed.set(true);
        Ok(())
    }
}

/// One recording as seen by the fake factory.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordingEntry {
    pub(crate) path: PathBuf,
    pub(crate) fps: f64,
    pub(crate) size: (u32, u32),
    pub(crate) frames: usize,
    pub(crate) finished: bool,
}

#[derive(Clone, Default)]
pub(crate) struct RecorderLog {
    pub(crate) entries: Rc<RefCell<Vec<RecordingEntry>>>,
}

pub(crate) struct FakeRecorderFactory {
    pub(crate) log: RecorderLog,
    /// Fail `write` once the recording holds this many frames.
    pub(crate) fail_after: Option<usize>,
    pub(crate) refuse: bool,
}

impl FakeRecorderFactory {
    pub(crate) fn new() -> Self {
        Self {
            log: RecorderLog::default(),
            fail_after: None,
            refuse: false,
        }
    }
}

pub(crate) struct FakeRecorder {
    index: usize,
    fail_after: Option<usize>,
    log: RecorderLog,
}

impl RecorderFactory for FakeRecorderFactory {
    type Recorder = FakeRecorder;

    fn create(
        &mut self,
        path: &Path,
        fps: f64,
        width: u32,
        height: u32,
    ) -> Result<FakeRecorder, SinkError> {
        if self.refuse {
            return Err(SinkError::Recorder("codec unavailable".into()));
        }
        let mut entries = self.log.entries.borrow_mut();
        entries.push(RecordingEntry {
            path: path.to_path_buf(),
            fps,
            size: (width, height),
            frames: 0,
            finished: false,
        });
        Ok(FakeRecorder {
            index: entries.len() - 1,
            fail_after: self.fail_after,
            log: self.log.clone(),
        })
    }
}

impl FrameRecorder for FakeRecorder {
    fn write(&mut self, _frame: &Frame) -> Result<(), SinkError> {
        let mut entries = self.log.entries.borrow_mut();
        let entry = &mut entries[self.index];
        if self.fail_after.is_some_and(|limit| entry.frames >= limit) {
            return Err(SinkError::Recorder("disk full".into()));
        }
        entry.frames += 1;
        Ok(())
    }

    fn finish(self) -> Result<(), SinkError> {
        self.log.entries.borrow_mut()[self.index].finished = true;
        Ok(())
    }
}
