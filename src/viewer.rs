// THEORY:
// The `viewer` module is the control loop. One `step` is one frame:
//
//   read -> count -> detect (if on) -> compose overlay + status -> show
//        -> write raw frame (if recording) -> poll one key -> apply command
//
// `step` takes the current `SessionState` and hands back the next one inside a
// `Step`, so the loop body never mutates a flag in place. The only state the
// viewer itself carries across steps is the open recorder, and it is kept in
// lockstep with `SessionState::recording`: a recorder exists exactly while the
// flag is set.
//
// Sink failures are graded. A snapshot that cannot be written or a recorder
// that cannot be opened or written is logged and the session carries on
// (recording is switched off where needed). A display failure or an exhausted
// stream link ends the loop. Either way `run` releases the stream, the
// recorder and the window, in that order, before returning.

use chrono::Local;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::error::ViewerError;
use crate::overlay;
use crate::pipeline::{DetectionConfig, DetectionPipeline};
use crate::session::{Command, KeyBindings, SessionState};
use crate::sinks::{ArtifactNamer, DisplaySink, FrameRecorder, RecorderFactory};
use crate::stream::{Frame, SourceOpener, StreamLink};

/// Everything about a session that is not a backend.
#[derive(Debug, Clone)]
pub struct ViewerSettings {
    pub detection: DetectionConfig,
    pub bindings: KeyBindings,
    pub namer: ArtifactNamer,
    /// Recording frame rate when the stream reports none.
    pub fallback_fps: f64,
    pub detection_at_start: bool,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            detection: DetectionConfig::default(),
            bindings: KeyBindings::default(),
            namer: ArtifactNamer::default(),
            fallback_fps: 30.0,
            detection_at_start: false,
        }
    }
}

/// Outcome of one iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Continue(SessionState),
    Quit(SessionState),
}

/// What a finished session reports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub elapsed: Duration,
    pub reconnects: u64,
}

impl RunSummary {
    pub fn fps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {} frames in {:.1}s ({:.1} fps)",
            self.frames,
            self.elapsed.as_secs_f64(),
            self.fps()
        )
    }
}

pub struct Viewer<O: SourceOpener, D: DisplaySink, F: RecorderFactory> {
    link: StreamLink<O>,
    display: D,
    recorders: F,
    recorder: Option<F::Recorder>,
    pipeline: DetectionPipeline,
    settings: ViewerSettings,
}

impl<O, D, F> Viewer<O, D, F>
where
    O: SourceOpener,
    D: DisplaySink,
    F: RecorderFactory,
{
    pub fn new(link: StreamLink<O>, display: D, recorders: F, settings: ViewerSettings) -> Self {
        Self {
            link,
            display,
            recorders,
            recorder: None,
            pipeline: DetectionPipeline::new(settings.detection.clone()),
            settings,
        }
    }

    /// State a fresh session starts from.
    pub fn initial_state(&self) -> SessionState {
        SessionState::new(self.settings.detection_at_start)
    }

    /// Runs until the quit key or a fatal error, then tears down.
    pub fn run(mut self) -> Result<RunSummary, ViewerError> {
        let mut state = self.initial_state();
        let outcome = loop {
            match self.step(state) {
                Ok(Step::Continue(next)) => state = next,
                Ok(Step::Quit(last)) => {
                    state = last;
                    break Ok(());
                }
                Err(err) => break Err(err),
            }
        };

        let summary = RunSummary {
            frames: state.frame_count,
            elapsed: Instant::now().saturating_duration_since(state.started_at),
            reconnects: self.link.reconnects(),
        };
        self.teardown();

        outcome.map(|()| summary)
    }

    /// Processes one frame and at most one key press.
    pub fn step(&mut self, state: SessionState) -> Result<Step, ViewerError> {
        let frame = self.link.next_frame()?;
        let state = state.frame_processed();

        let regions = if state.show_detection {
            self.pipeline.detect(frame.pixels())
        } else {
            Vec::new()
        };
        let status = state.status_text(state.fps_at(Instant::now()));
        self.display.show(&frame, &overlay::compose(&regions, &status))?;

        let state = self.record(&frame, state);

        let Some(key) = self.display.poll_key()? else {
            return Ok(Step::Continue(state));
        };
        match self.settings.bindings.command_for(key) {
            Some(command) => Ok(self.apply(command, &frame, state)),
            None => Ok(Step::Continue(state)),
        }
    }

    fn apply(&mut self, command: Command, frame: &Frame, state: SessionState) -> Step {
        match command {
            Command::Quit => return Step::Quit(state),
            Command::Snapshot => self.snapshot(frame),
            Command::ToggleRecording if state.recording => {
                self.stop_recording();
                return Step::Continue(state.with_recording(false));
            }
            Command::ToggleRecording => return Step::Continue(self.start_recording(frame, state)),
            Command::ToggleDetection => {
                let state = state.toggle_detection();
                info!(enabled = state.show_detection, "detection overlay toggled");
                return Step::Continue(state);
            }
        }
        Step::Continue(state)
    }

    fn snapshot(&self, frame: &Frame) {
        match self
            .settings
            .namer
            .save_snapshot(frame, Local::now().naive_local())
        {
            Ok(path) => info!(path = %path.display(), "screenshot saved"),
            Err(err) => warn!(error = %err, "failed to save screenshot"),
        }
    }

    fn start_recording(&mut self, frame: &Frame, state: SessionState) -> SessionState {
        let path = self.settings.namer.recording_path(Local::now().naive_local());
        let fps = self.link.properties().recording_fps(self.settings.fallback_fps);
        match self
            .recorders
            .create(&path, fps, frame.width(), frame.height())
        {
            Ok(recorder) => {
                info!(
                    path = %path.display(),
                    fps,
                    width = frame.width(),
                    height = frame.height(),
                    "recording started"
                );
                self.recorder = Some(recorder);
                state.with_recording(true)
            }
            Err(err) => {
                error!(path = %path.display(), error = %err, "failed to start recording");
                state
            }
        }
    }

    fn stop_recording(&mut self) {
        if let Some(recorder) = self.recorder.take() {
            match recorder.finish() {
                Ok(()) => info!("recording stopped"),
                Err(err) => warn!(error = %err, "recording did not close cleanly"),
            }
        }
    }

    /// Appends the raw frame to the open recording, if any.
    fn record(&mut self, frame: &Frame, state: SessionState) -> SessionState {
        let Some(recorder) = self.recorder.as_mut() else {
            return state;
        };
        match recorder.write(frame) {
            Ok(()) => state,
            Err(err) => {
                error!(error = %err, "failed to write frame, stopping recording");
                self.stop_recording();
                state.with_recording(false)
            }
        }
    }

    fn teardown(mut self) {
        self.stop_recording();
        let Self { link, display, .. } = self;
        link.close();
        if let Err(err) = display.close() {
            warn!(error = %err, "failed to close display");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SinkError, StreamError};
    use crate::overlay::Annotation;
    use crate::stream::ReconnectPolicy;
    use crate::testing::{
        solid_frame, FakeRecorderFactory, OpenerLog, ScriptedDisplay, ScriptedOpener, Session,
    };
    use image::{Rgb, RgbImage};

    const URL: &str = "rtsp://cam:8554/cam";

    fn frames(count: usize) -> Vec<Result<Frame, StreamError>> {
        (0..count).map(|_| Ok(solid_frame(64, 48, [20, 40, 200]))).collect()
    }

    fn link(sessions: Vec<Session>, log: &OpenerLog) -> StreamLink<ScriptedOpener> {
        StreamLink::connect(ScriptedOpener::new(sessions, log), URL, ReconnectPolicy::unbounded())
            .unwrap()
    }

    fn status_of(overlay: &[Annotation]) -> String {
        match overlay.last() {
            Some(Annotation::Label { text, .. }) => text.clone(),
            other => panic!("expected status label, got {other:?}"),
        }
    }

    #[test]
    fn quit_key_ends_the_session_and_releases_everything() {
        let log = OpenerLog::default();
        let display = ScriptedDisplay::new("x.q");
        let shown = display.log.clone();
        let viewer = Viewer::new(
            link(vec![Session::Frames(frames(10))], &log),
            display,
            FakeRecorderFactory::new(),
            ViewerSettings::default(),
        );

        let summary = viewer.run().unwrap();

        assert_eq!(summary.frames, 3);
        assert_eq!(summary.reconnects, 0);
        assert_eq!(shown.shown.borrow().len(), 3);
        assert!(shown.closed.get());
        assert_eq!(log.closes(), 1);
    }

    #[test]
    fn record_toggle_pair_produces_one_closed_recording() {
        let dir = tempfile::tempdir().unwrap();
        let log = OpenerLog::default();
        let recorders = FakeRecorderFactory::new();
        let recordings = recorders.log.clone();
        let display = ScriptedDisplay::new("r..r.");
        let shown = display.log.clone();
        let settings = ViewerSettings {
            namer: ArtifactNamer {
                directory: dir.path().to_path_buf(),
                ..ArtifactNamer::default()
            },
            ..ViewerSettings::default()
        };
        let viewer = Viewer::new(
            link(vec![Session::Frames(frames(10))], &log),
            display,
            recorders,
            settings,
        );

        viewer.run().unwrap();

        let entries = recordings.entries.borrow();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert!(entry.finished);
        // Started after frame 1, stopped after frame 4 was written.
        assert_eq!(entry.frames, 3);
        assert_eq!(entry.fps, 30.0);
        assert_eq!(entry.size, (64, 48));
        assert_eq!(entry.path.parent().unwrap(), dir.path());
        let name = entry.path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("recording_") && name.ends_with(".mp4"));

        let statuses: Vec<String> = shown.shown.borrow().iter().map(|o| status_of(o)).collect();
        assert!(!statuses[0].contains("[REC]"));
        assert!(statuses[1].contains("[REC]"));
        assert!(!statuses[4].contains("[REC]"));
    }

    #[test]
    fn recording_open_at_quit_is_finished_during_teardown() {
        let log = OpenerLog::default();
        let recorders = FakeRecorderFactory::new();
        let recordings = recorders.log.clone();
        let viewer = Viewer::new(
            link(vec![Session::Frames(frames(10))], &log),
            ScriptedDisplay::new("r."),
            recorders,
            ViewerSettings::default(),
        );

        viewer.run().unwrap();

        let entries = recordings.entries.borrow();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].finished);
        assert_eq!(entries[0].frames, 2);
    }

    #[test]
    fn detection_toggle_adds_region_annotations() {
        let mut pixels = RgbImage::from_pixel(64, 48, Rgb([20, 40, 200]));
        for y in 10..40 {
            for x in 20..50 {
                pixels.put_pixel(x, y, Rgb([255, 128, 0]));
            }
        }
        let orange = || Ok(Frame::new(pixels.clone()));
        let log = OpenerLog::default();
        let display = ScriptedDisplay::new("d.d.");
        let shown = display.log.clone();
        let viewer = Viewer::new(
            link(vec![Session::Frames(vec![orange(), orange(), orange(), orange(), orange()])], &log),
            display,
            FakeRecorderFactory::new(),
            ViewerSettings::default(),
        );

        viewer.run().unwrap();

        let shown = shown.shown.borrow();
        assert_eq!(shown[0].len(), 1);
        assert_eq!(shown[1].len(), 4);
        assert_eq!(shown[2].len(), 4);
        assert_eq!(shown[3].len(), 1);
        assert!(status_of(&shown[1]).ends_with("[DET]"));
        assert!(matches!(
            &shown[1][2],
            Annotation::Label { text, .. } if text == "(35, 25)"
        ));
    }

    #[test]
    fn read_failure_reconnects_and_keeps_the_loop_going() {
        let log = OpenerLog::default();
        let mut first = frames(1);
        first.push(Err(StreamError::Read("connection reset".into())));
        let viewer = Viewer::new(
            link(vec![Session::Frames(first), Session::Refused, Session::Frames(frames(5))], &log),
            ScriptedDisplay::new("..."),
            FakeRecorderFactory::new(),
            ViewerSettings::default(),
        );

        let summary = viewer.run().unwrap();

        assert_eq!(summary.frames, 4);
        assert_eq!(summary.reconnects, 1);
        assert_eq!(log.opens(), 3);
    }

    #[test]
    fn snapshot_saves_the_raw_frame() {
        let dir = tempfile::tempdir().unwrap();
        let log = OpenerLog::default();
        let raw = solid_frame(64, 48, [255, 128, 0]);
        let settings = ViewerSettings {
            namer: ArtifactNamer {
                directory: dir.path().to_path_buf(),
                ..ArtifactNamer::default()
            },
            detection_at_start: true,
            ..ViewerSettings::default()
        };
        let viewer = Viewer::new(
            link(vec![Session::Frames(vec![Ok(raw.clone()), Ok(raw.clone())])], &log),
            ScriptedDisplay::new("s"),
            FakeRecorderFactory::new(),
            settings,
        );

        viewer.run().unwrap();

        let saved: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        assert_eq!(saved.len(), 1);
        let name = saved[0].file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("screenshot_") && name.ends_with(".png"));
        assert_eq!(&image::open(&saved[0]).unwrap().to_rgb8(), raw.pixels());
    }

    #[test]
    fn snapshot_failure_does_not_end_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let log = OpenerLog::default();
        let settings = ViewerSettings {
            namer: ArtifactNamer {
                directory: dir.path().join("missing"),
                ..ArtifactNamer::default()
            },
            ..ViewerSettings::default()
        };
        let viewer = Viewer::new(
            link(vec![Session::Frames(frames(5))], &log),
            ScriptedDisplay::new("s."),
            FakeRecorderFactory::new(),
            settings,
        );

        assert_eq!(viewer.run().unwrap().frames, 3);
    }

    #[test]
    fn refused_recorder_leaves_recording_off() {
        let log = OpenerLog::default();
        let mut recorders = FakeRecorderFactory::new();
        recorders.refuse = true;
        let mut viewer = Viewer::new(
            link(vec![Session::Frames(frames(5))], &log),
            ScriptedDisplay::new("r."),
            recorders,
            ViewerSettings::default(),
        );

        let state = viewer.initial_state();
        let Step::Continue(state) = viewer.step(state).unwrap() else {
            panic!("unexpected quit");
        };
        assert!(!state.recording);
        let Step::Continue(state) = viewer.step(state).unwrap() else {
            panic!("unexpected quit");
        };
        assert!(!state.recording);
        assert_eq!(state.frame_count, 2);
    }

    #[test]
    fn failed_write_stops_and_closes_the_recording() {
        let log = OpenerLog::default();
        let mut recorders = FakeRecorderFactory::new();
        recorders.fail_after = Some(1);
        let recordings = recorders.log.clone();
        let mut viewer = Viewer::new(
            link(vec![Session::Frames(frames(5))], &log),
            ScriptedDisplay::new("r.."),
            recorders,
            ViewerSettings::default(),
        );

        let mut state = viewer.initial_state();
        for _ in 0..3 {
            state = match viewer.step(state).unwrap() {
                Step::Continue(next) => next,
                Step::Quit(_) => panic!("unexpected quit"),
            };
        }

        assert!(!state.recording);
        let entries = recordings.entries.borrow();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].frames, 1);
        assert!(entries[0].finished);
    }

    #[test]
    fn exhausted_link_is_fatal_but_still_tears_down() {
        let log = OpenerLog::default();
        let opener = ScriptedOpener::new(vec![Session::Frames(frames(2))], &log);
        let policy = ReconnectPolicy {
            max_attempts: Some(1),
            retry_delay: Duration::ZERO,
        };
        let display = ScriptedDisplay::new("....");
        let closed = display.log.closed.clone();
        let viewer = Viewer::new(
            StreamLink::connect(opener, URL, policy).unwrap(),
            display,
            FakeRecorderFactory::new(),
            ViewerSettings::default(),
        );

        let err = viewer.run().unwrap_err();

        assert!(matches!(
            err,
            ViewerError::Stream(StreamError::ReconnectExhausted { attempts: 1, .. })
        ));
        assert!(closed.get());
    }

    #[test]
    fn display_failure_is_fatal() {
        struct BrokenDisplay;

        impl DisplaySink for BrokenDisplay {
            fn show(&mut self, _frame: &Frame, _overlay: &[Annotation]) -> Result<(), SinkError> {
                Err(SinkError::Display("window closed".into()))
            }

            fn poll_key(&mut self) -> Result<Option<char>, SinkError> {
                Ok(None)
            }

            fn close(self) -> Result<(), SinkError> {
                Ok(())
            }
        }

        let log = OpenerLog::default();
        let viewer = Viewer::new(
            link(vec![Session::Frames(frames(5))], &log),
            BrokenDisplay,
            FakeRecorderFactory::new(),
            ViewerSettings::default(),
        );

        assert!(matches!(viewer.run(), Err(ViewerError::Sink(SinkError::Display(_)))));
        assert_eq!(log.closes(), 1);
    }

    #[test]
    fn summary_line_reports_frames_time_and_rate() {
        let summary = RunSummary {
            frames: 250,
            elapsed: Duration::from_secs(10),
            reconnects: 2,
        };
        assert_eq!(summary.to_string(), "Processed 250 frames in 10.0s (25.0 fps)");
    }
}
