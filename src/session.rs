// THEORY:
// `SessionState` is the whole mutable state of a viewing session: two
// independent toggles, a frame counter and the start instant used for the FPS
// readout. The control loop owns exactly one value of it and threads it through
// each iteration (passed in, returned out) instead of mutating flags in place,
// so every transition is an ordinary function from state to state.
//
// The toggles are free of each other: all four {recording, detection}
// combinations are legal, and nothing flips them except a key press.

use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionState {
    pub recording: bool,
    pub show_detection: bool,
    pub frame_count: u64,
    pub started_at: Instant,
}

impl SessionState {
    pub fn new(show_detection: bool) -> Self {
        Self::started_at(Instant::now(), show_detection)
    }

    pub fn started_at(started_at: Instant, show_detection: bool) -> Self {
        Self {
            recording: false,
            show_detection,
            frame_count: 0,
            started_at,
        }
    }

    /// Counts one more processed frame.
    pub fn frame_processed(self) -> Self {
        Self {
            frame_count: self.frame_count + 1,
            ..self
        }
    }

    pub fn toggle_detection(self) -> Self {
        Self {
            show_detection: !self.show_detection,
            ..self
        }
    }

    pub fn with_recording(self, recording: bool) -> Self {
        Self { recording, ..self }
    }

    /// Average frames per second since the session started. 0 before any time
    /// has elapsed.
    pub fn fps_at(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.started_at).as_secs_f64();
        if elapsed > 0.0 {
            self.frame_count as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Status readout, e.g. `FPS: 24.8 [REC] [DET]`.
    pub fn status_text(&self, fps: f64) -> String {
        let mut text = format!("FPS: {fps:.1}");
        if self.recording {
            text.push_str(" [REC]");
        }
        if self.show_detection {
            text.push_str(" [DET]");
        }
        text
    }
}

/// Discrete operator commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    Snapshot,
    ToggleRecording,
    ToggleDetection,
}

/// Key-to-command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBindings {
    pub quit: char,
    pub snapshot: char,
    pub toggle_recording: char,
    pub toggle_detection: char,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: 'q',
            snapshot: 's',
            toggle_recording: 'r',
            toggle_detection: 'd',
        }
    }
}

impl KeyBindings {
    pub fn command_for(&self, key: char) -> Option<Command> {
        if key == self.quit {
            Some(Command::Quit)
        } else if key == self.snapshot {
            Some(Command::Snapshot)
        } else if key == self.toggle_recording {
            Some(Command::ToggleRecording)
        } else if key == self.toggle_detection {
            Some(Command::ToggleDetection)
        } else {
            None
        }
    }

    /// Help lines printed at startup.
    pub fn help_lines(&self) -> [String; 4] {
        [
            format!("{} - Quit", self.quit),
            format!("{} - Save screenshot", self.snapshot),
            format!("{} - Toggle recording", self.toggle_recording),
            format!("{} - Toggle detection overlay", self.toggle_detection),
        ]
    }
}
