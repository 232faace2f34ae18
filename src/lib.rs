// THEORY:
// This file is the entry point for the `scoutcam` library crate. It holds
// everything the ScoutCam viewer needs that does not depend on a native video
// stack: the color-blob detector, the overlay description, the session state
// threaded through the control loop, the reconnecting stream link and the sink
// traits the loop writes into.
//
// The OpenCV-backed pieces (FFmpeg capture, HighGUI window, VideoWriter) live in
// the sibling `scoutcam_viewer` package and plug into the traits exported here.
// Keeping the native stack out of this crate means the whole detection and
// control path is testable with plain in-memory frames.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod overlay;
pub mod pipeline;
pub mod session;
pub mod sinks;
pub mod stream;
pub mod viewer;

#[cfg(test)]
pub(crate) mod testing;
