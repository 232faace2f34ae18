// THEORY:
// The `stream` module is the acquisition side of the viewer. A backend provides
// two things: a `SourceOpener` that turns a URL into a live `FrameSource`, and
// the source itself, which hands out decoded frames until it fails.
//
// `StreamLink` wraps the pair and owns the retry policy. It is an explicit
// two-state machine:
//
//   Connected    --read ok-------> Connected      (frame returned)
//   Connected    --read failed---> Reconnecting   (source released)
//   Reconnecting --open ok-------> Connected
//   Reconnecting --open failed---> Reconnecting   (attempt + 1, or give up once
//                                                  the policy's bound is hit)
//
// The stock policy never gives up and never waits: the camera sits on a local
// network and is assumed to come back. There is no read timeout, so a source
// that hangs blocks the caller; that is the backend's business.

use image::RgbImage;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::StreamError;

/// One decoded video frame, RGB, 8 bits per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pixels: RgbImage,
}

impl Frame {
    pub fn new(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Metadata reported by an open source.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StreamProperties {
    pub width: u32,
    pub height: u32,
    /// Nominal frame rate; 0 when the transport does not report one.
    pub fps: f64,
}

impl StreamProperties {
    /// Frame rate to stamp on a recording, falling back when none is reported.
    pub fn recording_fps(&self, fallback: f64) -> f64 {
        if self.fps.is_finite() && self.fps > 0.0 {
            self.fps
        } else {
            fallback
        }
    }
}

/// A live, opened stream.
pub trait FrameSource {
    fn properties(&self) -> StreamProperties;

    /// Blocks until the next frame is decoded. Any error means the source is
    /// unusable and should be released.
    fn read(&mut self) -> Result<Frame, StreamError>;

    /// Releases the underlying transport.
    fn close(self)
    where
        Self: Sized,
    {
    }
}

/// Opens sources for a URL. Called once at startup and again on every
/// reconnect attempt.
pub trait SourceOpener {
    type Source: FrameSource;

    fn open(&mut self, url: &str) -> Result<Self::Source, StreamError>;
}

/// How the link behaves after a read failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconnectPolicy {
    /// Failed reopen attempts tolerated per outage. `None` retries forever.
    pub max_attempts: Option<u32>,
    /// Pause before each reopen attempt.
    pub retry_delay: Duration,
}

impl ReconnectPolicy {
    /// Retry forever, immediately.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Whether another reopen may be tried after `failed` failed attempts.
    pub fn allows(&self, failed: u32) -> bool {
        self.max_attempts.is_none_or(|max| failed < max)
    }
}

/// State of a `StreamLink`.
#[derive(Debug)]
pub enum LinkState<S> {
    Connected(S),
    Reconnecting { attempt: u32 },
}

impl<S> LinkState<S> {
    pub fn name(&self) -> &'static str {
        match self {
            LinkState::Connected(_) => "connected",
            LinkState::Reconnecting { .. } => "reconnecting",
        }
    }
}

/// A stream source that reopens itself on read failure.
pub struct StreamLink<O: SourceOpener> {
    opener: O,
    url: String,
    policy: ReconnectPolicy,
    state: LinkState<O::Source>,
    properties: StreamProperties,
    reconnects: u64,
}

impl<O: SourceOpener> StreamLink<O> {
    /// Opens the stream once. A failure here is not retried.
    pub fn connect(
        mut opener: O,
        url: impl Into<String>,
        policy: ReconnectPolicy,
    ) -> Result<Self, StreamError> {
        let url = url.into();
        let source = opener.open(&url)?;
        let properties = source.properties();
        info!(
            url = %url,
            width = properties.width,
            height = properties.height,
            fps = properties.fps,
            "connected to stream"
        );
        Ok(Self {
            opener,
            url,
            policy,
            state: LinkState::Connected(source),
            properties,
            reconnects: 0,
        })
    }

    /// Returns the next frame, reopening the source as often as the policy
    /// allows. Only fails with `StreamError::ReconnectExhausted`.
    pub fn next_frame(&mut self) -> Result<Frame, StreamError> {
        loop {
            let state = std::mem::replace(&mut self.state, LinkState::Reconnecting { attempt: 0 });
            self.state = match state {
                LinkState::Connected(mut source) => match source.read() {
                    Ok(frame) => {
                        self.state = LinkState::Connected(source);
                        return Ok(frame);
                    }
                    Err(err) => {
                        warn!(url = %self.url, error = %err, "lost connection to stream, attempting to reconnect");
                        source.close();
                        self.reconnects += 1;
                        LinkState::Reconnecting { attempt: 0 }
                    }
                },
                LinkState::Reconnecting { attempt } => {
                    if !self.policy.allows(attempt) {
                        self.state = LinkState::Reconnecting { attempt };
                        return Err(StreamError::ReconnectExhausted {
                            url: self.url.clone(),
                            attempts: attempt,
                        });
                    }
                    if !self.policy.retry_delay.is_zero() {
                        std::thread::sleep(self.policy.retry_delay);
                    }
                    match self.opener.open(&self.url) {
                        Ok(source) => {
                            self.properties = source.properties();
                            info!(url = %self.url, attempt = attempt + 1, "reconnected to stream");
                            LinkState::Connected(source)
                        }
                        Err(err) => {
                            debug!(url = %self.url, attempt = attempt + 1, error = %err, "reopen failed");
                            LinkState::Reconnecting {
                                attempt: attempt + 1,
                            }
                        }
                    }
                }
            };
        }
    }

    /// Properties of the most recently opened source.
    pub fn properties(&self) -> StreamProperties {
        self.properties
    }

    pub fn state(&self) -> &LinkState<O::Source> {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, LinkState::Connected(_))
    }

    /// Number of outages seen so far.
    pub fn reconnects(&self) -> u64 {
        self.reconnects
    }

    /// Releases the current source, if any.
    pub fn close(self) {
        if let LinkState::Connected(source) = self.state {
            source.close();
        }
        debug!(url = %self.url, "stream released");
    }
}
