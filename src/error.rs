use thiserror::Error;

/// Failures of the stream source. `Open` is fatal at startup; the read kinds
/// send the link into its reconnect state.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("failed to open stream {url}")]
    Open { url: String },
    #[error("failed to read frame: {0}")]
    Read(String),
    #[error("stream ended")]
    EndOfStream,
    #[error("gave up reconnecting to {url} after {attempts} attempts")]
    ReconnectExhausted { url: String, attempts: u32 },
}

/// Failures of the display, recording and snapshot sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("display error: {0}")]
    Display(String),
    #[error("recorder error: {0}")]
    Recorder(String),
    #[error("failed to write snapshot: {0}")]
    Snapshot(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Anything that ends the control loop early.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}
