// THEORY:
// `scoutcam_viewer` is the desktop front end. It owns everything that needs the
// native OpenCV stack (FFmpeg capture, the HighGUI window, the video writer)
// and plugs those backends into the `scoutcam` control loop. All the logic that
// decides what to draw, when to record and how to reconnect lives in the
// library; this binary only parses arguments, sets up logging, prints the
// operator-facing text and maps outcomes to exit codes.

mod capture;
mod mat;
mod recorder;
mod window;

use anyhow::{Context, Result};
use clap::Parser;
use scoutcam::config::ViewerConfig;
use scoutcam::error::StreamError;
use scoutcam::stream::StreamLink;
use scoutcam::viewer::Viewer;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::capture::FfmpegOpener;
use crate::recorder::VideoWriterFactory;
use crate::window::HighGuiWindow;

#[derive(Parser, Debug)]
#[command(name = "scoutcam_viewer", about = "Live viewer for a ScoutCam RTSP stream")]
struct Cli {
    /// Camera host name or IP address.
    #[arg(default_value = "scoutcam.local")]
    host: String,
    /// TOML file overriding the stock settings.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Where screenshots and recordings are written.
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match cli.config.as_deref().map(ViewerConfig::load).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(err) => {
            eprintln!("ERROR: {err}");
            return ExitCode::from(2);
        }
    };
    if let Some(dir) = cli.output_dir {
        config.output.directory = dir;
    }

    init_logging(&config.logging.level);

    match run(&cli.host, &config) {
        Ok(code) => code,
        Err(err) => {
            error!(error = %format!("{err:#}"), "viewer stopped");
            eprintln!("ERROR: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(host: &str, config: &ViewerConfig) -> Result<ExitCode> {
    let url = config.stream_url(host);

    println!("{}", "=".repeat(50));
    println!("  ScoutCam Viewer");
    println!("{}", "=".repeat(50));
    println!();
    println!("Connecting to: {url}");
    println!();
    println!("Controls:");
    for line in config.key_bindings().help_lines() {
        println!("  {line}");
    }
    println!();

    std::fs::create_dir_all(&config.output.directory).with_context(|| {
        format!(
            "failed to create output directory {}",
            config.output.directory.display()
        )
    })?;

    let opener = FfmpegOpener {
        buffer_size: config.stream.buffer_size,
    };
    let link = match StreamLink::connect(opener, url.as_str(), config.reconnect_policy()) {
        Ok(link) => link,
        Err(err) => {
            print_troubleshooting(host, &err);
            return Ok(ExitCode::FAILURE);
        }
    };

    let properties = link.properties();
    println!(
        "Stream: {}x{} @ {:.1}fps",
        properties.width, properties.height, properties.fps
    );
    println!();

    let recorders = VideoWriterFactory::new(&config.output.recording_fourcc)?;
    let window = HighGuiWindow::open(&config.display.window_title)?;

    let summary = Viewer::new(link, window, recorders, config.viewer_settings()).run()?;

    println!();
    println!("{summary}");
    println!("Reconnects: {}", summary.reconnects);
    Ok(ExitCode::SUCCESS)
}

fn print_troubleshooting(host: &str, err: &StreamError) {
    println!("ERROR: {err}");
    println!();
    println!("Troubleshooting:");
    println!("  1. Is the camera powered on and connected to the network?");
    println!("  2. Is the scoutcam service running? SSH in and run: scoutcam status");
    println!("  3. Can you ping the camera? ping {host}");
}
