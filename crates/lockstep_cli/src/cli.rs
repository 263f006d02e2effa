use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

/// Log levels selectable on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// How intersections are computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Depth-first reference tracer, no batching
    Reference,
    /// Batched, linear-scan intersector on the host
    Software,
    /// Batched, through the emulated raycast device
    Emulated,
}

#[derive(Parser, Debug)]
#[command(name = "lockstep")]
#[command(about = "Batched breadth-first path tracer")]
#[command(version)]
pub struct Args {
    /// Scene description (JSON array of shapes)
    pub scene: PathBuf,

    /// Output image path; format follows the extension
    #[arg(short, long, default_value = "render.png")]
    pub output: PathBuf,

    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub debug_level: LogLevel,

    /// Image height in pixels
    #[arg(long, default_value = "360")]
    pub rows: u32,

    /// Image width in pixels
    #[arg(long, default_value = "480")]
    pub cols: u32,

    /// Sample passes per pixel
    #[arg(long, short = 's', default_value = "4")]
    pub rays_per_pixel: u32,

    /// Maximum path length in bounces
    #[arg(long, short = 'd', default_value = "4")]
    pub depth: u32,

    /// Rays per backend call
    #[arg(long, short = 'w', default_value = "16")]
    pub batch_width: usize,

    #[arg(long, value_enum, default_value = "software")]
    pub backend: BackendKind,

    /// Run sample passes in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Base random seed
    #[arg(long, default_value = "0")]
    pub seed: u64,

    /// Horizontal field of view in degrees
    #[arg(long, default_value = "90")]
    pub fov: f32,

    /// Camera pitch in degrees, positive looks up
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub pitch: f32,

    /// Camera yaw in degrees, positive turns left
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub yaw: f32,

    /// Camera position as x,y,z
    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = [0.0, 0.0, 0.0],
        allow_hyphen_values = true
    )]
    pub position: Vec<f32>,

    /// Scene memory of the emulated device, in shapes
    #[arg(long, default_value = "16")]
    pub device_capacity: usize,

    /// Device response timeout in milliseconds
    #[arg(long, default_value = "5000")]
    pub timeout_ms: u64,
}
