use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mixviz", about = "Audio-reactive music mix video renderer")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG, AAC)
    pub input: Option<PathBuf>,

    /// Output video file
    #[arg(short, long, default_value = "final_mix.mp4")]
    pub output: PathBuf,

    /// Background image or looping video clip
    #[arg(short, long)]
    pub background: Option<PathBuf>,

    /// Video width in pixels
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Video height in pixels
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Frames per second
    #[arg(long, default_value_t = 30)]
    pub fps: u32,

    /// Number of frequency bars (or line points)
    #[arg(short = 'n', long, default_value_t = 32)]
    pub bars: usize,

    /// Visualization style (bars, line)
    #[arg(long, default_value = "bars")]
    pub style: String,

    /// Color scheme preset (see --list-schemes)
    #[arg(long, default_value = "neon")]
    pub scheme: String,

    /// Frequency weighting curve (flat, bass, mid)
    #[arg(long, default_value = "bass")]
    pub weighting: String,

    /// Glow blur radius in pixels (0 disables the glow pass)
    #[arg(long, default_value_t = 12)]
    pub glow_radius: u32,

    /// Glow layer opacity (0.0-1.0)
    #[arg(long, default_value_t = 0.55)]
    pub glow_opacity: f32,

    /// H.264 CRF quality (0-51, lower = better). Ignored when --bitrate is set.
    #[arg(long, default_value_t = 18)]
    pub crf: u32,

    /// Video bitrate (e.g. 2400k, 5M). When set, uses -b:v instead of -crf.
    #[arg(long)]
    pub bitrate: Option<String>,

    /// FFmpeg video codec
    #[arg(long, default_value = "libx264")]
    pub codec: String,

    /// FFmpeg output pixel format
    #[arg(long, default_value = "yuv420p")]
    pub pix_fmt: String,

    /// Config file path (defaults to mixviz.toml / user config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// List available color schemes and exit
    #[arg(long)]
    pub list_schemes: bool,
}
