mod audio;
mod cli;
mod config;
mod encode;
mod render;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use cli::Cli;
use encode::ffmpeg::FfmpegEncoder;
use render::background::BackgroundFrameSet;
use render::color::ColorScheme;
use render::options::RenderOptions;
use render::sequencer::{self, CancelToken};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect mixviz.toml / global config
    let config_path = cli.config.clone().or_else(|| {
        let local = std::path::PathBuf::from("mixviz.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("mixviz").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("mixviz").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    });
    if let Some(ref path) = config_path {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            // Merge: config values apply only when CLI is at its default
            if cli.width == 1280 { cli.width = cfg.output.width; }
            if cli.height == 720 { cli.height = cfg.output.height; }
            if cli.fps == 30 { cli.fps = cfg.output.fps; }
            if cli.crf == 18 { cli.crf = cfg.output.crf; }
            if cli.codec == "libx264" { cli.codec = cfg.output.codec; }
            if cli.bars == 32 { cli.bars = cfg.viz.bars; }
            if cli.style == "bars" { cli.style = cfg.viz.style; }
            if cli.scheme == "neon" { cli.scheme = cfg.viz.scheme; }
            if cli.weighting == "bass" { cli.weighting = cfg.viz.weighting; }
            if cli.glow_radius == 12 { cli.glow_radius = cfg.viz.glow_radius; }
            if cli.glow_opacity == 0.55 { cli.glow_opacity = cfg.viz.glow_opacity; }
            if cli.background.is_none() {
                cli.background = cfg.input.background;
            }
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    // List schemes mode
    if cli.list_schemes {
        println!("Available color schemes:");
        for scheme in ColorScheme::ALL {
            let stops: Vec<String> = scheme
                .colors()
                .iter()
                .map(|c| format!("#{:02x}{:02x}{:02x}", c[0], c[1], c[2]))
                .collect();
            println!("  {:<10} {}", scheme.name(), stops.join(" -> "));
        }
        return Ok(());
    }

    let input = cli.input.as_ref().context("Input audio file is required")?;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    let background_path = cli
        .background
        .as_ref()
        .context("Background image or video is required (-b / [input].background)")?;

    // Validated options: any bad combination fails here, not mid-render.
    let options = RenderOptions {
        width: cli.width,
        height: cli.height,
        fps: cli.fps,
        bars: cli.bars,
        style: cli.style.parse().map_err(anyhow::Error::msg)?,
        scheme: cli.scheme.parse().map_err(anyhow::Error::msg)?,
        weighting: cli.weighting.parse().map_err(anyhow::Error::msg)?,
        glow_radius: cli.glow_radius,
        glow_opacity: cli.glow_opacity,
    };
    options.validate()?;

    log::info!("mixviz - audio-reactive mix video renderer");
    log::info!("Input: {}", input.display());
    log::info!("Background: {}", background_path.display());
    log::info!("Output: {}", cli.output.display());
    log::info!(
        "Resolution: {}x{} @ {}fps, style={}, scheme={}, weighting={}",
        options.width,
        options.height,
        options.fps,
        options.style.name(),
        options.scheme.name(),
        options.weighting.name()
    );

    // 1. Decode audio
    log::info!("Decoding audio...");
    let audio_data = audio::decode::decode_audio(input)?;

    // 2. Load background frames (fatal before the frame loop starts)
    log::info!("Loading background...");
    let background = BackgroundFrameSet::load(background_path, options.width, options.height)?;

    let total_frames = sequencer::frame_count(&audio_data, options.fps);
    log::info!(
        "Total frames: {}, Duration: {:.1}s, background loop: {} frame(s)",
        total_frames,
        audio_data.duration_secs(),
        background.len()
    );

    // 3. Start FFmpeg encoder
    log::info!("Starting FFmpeg encoder...");
    let mut encoder = FfmpegEncoder::new(
        &cli.output,
        input,
        options.width,
        options.height,
        options.fps,
        &cli.codec,
        &cli.pix_fmt,
        cli.crf,
        cli.bitrate.as_deref(),
    )?;

    // 4. Render loop
    let pb = ProgressBar::new(total_frames as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames ({eta} remaining)")
            .unwrap()
            .progress_chars("=>-"),
    );

    let cancel = CancelToken::new();
    let stats = sequencer::run_job(
        &options,
        &audio_data,
        &background,
        &mut encoder,
        &cancel,
        |emitted| pb.set_position(emitted as u64),
    )?;
    pb.finish_with_message("Rendering complete");

    if stats.cancelled {
        log::warn!("Render stopped early after {} frames", stats.frames_emitted);
    }

    // 5. Finish encoding
    log::info!("Finishing encoding...");
    encoder.finish()?;

    log::info!("Done! Output: {}", cli.output.display());
    Ok(())
}
