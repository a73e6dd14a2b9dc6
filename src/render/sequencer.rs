use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::audio::analysis::SpectrumAnalyzer;
use crate::audio::decode::AudioData;
use crate::audio::smoothing::SmootherState;

use super::background::BackgroundFrameSet;
use super::compose::Compositor;
use super::geometry::build_geometry;
use super::options::RenderOptions;

/// Downstream consumer of finished frames, fed strictly in index order
/// with no gaps. The production sink is the ffmpeg encoder pipe.
pub trait FrameSink {
    fn write_frame(&mut self, pixels: &[u8]) -> Result<()>;
}

/// Cooperative stop signal. Cancelling finishes the frame in flight and
/// stops before the next one; no partial frame ever reaches the sink.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Safe to call from any thread.
    #[allow(dead_code)]
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RenderStats {
    pub frames_emitted: usize,
    pub cancelled: bool,
}

/// Total output frames for a buffer: `ceil(duration * fps)`.
pub fn frame_count(audio: &AudioData, fps: u32) -> usize {
    let duration = audio.samples.len() as f64 / audio.sample_rate as f64;
    (duration * fps as f64).ceil() as usize
}

/// Drive one render job: slice audio per frame, loop the background, run
/// analysis, smoothing, geometry, and compositing, and emit each frame to
/// the sink in order. Smoother state lives and dies inside the job, so
/// concurrent jobs never share history.
///
/// `progress` is called with the number of frames emitted so far.
pub fn run_job(
    opts: &RenderOptions,
    audio: &AudioData,
    background: &BackgroundFrameSet,
    sink: &mut dyn FrameSink,
    cancel: &CancelToken,
    mut progress: impl FnMut(usize),
) -> Result<RenderStats> {
    let total = frame_count(audio, opts.fps);
    if total == 0 {
        return Ok(RenderStats { frames_emitted: 0, cancelled: false });
    }

    let samples = &audio.samples;
    let samples_per_frame = samples.len() / total;

    let mut analyzer = SpectrumAnalyzer::new(opts.bars, opts.weighting);
    let mut state = SmootherState::new();
    let mut compositor =
        Compositor::new(opts.width, opts.height, opts.glow_radius, opts.glow_opacity);

    for index in 0..total {
        let start = (index * samples_per_frame).min(samples.len());
        let end = ((index + 1) * samples_per_frame).min(samples.len());
        let window = &samples[start..end];

        let raw = analyzer.analyze(window);
        let smoothed = state.advance(&raw);
        let geometry = build_geometry(&smoothed, opts.style, opts.width, opts.height, opts.scheme);
        let pixels = compositor.composite(background.frame(index), &geometry, opts.style);

        sink.write_frame(&pixels)?;
        progress(index + 1);

        if cancel.is_cancelled() {
            log::info!("Render cancelled after frame {}", index);
            return Ok(RenderStats { frames_emitted: index + 1, cancelled: true });
        }
    }

    Ok(RenderStats { frames_emitted: total, cancelled: false })
}
