use thiserror::Error;

use super::color::ColorScheme;
use super::geometry::VizStyle;
use crate::audio::analysis::FreqWeighting;

/// Everything the per-frame pipeline needs to know, validated once before
/// the first frame. Construction happens in main from CLI + config; the
/// render loop never re-checks these.
#[derive(Clone, Copy, Debug)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub bars: usize,
    pub style: VizStyle,
    pub scheme: ColorScheme,
    pub weighting: FreqWeighting,
    pub glow_radius: u32,
    pub glow_opacity: f32,
}

#[derive(Debug, Error, PartialEq)]
pub enum OptionsError {
    #[error("resolution must be non-zero (got {0}x{1})")]
    ZeroResolution(u32, u32),
    #[error("fps must be non-zero")]
    ZeroFps,
    #[error("bar/point count must be non-zero")]
    ZeroBars,
    #[error("bar/point count {bars} does not fit a {width}px frame")]
    TooManyBars { bars: usize, width: u32 },
    #[error("glow opacity must be within [0.0, 1.0] (got {0})")]
    GlowOpacityOutOfRange(f32),
}

impl RenderOptions {
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.width == 0 || self.height == 0 {
            return Err(OptionsError::ZeroResolution(self.width, self.height));
        }
        if self.fps == 0 {
            return Err(OptionsError::ZeroFps);
        }
        if self.bars == 0 {
            return Err(OptionsError::ZeroBars);
        }
        // Each bar/point needs at least two pixels of horizontal room.
        if self.bars > (self.width / 2) as usize {
            return Err(OptionsError::TooManyBars {
                bars: self.bars,
                width: self.width,
            });
        }
        if !(0.0..=1.0).contains(&self.glow_opacity) {
            return Err(OptionsError::GlowOpacityOutOfRange(self.glow_opacity));
        }
        Ok(())
    }
}
