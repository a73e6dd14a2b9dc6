use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub viz: VizConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct InputConfig {
    #[serde(default)]
    pub background: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_crf")]
    pub crf: u32,
    #[serde(default = "default_codec")]
    pub codec: String,
}

#[derive(Debug, Deserialize)]
pub struct VizConfig {
    #[serde(default = "default_bars")]
    pub bars: usize,
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_weighting")]
    pub weighting: String,
    #[serde(default = "default_glow_radius")]
    pub glow_radius: u32,
    #[serde(default = "default_glow_opacity")]
    pub glow_opacity: f32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            crf: default_crf(),
            codec: default_codec(),
        }
    }
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            bars: default_bars(),
            style: default_style(),
            scheme: default_scheme(),
            weighting: default_weighting(),
            glow_radius: default_glow_radius(),
            glow_opacity: default_glow_opacity(),
        }
    }
}

fn default_width() -> u32 { 1280 }
fn default_height() -> u32 { 720 }
fn default_fps() -> u32 { 30 }
fn default_crf() -> u32 { 18 }
fn default_codec() -> String { "libx264".into() }
fn default_bars() -> usize { 32 }
fn default_style() -> String { "bars".into() }
fn default_scheme() -> String { "neon".into() }
fn default_weighting() -> String { "bass".into() }
fn default_glow_radius() -> u32 { 12 }
fn default_glow_opacity() -> f32 { 0.55 }

pub fn load_config(path: &PathBuf) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.output.width, 1280);
        assert_eq!(config.output.fps, 30);
        assert_eq!(config.viz.bars, 32);
        assert_eq!(config.viz.scheme, "neon");
        assert!(config.input.background.is_none());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: Config = toml::from_str(
            r#"
            [viz]
            bars = 64
            style = "line"

            [input]
            background = "backgrounds/bg.mp4"
            "#,
        )
        .unwrap();
        assert_eq!(config.viz.bars, 64);
        assert_eq!(config.viz.style, "line");
        assert_eq!(config.viz.glow_radius, 12);
        assert_eq!(config.output.height, 720);
        assert_eq!(
            config.input.background.as_deref(),
            Some(std::path::Path::new("backgrounds/bg.mp4"))
        );
    }
}
