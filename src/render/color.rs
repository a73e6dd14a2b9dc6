use std::str::FromStr;

/// Interleaved 8-bit RGB, matching the frame pixel format.
pub type Rgb = [u8; 3];

/// Named color presets. Each carries an ordered gradient of 3-4 stops,
/// cold end first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorScheme {
    Neon,
    Sunset,
    Ocean,
    Ember,
    Mono,
}

impl ColorScheme {
    pub const ALL: [ColorScheme; 5] = [
        ColorScheme::Neon,
        ColorScheme::Sunset,
        ColorScheme::Ocean,
        ColorScheme::Ember,
        ColorScheme::Mono,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ColorScheme::Neon => "neon",
            ColorScheme::Sunset => "sunset",
            ColorScheme::Ocean => "ocean",
            ColorScheme::Ember => "ember",
            ColorScheme::Mono => "mono",
        }
    }

    /// Gradient stops, ascending from the cold end to the hot end.
    pub fn colors(self) -> &'static [Rgb] {
        match self {
            ColorScheme::Neon => &[[0, 229, 255], [64, 93, 255], [255, 0, 212]],
            ColorScheme::Sunset => &[[69, 33, 124], [232, 83, 85], [255, 166, 0], [255, 233, 128]],
            ColorScheme::Ocean => &[[8, 44, 108], [28, 118, 189], [108, 205, 222], [230, 250, 250]],
            ColorScheme::Ember => &[[96, 12, 4], [214, 64, 14], [255, 168, 32]],
            ColorScheme::Mono => &[[82, 82, 82], [168, 168, 168], [255, 255, 255]],
        }
    }

    /// Sample the gradient at `t` in [0, 1], piecewise-linear across the
    /// stops. Out-of-range values clamp to the nearest end.
    pub fn sample(self, t: f32) -> Rgb {
        let stops = self.colors();
        let t = t.clamp(0.0, 1.0);

        let segments = (stops.len() - 1) as f32;
        let pos = t * segments;
        let idx = (pos as usize).min(stops.len() - 2);
        let frac = pos - idx as f32;

        let lo = stops[idx];
        let hi = stops[idx + 1];
        [
            lerp_channel(lo[0], hi[0], frac),
            lerp_channel(lo[1], hi[1], frac),
            lerp_channel(lo[2], hi[2], frac),
        ]
    }
}

fn lerp_channel(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round() as u8
}

impl FromStr for ColorScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColorScheme::ALL
            .iter()
            .copied()
            .find(|scheme| scheme.name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = ColorScheme::ALL.iter().map(|s| s.name()).collect();
                format!("unknown color scheme '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}
