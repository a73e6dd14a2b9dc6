use std::str::FromStr;

use super::color::{ColorScheme, Rgb};

/// Bars never collapse below this height, so the animation stays visible
/// through silence.
pub const MIN_BAR_HEIGHT: f32 = 4.0;
/// Stroke width of the line style.
pub const LINE_THICKNESS: f32 = 3.0;

/// Fraction of the frame width the visualization occupies, centered.
const SPAN_FRACTION: f32 = 0.88;
/// Fraction of each bar slot filled by the bar itself; the rest is gap.
const BAR_FILL: f32 = 0.7;
/// Baseline sits this far up from the bottom edge.
const BASELINE_FRACTION: f32 = 0.1;
/// Tallest bar/point reaches this fraction of the frame height.
const MAX_HEIGHT_FRACTION: f32 = 0.42;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VizStyle {
    Bars,
    Line,
}

impl VizStyle {
    pub fn name(self) -> &'static str {
        match self {
            VizStyle::Bars => "bars",
            VizStyle::Line => "line",
        }
    }
}

impl FromStr for VizStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bars" => Ok(VizStyle::Bars),
            "line" => Ok(VizStyle::Line),
            other => Err(format!("unknown style '{}' (expected one of: bars, line)", other)),
        }
    }
}

/// A drawable primitive in absolute pixel coordinates with a resolved color.
#[derive(Clone, Debug)]
pub enum Primitive {
    /// Axis-aligned rectangle with rounded corners. `x`/`y` is the top-left.
    Bar {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        radius: f32,
        color: Rgb,
    },
    /// Thick line segment between two points.
    Segment {
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        thickness: f32,
        color: Rgb,
    },
}

/// Map a smoothed spectrum to screen-space primitives. The result is never
/// empty: zero magnitudes produce floor-height stand-ins.
pub fn build_geometry(
    spectrum: &[f32],
    style: VizStyle,
    width: u32,
    height: u32,
    scheme: ColorScheme,
) -> Vec<Primitive> {
    let w = width as f32;
    let h = height as f32;
    let span = w * SPAN_FRACTION;
    let left = (w - span) / 2.0;
    let baseline = h * (1.0 - BASELINE_FRACTION);
    let max_height = h * MAX_HEIGHT_FRACTION;

    match style {
        VizStyle::Bars => bars_geometry(spectrum, span, left, baseline, max_height, scheme),
        VizStyle::Line => line_geometry(spectrum, span, left, baseline, max_height, scheme),
    }
}

fn magnitude_to_height(magnitude: f32, max_height: f32) -> f32 {
    MIN_BAR_HEIGHT + magnitude.clamp(0.0, 1.0) * (max_height - MIN_BAR_HEIGHT)
}

fn bars_geometry(
    spectrum: &[f32],
    span: f32,
    left: f32,
    baseline: f32,
    max_height: f32,
    scheme: ColorScheme,
) -> Vec<Primitive> {
    let slot = span / spectrum.len() as f32;
    let bar_width = slot * BAR_FILL;

    spectrum
        .iter()
        .enumerate()
        .map(|(i, &magnitude)| {
            let magnitude = magnitude.clamp(0.0, 1.0);
            let bar_height = magnitude_to_height(magnitude, max_height);
            let x = left + i as f32 * slot + (slot - bar_width) / 2.0;
            Primitive::Bar {
                x,
                y: baseline - bar_height,
                width: bar_width,
                height: bar_height,
                // Cap at half the height so the arcs never cross.
                radius: (bar_width * 0.25).min(bar_height / 2.0),
                // Taller bars shift toward the hot end of the gradient.
                color: scheme.sample(magnitude),
            }
        })
        .collect()
}

fn line_geometry(
    spectrum: &[f32],
    span: f32,
    left: f32,
    baseline: f32,
    max_height: f32,
    scheme: ColorScheme,
) -> Vec<Primitive> {
    let n = spectrum.len();
    let points: Vec<(f32, f32)> = spectrum
        .iter()
        .enumerate()
        .map(|(i, &magnitude)| {
            let t = if n > 1 { i as f32 / (n - 1) as f32 } else { 0.5 };
            let x = left + t * span;
            let y = baseline - magnitude_to_height(magnitude, max_height);
            (x, y)
        })
        .collect();

    if points.len() == 1 {
        // Degenerate single-point spectrum still draws a dot.
        let (x, y) = points[0];
        return vec![Primitive::Segment {
            x0: x,
            y0: y,
            x1: x,
            y1: y,
            thickness: LINE_THICKNESS,
            color: scheme.sample(0.0),
        }];
    }

    points
        .windows(2)
        .enumerate()
        .map(|(i, pair)| Primitive::Segment {
            x0: pair[0].0,
            y0: pair[0].1,
            x1: pair[1].0,
            y1: pair[1].1,
            thickness: LINE_THICKNESS,
            // Line color follows horizontal position, not amplitude.
            color: scheme.sample(i as f32 / (n - 1) as f32),
        })
        .collect()
}
