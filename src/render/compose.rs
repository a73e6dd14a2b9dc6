use rayon::prelude::*;

use super::color::Rgb;
use super::geometry::{Primitive, VizStyle};

/// Extra half-width added to primitives on the glow layer before blurring.
const GLOW_DILATION: f32 = 3.0;
/// Coverage above which the line style overwrites the pixel outright.
const OVERWRITE_THRESHOLD: u8 = 96;

/// Renders geometry onto transparent scratch layers and blends them over a
/// background frame: blurred glow first at reduced opacity, then the sharp
/// shapes. Scratch buffers are reused across frames.
pub struct Compositor {
    width: u32,
    height: u32,
    glow_radius: u32,
    glow_opacity: f32,
    shape: Vec<u8>,
    glow: Vec<u8>,
    blur_scratch: Vec<u8>,
}

impl Compositor {
    pub fn new(width: u32, height: u32, glow_radius: u32, glow_opacity: f32) -> Self {
        let layer_len = (width * height * 4) as usize;
        Self {
            width,
            height,
            glow_radius,
            glow_opacity,
            shape: vec![0; layer_len],
            glow: vec![0; layer_len],
            blur_scratch: vec![0; layer_len],
        }
    }

    /// Composite one frame. `background` is RGB24 at the compositor's
    /// dimensions; the returned buffer has the same format and size.
    pub fn composite(&mut self, background: &[u8], geometry: &[Primitive], style: VizStyle) -> Vec<u8> {
        self.shape.fill(0);
        self.glow.fill(0);

        for prim in geometry {
            draw_primitive(&mut self.shape, self.width, self.height, prim, 0.0);
            draw_primitive(&mut self.glow, self.width, self.height, prim, GLOW_DILATION);
        }

        if self.glow_radius > 0 && self.glow_opacity > 0.0 {
            // Two box-blur passes approximate a Gaussian bloom.
            for _ in 0..2 {
                blur_rows(&self.glow, &mut self.blur_scratch, self.width, self.height, self.glow_radius);
                blur_columns(&self.blur_scratch, &mut self.glow, self.width, self.height, self.glow_radius);
            }
        }

        let mut out = background.to_vec();
        self.blend_glow(&mut out);
        self.blend_shape(&mut out, style);
        out
    }

    /// Additive glow blend. The layer is black outside coverage, so the
    /// blurred color channels already carry the falloff.
    fn blend_glow(&self, out: &mut [u8]) {
        if self.glow_radius == 0 || self.glow_opacity <= 0.0 {
            return;
        }
        for (dst, src) in out.chunks_exact_mut(3).zip(self.glow.chunks_exact(4)) {
            for c in 0..3 {
                let add = (src[c] as f32 * self.glow_opacity) as u8;
                dst[c] = dst[c].saturating_add(add);
            }
        }
    }

    fn blend_shape(&self, out: &mut [u8], style: VizStyle) {
        for (dst, src) in out.chunks_exact_mut(3).zip(self.shape.chunks_exact(4)) {
            let alpha = src[3];
            if alpha == 0 {
                continue;
            }
            match style {
                // Source-over through the shape's own silhouette: the bar
                // stays crisp atop its halo, edges stay anti-aliased.
                VizStyle::Bars => {
                    let a = alpha as f32 / 255.0;
                    for c in 0..3 {
                        dst[c] = (src[c] as f32 * a + dst[c] as f32 * (1.0 - a)) as u8;
                    }
                }
                // The line overwrites wherever its mask has real coverage.
                VizStyle::Line => {
                    if alpha >= OVERWRITE_THRESHOLD {
                        dst[..3].copy_from_slice(&src[..3]);
                    } else {
                        let a = alpha as f32 / 255.0;
                        for c in 0..3 {
                            dst[c] = (src[c] as f32 * a + dst[c] as f32 * (1.0 - a)) as u8;
                        }
                    }
                }
            }
        }
    }
}

/// Rasterize a primitive onto an RGBA layer with 1px anti-aliased edges.
/// `dilation` grows the silhouette outward (used for the glow copy).
/// Coordinates outside the layer clip silently.
fn draw_primitive(layer: &mut [u8], width: u32, height: u32, prim: &Primitive, dilation: f32) {
    match *prim {
        Primitive::Bar { x, y, width: bw, height: bh, radius, color } => {
            let cx = x + bw / 2.0;
            let cy = y + bh / 2.0;
            let half_w = bw / 2.0 + dilation;
            let half_h = bh / 2.0 + dilation;
            let radius = radius + dilation;
            fill_span(layer, width, height, color, cx - half_w, cy - half_h, cx + half_w, cy + half_h, |px, py| {
                rounded_rect_distance(px - cx, py - cy, half_w, half_h, radius)
            });
        }
        Primitive::Segment { x0, y0, x1, y1, thickness, color } => {
            let half_t = thickness / 2.0 + dilation;
            let min_x = x0.min(x1) - half_t;
            let max_x = x0.max(x1) + half_t;
            let min_y = y0.min(y1) - half_t;
            let max_y = y0.max(y1) + half_t;
            fill_span(layer, width, height, color, min_x, min_y, max_x, max_y, |px, py| {
                segment_distance(px, py, x0, y0, x1, y1) - half_t
            });
        }
    }
}

/// Iterate the clipped bounding box and write coverage from a signed
/// distance function (negative inside). Overlapping primitives keep the
/// strongest coverage.
fn fill_span<F>(
    layer: &mut [u8],
    width: u32,
    height: u32,
    color: Rgb,
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
    distance: F,
) where
    F: Fn(f32, f32) -> f32,
{
    let x_start = (min_x.floor().max(0.0)) as u32;
    let y_start = (min_y.floor().max(0.0)) as u32;
    let x_end = (max_x.ceil().min(width as f32 - 1.0)).max(0.0) as u32;
    let y_end = (max_y.ceil().min(height as f32 - 1.0)).max(0.0) as u32;
    if x_start > x_end || y_start > y_end {
        return;
    }

    for py in y_start..=y_end {
        for px in x_start..=x_end {
            let d = distance(px as f32 + 0.5, py as f32 + 0.5);
            let coverage = (0.5 - d).clamp(0.0, 1.0);
            if coverage <= 0.0 {
                continue;
            }
            let alpha = (coverage * 255.0) as u8;
            let idx = ((py * width + px) * 4) as usize;
            if alpha > layer[idx + 3] {
                layer[idx] = color[0];
                layer[idx + 1] = color[1];
                layer[idx + 2] = color[2];
                layer[idx + 3] = alpha;
            }
        }
    }
}

/// Signed distance from a point (relative to the rect center) to a rounded
/// rectangle with half extents `half_w`/`half_h` and corner radius `radius`.
fn rounded_rect_distance(dx: f32, dy: f32, half_w: f32, half_h: f32, radius: f32) -> f32 {
    let radius = radius.min(half_w).min(half_h);
    let qx = dx.abs() - (half_w - radius);
    let qy = dy.abs() - (half_h - radius);
    let outside = (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt();
    outside + qx.max(qy).min(0.0) - radius
}

/// Distance from a point to a line segment.
fn segment_distance(px: f32, py: f32, x0: f32, y0: f32, x1: f32, y1: f32) -> f32 {
    let vx = x1 - x0;
    let vy = y1 - y0;
    let wx = px - x0;
    let wy = py - y0;
    let len_sq = vx * vx + vy * vy;
    let t = if len_sq > 0.0 {
        ((wx * vx + wy * vy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let dx = wx - t * vx;
    let dy = wy - t * vy;
    (dx * dx + dy * dy).sqrt()
}

/// Horizontal box-blur pass: each destination row is a sliding-window
/// average of its source row. Rows are independent, so they run in parallel.
fn blur_rows(src: &[u8], dst: &mut [u8], width: u32, height: u32, radius: u32) {
    let row_bytes = (width * 4) as usize;
    let w = width as i64;
    let r = radius as i64;
    let window = (2 * r + 1) as u32;

    dst.par_chunks_mut(row_bytes)
        .zip(src.par_chunks(row_bytes))
        .take(height as usize)
        .for_each(|(dst_row, src_row)| {
            let mut sums = [0u32; 4];
            for x in -r..=r {
                let sx = (x.clamp(0, w - 1) * 4) as usize;
                for c in 0..4 {
                    sums[c] += src_row[sx + c] as u32;
                }
            }
            for x in 0..w {
                let di = (x * 4) as usize;
                for c in 0..4 {
                    dst_row[di + c] = (sums[c] / window) as u8;
                }
                let leave = ((x - r).clamp(0, w - 1) * 4) as usize;
                let enter = ((x + r + 1).clamp(0, w - 1) * 4) as usize;
                for c in 0..4 {
                    sums[c] += src_row[enter + c] as u32;
                    sums[c] -= src_row[leave + c] as u32;
                }
            }
        });
}

/// Vertical box-blur pass: each destination row averages the source rows in
/// its window. Rows are written independently and run in parallel.
fn blur_columns(src: &[u8], dst: &mut [u8], width: u32, height: u32, radius: u32) {
    let row_bytes = (width * 4) as usize;
    let h = height as i64;
    let r = radius as i64;
    let window = (2 * r + 1) as u32;

    dst.par_chunks_mut(row_bytes)
        .take(height as usize)
        .enumerate()
        .for_each(|(y, dst_row)| {
            let y = y as i64;
            for x in 0..width as usize {
                let mut sums = [0u32; 4];
                for dy in -r..=r {
                    let sy = (y + dy).clamp(0, h - 1) as usize;
                    let si = sy * row_bytes + x * 4;
                    for c in 0..4 {
                        sums[c] += src[si + c] as u32;
                    }
                }
                let di = x * 4;
                for c in 0..4 {
                    dst_row[di + c] = (sums[c] / window) as u8;
                }
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::color::ColorScheme;
    use crate::render::geometry::build_geometry;

    const W: u32 = 64;
    const H: u32 = 64;

    fn black_background() -> Vec<u8> {
        vec![0; (W * H * 3) as usize]
    }

    fn pixel(frame: &[u8], x: u32, y: u32) -> [u8; 3] {
        let i = ((y * W + x) * 3) as usize;
        [frame[i], frame[i + 1], frame[i + 2]]
    }

    #[test]
    fn output_matches_background_dimensions() {
        let mut compositor = Compositor::new(W, H, 4, 0.5);
        let geometry = build_geometry(&[0.5; 4], VizStyle::Bars, W, H, ColorScheme::Neon);
        let out = compositor.composite(&black_background(), &geometry, VizStyle::Bars);
        assert_eq!(out.len(), (W * H * 3) as usize);
    }

    #[test]
    fn bar_interior_is_exact_shape_color() {
        let mut compositor = Compositor::new(W, H, 4, 0.5);
        let color: Rgb = [10, 200, 30];
        let prim = Primitive::Bar {
            x: 20.0,
            y: 20.0,
            width: 20.0,
            height: 20.0,
            radius: 3.0,
            color,
        };
        let out = compositor.composite(&black_background(), &[prim], VizStyle::Bars);
        // Center of the bar: full coverage, sharp layer wins over glow.
        assert_eq!(pixel(&out, 30, 30), color);
    }

    #[test]
    fn region_far_from_geometry_keeps_background() {
        let mut compositor = Compositor::new(W, H, 2, 0.5);
        let mut background = black_background();
        background[0] = 77;
        background[1] = 88;
        background[2] = 99;
        let prim = Primitive::Bar {
            x: 40.0,
            y: 40.0,
            width: 10.0,
            height: 10.0,
            radius: 2.0,
            color: [255, 255, 255],
        };
        let out = compositor.composite(&background, &[prim], VizStyle::Bars);
        assert_eq!(pixel(&out, 0, 0), [77, 88, 99]);
    }

    #[test]
    fn glow_bleeds_outside_the_shape() {
        let mut compositor = Compositor::new(W, H, 6, 0.8);
        let prim = Primitive::Bar {
            x: 24.0,
            y: 24.0,
            width: 16.0,
            height: 16.0,
            radius: 2.0,
            color: [255, 0, 0],
        };
        let out = compositor.composite(&black_background(), &[prim], VizStyle::Bars);
        // A pixel just outside the sharp silhouette picks up blurred glow.
        let halo = pixel(&out, 20, 32);
        assert!(halo[0] > 0);
    }

    #[test]
    fn zero_opacity_disables_glow() {
        let mut compositor = Compositor::new(W, H, 6, 0.0);
        let prim = Primitive::Bar {
            x: 24.0,
            y: 24.0,
            width: 16.0,
            height: 16.0,
            radius: 2.0,
            color: [255, 0, 0],
        };
        let out = compositor.composite(&black_background(), &[prim], VizStyle::Bars);
        assert_eq!(pixel(&out, 12, 32), [0, 0, 0]);
    }

    #[test]
    fn out_of_bounds_geometry_clips_silently() {
        let mut compositor = Compositor::new(W, H, 4, 0.5);
        let prims = [
            Primitive::Bar {
                x: -50.0,
                y: -50.0,
                width: 30.0,
                height: 30.0,
                radius: 4.0,
                color: [255, 255, 255],
            },
            Primitive::Segment {
                x0: -100.0,
                y0: 10.0,
                x1: 200.0,
                y1: 500.0,
                thickness: 3.0,
                color: [255, 255, 255],
            },
        ];
        let out = compositor.composite(&black_background(), &prims, VizStyle::Line);
        assert_eq!(out.len(), (W * H * 3) as usize);
    }

    #[test]
    fn line_core_overwrites_background() {
        let mut compositor = Compositor::new(W, H, 0, 0.0);
        let mut background = black_background();
        background.fill(200);
        let color: Rgb = [5, 5, 5];
        let prim = Primitive::Segment {
            x0: 8.0,
            y0: 32.5,
            x1: 56.0,
            y1: 32.5,
            thickness: 4.0,
            color,
        };
        let out = compositor.composite(&background, &[prim], VizStyle::Line);
        assert_eq!(pixel(&out, 32, 32), color);
    }

    #[test]
    fn rounded_corner_stays_transparent() {
        let mut compositor = Compositor::new(W, H, 0, 0.0);
        let mut background = black_background();
        background.fill(123);
        let prim = Primitive::Bar {
            x: 10.0,
            y: 10.0,
            width: 40.0,
            height: 40.0,
            radius: 12.0,
            color: [255, 255, 255],
        };
        let out = compositor.composite(&background, &[prim], VizStyle::Bars);
        // The very corner of the bounding box lies outside the rounded arc.
        assert_eq!(pixel(&out, 10, 10), [123, 123, 123]);
    }
}
