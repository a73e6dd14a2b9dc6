use anyhow::{Context, Result};
use image::imageops::FilterType;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "webm", "avi"];

/// Background frames at the output resolution, RGB24. A still image is a
/// one-element set; a video clip loops implicitly through modulo indexing.
#[derive(Debug)]
pub struct BackgroundFrameSet {
    frames: Vec<Vec<u8>>,
}

impl BackgroundFrameSet {
    /// Load a background source, scaling to `width`x`height` with the
    /// aspect ratio preserved and black padding. Any failure here is fatal:
    /// the caller must not start the frame loop without a background.
    pub fn load(path: &Path, width: u32, height: u32) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Background source not found: {}", path.display());
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let frames = if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            vec![load_still(path, width, height)?]
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            load_clip(path, width, height)?
        } else {
            anyhow::bail!(
                "Unsupported background format '.{}' for {}",
                ext,
                path.display()
            );
        };

        if frames.is_empty() {
            anyhow::bail!("Background source has no frames: {}", path.display());
        }

        log::info!(
            "Loaded background: {} frame(s) at {}x{}",
            frames.len(),
            width,
            height
        );

        Ok(Self { frames })
    }

    #[cfg(test)]
    pub fn from_frames(frames: Vec<Vec<u8>>) -> Self {
        assert!(!frames.is_empty());
        Self { frames }
    }

    /// Background for the given output frame index, looping over the set.
    pub fn frame(&self, index: usize) -> &[u8] {
        &self.frames[index % self.frames.len()]
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

fn load_still(path: &Path, width: u32, height: u32) -> Result<Vec<u8>> {
    let img = image::open(path)
        .with_context(|| format!("Failed to open background image: {}", path.display()))?
        .to_rgb8();

    let (src_w, src_h) = img.dimensions();
    let scale = (width as f32 / src_w as f32).min(height as f32 / src_h as f32);
    let fit_w = ((src_w as f32 * scale) as u32).max(1).min(width);
    let fit_h = ((src_h as f32 * scale) as u32).max(1).min(height);

    let resized = image::imageops::resize(&img, fit_w, fit_h, FilterType::Triangle);

    // Center onto a black canvas, the pad behavior of the encode filter
    // this replaces.
    let mut canvas = vec![0u8; (width * height * 3) as usize];
    let off_x = (width - fit_w) / 2;
    let off_y = (height - fit_h) / 2;
    for y in 0..fit_h {
        for x in 0..fit_w {
            let src = resized.get_pixel(x, y).0;
            let di = (((y + off_y) * width + x + off_x) * 3) as usize;
            canvas[di..di + 3].copy_from_slice(&src);
        }
    }

    Ok(canvas)
}

/// Decode every frame of a background clip through an ffmpeg rawvideo pipe,
/// scaled and padded to the output resolution. The whole clip materializes
/// in memory; background loops are expected to be short.
fn load_clip(path: &Path, width: u32, height: u32) -> Result<Vec<Vec<u8>>> {
    let filter = format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2",
        w = width,
        h = height
    );

    let mut child = Command::new("ffmpeg")
        .args([
            "-i",
            path.to_str().context("Background path is not valid UTF-8")?,
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-vf",
            &filter,
            "pipe:1",
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("Failed to spawn ffmpeg. Is ffmpeg installed?")?;

    let mut stdout = child.stdout.take().context("ffmpeg stdout not available")?;
    let frame_len = (width * height * 3) as usize;
    let mut frames = Vec::new();

    loop {
        let mut frame = vec![0u8; frame_len];
        match read_frame(&mut stdout, &mut frame) {
            Ok(true) => frames.push(frame),
            Ok(false) => break,
            Err(e) => return Err(e).context("Failed reading background frames from ffmpeg"),
        }
    }

    let output = child
        .wait_with_output()
        .context("Failed to wait for ffmpeg")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("ffmpeg failed to decode background:\n{}", stderr);
    }

    Ok(frames)
}

/// Fill `buf` with exactly one frame. Returns false on a clean EOF at a
/// frame boundary; a partial trailing frame is discarded.
fn read_frame(reader: &mut impl Read, buf: &mut [u8]) -> Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            return Ok(false);
        }
        filled += n;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_index_wraps_modulo_length() {
        let frames = vec![vec![0u8; 12], vec![1u8; 12], vec![2u8; 12]];
        let set = BackgroundFrameSet::from_frames(frames);
        for i in 0..20 {
            assert_eq!(set.frame(i)[0] as usize, i % 3);
        }
    }

    #[test]
    fn single_frame_set_always_returns_it() {
        let set = BackgroundFrameSet::from_frames(vec![vec![9u8; 12]]);
        assert_eq!(set.len(), 1);
        for i in [0, 1, 7, 1000] {
            assert_eq!(set.frame(i)[0], 9);
        }
    }

    #[test]
    fn missing_source_fails_before_the_frame_loop() {
        let err = BackgroundFrameSet::load(Path::new("/no/such/bg.png"), 64, 64);
        assert!(err.is_err());
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        // Existing file with a format nothing decodes as a background.
        let path = std::env::temp_dir().join("mixviz_bg_test.txt");
        std::fs::write(&path, b"not an image").unwrap();
        let err = BackgroundFrameSet::load(&path, 64, 64);
        std::fs::remove_file(&path).ok();
        assert!(err.unwrap_err().to_string().contains("Unsupported"));
    }

    #[test]
    fn partial_trailing_frame_is_discarded() {
        let mut data: Vec<u8> = Vec::new();
        data.extend(std::iter::repeat(7u8).take(12));
        data.extend(std::iter::repeat(8u8).take(5)); // short tail
        let mut cursor = std::io::Cursor::new(data);

        let mut frame = vec![0u8; 12];
        assert!(read_frame(&mut cursor, &mut frame).unwrap());
        assert_eq!(frame, vec![7u8; 12]);
        assert!(!read_frame(&mut cursor, &mut frame).unwrap());
    }
}
