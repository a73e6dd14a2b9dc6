use rustfft::{num_complex::Complex, FftPlanner};
use std::str::FromStr;

/// Per-bin frequency weight curve applied to the magnitude spectrum.
/// Compensates for natural spectral roll-off so the display stays balanced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FreqWeighting {
    /// No weighting.
    Flat,
    /// Linear ramp boosting the low bins.
    Bass,
    /// Triangular ramp peaking at the middle of the displayed range.
    Mid,
}

impl FreqWeighting {
    pub fn name(self) -> &'static str {
        match self {
            FreqWeighting::Flat => "flat",
            FreqWeighting::Bass => "bass",
            FreqWeighting::Mid => "mid",
        }
    }

    fn curve(self, bins: usize) -> Vec<f32> {
        let span = (bins.max(2) - 1) as f32;
        (0..bins)
            .map(|i| {
                let t = i as f32 / span;
                match self {
                    FreqWeighting::Flat => 1.0,
                    FreqWeighting::Bass => 2.5 - 1.5 * t,
                    FreqWeighting::Mid => 1.0 + 1.5 * (1.0 - (2.0 * t - 1.0).abs()),
                }
            })
            .collect()
    }
}

impl FromStr for FreqWeighting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flat" => Ok(FreqWeighting::Flat),
            "bass" => Ok(FreqWeighting::Bass),
            "mid" => Ok(FreqWeighting::Mid),
            other => Err(format!(
                "unknown weighting '{}' (expected one of: flat, bass, mid)",
                other
            )),
        }
    }
}

/// Converts one frame's audio window into a weighted magnitude spectrum of
/// `bins` values, ascending in frequency. The FFT plan cache persists across
/// frames; windows in a job share a length so the plan is built once.
pub struct SpectrumAnalyzer {
    bins: usize,
    weights: Vec<f32>,
    planner: FftPlanner<f32>,
}

impl SpectrumAnalyzer {
    pub fn new(bins: usize, weighting: FreqWeighting) -> Self {
        Self {
            bins,
            weights: weighting.curve(bins),
            planner: FftPlanner::new(),
        }
    }

    /// Analyze one window of samples. An empty window is silence and yields
    /// an all-zero spectrum; short windows zero-fill the missing tail bins.
    pub fn analyze(&mut self, window: &[f32]) -> Vec<f32> {
        let mut spectrum = vec![0.0f32; self.bins];
        if window.is_empty() {
            return spectrum;
        }

        let hann = hann_window(window.len());
        let mut buffer: Vec<Complex<f32>> = window
            .iter()
            .zip(hann.iter())
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();

        let fft = self.planner.plan_fft_forward(buffer.len());
        fft.process(&mut buffer);

        let available = self.bins.min(buffer.len() / 2);
        for (i, out) in spectrum.iter_mut().take(available).enumerate() {
            *out = buffer[i].norm() * self.weights[i];
        }

        spectrum
    }
}

fn hann_window(size: usize) -> Vec<f32> {
    if size == 1 {
        return vec![1.0];
    }
    (0..size)
        .map(|i| {
            0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn empty_window_is_silence() {
        let mut analyzer = SpectrumAnalyzer::new(16, FreqWeighting::Flat);
        let spectrum = analyzer.analyze(&[]);
        assert_eq!(spectrum.len(), 16);
        assert!(spectrum.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn always_returns_bin_count_values() {
        let mut analyzer = SpectrumAnalyzer::new(32, FreqWeighting::Bass);
        for len in [1, 7, 64, 1470] {
            let window = vec![0.25f32; len];
            assert_eq!(analyzer.analyze(&window).len(), 32);
        }
    }

    #[test]
    fn magnitudes_are_non_negative() {
        let mut analyzer = SpectrumAnalyzer::new(24, FreqWeighting::Mid);
        let window = sine(440.0, 8000, 800);
        assert!(analyzer.analyze(&window).iter().all(|&m| m >= 0.0));
    }

    #[test]
    fn tone_peaks_at_expected_bin() {
        // Window of 800 samples at 8kHz: bin spacing is 10Hz, so a 120Hz
        // tone lands in bin 12 of the first 32 bins.
        let mut analyzer = SpectrumAnalyzer::new(32, FreqWeighting::Flat);
        let spectrum = analyzer.analyze(&sine(120.0, 8000, 800));
        let peak = spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 12);
    }

    #[test]
    fn bass_weighting_boosts_low_bins() {
        let curve = FreqWeighting::Bass.curve(16);
        assert!(curve[0] > curve[15]);
        assert!((curve[0] - 2.5).abs() < 1e-6);
        assert!((curve[15] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn short_window_fills_missing_bins_with_zero() {
        // 8 samples yield 4 usable bins; the remaining 12 stay at zero.
        let mut analyzer = SpectrumAnalyzer::new(16, FreqWeighting::Flat);
        let spectrum = analyzer.analyze(&vec![0.5f32; 8]);
        assert!(spectrum[4..].iter().all(|&m| m == 0.0));
    }
}
