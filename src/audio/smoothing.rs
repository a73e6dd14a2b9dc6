/// Spring stiffness per frame step.
const SPRING: f32 = 0.3;
/// Velocity damping per frame step.
const DAMPING: f32 = 0.7;
/// Per-frame decay of the running maximum used for normalization.
const MAX_DECAY: f32 = 0.95;
/// Exponent < 1 applied to normalized magnitudes; lifts quiet content.
const RESPONSE_GAMMA: f32 = 0.6;

/// Per-job smoothing state: the previous smoothed spectrum, the per-bin
/// spring velocity, and a decaying running maximum that adapts the
/// normalization to the track's loudness.
///
/// One instance belongs to exactly one render job. Create a fresh state per
/// job; sharing one across jobs leaks the previous track's history into the
/// first frames of the next.
#[derive(Debug, Default)]
pub struct SmootherState {
    current: Vec<f32>,
    velocity: Vec<f32>,
    running_max: f32,
}

impl SmootherState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the spring model by one frame and return the smoothed
    /// spectrum, each value in [0.0, 1.0]. Bin vectors are sized lazily on
    /// the first call.
    pub fn advance(&mut self, raw: &[f32]) -> Vec<f32> {
        if self.current.len() != raw.len() {
            self.current = vec![0.0; raw.len()];
            self.velocity = vec![0.0; raw.len()];
        }

        let observed = raw.iter().copied().fold(0.0f32, f32::max);
        self.running_max = (self.running_max * MAX_DECAY).max(observed);

        for (i, &magnitude) in raw.iter().enumerate() {
            // Zero running max means the job has been silent so far; leave
            // the target at zero instead of dividing.
            let target = if self.running_max > f32::EPSILON {
                (magnitude / self.running_max).clamp(0.0, 1.0).powf(RESPONSE_GAMMA)
            } else {
                0.0
            };

            let accel = (target - self.current[i]) * SPRING - self.velocity[i] * DAMPING;
            self.velocity[i] += accel;
            self.current[i] = (self.current[i] + self.velocity[i]).clamp(0.0, 1.0);
        }

        self.current.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_stays_at_zero() {
        let mut state = SmootherState::new();
        for _ in 0..30 {
            let out = state.advance(&[0.0; 8]);
            assert!(out.iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn output_bounded_for_any_input() {
        let mut state = SmootherState::new();
        let wild = [
            vec![1000.0f32, 0.0, 3.5, 9e8],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![1e-12, 5.0, 0.1, 2.0],
            vec![7.0, 7.0, 7.0, 7.0],
        ];
        for raw in wild.iter().cycle().take(200) {
            let out = state.advance(raw);
            assert!(out.iter().all(|&v| (0.0..=1.0).contains(&v)), "out of range: {:?}", out);
        }
    }

    #[test]
    fn converges_on_repeated_identical_spectrum() {
        let mut state = SmootherState::new();
        let raw = vec![0.8f32, 0.2, 0.5];

        let mut prev_error = f32::MAX;
        for step in 0..120 {
            let out = state.advance(&raw);
            let target = (0.8f32 / state.running_max).powf(RESPONSE_GAMMA);
            let error = (out[0] - target).abs();
            if step > 40 {
                assert!(error <= prev_error + 1e-3, "diverged at step {}", step);
            }
            prev_error = error;
        }
        assert!(prev_error < 0.05);
    }

    #[test]
    fn velocity_decays_toward_zero_on_stationary_input() {
        let mut state = SmootherState::new();
        let raw = vec![0.4f32; 6];
        for _ in 0..150 {
            state.advance(&raw);
        }
        assert!(state.velocity.iter().all(|&v| v.abs() < 1e-3));
    }

    #[test]
    fn running_max_decays_after_transient() {
        let mut state = SmootherState::new();
        state.advance(&[10.0, 0.0]);
        let peak = state.running_max;
        for _ in 0..20 {
            state.advance(&[0.1, 0.0]);
        }
        assert!(state.running_max < peak);
        assert!(state.running_max >= 0.1);
    }

    #[test]
    fn fresh_state_has_no_history() {
        let mut warm = SmootherState::new();
        for _ in 0..60 {
            warm.advance(&[1.0, 1.0]);
        }

        let mut fresh = SmootherState::new();
        let first = fresh.advance(&[1.0, 1.0]);
        let warmed = warm.advance(&[1.0, 1.0]);
        assert!(first[0] < warmed[0]);
    }

    #[test]
    fn resizes_lazily_to_bin_count() {
        let mut state = SmootherState::new();
        assert_eq!(state.advance(&[0.5; 12]).len(), 12);
    }
}
