//! Goertzel single-bin tone power estimator.
//!
//! Computes the power of one DFT bin over consecutive blocks of N samples
//! with a two-multiply recurrence, far cheaper than an FFT when only one
//! frequency matters. The receiver uses two of these to weigh the 19 kHz
//! stereo pilot against an adjacent empty band.
//!
//! Reference: G. Goertzel, "An Algorithm for the Evaluation of Finite
//! Trigonometric Series", The American Mathematical Monthly, 1958.

use core::f32::consts::PI;

/// Streaming Goertzel state for one tone.
///
/// The bin index is `k = round(N · freq / sample_rate)`; the block power is
/// emitted every `N` samples and the state self-resets, so `0 <= n < N`
/// holds between calls.
#[derive(Debug, Clone)]
pub struct Goertzel {
    q1: f32,
    q2: f32,
    coeff: f32,
    n: u32,
    len: u32,
}

impl Goertzel {
    /// Create an estimator for `freq` Hz at `sample_rate` Hz over blocks of
    /// `len` samples.
    pub fn new(freq: f32, sample_rate: f32, len: u32) -> Self {
        let k = (0.5 + len as f32 * freq / sample_rate) as u32;
        Self {
            q1: 0.0,
            q2: 0.0,
            coeff: 2.0 * libm::cosf(2.0 * PI * k as f32 / len as f32),
            n: 0,
            len,
        }
    }

    /// Feed one sample; returns the block power when the block completes.
    ///
    /// The emitted value is `q1² + q2² - coeff·q1·q2`, the squared DFT
    /// magnitude of the configured bin. For a full-scale tone sitting
    /// exactly on the bin this is `(A·N/2)²`.
    #[inline]
    pub fn execute(&mut self, sample: f32) -> Option<f32> {
        let q0 = self.coeff * self.q1 - self.q2 + sample;
        self.q2 = self.q1;
        self.q1 = q0;
        self.n += 1;

        if self.n == self.len {
            let power = self.q1 * self.q1 + self.q2 * self.q2 - self.q1 * self.q2 * self.coeff;
            self.q1 = 0.0;
            self.q2 = 0.0;
            self.n = 0;
            Some(power)
        } else {
            None
        }
    }

    /// Clear the recurrence and the block counter.
    pub fn reset(&mut self) {
        self.q1 = 0.0;
        self.q2 = 0.0;
        self.n = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::TAU;

    #[test]
    fn on_bin_tone_matches_analytic_power() {
        // Tone exactly on bin k = 8 of a 64-sample block.
        let n = 64u32;
        let fs = 64000.0;
        let freq = 8000.0;
        let mut g = Goertzel::new(freq, fs, n);
        let mut emitted = None;
        for i in 0..n {
            emitted = g.execute(libm::sinf(TAU * freq * i as f32 / fs)).or(emitted);
        }
        let power = emitted.expect("one block should complete");
        let analytic = (n as f32 / 2.0) * (n as f32 / 2.0);
        let rel = (power - analytic).abs() / analytic;
        assert!(rel <= 1e-3, "power {power}, analytic {analytic}, rel {rel}");
    }

    #[test]
    fn emits_exactly_every_n_samples() {
        let mut g = Goertzel::new(1000.0, 48000.0, 93);
        let mut count = 0;
        for i in 0..(93 * 5) {
            if g.execute(libm::sinf(i as f32 * 0.1)).is_some() {
                count += 1;
            }
        }
        assert_eq!(count, 5);
    }

    #[test]
    fn off_bin_tone_reads_low() {
        // A tone half the spectrum away should carry almost no power in
        // the configured bin.
        let n = 256u32;
        let fs = 256000.0;
        let mut g = Goertzel::new(8000.0, fs, n);
        let mut power = 0.0;
        for i in 0..n {
            if let Some(p) = g.execute(libm::sinf(TAU * 100_000.0 * i as f32 / fs)) {
                power = p;
            }
        }
        let on_bin = (n as f32 / 2.0) * (n as f32 / 2.0);
        assert!(power < on_bin / 100.0, "leakage power {power}");
    }

    #[test]
    fn reset_restarts_the_block() {
        let mut g = Goertzel::new(1000.0, 48000.0, 10);
        for _ in 0..5 {
            g.execute(1.0);
        }
        g.reset();
        let mut emissions = 0;
        for _ in 0..10 {
            if g.execute(1.0).is_some() {
                emissions += 1;
            }
        }
        assert_eq!(emissions, 1);
    }
}
