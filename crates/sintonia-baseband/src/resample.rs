//! Polyphase fractional resampler.
//!
//! Converts the audio chain's rate to 44100 Hz by a fixed rational ratio.
//! Resampling by `den/num` is upsampling by `den`, low-pass filtering at the
//! narrower of the two Nyquist limits, and downsampling by `num`; the
//! polyphase decomposition computes only the outputs actually kept, so each
//! input sample costs one short FIR branch and produces 0 or 1 output.
//!
//! The prototype low-pass is a windowed sinc (Blackman window), split into
//! `den` branches of `4 << quality` taps; each branch is normalised to unity
//! DC gain so the output level does not ripple with the output phase.
//!
//! Reference: R. E. Crochiere and L. R. Rabiner, *Multirate Digital Signal
//! Processing*, Prentice Hall, 1983, Chapter 4.

use std::f32::consts::PI;

/// Maximum supported quality setting.
const MAX_QUALITY: u32 = 4;

/// Streaming fractional resampler with an integer phase accumulator.
///
/// The in/out ratio is `num/den`: every input sample advances the output
/// clock by `den/num` of an output period. With `num > den` (decimating,
/// as the audio chain uses it) each input yields at most one output.
#[derive(Debug, Clone)]
pub struct FracResampler {
    num: u64,
    den: u64,
    taps_per_phase: usize,
    /// Branch taps, phase-major: `bank[p * taps_per_phase + k]`.
    bank: Vec<f32>,
    /// Newest-first input history, `taps_per_phase` deep.
    hist: Vec<f32>,
    /// Count of samples consumed so far.
    in_pos: u64,
    /// Input index of the next output point (integer part).
    next_base: u64,
    /// Fractional part of the next output point, in units of 1/den.
    phase: u64,
}

impl FracResampler {
    /// Create a resampler for the in/out ratio `num/den`.
    ///
    /// `in_rate` and `out_rate` are the nominal rates the ratio stands in
    /// for; they are validated for consistency but the rational ratio alone
    /// governs the output clock. `quality` in 0..=4 selects the branch
    /// length (`4 << quality` taps).
    ///
    /// # Panics
    ///
    /// Panics on a zero ratio term, zero rate, or out-of-range quality.
    pub fn new(num: u32, den: u32, quality: u32, in_rate: u32, out_rate: u32) -> Self {
        assert!(num > 0 && den > 0, "resampling ratio must be non-zero");
        assert!(in_rate > 0 && out_rate > 0, "rates must be non-zero");
        assert!(quality <= MAX_QUALITY, "quality must be 0..=4");

        let taps_per_phase = 4usize << quality;
        let phases = den as usize;
        let prototype = design_lowpass(
            taps_per_phase * phases,
            // Cut at the narrower Nyquist, with a small guard band.
            0.9 / num.max(den) as f32,
        );

        // Polyphase split with per-branch DC normalisation.
        let mut bank = vec![0.0f32; taps_per_phase * phases];
        for p in 0..phases {
            let branch = &mut bank[p * taps_per_phase..(p + 1) * taps_per_phase];
            for (k, slot) in branch.iter_mut().enumerate() {
                *slot = prototype[k * phases + p];
            }
            let sum: f32 = branch.iter().sum();
            if sum.abs() > 1e-10 {
                for tap in branch.iter_mut() {
                    *tap /= sum;
                }
            }
        }

        Self {
            num: u64::from(num),
            den: u64::from(den),
            taps_per_phase,
            bank,
            hist: vec![0.0; taps_per_phase],
            in_pos: 0,
            next_base: 0,
            phase: 0,
        }
    }

    /// Feed one input sample; returns the output sample when the output
    /// clock falls within this input period.
    pub fn process(&mut self, input: i16) -> Option<i16> {
        self.hist.rotate_right(1);
        self.hist[0] = f32::from(input);
        self.in_pos += 1;

        if self.next_base >= self.in_pos {
            return None;
        }

        let branch = &self.bank
            [self.phase as usize * self.taps_per_phase..][..self.taps_per_phase];
        let mut y = 0.0f32;
        for (tap, x) in branch.iter().zip(self.hist.iter()) {
            y += tap * x;
        }

        // Advance the output clock by num/den input samples.
        self.phase += self.num;
        self.next_base += self.phase / self.den;
        self.phase %= self.den;

        Some(y.clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16)
    }

    /// Clear the history and re-phase the output clock.
    pub fn reset(&mut self) {
        self.hist.fill(0.0);
        self.in_pos = 0;
        self.next_base = 0;
        self.phase = 0;
    }
}

/// Windowed-sinc low-pass prototype, Blackman window, unity DC gain.
///
/// `cutoff` is normalised so 1.0 is the Nyquist of the (upsampled) design
/// rate.
fn design_lowpass(num_taps: usize, cutoff: f32) -> Vec<f32> {
    let m = num_taps - 1;
    let mut coeffs = Vec::with_capacity(num_taps);

    for n in 0..num_taps {
        let x = n as f32 - m as f32 / 2.0;

        let sinc = if x.abs() < 1e-7 {
            cutoff
        } else {
            (PI * cutoff * x).sin() / (PI * x)
        };

        let window = {
            let phase = 2.0 * PI * n as f32 / m as f32;
            0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos()
        };

        coeffs.push(sinc * window);
    }

    let sum: f32 = coeffs.iter().sum();
    if sum.abs() > 1e-10 {
        for c in coeffs.iter_mut() {
            *c /= sum;
        }
    }

    coeffs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_ratio_hits_the_output_rate() {
        // One second at the audio chain's configuration.
        let mut rs = FracResampler::new(135, 128, 1, 46512, 44100);
        let mut produced = 0u32;
        for _ in 0..46512 {
            if rs.process(1000).is_some() {
                produced += 1;
            }
        }
        assert!(
            (i64::from(produced) - 44100).abs() <= 2,
            "produced {produced} samples"
        );
    }

    #[test]
    fn at_most_one_output_per_input_when_decimating() {
        let mut rs = FracResampler::new(135, 128, 1, 46512, 44100);
        for i in 0..10_000 {
            // Option is 0 or 1 outputs by construction; exercise anyway.
            let _ = rs.process((i % 311) as i16);
        }
    }

    #[test]
    fn dc_level_is_preserved() {
        let mut rs = FracResampler::new(135, 128, 1, 46512, 44100);
        let mut last = 0i16;
        for _ in 0..4000 {
            if let Some(y) = rs.process(20000) {
                last = y;
            }
        }
        assert!(
            (i32::from(last) - 20000).abs() <= 200,
            "settled DC output {last}"
        );
    }

    #[test]
    fn unity_ratio_reproduces_input_rate() {
        let mut rs = FracResampler::new(1, 1, 1, 48000, 48000);
        let mut produced = 0;
        for _ in 0..1000 {
            if rs.process(5000).is_some() {
                produced += 1;
            }
        }
        assert_eq!(produced, 1000);
    }

    #[test]
    fn reset_restores_the_output_phase() {
        let mut rs = FracResampler::new(135, 128, 1, 46512, 44100);
        let first: Vec<Option<i16>> = (0..200).map(|_| rs.process(1234)).collect();
        rs.reset();
        let second: Vec<Option<i16>> = (0..200).map(|_| rs.process(1234)).collect();
        assert_eq!(first, second);
    }

    #[test]
    #[should_panic]
    fn zero_ratio_is_rejected() {
        let _ = FracResampler::new(0, 128, 1, 46512, 44100);
    }
}
