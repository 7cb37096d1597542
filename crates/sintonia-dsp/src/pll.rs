//! Second-order PLL frequency discriminator.
//!
//! Tracks the instantaneous phase of the complex baseband with a
//! proportional-plus-integral loop; the loop's frequency state *is* the FM
//! demodulated output. Compared with a delay-line discriminator the PLL
//! rides through amplitude dips and rejects wideband noise by its loop
//! bandwidth.
//!
//! Loop constants follow the standard second-order design
//! (F. M. Gardner, *Phaselock Techniques*):
//!
//! ```text
//! damping = √2/2        loop_bw = 2π/20
//! alpha = 4·damping·loop_bw / (1 + 2·damping·loop_bw + loop_bw²)
//! beta  = 4·loop_bw²        / (1 + 2·damping·loop_bw + loop_bw²)
//! ```

use crate::iq::IqSample;
use core::f32::consts::{FRAC_PI_2, PI, TAU};

const DAMPING: f32 = core::f32::consts::FRAC_1_SQRT_2;
const LOOP_BW: f32 = TAU / 20.0;

/// Maximum trackable deviation, Hz.
const MAX_DEVIATION_HZ: f32 = 90_000.0;

/// Streaming PLL discriminator state.
///
/// # Invariants
///
/// - `phase` stays in `[-2π, 2π]` (normalised every step)
/// - `freq` stays in `[-fmax, fmax]` with `fmax = 2π·90000/sample_rate`
#[derive(Debug, Clone)]
pub struct FmDemod {
    phase: f32,
    freq: f32,
    alpha: f32,
    beta: f32,
    max_freq: f32,
}

impl FmDemod {
    /// Create a discriminator for the given input sample rate in Hz.
    pub fn new(sample_rate: f32) -> Self {
        let denom = 1.0 + 2.0 * DAMPING * LOOP_BW + LOOP_BW * LOOP_BW;
        Self {
            phase: 0.0,
            freq: 0.0,
            alpha: 4.0 * DAMPING * LOOP_BW / denom,
            beta: 4.0 * LOOP_BW * LOOP_BW / denom,
            max_freq: TAU * MAX_DEVIATION_HZ / sample_rate,
        }
    }

    /// Demodulate one sample.
    ///
    /// Returns the loop frequency *before* the update, normalised to
    /// fractions of π/2 radians per sample.
    #[inline]
    pub fn demod(&mut self, x: IqSample) -> f32 {
        let y = self.freq / FRAC_PI_2;

        let (re, im) = x.to_f32();
        let mut error = libm::atan2f(im, re) - self.phase;
        // atan2 lands in [-π, π] and phase in [-2π, 2π]; one step each way
        // is enough to bring the difference back into [-π, π].
        if error > PI {
            error -= TAU;
        }
        if error < -PI {
            error += TAU;
        }

        self.freq += self.beta * error;
        self.freq = self.freq.clamp(-self.max_freq, self.max_freq);

        self.phase += self.freq + self.alpha * error;
        while self.phase > TAU {
            self.phase -= TAU;
        }
        while self.phase < -TAU {
            self.phase += TAU;
        }

        y
    }

    /// Zero the loop state.
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.freq = 0.0;
    }

    /// The frequency clamp, in radians per sample.
    pub fn max_freq(&self) -> f32 {
        self.max_freq
    }
}
