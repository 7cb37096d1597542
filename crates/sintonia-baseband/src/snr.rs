//! SNR and pilot-tone estimator.
//!
//! Runs over the 2·Fi-rate frame while a quality callback is attached,
//! instead of normal delivery. Two independent measurements feed one
//! report:
//!
//! - **Band SNR**: 64-point FFTs with a sin² window, shifted so DC sits at
//!   bin 32. The digital sidebands land around ±7.5 bins from centre and
//!   the first adjacent channel around ±10.5, so averaging bins 24/25 and
//!   39/40 against 19..22 and 41..44 yields a sideband-power-to-noise
//!   ratio.
//! - **Pilot ratio**: the frame is also run through the receiver's own
//!   final halfband, FM decimator and discriminator, and two Goertzel
//!   windows on the demodulated output weigh the 19 kHz stereo pilot
//!   against an empty band at 17 kHz. The short 17 kHz window is scaled
//!   ×16 to offset its 1488:93 length disadvantage.
//!
//! After [`SNR_FFT_COUNT`] windows the accumulators collapse into
//! `(snr, pilot_db)` and reset.

use crate::{FM_PILOT_LIMIT, SAMPLE_RATE, SNR_FFT_COUNT};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

use sintonia_dsp::{FmDemod, Goertzel, HalfbandIq, IqSample};

/// FFT length for the band estimator.
const FFT_LEN: usize = 64;

/// Accumulating SNR/pilot estimator state.
pub struct SnrEstimator {
    fft: Arc<dyn Fft<f32>>,
    window: [f32; FFT_LEN],
    fft_buf: [Complex<f32>; FFT_LEN],
    power: [f32; FFT_LEN],
    count: u32,
    pilot: Goertzel,
    not_pilot: Goertzel,
    pilot_sum: f32,
    pilot_count: u32,
    not_pilot_sum: f32,
    not_pilot_count: u32,
}

impl SnrEstimator {
    /// Create an estimator with cleared accumulators.
    pub fn new() -> Self {
        let mut window = [0.0; FFT_LEN];
        for (i, w) in window.iter_mut().enumerate() {
            let s = (PI * i as f32 / 63.0).sin();
            *w = s * s;
        }
        let fm_rate = (SAMPLE_RATE / 2.0) as f32;
        Self {
            fft: FftPlanner::new().plan_fft_forward(FFT_LEN),
            window,
            fft_buf: [Complex::new(0.0, 0.0); FFT_LEN],
            power: [0.0; FFT_LEN],
            count: 0,
            pilot: Goertzel::new(19_000.0, fm_rate, 372 * 4),
            not_pilot: Goertzel::new(17_000.0, fm_rate, 372 / 4),
            pilot_sum: 0.0,
            pilot_count: 0,
            not_pilot_sum: 0.0,
            not_pilot_count: 0,
        }
    }

    /// Measure one 2·Fi-rate frame, sharing the pipeline's final halfband,
    /// FM decimator and discriminator state. Returns a `(snr, pilot_db)`
    /// report once enough windows have accumulated.
    pub fn measure(
        &mut self,
        buf: &[IqSample],
        final_stage: &mut HalfbandIq,
        fm_decim: &mut HalfbandIq,
        demod: &mut FmDemod,
    ) -> Option<(f32, f32)> {
        for window in buf.chunks_exact(FFT_LEN) {
            for (i, s) in window.iter().enumerate() {
                let (re, im) = s.to_f32();
                self.fft_buf[i] = Complex::new(re * self.window[i], im * self.window[i]);
            }
            self.fft.process(&mut self.fft_buf);
            self.fft_buf.rotate_left(FFT_LEN / 2);
            for (p, x) in self.power.iter_mut().zip(self.fft_buf.iter()) {
                *p += x.norm_sqr();
            }
            self.count += 1;
        }

        for quad in buf.chunks_exact(4) {
            let pair = [
                final_stage.execute_halfband(&[quad[0], quad[1]]),
                final_stage.execute_halfband(&[quad[2], quad[3]]),
            ];
            let z = fm_decim.execute_halfband(&pair);
            let angle = demod.demod(z);

            if let Some(mag) = self.pilot.execute(angle / PI) {
                let mag = mag.min(FM_PILOT_LIMIT);
                self.pilot_sum += mag * mag;
                self.pilot_count += 1;
            }
            if let Some(mag) = self.not_pilot.execute(angle / PI) {
                let mag = mag.min(FM_PILOT_LIMIT) * 16.0;
                self.not_pilot_sum += mag * mag;
                self.not_pilot_count += 1;
            }
        }

        if self.count < SNR_FFT_COUNT {
            return None;
        }

        // Noise bands sit just outside the signal; signal bands are the
        // digital sidebands.
        let noise_lo: f32 = self.power[19..23].iter().sum::<f32>() / 4.0;
        let noise_hi: f32 = self.power[41..45].iter().sum::<f32>() / 4.0;
        let signal_lo = (self.power[24] + self.power[25]) / 2.0;
        let signal_hi = (self.power[39] + self.power[40]) / 2.0;

        let signal = (signal_lo + signal_hi) / 2.0 / self.count as f32;
        let noise = (noise_lo + noise_hi) / 2.0 / self.count as f32;
        let snr = if noise > 0.0 { signal / noise } else { 0.0 };

        let pilot_avg = if self.pilot_count > 0 {
            self.pilot_sum / self.pilot_count as f32
        } else {
            0.0
        };
        let not_pilot_avg = if self.not_pilot_count > 0 {
            self.not_pilot_sum / self.not_pilot_count as f32
        } else {
            0.0
        };
        let pilot_db = if pilot_avg > 0.0 && not_pilot_avg > 0.0 {
            10.0 * (pilot_avg / not_pilot_avg).log10()
        } else {
            0.0
        };

        self.reset();
        Some((snr, pilot_db))
    }

    /// Clear every accumulator and both Goertzel windows.
    pub fn reset(&mut self) {
        self.power = [0.0; FFT_LEN];
        self.count = 0;
        self.pilot.reset();
        self.not_pilot.reset();
        self.pilot_sum = 0.0;
        self.pilot_count = 0;
        self.not_pilot_sum = 0.0;
        self.not_pilot_count = 0;
    }
}

impl Default for SnrEstimator {
    fn default() -> Self {
        Self::new()
    }
}
