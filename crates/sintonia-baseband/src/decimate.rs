//! IQ decimation chain and offset-tuning rotator.
//!
//! Device rates are an integer power-of-two multiple of the canonical
//! intermediate rate. The chain halves amplitude on entry (the supported
//! front-ends resolve at most 14 bits, so nothing is lost), runs the
//! device-specific halfband pre-stages down to 2·Fi, optionally rotates the
//! spectrum back by the tuning offset, and finally applies one more
//! halfband with conjugation while the pipeline copies into the
//! intermediate ring.

use crate::{FREQ_OFFSET, FREQ_OFFSET_FACTOR, SAMPLE_RATE};
use sintonia_dsp::taps::DECIM_TAPS;
use sintonia_dsp::{HalfbandIq, IqSample};
use std::f64::consts::TAU;
use thiserror::Error;

/// Maximum supported log2 of the device decimation factor.
pub const MAX_DECIM_LOG2: usize = 4;

/// Requested decimation factor is not a supported power of two.
#[derive(Debug, Clone, Copy, Error)]
#[error("unsupported decimation factor {0} (expected 2, 4, 8 or 16)")]
pub struct UnsupportedDecimation(pub u32);

/// The configurable ×2..×16 halfband cascade plus phase rotator.
///
/// Stage 0 is the final halfband to Fi and is always engaged; stages
/// `1..L-1` are engaged for device rates above the baseline.
#[derive(Debug)]
pub struct DecimationChain {
    stages: [HalfbandIq; MAX_DECIM_LOG2],
    decim_log2: usize,
    offset_tuning: bool,
    /// Unit phasor, kept in float; quantised to Q15 per sample so rounding
    /// error never feeds back into the oscillator.
    phase: (f32, f32),
    phase_increment: (f32, f32),
    phase_idx: u32,
    refresh: u32,
}

impl DecimationChain {
    /// Create a chain at the baseline ×2 decimation with offset tuning on.
    pub fn new() -> Self {
        let inc = TAU * FREQ_OFFSET / (SAMPLE_RATE * 2.0);
        let phase_increment = (inc.cos() as f32, inc.sin() as f32);
        Self {
            stages: [
                HalfbandIq::new(&DECIM_TAPS),
                HalfbandIq::new(&DECIM_TAPS),
                HalfbandIq::new(&DECIM_TAPS),
                HalfbandIq::new(&DECIM_TAPS),
            ],
            decim_log2: 1,
            offset_tuning: true,
            phase: phase_increment,
            phase_increment,
            phase_idx: 0,
            refresh: (SAMPLE_RATE * 2.0 / FREQ_OFFSET_FACTOR) as u32,
        }
    }

    /// Configure the device decimation factor (2, 4, 8 or 16).
    pub fn set_decimation(&mut self, decimation: u32) -> Result<(), UnsupportedDecimation> {
        self.decim_log2 = match decimation {
            2 => 1,
            4 => 2,
            8 => 3,
            16 => 4,
            other => return Err(UnsupportedDecimation(other)),
        };
        Ok(())
    }

    /// Enable or disable the offset-tuning rotator (disabled for raw IQ
    /// file playback, which was captured without the tuning offset).
    pub fn set_offset_tuning(&mut self, enabled: bool) {
        self.offset_tuning = enabled;
    }

    /// Steps 1-3 of the chain: halve amplitude, run the pre-stages in
    /// place, rotate. On return the frame is at the 2·Fi rate.
    pub fn pre_process(&mut self, buf: &mut Vec<IqSample>) {
        for s in buf.iter_mut() {
            *s = s.halve();
        }

        let mut len = buf.len() & !1;
        for j in 1..self.decim_log2 {
            let stage = &mut self.stages[j];
            let mut out = 0;
            for i in (0..len & !1).step_by(2) {
                buf[out] = stage.execute_halfband(&[buf[i], buf[i + 1]]);
                out += 1;
            }
            len = out;
        }
        buf.truncate(len);

        if self.offset_tuning {
            for s in buf.iter_mut() {
                let (pr, pi) = self.phase;
                let (ir, ii) = self.phase_increment;
                self.phase = (pr * ir - pi * ii, pr * ii + pi * ir);
                *s = s.mul(IqSample::from_f32(self.phase.0, self.phase.1));

                // Refresh the phasor once per period so rounding error
                // cannot accumulate.
                self.phase_idx += 1;
                if self.phase_idx == self.refresh {
                    self.phase_idx = 0;
                    self.phase = self.phase_increment;
                }
            }
        }
    }

    /// Step 4: final halfband to Fi with conjugation, appended to `out`.
    pub fn finish(&mut self, buf: &[IqSample], out: &mut Vec<IqSample>) {
        let stage = &mut self.stages[0];
        for pair in buf.chunks_exact(2) {
            let y = stage.execute_halfband(&[pair[0], pair[1]]);
            out.push(y.conj());
        }
    }

    /// Mutable access to the final halfband stage (shared with the SNR
    /// measurement path).
    pub fn final_stage_mut(&mut self) -> &mut HalfbandIq {
        &mut self.stages[0]
    }

    /// Clear every stage and re-arm the rotator.
    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
        self.phase = self.phase_increment;
        self.phase_idx = 0;
    }
}

impl Default for DecimationChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_power_of_two() {
        let mut chain = DecimationChain::new();
        assert!(chain.set_decimation(3).is_err());
        assert!(chain.set_decimation(32).is_err());
        for d in [2, 4, 8, 16] {
            assert!(chain.set_decimation(d).is_ok());
        }
    }

    #[test]
    fn zero_input_stays_zero_with_offset_tuning() {
        let mut chain = DecimationChain::new();
        chain.set_decimation(8).unwrap();
        let mut out = Vec::new();
        for _ in 0..50 {
            let mut frame = vec![IqSample::default(); 1024];
            chain.pre_process(&mut frame);
            assert_eq!(frame.len(), 256);
            assert!(frame.iter().all(|s| *s == IqSample::default()));
            chain.finish(&frame, &mut out);
        }
        assert_eq!(out.len(), 50 * 128);
        assert!(out.iter().all(|s| *s == IqSample::default()));
    }

    #[test]
    fn decimation_halves_length_per_engaged_stage() {
        let mut chain = DecimationChain::new();
        chain.set_offset_tuning(false);
        chain.set_decimation(16).unwrap();
        let mut frame = vec![IqSample::new(4000, 0); 4096];
        chain.pre_process(&mut frame);
        // Three pre-stages for ×16: 4096 -> 512.
        assert_eq!(frame.len(), 512);
    }

    #[test]
    fn amplitude_is_halved_on_entry() {
        let mut chain = DecimationChain::new();
        chain.set_offset_tuning(false);
        let mut frame = vec![IqSample::new(10000, -10000); 64];
        chain.pre_process(&mut frame);
        assert!(frame.iter().all(|s| s.re == 5000 && s.im == -5000));
    }

    #[test]
    fn rotator_preserves_magnitude() {
        let mut chain = DecimationChain::new();
        let mut frame = vec![IqSample::new(16000, 0); 2048];
        chain.pre_process(&mut frame);
        for s in &frame {
            let mag = f64::from(s.re) * f64::from(s.re) + f64::from(s.im) * f64::from(s.im);
            let mag = mag.sqrt();
            assert!((mag - 8000.0).abs() < 80.0, "magnitude {mag}");
        }
    }

    #[test]
    fn conjugation_flips_q() {
        let mut chain = DecimationChain::new();
        chain.set_offset_tuning(false);
        let mut frame = vec![IqSample::new(0, 8000); 64];
        chain.pre_process(&mut frame);
        let mut out = Vec::new();
        chain.finish(&frame, &mut out);
        // Settled output of a constant has the sign of Q flipped.
        let last = out.last().unwrap();
        assert!(last.im < -3500, "q = {}", last.im);
    }
}
