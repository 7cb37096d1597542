//! Audio post-chain: demodulated baseband to 44.1 kHz stereo PCM.
//!
//! Input arrives as pairs of discriminator outputs at Fi/2. Per pair:
//!
//! 1. halfband to Fi/4 (the mono baseband rate the IIR designs assume)
//! 2. pilot band-stop, then mono low-pass
//! 3. collect four samples; when full, two more halfband stages take the
//!    group down to Fi/16
//! 4. +20 dB make-up gain, de-emphasis
//! 5. clamp to i16 and feed the fractional resampler (0 or 1 outputs)
//! 6. duplicate each output into both channels of the 4096-entry block
//!
//! Full blocks are handed to the caller's emit function and the block
//! resets; mono duplication keeps the event format identical to the
//! digital decoder's stereo output.

use crate::resample::FracResampler;
use sintonia_dsp::taps::{DECIM_TAPS, FM_BSF_TAPS, FM_DEEMPH_TAPS, FM_LPF_TAPS};
use sintonia_dsp::{HalfbandFir, Iir};

/// Emitted block length in i16 samples (2048 stereo pairs).
const AUDIO_FRAME_LEN: usize = 4096;

/// Streaming audio post-chain state.
pub struct FmAudio {
    bb_decim: HalfbandFir,
    mono_decim: [HalfbandFir; 2],
    mono_predecim: [f32; 4],
    mono_predecim_idx: usize,
    mono_lpf: Iir,
    pilot_bsf: Iir,
    deemph: Iir,
    resampler: FracResampler,
    samples: Vec<i16>,
}

impl FmAudio {
    /// Create the chain in its quiescent state.
    pub fn new() -> Self {
        Self {
            bb_decim: HalfbandFir::new(&DECIM_TAPS),
            mono_decim: [HalfbandFir::new(&DECIM_TAPS), HalfbandFir::new(&DECIM_TAPS)],
            mono_predecim: [0.0; 4],
            mono_predecim_idx: 0,
            mono_lpf: Iir::new(&FM_LPF_TAPS),
            pilot_bsf: Iir::new(&FM_BSF_TAPS),
            deemph: Iir::new(&FM_DEEMPH_TAPS),
            resampler: FracResampler::new(135, 128, 1, 46512, 44100),
            samples: Vec::with_capacity(AUDIO_FRAME_LEN),
        }
    }

    /// Push one pair of discriminator outputs; hands every completed
    /// 4096-sample stereo block to `emit`.
    pub fn push(&mut self, x: &[f32; 2], emit: &mut dyn FnMut(&[i16])) {
        let mut y = self.bb_decim.execute_halfband(x);
        y = self.pilot_bsf.execute(y);
        y = self.mono_lpf.execute(y);

        self.mono_predecim[self.mono_predecim_idx] = y;
        self.mono_predecim_idx += 1;
        if self.mono_predecim_idx == 4 {
            self.mono_predecim_idx = 0;

            let pair = [
                self.mono_decim[0]
                    .execute_halfband(&[self.mono_predecim[0], self.mono_predecim[1]]),
                self.mono_decim[0]
                    .execute_halfband(&[self.mono_predecim[2], self.mono_predecim[3]]),
            ];
            let mut y = self.mono_decim[1].execute_halfband(&pair);
            y *= 10.0; // Amplify by 20 dB.
            y = self.deemph.execute(y);

            if y.is_finite() {
                let sample_in = (y * 32768.0) as i16;
                if let Some(sample_out) = self.resampler.process(sample_in) {
                    self.samples.push(sample_out);
                    self.samples.push(sample_out);
                }
            } else {
                tracing::warn!("non-finite audio sample, skipping");
            }
        }

        if self.samples.len() == AUDIO_FRAME_LEN {
            emit(&self.samples);
            self.samples.clear();
        }
    }

    /// Clear all filter, resampler and block state.
    pub fn reset(&mut self) {
        self.bb_decim.reset();
        for d in &mut self.mono_decim {
            d.reset();
        }
        self.mono_predecim = [0.0; 4];
        self.mono_predecim_idx = 0;
        self.mono_lpf.reset();
        self.pilot_bsf.reset();
        self.deemph.reset();
        self.resampler.reset();
        self.samples.clear();
    }
}

impl Default for FmAudio {
    fn default() -> Self {
        Self::new()
    }
}
