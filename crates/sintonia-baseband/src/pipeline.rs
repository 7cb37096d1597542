//! Pipeline orchestration: one IQ frame in, audio / baseband / reports out.
//!
//! [`Pipeline`] owns every piece of per-station DSP state and reproduces
//! the receive data path sample for sample:
//!
//! - pre-decimation and offset rotation ([`DecimationChain`])
//! - the SNR measurement detour while a callback is attached
//! - final halfband + conjugation into the intermediate ring
//! - the FM branch: every ring quadruple through the FM decimator and
//!   discriminator into the audio post-chain
//! - FFTCP-sized drains to the digital-sideband consumer
//!
//! The caller provides a [`PipelineSink`] for everything that leaves the
//! pipeline; all methods are invoked on the worker thread, in production
//! order.

use crate::audio::FmAudio;
use crate::decimate::{DecimationChain, UnsupportedDecimation};
use crate::ring::IqRing;
use crate::snr::SnrEstimator;
use crate::{FFTCP, INPUT_BUF_LEN, SAMPLE_RATE};
use sintonia_dsp::taps::DECIM_TAPS;
use sintonia_dsp::{FmDemod, HalfbandIq, IqSample};

/// Signal-quality subscription: receives `(snr, pilot_db)` reports; a
/// `false` return detaches the callback (one-shot subscriptions return
/// `false` after their first report).
pub type SnrCallback = Box<dyn FnMut(f32, f32) -> bool + Send>;

/// Where pipeline output goes. Implemented by the receiver worker.
pub trait PipelineSink {
    /// A frame of 2·Fi-rate IQ, post rotation (raw-IQ recording taps).
    fn iq_ready(&mut self, iq: &[IqSample]);

    /// A completed 4096-sample stereo PCM block.
    fn audio_ready(&mut self, samples: &[i16]);

    /// At least [`FFTCP`] samples of Fi-rate baseband are pending for the
    /// digital-sideband consumer. Returns the count consumed; 0 stops the
    /// drain for this frame.
    fn baseband_ready(&mut self, iq: &[IqSample]) -> usize;
}

/// The complete IQ-to-audio pipeline for one tuned station.
pub struct Pipeline {
    chain: DecimationChain,
    ring: IqRing,
    fi_scratch: Vec<IqSample>,
    fm_decim: HalfbandIq,
    demod: FmDemod,
    fm_carry: Vec<IqSample>,
    audio: FmAudio,
    snr: SnrEstimator,
    snr_cb: Option<SnrCallback>,
    overflows: u64,
}

impl Pipeline {
    /// Create a pipeline at the baseline ×2 decimation.
    pub fn new() -> Self {
        Self {
            chain: DecimationChain::new(),
            ring: IqRing::new(INPUT_BUF_LEN),
            fi_scratch: Vec::new(),
            fm_decim: HalfbandIq::new(&DECIM_TAPS),
            demod: FmDemod::new((SAMPLE_RATE / 2.0) as f32),
            fm_carry: Vec::new(),
            audio: FmAudio::new(),
            snr: SnrEstimator::new(),
            snr_cb: None,
            overflows: 0,
        }
    }

    /// Configure the device decimation factor (2, 4, 8 or 16).
    pub fn set_decimation(&mut self, decimation: u32) -> Result<(), UnsupportedDecimation> {
        self.chain.set_decimation(decimation)
    }

    /// Enable or disable the offset-tuning rotator.
    pub fn set_offset_tuning(&mut self, enabled: bool) {
        self.chain.set_offset_tuning(enabled);
    }

    /// Attach or clear the signal-quality callback. While attached the
    /// pipeline measures instead of delivering audio and baseband.
    pub fn set_snr_callback(&mut self, cb: Option<SnrCallback>) {
        self.snr_cb = cb;
    }

    /// Whether a signal-quality callback is currently attached.
    pub fn snr_active(&self) -> bool {
        self.snr_cb.is_some()
    }

    /// Schedule `n` Fi-rate samples to be discarded before the next
    /// baseband drain (digital consumer realignment).
    pub fn set_skip(&mut self, n: usize) {
        self.ring.add_skip(n);
    }

    /// Fi-rate samples waiting for the digital-sideband consumer.
    pub fn pending_baseband(&self) -> usize {
        self.ring.pending()
    }

    /// Frames dropped to intermediate-ring overflow since creation.
    pub fn overflow_count(&self) -> u64 {
        self.overflows
    }

    /// Process one device frame. The frame is consumed in place (the
    /// pre-decimation stages shrink it to the 2·Fi rate).
    pub fn process<S: PipelineSink + ?Sized>(&mut self, frame: &mut Vec<IqSample>, sink: &mut S) {
        self.chain.pre_process(frame);

        if self.snr_cb.is_some() {
            let report = self.snr.measure(
                frame,
                self.chain.final_stage_mut(),
                &mut self.fm_decim,
                &mut self.demod,
            );
            if let Some((snr, pilot_db)) = report {
                let keep = match self.snr_cb.as_mut() {
                    Some(cb) => cb(snr, pilot_db),
                    None => true,
                };
                if !keep {
                    self.snr_cb = None;
                }
            }
            return;
        }

        sink.iq_ready(frame);

        if let Err(err) = self.ring.reserve(frame.len() / 2) {
            self.overflows += 1;
            tracing::error!(%err, "input buffer overflow, dropping frame");
            return;
        }

        self.fi_scratch.clear();
        self.chain.finish(frame, &mut self.fi_scratch);
        self.ring.extend(&self.fi_scratch);

        // FM branch: one discriminator sample per Fi-rate pair, delivered
        // to the audio chain in pairs. Remainders carry across frames.
        self.fm_carry.extend_from_slice(&self.fi_scratch);
        for quad in self.fm_carry.chunks_exact(4) {
            let z0 = self.fm_decim.execute_halfband(&[quad[0], quad[1]]);
            let x0 = self.demod.demod(z0);
            let z1 = self.fm_decim.execute_halfband(&[quad[2], quad[3]]);
            let x1 = self.demod.demod(z1);
            self.audio
                .push(&[x0, x1], &mut |samples| sink.audio_ready(samples));
        }
        let rem = self.fm_carry.len() % 4;
        let start = self.fm_carry.len() - rem;
        self.fm_carry.copy_within(start.., 0);
        self.fm_carry.truncate(rem);

        self.ring.drain_until(FFTCP, |chunk| sink.baseband_ready(chunk));
    }

    /// Reset every per-station state: cursors, filters, discriminator,
    /// estimator, rotator. Used on retune and between gain steps.
    pub fn reset(&mut self) {
        self.ring.reset();
        self.fi_scratch.clear();
        self.fm_carry.clear();
        self.chain.reset();
        self.fm_decim.reset();
        self.demod.reset();
        self.audio.reset();
        self.snr.reset();
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
