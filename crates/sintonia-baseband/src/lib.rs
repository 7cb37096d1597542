//! Sintonia baseband - the IQ-to-audio signal path.
//!
//! This crate turns complex IQ frames from an SDR front-end into 16-bit
//! stereo PCM at 44100 Hz plus a signal-quality estimate:
//!
//! ```text
//! IQ frames ──► halfband pre-decimation ──► offset-tuning rotator
//!     ──► final halfband + conjugate ──► intermediate ring (Fi)
//!           ├── FM discriminator ──► audio post-chain ──► 44.1 kHz PCM
//!           └── FFTCP-sized chunks ──► external digital decoder
//! ```
//!
//! While an SNR callback is attached the pipeline measures instead of
//! delivering: a small-FFT band estimator plus two Goertzel windows weigh
//! digital-sideband power and the 19 kHz pilot, feeding the auto-gain and
//! scan logic upstream.
//!
//! All state is owned by [`Pipeline`] and mutated from one thread; the
//! hot path performs no allocation beyond reusing its scratch buffers.

mod audio;
mod decimate;
mod pipeline;
mod resample;
mod ring;
mod snr;

pub use audio::FmAudio;
pub use decimate::{DecimationChain, UnsupportedDecimation};
pub use pipeline::{Pipeline, PipelineSink, SnrCallback};
pub use resample::FracResampler;
pub use ring::{IqRing, RingOverflow};
pub use snr::SnrEstimator;

/// Canonical intermediate sample rate Fi, in Hz.
///
/// Every block downstream of the final decimation halfband assumes this
/// rate; the supported front-ends deliver an integer power-of-two multiple
/// of it.
pub const SAMPLE_RATE: f64 = 744_187.5;

/// Intermediate IQ ring capacity, in samples at [`SAMPLE_RATE`].
pub const INPUT_BUF_LEN: usize = 2160 * 512;

/// One OFDM symbol worth of samples (FFT + cyclic prefix); the granularity
/// at which the digital-sideband branch consumes the ring.
pub const FFTCP: usize = 2160;

/// Tuning offset applied at the device, in Hz; the rotator shifts it back
/// out in baseband so the DC spike of zero-IF front-ends lands outside the
/// channel.
pub const FREQ_OFFSET: f64 = -300_000.0;

/// Sets the rotator refresh period: the phasor is reset to its increment
/// every `SAMPLE_RATE * 2 / FREQ_OFFSET_FACTOR` samples to stop Q15
/// rounding error from accumulating.
pub const FREQ_OFFSET_FACTOR: f64 = 2.0;

/// Number of 64-sample FFT windows accumulated per SNR report.
pub const SNR_FFT_COUNT: u32 = 512;

/// Clamp applied to the pilot and adjacent-band Goertzel powers.
pub const FM_PILOT_LIMIT: f32 = 1000.0;
