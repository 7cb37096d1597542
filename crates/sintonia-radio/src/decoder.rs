//! Digital-sideband decoder seam.
//!
//! Demodulating the OFDM sidebands is out of scope for this receiver; an
//! external decoder plugs in here. The worker drains the intermediate ring
//! to the decoder in symbol-sized chunks and forwards whatever the decoder
//! reports as events. Without a decoder attached the baseband branch is
//! consumed and discarded so the ring cannot back up.

use crate::event::EventReporter;
use sintonia_dsp::IqSample;

/// An attached digital-sideband decoder.
///
/// `push` is called on the worker thread whenever at least
/// [`sintonia_baseband::FFTCP`] Fi-rate samples are pending; the decoder
/// consumes what it can and reports through `events`. Returning 0 leaves
/// the remainder for the next frame.
pub trait DigitalDecoder: Send {
    /// Consume pending Fi-rate baseband; returns the count consumed.
    fn push(&mut self, iq: &[IqSample], events: &mut dyn EventReporter) -> usize;

    /// Drop all acquisition state (called on retune and gain changes).
    fn reset(&mut self);
}
