//! Sintonia radio - device control and receiver orchestration.
//!
//! This crate wraps the baseband pipeline with everything a running
//! receiver needs:
//!
//! - [`SdrDevice`] - the front-end seam (tuning, gain, streaming reads),
//!   with a static supported-driver table and a raw-IQ file device
//! - [`Event`] - the sum-typed event stream delivered to one sink on the
//!   worker thread
//! - [`DigitalDecoder`] - the seam the external digital-sideband decoder
//!   plugs into
//! - [`Receiver`] - the public control handle: start/stop, tuning, gain,
//!   auto-gain and band scanning, all serviced by a dedicated worker
//!   thread that owns the pipeline
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sintonia_radio::{Receiver, Event};
//!
//! let mut radio = Receiver::open_iq("capture.iq".as_ref())?;
//! radio.set_event_callback(Some(Box::new(|event| {
//!     if let Event::Audio { samples, .. } = event {
//!         play(samples);
//!     }
//! })))?;
//! radio.start()?;
//! ```

mod decoder;
mod device;
mod event;
mod receiver;

pub use decoder::DigitalDecoder;
pub use device::{
    DriverCaps, FileDevice, GainRange, SUPPORTED_DRIVERS, SdrDevice, StreamFormat, lookup_driver,
};
pub use event::{
    Event, EventCallback, EventReporter, LotFile, PROGRAM_ANALOG, SigComponent, SigService,
    SigServiceKind,
};
pub use receiver::{Receiver, ScanHit, State, Status, SCAN_BEGIN, SCAN_END, SCAN_SKIP};

/// Errors surfaced by the receiver control surface.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The SDR front-end refused or failed an operation.
    #[error("device error: {0}")]
    Device(String),

    /// The operation needs a stopped pipeline.
    #[error("pipeline is running")]
    Busy,

    /// The requested decimation factor is not a supported power of two.
    #[error(transparent)]
    UnsupportedDecimation(#[from] sintonia_baseband::UnsupportedDecimation),

    /// Raw-IQ file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The worker thread is gone (receiver closed or panicked).
    #[error("worker thread is not running")]
    WorkerGone,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
