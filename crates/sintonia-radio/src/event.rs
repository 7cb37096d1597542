//! Receiver event model.
//!
//! Everything the receiver tells the application flows through one
//! sum-typed [`Event`] delivered to a single callback on the worker
//! thread. Payloads are borrowed; a sink that wants to keep data copies
//! it. Service descriptions are plain slices of owned values rather than
//! intrusive lists.
//!
//! Only [`Event::Audio`] (with [`PROGRAM_ANALOG`]), [`Event::Sync`] and
//! [`Event::LostSync`] originate in this crate; the remaining variants are
//! emitted on behalf of an attached digital decoder via [`EventReporter`].
//!
//! Callbacks run on the worker thread and must not call back into the
//! receiver's mutating API (the worker cannot service the resulting
//! control message while it is inside the callback).

use sintonia_dsp::IqSample;

/// Program number used for the analog (FM) audio stream.
pub const PROGRAM_ANALOG: u32 = 0xFFFF_FFFF;

/// Service class of a station information guide entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigServiceKind {
    /// An audio program service.
    Audio,
    /// A data service.
    Data,
}

/// One component of a station information guide service.
#[derive(Debug, Clone)]
pub enum SigComponent {
    /// Audio component.
    Audio {
        /// Component identifier.
        id: u8,
        /// Transport port.
        port: u16,
        /// Codec type.
        codec: u8,
        /// MIME type hash.
        mime: u32,
    },
    /// Data component.
    Data {
        /// Component identifier.
        id: u8,
        /// Transport port.
        port: u16,
        /// Service data type.
        service_data_type: u16,
        /// Payload type.
        kind: u8,
        /// MIME type hash.
        mime: u32,
    },
}

/// One station information guide service with its components.
#[derive(Debug, Clone)]
pub struct SigService {
    /// Service class.
    pub kind: SigServiceKind,
    /// Service number.
    pub number: u16,
    /// Service name.
    pub name: String,
    /// Components, in broadcast order.
    pub components: Vec<SigComponent>,
}

/// A received file object (station logo, album art, ...).
#[derive(Debug, Clone, Copy)]
pub struct LotFile<'a> {
    /// Transport port the file arrived on.
    pub port: u16,
    /// Object identifier.
    pub lot: u32,
    /// Total size in bytes.
    pub size: u32,
    /// MIME type hash.
    pub mime: u32,
    /// File name.
    pub name: &'a str,
    /// File contents.
    pub data: &'a [u8],
}

/// Everything the receiver reports, in production order.
#[derive(Debug)]
pub enum Event<'a> {
    /// A frame of 2·Fi-rate IQ after decimation and rotation.
    Iq {
        /// The IQ samples.
        data: &'a [IqSample],
    },
    /// The digital decoder acquired symbol sync.
    Sync,
    /// The digital decoder lost symbol sync.
    LostSync,
    /// A coded audio packet from the digital decoder.
    Hdc {
        /// Program number.
        program: u32,
        /// Packet bytes.
        data: &'a [u8],
    },
    /// A block of 16-bit stereo PCM (interleaved L/R pairs).
    Audio {
        /// Program number; [`PROGRAM_ANALOG`] for the FM path.
        program: u32,
        /// Interleaved samples.
        samples: &'a [i16],
    },
    /// Modulation error ratio of the two sidebands.
    Mer {
        /// Lower sideband MER in dB.
        lower: f32,
        /// Upper sideband MER in dB.
        upper: f32,
    },
    /// Convolutional decoder bit error rate.
    Ber {
        /// Estimated channel BER.
        cber: f32,
    },
    /// A completed file object.
    Lot(LotFile<'a>),
    /// Station information guide table.
    Sig {
        /// The services described by the guide.
        services: &'a [SigService],
    },
    /// Station information service basics.
    Sis {
        /// Station short name.
        name: &'a str,
        /// FCC facility identifier.
        facility_id: u32,
    },
    /// ID3 metadata for a program.
    Id3 {
        /// Program number.
        program: u32,
        /// Raw ID3 tag bytes.
        data: &'a [u8],
    },
}

/// The event sink: one callback, worker thread, production order.
pub type EventCallback = Box<dyn FnMut(&Event) + Send>;

/// Reporting surface handed to the digital decoder.
///
/// Methods may be called from inside [`crate::DigitalDecoder::push`]; the
/// receiver forwards them as [`Event`]s (suppressed while scanning, except
/// for the sync and station-name captures the scanner itself consumes).
pub trait EventReporter {
    /// Symbol sync acquired.
    fn sync(&mut self);
    /// Symbol sync lost.
    fn lost_sync(&mut self);
    /// Decoded PCM for a digital program.
    fn audio(&mut self, program: u32, samples: &[i16]);
    /// A coded audio packet.
    fn hdc(&mut self, program: u32, data: &[u8]);
    /// Modulation error ratio.
    fn mer(&mut self, lower: f32, upper: f32);
    /// Channel bit error rate.
    fn ber(&mut self, cber: f32);
    /// A completed file object.
    fn lot(&mut self, file: &LotFile<'_>);
    /// Station information guide.
    fn sig(&mut self, services: &[SigService]);
    /// Station information basics.
    fn sis(&mut self, name: &str, facility_id: u32);
    /// ID3 metadata.
    fn id3(&mut self, program: u32, data: &[u8]);
}
