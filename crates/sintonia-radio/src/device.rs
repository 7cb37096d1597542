//! SDR front-end seam.
//!
//! [`SdrDevice`] decouples the receiver from any specific driver API. The
//! trait mirrors the capability set every supported front-end offers:
//! sample rate, bandwidth, manual gain, tuning, CS16 streaming and a
//! bounded read. Hardware bindings live out of tree; in tree there is
//! [`FileDevice`] for raw-IQ captures and the mock devices the tests use.
//!
//! The trait uses plain methods rather than generics so `Box<dyn
//! SdrDevice>` can be chosen at runtime, the same shape the audio backend
//! seam takes in the rest of the ecosystem.

use crate::{Error, Result};
use sintonia_baseband::SAMPLE_RATE;
use sintonia_dsp::IqSample;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Stream sample format. Every supported front-end delivers CS16
/// (interleaved signed 16-bit I/Q).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFormat {
    /// Interleaved `i16` I/Q pairs.
    ComplexI16,
}

/// Inclusive gain range of a front-end, in dB.
#[derive(Debug, Clone, Copy)]
pub struct GainRange {
    /// Lowest settable gain.
    pub minimum: f32,
    /// Highest settable gain.
    pub maximum: f32,
}

/// A supported driver and the rate/decimation pair the pipeline uses
/// with it.
#[derive(Debug, Clone, Copy)]
pub struct DriverCaps {
    /// Driver key as the device reports it.
    pub driver: &'static str,
    /// Device sample rate in Hz (an integer multiple of Fi).
    pub sample_rate: f64,
    /// Decimation factor down to Fi.
    pub decimation: u32,
}

/// Front-ends with known-good rate configurations.
pub const SUPPORTED_DRIVERS: [DriverCaps; 3] = [
    DriverCaps {
        driver: "rtlsdr",
        sample_rate: SAMPLE_RATE * 2.0,
        decimation: 2,
    },
    DriverCaps {
        driver: "hackrf",
        sample_rate: SAMPLE_RATE * 8.0,
        decimation: 8,
    },
    DriverCaps {
        driver: "sdrplay",
        sample_rate: SAMPLE_RATE * 4.0,
        decimation: 4,
    },
];

/// Look up the rate configuration for a driver key, case-insensitively.
pub fn lookup_driver(driver: &str) -> Option<DriverCaps> {
    SUPPORTED_DRIVERS
        .iter()
        .find(|caps| caps.driver.eq_ignore_ascii_case(driver))
        .copied()
}

/// The capability set the receiver needs from an SDR front-end.
///
/// All methods are called from the worker thread (and from `open` before
/// the worker exists); implementations need `Send` but not `Sync`.
pub trait SdrDevice: Send {
    /// Driver key, e.g. `"rtlsdr"`.
    fn driver(&self) -> &str;

    /// Set the device sample rate in Hz.
    fn set_sample_rate(&mut self, rate: f64) -> Result<()>;

    /// Set the analog bandwidth in Hz.
    fn set_bandwidth(&mut self, bandwidth: f64) -> Result<()>;

    /// Switch between hardware AGC and manual gain.
    fn set_gain_mode(&mut self, auto: bool) -> Result<()>;

    /// Set the receive gain in dB.
    fn set_gain(&mut self, gain: f32) -> Result<()>;

    /// The settable gain range.
    fn gain_range(&self) -> GainRange;

    /// Tune to the given RF frequency in Hz (offset already applied by
    /// the caller).
    fn set_frequency(&mut self, frequency: f64) -> Result<()>;

    /// Prepare the receive stream in the given format.
    fn setup_stream(&mut self, format: StreamFormat) -> Result<()>;

    /// Start the stream.
    fn activate(&mut self) -> Result<()>;

    /// Stop the stream.
    fn deactivate(&mut self) -> Result<()>;

    /// Read up to `buf.len()` samples, waiting at most `timeout`.
    /// Returns the count read; 0 means end of stream.
    fn read(&mut self, buf: &mut [IqSample], timeout: Duration) -> Result<usize>;
}

/// Raw-IQ playback device: interleaved little-endian `i16 I, Q` from a
/// file, or stdin when opened with `-`.
pub struct FileDevice {
    reader: Box<dyn Read + Send>,
    bytes: Vec<u8>,
}

impl FileDevice {
    /// Open a capture file, or stdin for `-`.
    pub fn open(path: &Path) -> Result<Self> {
        let reader: Box<dyn Read + Send> = if path.as_os_str() == "-" {
            Box::new(std::io::stdin())
        } else {
            Box::new(File::open(path)?)
        };
        Ok(Self {
            reader,
            bytes: Vec::new(),
        })
    }
}

impl SdrDevice for FileDevice {
    fn driver(&self) -> &str {
        "file"
    }

    fn set_sample_rate(&mut self, _rate: f64) -> Result<()> {
        Ok(())
    }

    fn set_bandwidth(&mut self, _bandwidth: f64) -> Result<()> {
        Ok(())
    }

    fn set_gain_mode(&mut self, _auto: bool) -> Result<()> {
        Ok(())
    }

    fn set_gain(&mut self, _gain: f32) -> Result<()> {
        Ok(())
    }

    fn gain_range(&self) -> GainRange {
        GainRange {
            minimum: 0.0,
            maximum: 0.0,
        }
    }

    fn set_frequency(&mut self, _frequency: f64) -> Result<()> {
        Err(Error::Device("raw-IQ files cannot be retuned".into()))
    }

    fn setup_stream(&mut self, _format: StreamFormat) -> Result<()> {
        Ok(())
    }

    fn activate(&mut self) -> Result<()> {
        Ok(())
    }

    fn deactivate(&mut self) -> Result<()> {
        Ok(())
    }

    fn read(&mut self, buf: &mut [IqSample], _timeout: Duration) -> Result<usize> {
        self.bytes.resize(buf.len() * 4, 0);
        let mut filled = 0;
        while filled < self.bytes.len() {
            let n = self.reader.read(&mut self.bytes[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        let samples = filled / 4;
        for (sample, chunk) in buf.iter_mut().zip(self.bytes[..samples * 4].chunks_exact(4)) {
            sample.re = i16::from_le_bytes([chunk[0], chunk[1]]);
            sample.im = i16::from_le_bytes([chunk[2], chunk[3]]);
        }
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_table_lookup_is_case_insensitive() {
        let caps = lookup_driver("RTLSDR").expect("rtlsdr is supported");
        assert_eq!(caps.decimation, 2);
        assert!((caps.sample_rate - 1_488_375.0).abs() < 1e-9);

        let caps = lookup_driver("HackRF").expect("hackrf is supported");
        assert_eq!(caps.decimation, 8);

        let caps = lookup_driver("sdrplay").expect("sdrplay is supported");
        assert_eq!(caps.decimation, 4);
        assert!((caps.sample_rate - 2_976_750.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_drivers_are_not_in_the_table() {
        assert!(lookup_driver("airspy").is_none());
        assert!(lookup_driver("").is_none());
    }

    #[test]
    fn rates_are_power_of_two_multiples_of_fi() {
        for caps in &SUPPORTED_DRIVERS {
            let ratio = caps.sample_rate / SAMPLE_RATE;
            assert_eq!(ratio, f64::from(caps.decimation));
            assert!(caps.decimation.is_power_of_two());
        }
    }

    #[test]
    fn file_device_reads_interleaved_le_pairs() {
        use std::io::Write;

        let path = std::env::temp_dir().join(format!(
            "sintonia-file-device-{}.iq",
            std::process::id()
        ));
        {
            let mut f = File::create(&path).unwrap();
            for (i, q) in [(100i16, -200i16), (32767, -32768), (0, 1)] {
                f.write_all(&i.to_le_bytes()).unwrap();
                f.write_all(&q.to_le_bytes()).unwrap();
            }
        }

        let mut dev = FileDevice::open(&path).unwrap();
        let mut buf = vec![IqSample::default(); 8];
        let n = dev.read(&mut buf, Duration::from_secs(1)).unwrap();
        assert_eq!(n, 3);
        assert_eq!(buf[0], IqSample::new(100, -200));
        assert_eq!(buf[1], IqSample::new(32767, -32768));
        assert_eq!(buf[2], IqSample::new(0, 1));

        // Subsequent reads report end of stream.
        let n = dev.read(&mut buf, Duration::from_secs(1)).unwrap();
        assert_eq!(n, 0);

        std::fs::remove_file(&path).ok();
    }
}
