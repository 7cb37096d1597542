//! Receiver control handle and worker thread.
//!
//! One worker thread owns the SDR read loop and the whole signal-processing
//! pipeline. The public [`Receiver`] handle talks to it over a control
//! channel; messages are serviced between IQ reads, so the hot path never
//! takes a lock. Stopping is synchronous: `stop()` returns only after the
//! worker has deactivated the stream and quiesced, which is what makes the
//! "reconfigure only while stopped" rule enforceable.
//!
//! The worker also runs the two long-lived control algorithms:
//!
//! - **Auto-gain**: sweep the front-end's gain range, measure SNR per step
//!   through the pipeline's measurement detour and keep the argmax.
//!   Reports without a pilot are scored zero so the sweep cannot lock onto
//!   wideband noise.
//! - **Scan**: walk a frequency band, qualify each channel with a coarse
//!   then a fine gain sweep, and confirm a station by digital sync within
//!   a sample budget, capturing the station name when it arrives.

use crate::decoder::DigitalDecoder;
use crate::device::{FileDevice, GainRange, SdrDevice, StreamFormat, lookup_driver};
use crate::event::{
    Event, EventCallback, EventReporter, LotFile, PROGRAM_ANALOG, SigService,
};
use crate::{Error, Result};
use sintonia_baseband::{FFTCP, FREQ_OFFSET, Pipeline, PipelineSink, SAMPLE_RATE, SnrCallback};
use sintonia_dsp::IqSample;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver as CtlReceiver, Sender, SyncSender, TryRecvError};
use std::thread::JoinHandle;
use std::time::Duration;

const RX_BUFFER_FFT: usize = 16384;
const RX_BUFFER: usize = RX_BUFFER_FFT * 4;
const RX_TRANSITION_SAMPLES: usize = 81920;
const RX_TIMEOUT: Duration = Duration::from_secs(5);
const AUTO_GAIN_STEP: f32 = 4.0;
const AUTO_GAIN_MIN_PILOT: f32 = 10.0;
const SCAN_MIN_SNR: f32 = 2.0;
const SCAN_AUTO_GAIN_STEP: f32 = 20.0;

/// First FM channel of the scan band, Hz.
pub const SCAN_BEGIN: f64 = 87.9e6;
/// Last FM channel of the scan band, Hz.
pub const SCAN_END: f64 = 107.9e6;
/// FM channel grid spacing, Hz.
pub const SCAN_SKIP: f64 = 200e3;

/// Receiver activity as observed through [`Receiver::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Stopped; reconfiguration allowed.
    Idle,
    /// Delivering audio and baseband.
    Streaming,
    /// Sweeping the gain range.
    AutoGain,
    /// Walking the scan band.
    Scanning,
}

/// A station found by [`Receiver::scan`].
#[derive(Debug, Clone)]
pub struct ScanHit {
    /// Channel frequency in Hz.
    pub frequency: f64,
    /// Station short name, when it arrived within the scan budget.
    pub name: Option<String>,
    /// SNR measured during the fine gain sweep.
    pub snr: f32,
}

/// Snapshot of the receiver's control state.
#[derive(Debug, Clone, Copy)]
pub struct Status {
    /// Current activity.
    pub state: State,
    /// Tuned frequency in Hz (before the device offset).
    pub frequency: f64,
    /// Chosen gain in dB, if any.
    pub gain: Option<f32>,
}

enum Ctl {
    Start,
    Stop(SyncSender<()>),
    Close,
    SetFrequency(f64, SyncSender<Result<()>>),
    SetGain(f32, SyncSender<Result<()>>),
    SetAutoGain(bool),
    SetEventCallback(Option<EventCallback>),
    SetSnrCallback(Option<SnrCallback>),
    SetDigitalDecoder(Option<Box<dyn DigitalDecoder>>),
    Scan {
        begin: f64,
        end: f64,
        skip: f64,
        reply: SyncSender<Result<Option<ScanHit>>>,
    },
    Status(SyncSender<Status>),
}

/// Public control handle; the worker thread owns everything else.
pub struct Receiver {
    ctl: Option<Sender<Ctl>>,
    worker: Option<JoinHandle<()>>,
    closed: Arc<AtomicBool>,
    stop_flag: Arc<AtomicBool>,
}

impl Receiver {
    /// Bring up an SDR front-end and spawn the worker.
    ///
    /// Performs the standard bring-up sequence: driver lookup (unknown
    /// drivers warn and fall back to the ×2 baseline), sample rate,
    /// bandwidth at half the rate, manual gain mode, initial tune with the
    /// offset applied, CS16 stream setup.
    pub fn open(mut device: Box<dyn SdrDevice>) -> Result<Self> {
        let driver = device.driver().to_string();
        tracing::info!(driver = %driver, "opening SDR front-end");

        let caps = lookup_driver(&driver).unwrap_or_else(|| {
            tracing::warn!(
                driver = %driver,
                "unsupported driver, using baseline rate; please report success or failure"
            );
            crate::device::DriverCaps {
                driver: "",
                sample_rate: SAMPLE_RATE * 2.0,
                decimation: 2,
            }
        });

        device.set_sample_rate(caps.sample_rate)?;
        if let Err(err) = device.set_bandwidth(caps.sample_rate / 2.0) {
            tracing::debug!(%err, "set_bandwidth not honoured");
        }
        tracing::info!(
            sample_rate = caps.sample_rate,
            decimation = caps.decimation,
            "device configured"
        );

        device.set_gain_mode(false)?;
        device.set_gain(0.0)?;
        device.set_frequency(SCAN_BEGIN + FREQ_OFFSET)?;
        device.setup_stream(StreamFormat::ComplexI16)?;

        Self::spawn(device, caps.decimation, true, true)
    }

    /// Open a raw-IQ capture (interleaved little-endian `i16 I, Q`), or
    /// stdin with `-`. Playback runs at the ×2 baseline with offset
    /// tuning disabled.
    pub fn open_iq(path: &Path) -> Result<Self> {
        let device = FileDevice::open(path)?;
        Self::spawn(Box::new(device), 2, false, false)
    }

    fn spawn(
        device: Box<dyn SdrDevice>,
        decimation: u32,
        is_stream: bool,
        offset_tuning: bool,
    ) -> Result<Self> {
        let mut pipeline = Pipeline::new();
        pipeline.set_decimation(decimation)?;
        pipeline.set_offset_tuning(offset_tuning);

        let (ctl_tx, ctl_rx) = mpsc::channel();
        let closed = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::new(AtomicBool::new(true));

        let worker = Worker {
            device,
            pipeline,
            decimation: decimation as usize,
            is_stream,
            ctl: ctl_rx,
            closed: Arc::clone(&closed),
            stop_flag: Arc::clone(&stop_flag),
            stopped: true,
            state: State::Idle,
            frequency: SCAN_BEGIN,
            gain: None,
            auto_gain: true,
            events: None,
            decoder: None,
            samples: 0,
            scanning: false,
            scan_sync: false,
            scan_name: None,
            frame: Vec::new(),
        };

        let handle = std::thread::Builder::new()
            .name("sintonia-worker".into())
            .spawn(move || worker.run())?;

        Ok(Self {
            ctl: Some(ctl_tx),
            worker: Some(handle),
            closed,
            stop_flag,
        })
    }

    fn send(&self, msg: Ctl) -> Result<()> {
        self.ctl
            .as_ref()
            .ok_or(Error::WorkerGone)?
            .send(msg)
            .map_err(|_| Error::WorkerGone)
    }

    fn request<T>(&self, build: impl FnOnce(SyncSender<T>) -> Ctl) -> Result<T> {
        let (tx, rx) = mpsc::sync_channel(1);
        self.send(build(tx))?;
        rx.recv().map_err(|_| Error::WorkerGone)
    }

    /// Start streaming. If auto-gain is enabled and no gain has been
    /// chosen yet, the worker sweeps the gain range first.
    pub fn start(&self) -> Result<()> {
        self.stop_flag.store(false, Ordering::SeqCst);
        self.send(Ctl::Start)
    }

    /// Stop streaming. Returns once the worker has deactivated the stream
    /// and drained its current read.
    pub fn stop(&self) -> Result<()> {
        self.stop_flag.store(true, Ordering::SeqCst);
        self.request(Ctl::Stop)
    }

    /// Tune to `frequency` Hz. Fails with [`Error::Busy`] unless stopped.
    pub fn set_frequency(&self, frequency: f64) -> Result<()> {
        self.request(|tx| Ctl::SetFrequency(frequency, tx))?
    }

    /// Set a fixed gain in dB. Fails with [`Error::Busy`] unless stopped.
    pub fn set_gain(&self, gain: f32) -> Result<()> {
        self.request(|tx| Ctl::SetGain(gain, tx))?
    }

    /// Enable or disable the auto-gain sweep on the next start. Either
    /// way the previously chosen gain is forgotten.
    pub fn set_auto_gain(&self, enabled: bool) -> Result<()> {
        self.send(Ctl::SetAutoGain(enabled))
    }

    /// Install or clear the event callback.
    pub fn set_event_callback(&self, callback: Option<EventCallback>) -> Result<()> {
        self.send(Ctl::SetEventCallback(callback))
    }

    /// Install or clear a signal-quality callback. While installed the
    /// pipeline measures instead of delivering; a `false` return detaches.
    pub fn set_snr_callback(&self, callback: Option<SnrCallback>) -> Result<()> {
        self.send(Ctl::SetSnrCallback(callback))
    }

    /// Attach or detach the external digital-sideband decoder.
    pub fn set_digital_decoder(&self, decoder: Option<Box<dyn DigitalDecoder>>) -> Result<()> {
        self.send(Ctl::SetDigitalDecoder(decoder))
    }

    /// Walk `begin..=end` in `skip` steps and return the first station
    /// found, or `None` when the band is exhausted. Requires a stopped,
    /// tunable device; runs on the worker and blocks the caller.
    pub fn scan(&self, begin: f64, end: f64, skip: f64) -> Result<Option<ScanHit>> {
        self.request(|reply| Ctl::Scan {
            begin,
            end,
            skip,
            reply,
        })?
    }

    /// Snapshot the control state.
    pub fn status(&self) -> Result<Status> {
        self.request(Ctl::Status)
    }

    /// Tuned frequency in Hz.
    pub fn frequency(&self) -> Result<f64> {
        Ok(self.status()?.frequency)
    }

    /// Chosen gain in dB, if any.
    pub fn gain(&self) -> Result<Option<f32>> {
        Ok(self.status()?.gain)
    }

    /// Shut the worker down and join it. Idempotent; also runs on drop.
    pub fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Some(ctl) = self.ctl.take() {
            let _ = ctl.send(Ctl::Close);
            drop(ctl);
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for Receiver {
    fn drop(&mut self) {
        self.close();
    }
}

/// Everything owned by the worker thread.
struct Worker {
    device: Box<dyn SdrDevice>,
    pipeline: Pipeline,
    decimation: usize,
    is_stream: bool,
    ctl: CtlReceiver<Ctl>,
    closed: Arc<AtomicBool>,
    stop_flag: Arc<AtomicBool>,
    stopped: bool,
    state: State,
    frequency: f64,
    gain: Option<f32>,
    auto_gain: bool,
    events: Option<EventCallback>,
    decoder: Option<Box<dyn DigitalDecoder>>,
    samples: u64,
    scanning: bool,
    scan_sync: bool,
    scan_name: Option<String>,
    frame: Vec<IqSample>,
}

impl Worker {
    fn run(mut self) {
        while !self.closed.load(Ordering::SeqCst) {
            if self.stopped {
                match self.ctl.recv() {
                    Ok(msg) => self.handle(msg),
                    Err(_) => break,
                }
            } else {
                loop {
                    match self.ctl.try_recv() {
                        Ok(msg) => self.handle(msg),
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => {
                            self.closed.store(true, Ordering::SeqCst);
                            break;
                        }
                    }
                }
                if self.stopped || self.closed.load(Ordering::SeqCst) {
                    continue;
                }
                if let Err(err) = self.do_work() {
                    tracing::error!(%err, "device read failed, stopping");
                    self.enter_idle();
                }
            }
        }
        if !self.stopped && self.is_stream {
            let _ = self.device.deactivate();
        }
    }

    fn handle(&mut self, msg: Ctl) {
        match msg {
            Ctl::Start => {
                if !self.stopped {
                    return;
                }
                self.stopped = false;
                self.state = State::Streaming;
                if self.is_stream {
                    if let Err(err) = self.device.activate() {
                        tracing::error!(%err, "activate stream failed");
                    }
                    if self.auto_gain && self.gain.is_none() {
                        self.state = State::AutoGain;
                        match self.run_auto_gain(AUTO_GAIN_STEP) {
                            Ok(_) => self.state = State::Streaming,
                            Err(err) => {
                                tracing::error!(%err, "auto gain failed");
                                self.enter_idle();
                            }
                        }
                    }
                }
            }
            Ctl::Stop(ack) => {
                if !self.stopped {
                    self.enter_idle();
                }
                let _ = ack.send(());
            }
            Ctl::Close => {
                self.closed.store(true, Ordering::SeqCst);
            }
            Ctl::SetFrequency(hz, reply) => {
                let result = self.do_set_frequency(hz);
                let _ = reply.send(result);
            }
            Ctl::SetGain(db, reply) => {
                let result = self.do_set_gain(db);
                let _ = reply.send(result);
            }
            Ctl::SetAutoGain(enabled) => {
                self.auto_gain = enabled;
                self.gain = None;
            }
            Ctl::SetEventCallback(callback) => {
                self.events = callback;
            }
            Ctl::SetSnrCallback(callback) => {
                self.pipeline.set_snr_callback(callback);
            }
            Ctl::SetDigitalDecoder(decoder) => {
                self.decoder = decoder;
            }
            Ctl::Scan {
                begin,
                end,
                skip,
                reply,
            } => {
                let result = if !self.stopped {
                    Err(Error::Busy)
                } else if !self.is_stream {
                    Err(Error::Device("scanning requires a tunable device".into()))
                } else {
                    self.scanning = true;
                    self.state = State::Scanning;
                    let result = self.run_scan(begin, end, skip);
                    self.scanning = false;
                    self.state = State::Idle;
                    result
                };
                let _ = reply.send(result);
            }
            Ctl::Status(reply) => {
                let _ = reply.send(Status {
                    state: self.state,
                    frequency: self.frequency,
                    gain: self.gain,
                });
            }
        }
    }

    fn enter_idle(&mut self) {
        if self.is_stream {
            let _ = self.device.deactivate();
        }
        self.stopped = true;
        self.state = State::Idle;
    }

    fn do_set_frequency(&mut self, hz: f64) -> Result<()> {
        if self.frequency == hz {
            return Ok(());
        }
        if !self.stopped {
            return Err(Error::Busy);
        }
        if self.is_stream {
            self.device.set_frequency(hz + FREQ_OFFSET)?;
            if self.auto_gain {
                self.gain = None;
            }
            self.reset_pipeline();
        }
        self.frequency = hz;
        Ok(())
    }

    fn do_set_gain(&mut self, db: f32) -> Result<()> {
        if self.gain == Some(db) {
            return Ok(());
        }
        if !self.stopped {
            return Err(Error::Busy);
        }
        if self.is_stream {
            self.device.set_gain(db)?;
        }
        self.gain = Some(db);
        Ok(())
    }

    fn reset_pipeline(&mut self) {
        self.pipeline.reset();
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.reset();
        }
    }

    /// One read-and-process round of the hot loop.
    fn do_work(&mut self) -> Result<()> {
        let max = RX_BUFFER * self.decimation;
        self.frame.resize(max, IqSample::default());
        let count = self.device.read(&mut self.frame[..max], RX_TIMEOUT)?;
        if count == 0 {
            if !self.is_stream {
                // End of capture; idle like a silent station.
                std::thread::sleep(Duration::from_secs(1));
            }
            return Ok(());
        }
        self.frame.truncate(count);
        self.samples += count as u64;

        let mut sink = WorkerSink {
            events: &mut self.events,
            decoder: &mut self.decoder,
            scanning: self.scanning,
            scan_sync: &mut self.scan_sync,
            scan_name: &mut self.scan_name,
        };
        self.pipeline.process(&mut self.frame, &mut sink);
        Ok(())
    }

    /// Sweep the gain range in `step` increments and keep the best SNR.
    ///
    /// Between gain changes the first `RX_TRANSITION_SAMPLES * decimation`
    /// samples are discarded: the front-end queues samples taken at the
    /// old gain, and some tuners misbehave when reconfigured while data is
    /// in flight.
    fn run_auto_gain(&mut self, step: f32) -> Result<f32> {
        let (report_tx, report_rx) = mpsc::channel::<f32>();
        self.pipeline.set_snr_callback(Some(Box::new(move |snr, pilot| {
            let _ = report_tx.send(gate_snr(snr, pilot));
            true
        })));

        let result = self.gain_sweep(step, &report_rx);
        self.pipeline.set_snr_callback(None);

        let sweep = result?;
        let (best_gain, best_snr) = select_best(sweep);
        tracing::debug!(gain = best_gain, snr = best_snr, "auto gain selected");
        self.gain = Some(best_gain);
        let _ = self.device.set_gain(best_gain);
        Ok(best_snr)
    }

    fn gain_sweep(
        &mut self,
        step: f32,
        reports: &mpsc::Receiver<f32>,
    ) -> Result<Vec<(f32, f32)>> {
        let range: GainRange = self.device.gain_range();
        let mut sweep = Vec::new();
        let mut gain = range.minimum;
        while gain < range.maximum + step - 0.1 {
            if self.aborted() {
                break;
            }
            let g = gain.min(range.maximum);
            gain += step;

            if self.device.set_gain(g).is_err() {
                continue;
            }
            self.reset_pipeline();
            while reports.try_recv().is_ok() {}

            let mut ignore = RX_TRANSITION_SAMPLES * self.decimation;
            let snr = loop {
                if let Ok(snr) = reports.try_recv() {
                    break snr;
                }
                if self.aborted() {
                    break 0.0;
                }
                let max = RX_BUFFER_FFT * self.decimation;
                self.frame.resize(max, IqSample::default());
                let count = self.device.read(&mut self.frame[..max], RX_TIMEOUT)?;
                if count == 0 {
                    return Err(Error::Device("stream ended during gain sweep".into()));
                }
                if ignore >= count {
                    ignore -= count;
                    continue;
                }
                self.frame.truncate(count);
                if ignore > 0 {
                    self.frame.drain(..ignore);
                    ignore = 0;
                }
                let mut sink = WorkerSink {
                    events: &mut self.events,
                    decoder: &mut self.decoder,
                    scanning: self.scanning,
                    scan_sync: &mut self.scan_sync,
                    scan_name: &mut self.scan_name,
                };
                self.pipeline.process(&mut self.frame, &mut sink);
            };
            sweep.push((g, snr));
            self.reset_pipeline();
        }
        Ok(sweep)
    }

    fn aborted(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
            || (!self.scanning && self.stop_flag.load(Ordering::SeqCst))
    }

    fn run_scan(&mut self, begin: f64, end: f64, skip: f64) -> Result<Option<ScanHit>> {
        if let Err(err) = self.device.activate() {
            tracing::error!(%err, "activate stream failed");
        }
        let result = self.scan_band(begin, end, skip);
        let _ = self.device.deactivate();
        result
    }

    fn scan_band(&mut self, begin: f64, end: f64, skip: f64) -> Result<Option<ScanHit>> {
        let mut freq = begin;
        while freq <= end {
            if self.closed.load(Ordering::SeqCst) {
                break;
            }
            if self.do_set_frequency(freq).is_err() {
                freq += skip;
                continue;
            }

            // Coarse sweep finds channels with any pilot at all; the fine
            // sweep then picks the gain the measurement is trusted at.
            let snr = self.run_auto_gain(SCAN_AUTO_GAIN_STEP)?;
            if snr == 0.0 {
                freq += skip;
                continue;
            }
            let snr = self.run_auto_gain(AUTO_GAIN_STEP * 2.0)?;
            tracing::debug!(frequency = freq, snr, "station candidate");
            if snr < SCAN_MIN_SNR {
                freq += skip;
                continue;
            }

            self.reset_pipeline();
            self.scan_name = None;
            self.scan_sync = false;
            self.samples = 0;
            let sync_budget = (SAMPLE_RATE * self.decimation as f64 * 10.0) as u64;
            let name_budget = (SAMPLE_RATE * self.decimation as f64 * 30.0) as u64;

            while self.samples < name_budget {
                self.do_work()?;
                if self.closed.load(Ordering::SeqCst) {
                    break;
                }
                // Give up if nothing locked on in time.
                if !self.scan_sync && self.samples >= sync_budget {
                    break;
                }
                // Stop early once the station name is known.
                if self.scan_name.as_ref().is_some_and(|n| !n.is_empty()) {
                    break;
                }
            }

            if !self.scan_sync {
                freq += skip;
                continue;
            }
            if let Some(name) = &self.scan_name {
                tracing::info!(station = %name, frequency = freq, snr, "station found");
            }
            return Ok(Some(ScanHit {
                frequency: freq,
                name: self.scan_name.clone(),
                snr,
            }));
        }
        Ok(None)
    }
}

/// Pilot floor applied to every SNR report: a measurement without a
/// plausible pilot is scored zero so noise cannot win the sweep.
fn gate_snr(snr: f32, pilot_db: f32) -> f32 {
    if pilot_db < AUTO_GAIN_MIN_PILOT { 0.0 } else { snr }
}

/// Argmax over `(gain, snr)` pairs; earlier entries win ties.
fn select_best(sweep: Vec<(f32, f32)>) -> (f32, f32) {
    let mut best = (0.0, 0.0);
    for (gain, snr) in sweep {
        if snr > best.1 {
            best = (gain, snr);
        }
    }
    best
}

/// Per-frame view of the worker handed to the pipeline: event fan-out,
/// digital drain, and the scanner's sync/name capture.
struct WorkerSink<'a> {
    events: &'a mut Option<EventCallback>,
    decoder: &'a mut Option<Box<dyn DigitalDecoder>>,
    scanning: bool,
    scan_sync: &'a mut bool,
    scan_name: &'a mut Option<String>,
}

impl WorkerSink<'_> {
    fn emit(&mut self, event: &Event<'_>) {
        if self.scanning {
            return;
        }
        if let Some(callback) = self.events.as_mut() {
            callback(event);
        }
    }
}

impl PipelineSink for WorkerSink<'_> {
    fn iq_ready(&mut self, iq: &[IqSample]) {
        self.emit(&Event::Iq { data: iq });
    }

    fn audio_ready(&mut self, samples: &[i16]) {
        self.emit(&Event::Audio {
            program: PROGRAM_ANALOG,
            samples,
        });
    }

    fn baseband_ready(&mut self, iq: &[IqSample]) -> usize {
        debug_assert!(iq.len() >= FFTCP);
        let mut decoder = self.decoder.take();
        let consumed = match decoder.as_mut() {
            Some(decoder) => decoder.push(iq, self),
            // No decoder attached: discard so the ring cannot back up.
            None => iq.len(),
        };
        *self.decoder = decoder;
        consumed
    }
}

impl EventReporter for WorkerSink<'_> {
    fn sync(&mut self) {
        if self.scanning {
            *self.scan_sync = true;
        }
        self.emit(&Event::Sync);
    }

    fn lost_sync(&mut self) {
        self.emit(&Event::LostSync);
    }

    fn audio(&mut self, program: u32, samples: &[i16]) {
        self.emit(&Event::Audio { program, samples });
    }

    fn hdc(&mut self, program: u32, data: &[u8]) {
        self.emit(&Event::Hdc { program, data });
    }

    fn mer(&mut self, lower: f32, upper: f32) {
        self.emit(&Event::Mer { lower, upper });
    }

    fn ber(&mut self, cber: f32) {
        self.emit(&Event::Ber { cber });
    }

    fn lot(&mut self, file: &LotFile<'_>) {
        self.emit(&Event::Lot(*file));
    }

    fn sig(&mut self, services: &[SigService]) {
        self.emit(&Event::Sig { services });
    }

    fn sis(&mut self, name: &str, facility_id: u32) {
        if self.scanning {
            *self.scan_name = Some(name.to_string());
        }
        self.emit(&Event::Sis { name, facility_id });
    }

    fn id3(&mut self, program: u32, data: &[u8]) {
        self.emit(&Event::Id3 { program, data });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_best_picks_the_argmax() {
        let sweep = vec![(0.0, 2.0), (4.0, 5.0), (8.0, 9.0), (12.0, 6.0), (16.0, 3.0)];
        let (gain, snr) = select_best(sweep);
        assert_eq!(gain, 8.0);
        assert_eq!(snr, 9.0);
    }

    #[test]
    fn select_best_of_nothing_is_zero() {
        assert_eq!(select_best(Vec::new()), (0.0, 0.0));
    }

    #[test]
    fn select_best_prefers_the_first_of_equal_peaks() {
        let (gain, _) = select_best(vec![(0.0, 5.0), (4.0, 5.0)]);
        assert_eq!(gain, 0.0);
    }

    #[test]
    fn snr_gate_zeroes_reports_without_pilot() {
        assert_eq!(gate_snr(7.5, 9.9), 0.0);
        assert_eq!(gate_snr(7.5, 10.0), 7.5);
        assert_eq!(gate_snr(0.0, 25.0), 0.0);
    }
}
