//! End-to-end pipeline scenarios: synthetic IQ in, PCM and reports out.
//!
//! The generators model an rtlsdr front-end: CS16 samples at 2·Fi with the
//! pipeline at the ×2 baseline decimation.

use std::f64::consts::TAU;
use std::sync::{Arc, Mutex};

use rustfft::FftPlanner;
use rustfft::num_complex::Complex;
use sintonia_baseband::{INPUT_BUF_LEN, Pipeline, PipelineSink, SAMPLE_RATE};
use sintonia_dsp::IqSample;

/// Device rate of the ×2 baseline front-end.
const DEVICE_RATE: f64 = SAMPLE_RATE * 2.0;

/// One device read worth of samples.
const CHUNK: usize = 131_072;

#[derive(Default)]
struct CollectSink {
    audio: Vec<i16>,
    baseband_seen: usize,
    consume_baseband: bool,
}

impl PipelineSink for CollectSink {
    fn iq_ready(&mut self, _iq: &[IqSample]) {}

    fn audio_ready(&mut self, samples: &[i16]) {
        self.audio.extend_from_slice(samples);
    }

    fn baseband_ready(&mut self, iq: &[IqSample]) -> usize {
        self.baseband_seen += iq.len();
        if self.consume_baseband { iq.len() } else { 0 }
    }
}

fn feed(pipeline: &mut Pipeline, sink: &mut CollectSink, samples: &[IqSample]) {
    let mut frame = Vec::new();
    for chunk in samples.chunks(CHUNK) {
        frame.clear();
        frame.extend_from_slice(chunk);
        pipeline.process(&mut frame, sink);
    }
}

/// FM-modulate a single audio tone: `deviation` Hz peak at `audio_freq` Hz,
/// carrier at DC, amplitude `amp` of full scale.
fn fm_tone(len: usize, audio_freq: f64, deviation: f64, amp: f64) -> Vec<IqSample> {
    let mut phase = 0.0f64;
    (0..len)
        .map(|n| {
            let t = n as f64 / DEVICE_RATE;
            let inst = deviation * (TAU * audio_freq * t).sin();
            phase += TAU * inst / DEVICE_RATE;
            if phase > TAU {
                phase -= TAU;
            }
            if phase < -TAU {
                phase += TAU;
            }
            IqSample::from_f32((amp * phase.cos()) as f32, (amp * phase.sin()) as f32)
        })
        .collect()
}

#[test]
fn one_second_of_silence_yields_one_second_of_zero_audio() {
    let mut pipeline = Pipeline::new();
    let mut sink = CollectSink {
        consume_baseband: true,
        ..Default::default()
    };

    let silence = vec![IqSample::default(); 1_488_376];
    feed(&mut pipeline, &mut sink, &silence);

    let pairs = sink.audio.len() / 2;
    assert!(
        (43_000..=45_000).contains(&pairs),
        "{pairs} stereo pairs emitted"
    );
    assert!(sink.audio.iter().all(|&s| s == 0), "audio is not silent");
    assert!(sink.baseband_seen > 0, "baseband branch saw nothing");
}

#[test]
fn one_khz_tone_demodulates_cleanly() {
    let mut pipeline = Pipeline::new();
    // The modulator produces baseband at DC, as a capture would.
    pipeline.set_offset_tuning(false);
    let mut sink = CollectSink {
        consume_baseband: true,
        ..Default::default()
    };

    let iq = fm_tone(1_488_376, 1000.0, 7500.0, 0.5);
    feed(&mut pipeline, &mut sink, &iq);

    // Mono channel, settled region.
    let mono: Vec<f32> = sink
        .audio
        .chunks_exact(2)
        .map(|pair| f32::from(pair[0]))
        .skip(8192)
        .take(32_768)
        .collect();
    assert_eq!(mono.len(), 32_768, "not enough audio for the spectrum");

    // Hann-windowed spectrum.
    let n = mono.len();
    let mut buf: Vec<Complex<f32>> = mono
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let w = 0.5 * (1.0 - (TAU as f32 * i as f32 / n as f32).cos());
            Complex::new(x * w, 0.0)
        })
        .collect();
    FftPlanner::new().plan_fft_forward(n).process(&mut buf);

    let spectrum: Vec<f32> = buf[..n / 2].iter().map(|x| x.norm_sqr()).collect();
    let peak_bin = spectrum
        .iter()
        .enumerate()
        .skip(1)
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
        .map(|(i, _)| i)
        .unwrap();
    let peak_freq = peak_bin as f32 * 44_100.0 / n as f32;
    assert!(
        (peak_freq - 1000.0).abs() < 10.0,
        "spectrum peaks at {peak_freq} Hz"
    );

    // Tone power against everything else (DC leakage excluded).
    let lo = peak_bin.saturating_sub(3);
    let hi = peak_bin + 4;
    let signal: f32 = spectrum[lo..hi].iter().sum();
    let rest: f32 = spectrum[4..]
        .iter()
        .enumerate()
        .filter(|(i, _)| !(lo..hi).contains(&(i + 4)))
        .map(|(_, &p)| p)
        .sum();
    let snr_db = 10.0 * (signal / rest).log10();
    assert!(snr_db > 30.0, "demodulated SNR {snr_db} dB");
}

#[test]
fn pilot_tone_reports_strong_pilot_ratio() {
    let mut pipeline = Pipeline::new();
    pipeline.set_offset_tuning(false);
    let reports: Arc<Mutex<Vec<(f32, f32)>>> = Arc::new(Mutex::new(Vec::new()));
    let reports_cb = Arc::clone(&reports);
    pipeline.set_snr_callback(Some(Box::new(move |snr, pilot_db| {
        reports_cb.lock().unwrap().push((snr, pilot_db));
        true
    })));

    // A bare 19 kHz pilot at a realistic injection level.
    let iq = fm_tone(32_768 * 10, 19_000.0, 7500.0, 0.5);
    let mut sink = CollectSink::default();
    for chunk in iq.chunks(32_768) {
        let mut frame = chunk.to_vec();
        pipeline.process(&mut frame, &mut sink);
    }

    let reports = reports.lock().unwrap();
    assert!(reports.len() >= 5, "only {} reports", reports.len());
    // Skip the first report: it includes the discriminator lock-in.
    for (i, (_, pilot_db)) in reports.iter().enumerate().skip(1) {
        assert!(
            *pilot_db > 20.0,
            "report {i}: pilot ratio {pilot_db} dB"
        );
    }
    // Measurement mode delivers no audio and no baseband.
    assert!(sink.audio.is_empty());
    assert_eq!(sink.baseband_seen, 0);
}

#[test]
fn snr_callback_detaches_on_false_return() {
    let mut pipeline = Pipeline::new();
    let count = Arc::new(Mutex::new(0u32));
    let count_cb = Arc::clone(&count);
    pipeline.set_snr_callback(Some(Box::new(move |_, _| {
        *count_cb.lock().unwrap() += 1;
        false
    })));

    let silence = vec![IqSample::default(); 32_768];
    let mut sink = CollectSink::default();
    for _ in 0..4 {
        let mut frame = silence.clone();
        pipeline.process(&mut frame, &mut sink);
    }

    assert_eq!(*count.lock().unwrap(), 1, "one-shot subscription fired again");
    assert!(!pipeline.snr_active());
    // With the callback gone, delivery resumes.
    assert!(sink.baseband_seen > 0);
}

#[test]
fn ring_overflow_is_counted_and_the_pipeline_survives() {
    let mut pipeline = Pipeline::new();
    let mut sink = CollectSink {
        consume_baseband: false,
        ..Default::default()
    };

    // 17 refused chunks: 16 fill the ring, the 17th must drop.
    let chunk = vec![IqSample::default(); CHUNK];
    for _ in 0..17 {
        let mut frame = chunk.clone();
        pipeline.process(&mut frame, &mut sink);
    }
    assert_eq!(pipeline.overflow_count(), 1, "expected a single overflow");
    assert!(pipeline.pending_baseband() <= INPUT_BUF_LEN);

    // Let the consumer drain and keep going: the pipeline stays live. The
    // first recovery frame is small enough to fit beside the backlog.
    sink.consume_baseband = true;
    let audio_before = sink.audio.len();
    let small = vec![IqSample::default(); CHUNK / 2];
    for _ in 0..8 {
        let mut frame = small.clone();
        pipeline.process(&mut frame, &mut sink);
    }
    assert_eq!(pipeline.overflow_count(), 1);
    assert!(sink.audio.len() > audio_before, "audio did not resume");
    assert!(pipeline.pending_baseband() < INPUT_BUF_LEN);
}

#[test]
fn reset_produces_identical_output_streams() {
    let iq = fm_tone(CHUNK * 2, 1000.0, 7500.0, 0.5);

    let mut pipeline = Pipeline::new();
    pipeline.set_offset_tuning(false);
    let mut first = CollectSink {
        consume_baseband: true,
        ..Default::default()
    };
    feed(&mut pipeline, &mut first, &iq);

    pipeline.reset();
    let mut second = CollectSink {
        consume_baseband: true,
        ..Default::default()
    };
    feed(&mut pipeline, &mut second, &iq);

    assert_eq!(first.audio, second.audio, "reset is not a clean restart");
}
