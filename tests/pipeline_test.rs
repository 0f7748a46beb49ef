//! end-to-end checks of the detection pipeline on synthetic plucks
use once_cell::sync::Lazy;
use rand::Rng;
use spokemeter_rust::analyzer::param_message::{AnalyzerParam, ParamMessage};
use spokemeter_rust::dsp::autocorrelation::AutocorrelationEstimator;
use spokemeter_rust::dsp::spectrum::SpectralEstimator;
use spokemeter_rust::dsp::window::HannWindow;
use spokemeter_rust::{AnalyzerSettings, TensionEngine};

const SAMPLE_RATE: f64 = 44_100.0;
const BLOCK_SIZE: usize = 4096;
const MS: u128 = 1000;

/// sine with continuous phase, as consecutive blocks off a live stream
fn tone_blocks(freq: f64, amplitude: f64, count: usize) -> Vec<Vec<i16>> {
    (0..count)
        .map(|block| {
            (0..BLOCK_SIZE)
                .map(|i| {
                    let n = (block * BLOCK_SIZE + i) as f64;
                    (amplitude * 32767.0 * f64::sin(n * 2.0 * std::f64::consts::PI * freq / SAMPLE_RATE))
                        as i16
                })
                .collect()
        })
        .collect()
}

static WINDOW: Lazy<HannWindow> = Lazy::new(|| HannWindow::build(BLOCK_SIZE));

fn windowed_frame(block: &[i16]) -> Vec<f64> {
    let mut frame: Vec<f64> = block.iter().map(|s| *s as f64 / 32767.0).collect();
    let mean = frame.iter().sum::<f64>() / frame.len() as f64;
    for v in frame.iter_mut() {
        *v -= mean;
    }
    WINDOW.apply(&mut frame);
    frame
}

#[test]
fn estimators_agree_on_a_440_burst() {
    let mut spectral = SpectralEstimator::build(BLOCK_SIZE, SAMPLE_RATE, 0.5, 0.005, 5);
    let mut autocorr =
        AutocorrelationEstimator::build(BLOCK_SIZE, SAMPLE_RATE, 157.7, 863.7, 3, 1e-6).unwrap();

    let mut top_candidate = 0.0;
    for block in tone_blocks(440.0, 0.6, 4) {
        let frame = windowed_frame(&block);
        spectral.update(&frame);
        let candidates = autocorr.detect(&frame);
        assert!(!candidates.is_empty());
        top_candidate = candidates[0].frequency;
    }

    // the spectral peak list holds a peak within one bin width of 440
    let peaks = spectral.peaks();
    let nearest = peaks
        .iter()
        .map(|p| (p.frequency - 440.0).abs())
        .fold(f64::INFINITY, f64::min);
    assert!(nearest <= spectral.bin_width());

    // the autocorrelation estimate lands within 1% (lag around 100.2)
    assert!((top_candidate - 440.0).abs() < 4.4);
}

#[test]
fn full_engine_reads_tension_from_a_pluck() {
    let mut engine = TensionEngine::build(AnalyzerSettings::default(), 0).unwrap();
    let mut now = 0;
    let mut readout = engine.readout();
    for block in tone_blocks(440.0, 0.6, 6) {
        now += 95 * MS; // block cadence of 4096 samples at 44100
        readout = engine.process(&block, now);
    }
    let freq = readout.frequency.unwrap();
    let tension = readout.tension.unwrap();
    println!("pluck read back as {:.1} Hz / {:.0} N", freq, tension);
    assert!((freq - 440.0).abs() < 4.4);
    assert!((tension - 778.5).abs() < 20.0);
    assert!((readout.kgf().unwrap() - tension / 9.80665).abs() < 1e-9);
}

#[test]
fn noisy_pluck_still_resolves() {
    let mut engine = TensionEngine::build(AnalyzerSettings::default(), 0).unwrap();
    let mut rng = rand::thread_rng();
    let mut now = 0;
    let mut readout = engine.readout();
    for block in tone_blocks(440.0, 0.5, 6) {
        let noisy: Vec<i16> = block
            .iter()
            .map(|s| s.saturating_add(rng.gen_range(-1000..1000)))
            .collect();
        now += 95 * MS;
        readout = engine.process(&noisy, now);
    }
    let freq = readout.frequency.unwrap();
    assert!((freq - 440.0).abs() < 8.0);
}

#[test]
fn out_of_band_tone_never_updates_the_readout() {
    let mut engine = TensionEngine::build(AnalyzerSettings::default(), 0).unwrap();
    let mut now = 0;
    // 1200 Hz is above the 100..3000 N band of the default spoke
    for block in tone_blocks(1200.0, 0.6, 6) {
        now += 95 * MS;
        assert!(engine.process(&block, now).is_empty());
    }
}

#[test]
fn readout_decays_to_empty_after_the_hold_window() {
    let mut engine = TensionEngine::build(AnalyzerSettings::default(), 0).unwrap();
    let mut now = 0;
    for block in tone_blocks(440.0, 0.6, 4) {
        now += 95 * MS;
        engine.process(&block, now);
    }
    assert!(!engine.readout().is_empty());

    // silence keeps the hold alive for a second, then clears it
    let silence = vec![0i16; BLOCK_SIZE];
    let mut cleared_at = None;
    for _ in 0..20 {
        now += 95 * MS;
        if engine.process(&silence, now).is_empty() {
            cleared_at = Some(now);
            break;
        }
    }
    let cleared_at = cleared_at.expect("readout never went empty");
    // hold duration is 1000 ms past the last accepted update
    assert!(cleared_at > 1000 * MS);
}

#[test]
fn band_reconfiguration_resets_spectral_state() {
    let mut engine = TensionEngine::build(AnalyzerSettings::default(), 0).unwrap();
    let mut now = 0;
    for block in tone_blocks(440.0, 0.6, 4) {
        now += 95 * MS;
        engine.process(&block, now);
    }
    assert!(engine.spectrum_db().iter().any(|db| *db > -100.0));

    engine
        .handle_param(&ParamMessage::new(AnalyzerParam::SetTensionBand, 300.0, 2000.0))
        .unwrap();
    // smoothed spectrum is back at the zero state and the band is sane
    assert!(engine.spectrum_db().iter().all(|db| *db <= -200.0));
    let (freq_min, freq_max) = engine.get_band();
    assert!(freq_min > 0.0 && freq_min < freq_max);

    // and the pipeline keeps working after the change
    for block in tone_blocks(440.0, 0.6, 4) {
        now += 400 * MS;
        engine.process(&block, now);
    }
    assert!(!engine.readout().is_empty());
}
