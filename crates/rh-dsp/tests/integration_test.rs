//! DSP Integration Tests
//!
//! Runs signals through chains of processors the way the offline renderer
//! strings them together. Verifies:
//! - Signal path integrity (no NaN/Inf)
//! - Silence in, silence out
//! - Limiter-style compression bounds the level
//! - Oversampled shaping stays time-aligned

use rh_dsp::biquad::{BiquadCascade, BiquadCoeffs, BiquadTDF2, FilterType};
use rh_dsp::delay::DelayLine;
use rh_dsp::dynamics::Compressor;
use rh_dsp::oversampling::OversampleFactor;
use rh_dsp::saturation::{OversampledWaveshaper, Waveshaper};
use rh_dsp::{FrameProcessor, MonoProcessor, Processor};

const SAMPLE_RATE: f64 = 44100.0;

/// Generate test sine wave
fn generate_sine(samples: usize, freq: f64, amplitude: f64) -> Vec<f64> {
    (0..samples)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE;
            amplitude * (2.0 * std::f64::consts::PI * freq * t).sin()
        })
        .collect()
}

/// Check signal has no NaN or Infinity
fn is_valid_signal(signal: &[f64]) -> bool {
    signal.iter().all(|&x| x.is_finite())
}

fn peak(signal: &[f64]) -> f64 {
    signal.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()))
}

// ═══════════════════════════════════════════════════════════════════════════════
// SIGNAL INTEGRITY TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_eq_cascade_signal_integrity() {
    let mut cascade = BiquadCascade::new();
    for (freq, gain, q) in [(80.0, 2.0, 1.5), (1000.0, -1.0, 0.7), (3000.0, 3.0, 1.2)] {
        cascade.push(BiquadTDF2::design(FilterType::Peaking, freq, q, gain, SAMPLE_RATE).unwrap());
    }

    let mut buffer = generate_sine(44100, 440.0, 0.8);
    cascade.process_block(&mut buffer);

    assert!(is_valid_signal(&buffer), "EQ cascade produced invalid signal");
    assert!(peak(&buffer) > 0.1);
}

#[test]
fn test_full_chain_silence() {
    let mut eq = BiquadTDF2::design(FilterType::Peaking, 60.0, 1.8, 4.0, SAMPLE_RATE).unwrap();
    let mut comp = Compressor::new(SAMPLE_RATE);
    comp.set_threshold(-10.0);
    comp.set_knee(30.0);
    let shaper = OversampledWaveshaper::new(Waveshaper::enhance().unwrap(), OversampleFactor::X4);
    let mut delay = DelayLine::from_ms(10.0, SAMPLE_RATE);

    let mut buffer = vec![0.0; 4096];
    eq.process_block(&mut buffer);
    comp.process_block(&mut buffer);
    let shaped = shaper.process(&buffer);
    let delayed = delay.delay(&shaped);

    assert!(delayed.iter().all(|&s| s.abs() <= 1e-12));
}

// ═══════════════════════════════════════════════════════════════════════════════
// DYNAMICS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_limiter_settings_reduce_hot_signal() {
    let mut limiter = Compressor::new(SAMPLE_RATE);
    limiter.set_threshold(-0.1);
    limiter.set_knee(0.0);
    limiter.set_ratio(20.0);
    limiter.set_times(1.0, 10.0);

    let left = generate_sine(44100, 220.0, 2.0);
    let right = generate_sine(44100, 330.0, 1.5);

    let mut out_left = Vec::with_capacity(left.len());
    for (&l, &r) in left.iter().zip(right.iter()) {
        let mut frame = [l, r];
        limiter.process_frame(&mut frame);
        out_left.push(frame[0]);
    }

    assert!(is_valid_signal(&out_left));
    // Steady-state level ends up close to the threshold
    let tail_peak = peak(&out_left[22050..]);
    assert!(tail_peak < 1.5, "tail peak {}", tail_peak);
    assert!(tail_peak < peak(&left) * 0.8);
    assert!(limiter.gain_reduction_db() >= 0.0);
}

#[test]
fn test_compressor_reset_is_repeatable() {
    let input = generate_sine(4096, 1000.0, 0.9);

    let mut comp = Compressor::new(SAMPLE_RATE);
    comp.set_threshold(-20.0);
    let first: Vec<f64> = input.iter().map(|&x| comp.process_sample(x)).collect();

    comp.reset();
    let second: Vec<f64> = input.iter().map(|&x| comp.process_sample(x)).collect();

    assert_eq!(first, second);
}

// ═══════════════════════════════════════════════════════════════════════════════
// FILTER RESPONSE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_lowpass_attenuates_highs() {
    let mut filter = BiquadTDF2::with_coeffs(BiquadCoeffs::lowpass(200.0, 1.0, SAMPLE_RATE), SAMPLE_RATE);

    let low = filter.filter(&generate_sine(8192, 50.0, 1.0));
    filter.reset();
    let high = filter.filter(&generate_sine(8192, 5000.0, 1.0));

    assert!(peak(&low[4096..]) > 0.9);
    assert!(peak(&high[4096..]) < 0.01);
}

#[test]
fn test_oversampled_shaping_is_aligned() {
    let shaper = OversampledWaveshaper::new(Waveshaper::enhance().unwrap(), OversampleFactor::X4);
    let input = generate_sine(4096, 100.0, 0.05);
    let output = shaper.process(&input);

    // Small signals: tanh(2x)/2 ~ x, so the shape should track the input in time
    for i in 200..3800 {
        assert!((output[i] - input[i]).abs() < 0.001, "misaligned at {}", i);
    }
}
